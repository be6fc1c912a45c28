//! Block runtime: type registry and handler dispatch
//!
//! The runtime knows which block and aside types exist, which fields they
//! declare, which named handlers they expose, and which creation templates
//! they offer. Handlers operate on field data through a [`HandlerContext`],
//! so they never see storage or HTTP details.

mod catalogue;
mod fields;
mod request;
mod studio_edit;
mod tagging;

pub use fields::{FieldKind, FieldSpec};
pub use request::{HandlerRequest, HandlerResponse, JSON_CONTENT_TYPE};
pub use studio_edit::StudioEditHandler;
pub use tagging::{SaveTagsHandler, SAVED_TAGS_FIELD, TAGGING_ASIDE};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use serde_json::Value;

use crate::block::{AsideInstance, ContentBlock, FieldData, DISPLAY_NAME_FIELD};
use crate::error::{Result, StudioError};
use crate::types::UserId;

/// Name of the handler Studio posts field edits to
pub const STUDIO_EDIT_HANDLER: &str = "submit_studio_edits";

/// What a handler can see and change while it runs
pub struct HandlerContext<'a> {
    /// Serialized key of the block or aside being handled
    pub usage_id: String,
    pub fields: &'a mut FieldData,
    pub field_specs: &'a [FieldSpec],
    /// Acting user, when an editing runtime is bound
    pub user: Option<&'a UserId>,
}

/// A named entry point on a block or aside type
pub trait XBlockHandler: Send + Sync {
    fn handle(
        &self,
        ctx: HandlerContext<'_>,
        request: &HandlerRequest,
        suffix: &str,
    ) -> HandlerResponse;
}

/// Creation template: a boilerplate id and the field values it sets
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub id: String,
    pub fields: FieldData,
}

impl Template {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: FieldData::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// Definition of a block or aside type
#[derive(Clone)]
pub struct BlockType {
    name: String,
    fields: Vec<FieldSpec>,
    handlers: HashMap<String, Arc<dyn XBlockHandler>>,
    templates: HashMap<String, Template>,
    applies_to: Option<Vec<String>>,
}

impl BlockType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            handlers: HashMap::new(),
            templates: HashMap::new(),
            applies_to: None,
        }
    }

    /// Declare a field
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Expose a named handler
    pub fn handler(mut self, name: impl Into<String>, handler: impl XBlockHandler + 'static) -> Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Expose the Studio edit handler
    pub fn studio_editable(self) -> Self {
        self.handler(STUDIO_EDIT_HANDLER, StudioEditHandler)
    }

    pub fn template(mut self, template: Template) -> Self {
        self.templates.insert(template.id.clone(), template);
        self
    }

    /// Restrict an aside type to the given block categories
    pub fn applies_to<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applies_to = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// The explicitly set value of `name`, else its declared default.
    ///
    /// A `null` default counts as no default.
    pub fn field_value<'a>(&'a self, fields: &'a FieldData, name: &str) -> Option<&'a Value> {
        fields.get(name).or_else(|| {
            self.field_spec(name)
                .map(|spec| &spec.default)
                .filter(|default| !default.is_null())
        })
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn find_handler(&self, name: &str) -> Option<&Arc<dyn XBlockHandler>> {
        self.handlers.get(name)
    }

    pub fn find_template(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    /// Whether an aside of this type may attach to a block of `category`
    pub fn applies(&self, category: &str) -> bool {
        self.applies_to
            .as_ref()
            .map_or(true, |categories| categories.iter().any(|c| c == category))
    }
}

impl fmt::Debug for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<&String> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("BlockType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("handlers", &handlers)
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .field("applies_to", &self.applies_to)
            .finish()
    }
}

/// Registry of block and aside types
#[derive(Debug, Default, Clone)]
pub struct BlockRuntime {
    block_types: HashMap<String, BlockType>,
    aside_types: HashMap<String, BlockType>,
}

impl BlockRuntime {
    /// An empty runtime with no registered types
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime with the standard course and library block types
    pub fn with_defaults() -> Self {
        catalogue::default_runtime()
    }

    pub fn register_block(mut self, block_type: BlockType) -> Self {
        self.block_types
            .insert(block_type.name().to_string(), block_type);
        self
    }

    pub fn register_aside(mut self, aside_type: BlockType) -> Self {
        self.aside_types
            .insert(aside_type.name().to_string(), aside_type);
        self
    }

    pub fn block_type(&self, category: &str) -> Option<&BlockType> {
        self.block_types.get(category)
    }

    pub fn aside_type(&self, name: &str) -> Option<&BlockType> {
        self.aside_types.get(name)
    }

    /// Creation template for a category, if the boilerplate id is known
    pub fn template(&self, category: &str, boilerplate: &str) -> Option<&Template> {
        self.block_type(category)?.find_template(boilerplate)
    }

    /// Read a block field, falling back to its type's declared default.
    /// Blocks of unregistered types only report stored values.
    pub fn field_value<'a>(&'a self, block: &'a ContentBlock, name: &str) -> Option<&'a Value> {
        match self.block_type(block.category()) {
            Some(definition) => definition.field_value(&block.fields, name),
            None => block.field(name),
        }
    }

    pub fn display_name<'a>(&'a self, block: &'a ContentBlock) -> Option<&'a str> {
        self.field_value(block, DISPLAY_NAME_FIELD)
            .and_then(Value::as_str)
    }

    /// Load an aside on `block`.
    ///
    /// Returns the stored instance if there is one, a fresh instance if the
    /// aside type is registered and applies to the block, and `None`
    /// otherwise.
    pub fn aside_instance(&self, block: &ContentBlock, aside_type: &str) -> Option<AsideInstance> {
        let definition = self.aside_type(aside_type)?;
        if !definition.applies(block.category()) {
            return None;
        }
        Some(
            block
                .aside(aside_type)
                .cloned()
                .unwrap_or_else(|| AsideInstance::new(aside_type)),
        )
    }

    /// Run a named handler on a block
    pub fn handle_block(
        &self,
        block: &mut ContentBlock,
        handler: &str,
        request: &HandlerRequest,
        suffix: &str,
    ) -> Result<HandlerResponse> {
        let usage_id = block.location.to_string();
        let (definition, entry) = self
            .block_type(block.category())
            .and_then(|definition| definition.find_handler(handler).map(|h| (definition, h)))
            .ok_or_else(|| StudioError::NoSuchHandler {
                handler: handler.to_string(),
                target: usage_id.clone(),
            })?;

        let user = block.runtime().map(|runtime| runtime.user().clone());
        debug!(usage_id = %usage_id, handler = %handler, "Dispatching block handler");

        let ctx = HandlerContext {
            usage_id,
            fields: &mut block.fields,
            field_specs: definition.fields(),
            user: user.as_ref(),
        };
        Ok(entry.handle(ctx, request, suffix))
    }

    /// Run a named handler on an aside attached to `host`
    pub fn handle_aside(
        &self,
        host: &ContentBlock,
        aside: &mut AsideInstance,
        handler: &str,
        request: &HandlerRequest,
        suffix: &str,
    ) -> Result<HandlerResponse> {
        let usage_id = aside.usage_key(&host.location)?.to_string();
        let (definition, entry) = self
            .aside_type(&aside.aside_type)
            .and_then(|definition| definition.find_handler(handler).map(|h| (definition, h)))
            .ok_or_else(|| StudioError::NoSuchHandler {
                handler: handler.to_string(),
                target: usage_id.clone(),
            })?;

        let user = host.runtime().map(|runtime| runtime.user().clone());
        debug!(usage_id = %usage_id, handler = %handler, "Dispatching aside handler");

        let ctx = HandlerContext {
            usage_id,
            fields: &mut aside.fields,
            field_specs: definition.fields(),
            user: user.as_ref(),
        };
        Ok(entry.handle(ctx, request, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::EditRuntime;
    use serde_json::json;

    struct WhoAmI;

    impl XBlockHandler for WhoAmI {
        fn handle(
            &self,
            ctx: HandlerContext<'_>,
            _request: &HandlerRequest,
            suffix: &str,
        ) -> HandlerResponse {
            HandlerResponse::json(
                200,
                &json!({
                    "user": ctx.user.map(UserId::as_str),
                    "suffix": suffix,
                    "usage_id": ctx.usage_id,
                }),
            )
        }
    }

    fn block(category: &str) -> ContentBlock {
        ContentBlock::new(
            format!("block-v1:Org+C+R+type@{category}+block@b1")
                .parse()
                .unwrap(),
        )
    }

    #[test]
    fn test_handle_block_passes_runtime_user() {
        let runtime = BlockRuntime::new().register_block(BlockType::new("html").handler("whoami", WhoAmI));
        let mut html = block("html");
        html.bind_runtime(EditRuntime::new(UserId::new("9")));

        let response = runtime
            .handle_block(&mut html, "whoami", &HandlerRequest::new("GET"), "tail")
            .unwrap();
        let body = response.json_body().unwrap();
        assert_eq!(body["user"], "9");
        assert_eq!(body["suffix"], "tail");
        assert_eq!(body["usage_id"], "block-v1:Org+C+R+type@html+block@b1");
    }

    #[test]
    fn test_missing_handler_is_an_error() {
        let runtime = BlockRuntime::with_defaults();
        let mut vertical = block("vertical");
        let err = runtime
            .handle_block(&mut vertical, STUDIO_EDIT_HANDLER, &HandlerRequest::new("POST"), "")
            .unwrap_err();
        assert!(matches!(err, StudioError::NoSuchHandler { .. }));

        let mut unknown = block("mystery");
        assert!(runtime
            .handle_block(&mut unknown, STUDIO_EDIT_HANDLER, &HandlerRequest::new("POST"), "")
            .is_err());
    }

    #[test]
    fn test_aside_instance_loading() {
        let runtime = BlockRuntime::new()
            .register_aside(BlockType::new("tagging_aside"))
            .register_aside(BlockType::new("video_only").applies_to(["video"]));
        let mut html = block("html");

        let fresh = runtime.aside_instance(&html, "tagging_aside").unwrap();
        assert!(fresh.fields.is_empty());

        let mut stored = AsideInstance::new("tagging_aside");
        stored.fields.insert("saved_tags".to_string(), json!({"a": 1}));
        html.apply_asides(&[stored.clone()]);
        assert_eq!(runtime.aside_instance(&html, "tagging_aside"), Some(stored));

        assert!(runtime.aside_instance(&html, "video_only").is_none());
        assert!(runtime.aside_instance(&html, "unregistered").is_none());
    }

    #[test]
    fn test_handle_aside_uses_aside_key() {
        let runtime = BlockRuntime::new()
            .register_aside(BlockType::new("tagging_aside").handler("whoami", WhoAmI));
        let host = block("problem");
        let mut aside = AsideInstance::new("tagging_aside");

        let response = runtime
            .handle_aside(&host, &mut aside, "whoami", &HandlerRequest::new("GET"), "")
            .unwrap();
        let body = response.json_body().unwrap();
        assert_eq!(
            body["usage_id"],
            "aside-usage-v2:block-v1$:Org+C+R+type@problem+block@b1::tagging_aside"
        );
        assert!(body["user"].is_null());
    }

    #[test]
    fn test_field_value_falls_back_to_declared_default() {
        let runtime = BlockRuntime::with_defaults();
        let mut html = block("html").with_field("display_name", json!("Welcome"));
        assert_eq!(runtime.display_name(&html), Some("Welcome"));

        let ctx = HandlerContext {
            usage_id: html.location.to_string(),
            fields: &mut html.fields,
            field_specs: runtime.block_type("html").unwrap().fields(),
            user: None,
        };
        let response = super::StudioEditHandler.handle(
            ctx,
            &HandlerRequest::post_json(&json!({"defaults": ["display_name"]})),
            "",
        );
        assert!(response.is_success());

        assert!(html.field("display_name").is_none());
        assert_eq!(runtime.display_name(&html), Some("Text"));
        assert_eq!(runtime.field_value(&html, "editor"), Some(&json!("visual")));
        assert!(runtime.field_value(&html, "undeclared").is_none());
    }

    #[test]
    fn test_field_value_without_default_or_type() {
        let runtime = BlockRuntime::with_defaults();
        let problem = block("problem");
        assert!(runtime.field_value(&problem, "max_attempts").is_none());

        let unknown = block("mystery").with_field("display_name", json!("Kept"));
        assert_eq!(runtime.display_name(&unknown), Some("Kept"));
        assert!(runtime.field_value(&unknown, "data").is_none());
    }

    #[test]
    fn test_templates_lookup() {
        let runtime = BlockRuntime::new().register_block(
            BlockType::new("html").template(Template::new("raw.yaml").field("data", json!("<p/>"))),
        );
        assert_eq!(
            runtime.template("html", "raw.yaml").unwrap().fields["data"],
            json!("<p/>")
        );
        assert!(runtime.template("html", "missing.yaml").is_none());
        assert!(runtime.template("video", "raw.yaml").is_none());
    }
}
