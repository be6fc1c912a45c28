//! Tagging aside handlers

use serde_json::{json, Value};

use super::request::{HandlerRequest, HandlerResponse};
use super::{HandlerContext, XBlockHandler};

/// Aside type that stores structured tags on any block
pub const TAGGING_ASIDE: &str = "tagging_aside";

/// Field holding the tags saved on a block
pub const SAVED_TAGS_FIELD: &str = "saved_tags";

/// Stores the posted JSON object as the aside's saved tags
#[derive(Debug, Default, Clone, Copy)]
pub struct SaveTagsHandler;

impl XBlockHandler for SaveTagsHandler {
    fn handle(
        &self,
        ctx: HandlerContext<'_>,
        request: &HandlerRequest,
        _suffix: &str,
    ) -> HandlerResponse {
        if !request.is_post() {
            return HandlerResponse::json_error(405, json!("Method must be POST"));
        }

        match request.json::<Value>() {
            Ok(Value::Object(tags)) => {
                ctx.fields
                    .insert(SAVED_TAGS_FIELD.to_string(), Value::Object(tags));
                HandlerResponse::success()
            }
            _ => HandlerResponse::json_error(400, json!("Invalid JSON")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::FieldData;

    #[test]
    fn test_save_tags_stores_object() {
        let mut fields = FieldData::new();
        let ctx = HandlerContext {
            usage_id: "aside-usage-v2:x".to_string(),
            fields: &mut fields,
            field_specs: &[],
            user: None,
        };

        let response = SaveTagsHandler.handle(
            ctx,
            &HandlerRequest::post_json(&json!({"difficulty": ["hard"]})),
            "",
        );

        assert_eq!(response.status, 200);
        assert_eq!(fields[SAVED_TAGS_FIELD], json!({"difficulty": ["hard"]}));
    }

    #[test]
    fn test_save_tags_rejects_arrays() {
        let mut fields = FieldData::new();
        let ctx = HandlerContext {
            usage_id: "aside-usage-v2:x".to_string(),
            fields: &mut fields,
            field_specs: &[],
            user: None,
        };

        let response =
            SaveTagsHandler.handle(ctx, &HandlerRequest::post_json(&json!(["hard"])), "");
        assert_eq!(response.status, 400);
        assert!(fields.is_empty());
    }
}
