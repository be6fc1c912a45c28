//! Content block and aside models
//!
//! A block is a node in a course or library tree. It carries its own field
//! values, the keys of its children, and the state of any asides attached
//! to it. Blocks loaded for editing can be bound to an [`EditRuntime`] that
//! records which user is acting; the runtime is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::keys::{AsideUsageKey, BlockUsageLocator};
use crate::error::Result;
use crate::types::UserId;

/// Field values keyed by field name
pub type FieldData = Map<String, Value>;

/// Field holding the human readable title of a block
pub const DISPLAY_NAME_FIELD: &str = "display_name";

/// Who last changed a block, and when
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_by: Option<UserId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_on: Option<DateTime<Utc>>,
}

/// Per-request editing context bound to a loaded block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRuntime {
    user: UserId,
    bound_at: DateTime<Utc>,
}

impl EditRuntime {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            bound_at: Utc::now(),
        }
    }

    /// User performing the edit
    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn bound_at(&self) -> DateTime<Utc> {
        self.bound_at
    }
}

/// State of one aside attached to a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsideInstance {
    pub aside_type: String,

    #[serde(default)]
    pub fields: FieldData,
}

impl AsideInstance {
    /// Create an aside with no stored field values
    pub fn new(aside_type: impl Into<String>) -> Self {
        Self {
            aside_type: aside_type.into(),
            fields: FieldData::new(),
        }
    }

    /// Key addressing this aside on the given host block
    pub fn usage_key(&self, host: &BlockUsageLocator) -> Result<AsideUsageKey> {
        Ok(AsideUsageKey::new(host.clone(), self.aside_type.clone())?)
    }
}

/// A node of course or library content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Key of this block
    pub location: BlockUsageLocator,

    /// Key of the containing block, absent for roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<BlockUsageLocator>,

    /// Ordered child keys
    #[serde(default)]
    pub children: Vec<BlockUsageLocator>,

    /// Explicitly set field values
    #[serde(default)]
    pub fields: FieldData,

    /// Asides with stored state
    #[serde(default)]
    pub asides: Vec<AsideInstance>,

    #[serde(default)]
    pub edit_info: EditInfo,

    #[serde(skip)]
    runtime: Option<EditRuntime>,
}

impl ContentBlock {
    /// Create an empty block at the given location
    pub fn new(location: BlockUsageLocator) -> Self {
        Self {
            location,
            parent: None,
            children: Vec::new(),
            fields: FieldData::new(),
            asides: Vec::new(),
            edit_info: EditInfo::default(),
            runtime: None,
        }
    }

    /// Set the parent key
    pub fn with_parent(mut self, parent: BlockUsageLocator) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set a field value
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Block category, taken from its key
    pub fn category(&self) -> &str {
        self.location.block_type()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.fields.get(DISPLAY_NAME_FIELD).and_then(Value::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Reset a field to its default; returns whether it was set
    pub fn clear_field(&mut self, name: &str) -> bool {
        self.fields.remove(name).is_some()
    }

    /// Merge template field values into this block
    pub fn apply_fields(&mut self, fields: &FieldData) {
        for (name, value) in fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// Append a child key unless it is already present
    pub fn add_child(&mut self, child: BlockUsageLocator) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    /// Stored state of an aside, if any
    pub fn aside(&self, aside_type: &str) -> Option<&AsideInstance> {
        self.asides.iter().find(|a| a.aside_type == aside_type)
    }

    /// Replace stored aside state with the given instances, matched by type
    pub fn apply_asides(&mut self, asides: &[AsideInstance]) {
        for aside in asides {
            match self
                .asides
                .iter_mut()
                .find(|existing| existing.aside_type == aside.aside_type)
            {
                Some(existing) => existing.fields = aside.fields.clone(),
                None => self.asides.push(aside.clone()),
            }
        }
    }

    /// Bind the editing runtime for the acting user
    pub fn bind_runtime(&mut self, runtime: EditRuntime) {
        self.runtime = Some(runtime);
    }

    pub fn runtime(&self) -> Option<&EditRuntime> {
        self.runtime.as_ref()
    }

    /// Drop the editing runtime, returning it if one was bound
    pub fn unbind_runtime(&mut self) -> Option<EditRuntime> {
        self.runtime.take()
    }

    /// Stamp the edit info for a write by `user`
    pub fn record_edit(&mut self, user: &UserId) {
        self.edit_info = EditInfo {
            edited_by: Some(user.clone()),
            edited_on: Some(Utc::now()),
        };
    }
}
