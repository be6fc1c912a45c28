//! Field declarations for block and aside types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON shape a field value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    List,
    Dict,
    Any,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::List => "list",
            FieldKind::Dict => "dict",
            FieldKind::Any => "any",
        }
    }

    /// Check that `value` fits this kind. `null` is accepted for every kind.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        let ok = match self {
            _ if value.is_null() => true,
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Float => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::List => value.is_array(),
            FieldKind::Dict => value.is_object(),
            FieldKind::Any => true,
        };

        if ok {
            Ok(())
        } else {
            Err(format!("expected {}, got {}", self.as_str(), describe(value)))
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Value reported when the field is not explicitly set
    pub default: Value,
    /// Whether Studio's edit handler may change this field
    pub editable: bool,
}

impl FieldSpec {
    /// A field that Studio edits may set or reset
    pub fn editable(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: Value::Null,
            editable: true,
        }
    }

    /// A field managed by the system or by other handlers
    pub fn internal(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            editable: false,
            ..Self::editable(name, kind)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }
}
