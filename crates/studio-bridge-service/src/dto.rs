//! Request and response types used at service boundaries

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body field that turns a creation request into a duplication request
pub const DUPLICATE_SOURCE_FIELD: &str = "duplicate_source_locator";

/// Deserialize a field so that an explicit `null` still counts as present.
///
/// Combined with `#[serde(default)]`, an absent field is `None` and a
/// present one (any value, including `null`) is `Some(..)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ============================================================================
// Creation DTOs
// ============================================================================

/// Request to create a block under an existing parent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateBlockRequest {
    /// Usage key of the parent block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_locator: Option<String>,

    /// Block category (e.g. `html`, `problem`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Template id used to seed the new block's fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boilerplate: Option<String>,

    /// Grading category as sent; `Some(Value::Null)` when sent as `null`.
    /// Checked only when grading runs, after the block exists.
    #[serde(
        rename = "graderType",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub grader_type: Option<Value>,

    /// Source block to duplicate; any value, including `null`, counts
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub duplicate_source_locator: Option<Value>,
}

impl CreateBlockRequest {
    /// Decode a raw request body.
    ///
    /// A body naming `duplicate_source_locator` is a duplication request
    /// whatever else it carries, so that field is looked up before any
    /// typed decoding of the rest.
    pub fn from_json(body: Value) -> Result<Self, serde_json::Error> {
        if let Some(source) = body.get(DUPLICATE_SOURCE_FIELD) {
            return Ok(Self {
                duplicate_source_locator: Some(source.clone()),
                ..Default::default()
            });
        }
        serde_json::from_value(body)
    }

    pub fn new(parent_locator: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            parent_locator: Some(parent_locator.into()),
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn boilerplate(mut self, boilerplate: impl Into<String>) -> Self {
        self.boilerplate = Some(boilerplate.into());
        self
    }

    pub fn grader_type(mut self, grader_type: Option<String>) -> Self {
        self.grader_type = Some(grader_type.map_or(Value::Null, Value::String));
        self
    }

    /// Whether the request asks for duplication rather than creation
    pub fn is_duplicate(&self) -> bool {
        self.duplicate_source_locator.is_some()
    }
}

/// Identifiers of a newly created block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBlockResponse {
    /// Usage key of the created block
    pub locator: String,

    /// Course or library key of the created block
    #[serde(rename = "courseKey")]
    pub course_key: String,
}

// ============================================================================
// Grading DTOs
// ============================================================================

/// Result of a grader type update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraderTypeUpdate {
    #[serde(rename = "graderType")]
    pub grader_type: String,
}
