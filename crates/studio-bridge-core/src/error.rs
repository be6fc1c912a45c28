//! Error types for Studio Bridge domain operations

use thiserror::Error;

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Errors raised while parsing opaque keys
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The key does not start with a known namespace prefix
    #[error("Unknown key namespace: {0}")]
    UnknownNamespace(String),

    /// The key body could not be parsed
    #[error("Invalid key '{key}': {reason}")]
    Malformed { key: String, reason: String },

    /// A key component contains characters outside the allowed set
    #[error("Invalid characters in key component '{0}'")]
    InvalidComponent(String),
}

impl KeyError {
    pub(crate) fn malformed(key: &str, reason: impl Into<String>) -> Self {
        KeyError::Malformed {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Main error type for block and runtime operations
#[derive(Error, Debug)]
pub enum StudioError {
    /// Opaque key could not be parsed
    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    /// The target exposes no handler with the requested name
    #[error("No handler named '{handler}' on {target}")]
    NoSuchHandler { handler: String, target: String },

    /// The block type is not registered with the runtime
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    /// Field value does not match its declared kind
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        StudioError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_such_handler_display() {
        let err = StudioError::NoSuchHandler {
            handler: "submit_studio_edits".to_string(),
            target: "block-v1:Org+C+R+type@vertical+block@v1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No handler named 'submit_studio_edits' on block-v1:Org+C+R+type@vertical+block@v1"
        );
    }

    #[test]
    fn test_key_error_is_transparent() {
        let err: StudioError = KeyError::UnknownNamespace("foo".to_string()).into();
        assert_eq!(err.to_string(), "Unknown key namespace: foo");
    }
}
