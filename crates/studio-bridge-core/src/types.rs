//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Library-scoped parents only accept these categories
pub const LIBRARY_CATEGORIES: [&str; 3] = ["html", "problem", "video"];

/// Whether a block of this category may be created inside a content library
pub fn is_library_category(category: &str) -> bool {
    LIBRARY_CATEGORIES.contains(&category)
}

/// Fresh block id: a random UUID rendered as 32 hex digits
pub fn new_block_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Identifier of the user acting on a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_categories() {
        assert!(is_library_category("html"));
        assert!(is_library_category("problem"));
        assert!(is_library_category("video"));
        assert!(!is_library_category("discussion"));
        assert!(!is_library_category("HTML"));
    }

    #[test]
    fn test_new_block_id_is_simple_hex() {
        let id = new_block_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_block_id());
    }

    #[test]
    fn test_user_id_is_transparent() {
        let user = UserId::new("42");
        assert_eq!(serde_json::to_string(&user).unwrap(), "\"42\"");
        assert_eq!(user.to_string(), "42");
    }
}
