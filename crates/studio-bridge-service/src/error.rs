//! Service-layer error types
//!
//! Domain and storage errors are mapped onto the cases the HTTP layer
//! distinguishes.

use studio_bridge_core::{KeyError, StudioError};
use studio_bridge_db::DbError;
use thiserror::Error;

/// Result type alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Service-layer error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No block stored under the key
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Usage or context key could not be parsed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Required request data is missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Libraries only accept a fixed set of component categories
    #[error("Category '{category}' not supported for Libraries")]
    UnsupportedLibraryCategory { category: String },

    /// Duplicating an existing block is not implemented
    #[error("Duplicate key found")]
    DuplicateNotImplemented,

    /// The target exposes no handler with this name
    #[error("No handler named '{handler}' on {target}")]
    NoSuchHandler { handler: String, target: String },

    /// The aside could not be resolved on its host block
    #[error("Aside not found: {0}")]
    AsideNotFound(String),

    /// Block already exists
    #[error("Item already exists: {0}")]
    AlreadyExists(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Internal service error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<KeyError> for ServiceError {
    fn from(err: KeyError) -> Self {
        ServiceError::InvalidKey(err.to_string())
    }
}

impl From<StudioError> for ServiceError {
    fn from(err: StudioError) -> Self {
        match err {
            StudioError::InvalidKey(err) => ServiceError::from(err),
            StudioError::NoSuchHandler { handler, target } => {
                ServiceError::NoSuchHandler { handler, target }
            }
            StudioError::InvalidField { .. } => ServiceError::InvalidInput(err.to_string()),
            StudioError::UnknownBlockType(_) | StudioError::SerializationError(_) => {
                ServiceError::Internal(err.to_string())
            }
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            DbError::AlreadyExists(msg) => ServiceError::AlreadyExists(msg),
            DbError::Connection(msg)
            | DbError::Pool(msg)
            | DbError::Query(msg)
            | DbError::Migration(msg) => ServiceError::Database(msg),
            DbError::InvalidData(msg)
            | DbError::Serialization(msg)
            | DbError::Configuration(msg)
            | DbError::Internal(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(format!("Serialization error: {}", err))
    }
}
