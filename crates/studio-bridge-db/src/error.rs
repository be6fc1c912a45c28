//! Storage error types and conversions

use thiserror::Error;

/// Result type alias for storage operations
pub type DbResult<T> = Result<T, DbError>;

/// Storage errors
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// SQL query error
    #[error("Query error: {0}")]
    Query(String),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// No block stored under the key
    #[error("Item not found: {0}")]
    NotFound(String),

    /// A block is already stored under the key
    #[error("Item already exists: {0}")]
    AlreadyExists(String),

    /// Stored data could not be decoded
    #[error("Invalid data format: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal database error
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, DbError::AlreadyExists(_))
    }

    /// Check if this is a transient error that could be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Connection(_) | DbError::Pool(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound("No rows returned".to_string()),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                // PostgreSQL error codes: https://www.postgresql.org/docs/current/errcodes-appendix.html
                match db_err.code().as_deref() {
                    Some("23505") => DbError::AlreadyExists(message),
                    _ => DbError::Query(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::Pool("Connection pool timeout".to_string()),

            sqlx::Error::PoolClosed => DbError::Pool("Connection pool closed".to_string()),

            sqlx::Error::Io(io_err) => DbError::Connection(format!("I/O error: {}", io_err)),

            sqlx::Error::Tls(tls_err) => DbError::Connection(format!("TLS error: {}", tls_err)),

            sqlx::Error::Protocol(msg) => DbError::Connection(format!("Protocol error: {}", msg)),

            sqlx::Error::ColumnNotFound(col) => {
                DbError::InvalidData(format!("Column not found: {}", col))
            }

            sqlx::Error::Decode(msg) => DbError::Serialization(format!("Decode error: {}", msg)),

            sqlx::Error::Migrate(migrate_err) => DbError::Migration(format!("{}", migrate_err)),

            _ => DbError::Internal(format!("{}", err)),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(format!("{}", err))
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(format!("{}", err))
    }
}

impl From<studio_bridge_core::KeyError> for DbError {
    fn from(err: studio_bridge_core::KeyError) -> Self {
        DbError::InvalidData(format!("Stored key is invalid: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let not_found = DbError::NotFound("block-v1:O+C+R+type@html+block@x".to_string());
        assert!(not_found.is_not_found());
        assert!(!not_found.is_already_exists());

        assert!(DbError::AlreadyExists("k".to_string()).is_already_exists());
        assert!(DbError::Pool("timeout".to_string()).is_transient());
        assert!(!DbError::Query("bad".to_string()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = DbError::NotFound("block-v1:O+C+R+type@html+block@x".to_string());
        assert_eq!(
            err.to_string(),
            "Item not found: block-v1:O+C+R+type@html+block@x"
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }
}
