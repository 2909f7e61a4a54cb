//! Store error types.

use commute_core::CommuteError;
use thiserror::Error;

/// Errors that can occur while reading or writing the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A value could not be encoded for storage.
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for CommuteError {
    fn from(err: StoreError) -> Self {
        CommuteError::Storage(err.to_string())
    }
}
