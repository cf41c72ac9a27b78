//! Error types for purse storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A document to be created already exists.
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// A field update cannot be applied to the stored value.
    #[error("invalid update of {field}: {reason}")]
    InvalidUpdate {
        /// The field being updated.
        field: String,
        /// Why the update was rejected.
        reason: String,
    },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
