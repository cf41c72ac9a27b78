//! Error types for purse domain logic.

use crate::ids::IdError;

/// Result type for purse domain operations.
pub type Result<T> = std::result::Result<T, PurseError>;

/// Errors raised by pure domain logic (parsing, validation, policy).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurseError {
    /// The product id does not encode a usable credit amount.
    #[error("invalid product id {product_id}: {reason}")]
    InvalidProduct {
        /// The rejected product id.
        product_id: String,
        /// Why the product id was rejected.
        reason: &'static str,
    },

    /// A required field is missing from an inbound event.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but has an invalid value.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// The field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
