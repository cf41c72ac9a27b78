//! API handlers.

pub mod health;
pub mod identity;
pub mod notifications;
pub mod payments;
pub mod subscriptions;

use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::ApiError;

/// Body of every successful saga response.
pub const OK: &str = "OK";

/// Parse a JSON request body.
///
/// Malformed JSON is a bad request; well-formed JSON with missing or mistyped
/// fields is a validation failure.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| match e.classify() {
        Category::Data => ApiError::Validation(e.to_string()),
        Category::Syntax | Category::Eof | Category::Io => ApiError::BadRequest(e.to_string()),
    })
}
