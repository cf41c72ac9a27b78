//! Identity verification document.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Verification status as reported by the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    /// The session was cancelled.
    Canceled,
    /// Submitted documents are being checked.
    Processing,
    /// The user has to submit (or resubmit) documents.
    RequiresInput,
    /// The identity was verified.
    Verified,
}

/// Per-account identity verification document.
///
/// `id` is the processor's verification session id. Once `status` is
/// [`IdentityStatus::Verified`] the document is never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDoc {
    /// Verification session id.
    pub id: String,
    /// Session creation time, unix seconds.
    pub created: i64,
    /// Verification status.
    pub status: IdentityStatus,
    /// Whether the session was created with live keys.
    pub livemode: bool,
    /// Verified first name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Verified last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Verified date of birth, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Verified id number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
}

impl IdentityDoc {
    /// Whether the document is locked against further writes.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.status == IdentityStatus::Verified
    }
}

/// Format a processor date of birth as `YYYY-MM-DD`.
///
/// Returns `None` for dates that do not exist.
#[must_use]
pub fn format_date_of_birth(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_processor_names() {
        let json = serde_json::to_string(&IdentityStatus::RequiresInput).unwrap();
        assert_eq!(json, "\"requires_input\"");
    }

    #[test]
    fn unverified_fields_are_omitted() {
        let doc = IdentityDoc {
            id: "vs_123".into(),
            created: 1_700_000_000,
            status: IdentityStatus::Processing,
            livemode: false,
            first_name: None,
            last_name: None,
            date_of_birth: None,
            id_number: None,
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("firstName").is_none());
        assert!(!doc.is_verified());
    }

    #[test]
    fn formats_date_of_birth() {
        assert_eq!(format_date_of_birth(1990, 2, 3).as_deref(), Some("1990-02-03"));
        assert_eq!(format_date_of_birth(1990, 2, 30), None);
    }
}
