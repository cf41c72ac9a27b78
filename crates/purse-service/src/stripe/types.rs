//! Stripe API types.

use serde::Deserialize;

use purse_core::IdentityStatus;

/// Stripe Identity `VerificationSession` object.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationSession {
    /// Session ID (`vs_...`).
    pub id: String,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
    /// Verification status.
    pub status: IdentityStatus,
    /// Whether the session was created with live keys.
    #[serde(default)]
    pub livemode: bool,
    /// Secret the mobile SDK uses to open the session.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Verified data; only present when retrieved with `expand`.
    #[serde(default)]
    pub verified_outputs: Option<VerifiedOutputs>,
    /// Metadata attached at creation.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl VerificationSession {
    /// The `accountId` metadata attached when the session was created.
    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.metadata.get("accountId").and_then(serde_json::Value::as_str)
    }
}

/// Verified outputs of an Identity session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifiedOutputs {
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Date of birth.
    #[serde(default)]
    pub dob: Option<DateOfBirth>,
    /// Document or national id number.
    #[serde(default)]
    pub id_number: Option<String>,
}

/// Date of birth as Stripe reports it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DateOfBirth {
    /// Day of month.
    pub day: Option<u32>,
    /// Month.
    pub month: Option<u32>,
    /// Year.
    pub year: Option<i32>,
}

impl DateOfBirth {
    /// `YYYY-MM-DD`, when all parts are present and form a real date.
    #[must_use]
    pub fn formatted(&self) -> Option<String> {
        purse_core::identity::format_date_of_birth(self.year?, self.month?, self.day?)
    }
}

/// Stripe `EphemeralKey` object.
#[derive(Debug, Clone, Deserialize)]
pub struct EphemeralKey {
    /// Key ID.
    pub id: String,
    /// Secret handed to the client.
    pub secret: String,
}

/// Stripe `PaymentIntent` object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Payment intent ID.
    pub id: String,
    /// Amount in the smallest currency unit.
    #[serde(default)]
    pub amount: i64,
    /// Currency (e.g., "usd").
    #[serde(default)]
    pub currency: String,
    /// Status (`requires_payment_method`, `succeeded`, ...).
    #[serde(default)]
    pub status: String,
    /// Secret the client confirms the payment with.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Stripe webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    /// Event ID.
    pub id: String,
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    pub data: StripeEventData,
}

/// Stripe event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    /// Event object.
    pub object: serde_json::Value,
}

/// Stripe error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorBody,
}

/// Stripe error body.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verified_session_with_outputs() {
        let session: VerificationSession = serde_json::from_value(json!({
            "id": "vs_123",
            "object": "identity.verification_session",
            "created": 1_700_000_000,
            "status": "verified",
            "livemode": false,
            "metadata": { "accountId": "acct-1" },
            "verified_outputs": {
                "first_name": "Jenny",
                "last_name": "Rosen",
                "dob": { "day": 1, "month": 2, "year": 1990 },
                "id_number": "123456789"
            }
        }))
        .unwrap();

        assert_eq!(session.status, IdentityStatus::Verified);
        assert_eq!(session.account_id(), Some("acct-1"));
        let outputs = session.verified_outputs.unwrap();
        assert_eq!(outputs.dob.unwrap().formatted().as_deref(), Some("1990-02-01"));
    }

    #[test]
    fn partial_dob_is_not_formatted() {
        let dob = DateOfBirth {
            day: None,
            month: Some(2),
            year: Some(1990),
        };
        assert!(dob.formatted().is_none());
    }
}
