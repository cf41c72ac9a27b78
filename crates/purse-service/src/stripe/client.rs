//! Stripe API client implementation.

use reqwest::Client;
use std::time::Duration;

use purse_core::{AccountId, ProductId};

use super::types::{EphemeralKey, PaymentIntent, StripeErrorResponse, VerificationSession};
use crate::config::STRIPE_API_BASE;
use crate::crypto::{constant_time_eq, hmac_sha256_hex};

/// API version pinned for ephemeral keys, which Stripe requires explicitly.
const EPHEMERAL_KEY_API_VERSION: &str = "2024-06-20";

/// Maximum age of a signed webhook before it is rejected as a replay.
const WEBHOOK_TOLERANCE_SECONDS: u64 = 300;

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    api_key: String,
    webhook_secret: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client against the public API.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `webhook_secret` - Optional webhook signing secret (whsec_...)
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::Configuration`] if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        webhook_secret: Option<String>,
    ) -> Result<Self, StripeError> {
        Self::with_base_url(api_key, webhook_secret, STRIPE_API_BASE)
    }

    /// Create a new Stripe client against a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::Configuration`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        webhook_secret: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, StripeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StripeError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            webhook_secret,
        })
    }

    /// Create an Identity verification session for an account.
    ///
    /// The session checks a government document with a matching selfie and
    /// carries the account id as `metadata[accountId]`.
    pub async fn create_verification_session(
        &self,
        account_id: &AccountId,
    ) -> Result<VerificationSession, StripeError> {
        let params = [
            ("type", "document"),
            ("options[document][require_matching_selfie]", "true"),
            ("metadata[accountId]", account_id.as_str()),
        ];

        tracing::debug!(account_id = %account_id, "Creating Stripe verification session");

        let response = self
            .client
            .post(format!("{}/identity/verification_sessions", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Retrieve a verification session with its verified outputs expanded.
    pub async fn retrieve_verification_session(
        &self,
        session_id: &str,
    ) -> Result<VerificationSession, StripeError> {
        let response = self
            .client
            .get(format!(
                "{}/identity/verification_sessions/{session_id}",
                self.base_url
            ))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .query(&[
                ("expand[]", "verified_outputs"),
                ("expand[]", "verified_outputs.dob"),
                ("expand[]", "verified_outputs.id_number"),
            ])
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Create an ephemeral key scoped to a verification session.
    pub async fn create_ephemeral_key(&self, session_id: &str) -> Result<EphemeralKey, StripeError> {
        let response = self
            .client
            .post(format!("{}/ephemeral_keys", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .header("Stripe-Version", EPHEMERAL_KEY_API_VERSION)
            .form(&[("verification_session", session_id)])
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Create a payment intent for a top-up purchase.
    ///
    /// # Arguments
    ///
    /// * `amount` - Amount in the smallest currency unit
    /// * `currency` - ISO currency code
    /// * `account_id` / `product_id` - Stored as metadata for reconciliation
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        account_id: &AccountId,
        product_id: &ProductId,
    ) -> Result<PaymentIntent, StripeError> {
        let params = [
            ("amount", amount.to_string()),
            ("currency", currency.to_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[accountId]", account_id.to_string()),
            ("metadata[productId]", product_id.to_string()),
        ];

        tracing::debug!(
            account_id = %account_id,
            product_id = %product_id,
            amount,
            "Creating Stripe payment intent"
        );

        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Verify a webhook signature.
    ///
    /// # Arguments
    ///
    /// * `payload` - Raw request body
    /// * `signature` - Value of the `Stripe-Signature` header
    /// * `now` - Current Unix time, for the replay window
    pub fn verify_webhook_signature(
        &self,
        payload: &str,
        signature: &str,
        now: i64,
    ) -> Result<(), StripeError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or_else(|| StripeError::Configuration("Webhook secret not configured".into()))?;

        // Format: t=timestamp,v1=signature,v1=signature2,...
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature.split(',') {
            let mut kv = part.splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some("t"), Some(ts)) => timestamp = Some(ts),
                (Some("v1"), Some(sig)) => signatures.push(sig),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(StripeError::InvalidSignature)?;
        let signed_at: i64 = timestamp
            .parse()
            .map_err(|_| StripeError::InvalidSignature)?;

        let within_tolerance = now
            .checked_sub(signed_at)
            .map(i64::unsigned_abs)
            .is_some_and(|age| age <= WEBHOOK_TOLERANCE_SECONDS);
        if signatures.is_empty() || !within_tolerance {
            return Err(StripeError::InvalidSignature);
        }

        let signed_payload = format!("{timestamp}.{payload}");
        let expected = hmac_sha256_hex(secret, &signed_payload)
            .map_err(|e| StripeError::Configuration(e.to_string()))?;

        if signatures.iter().any(|sig| constant_time_eq(&expected, sig)) {
            Ok(())
        } else {
            Err(StripeError::InvalidSignature)
        }
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}
