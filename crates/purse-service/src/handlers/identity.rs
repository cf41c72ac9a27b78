//! Identity verification handlers.
//!
//! Sessions are created through Stripe Identity; Stripe then reports progress via
//! signed webhooks. All three paths write the account's identity document, which
//! is frozen once verified.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use purse_core::{AccountId, IdentityDoc, IdentityStatus};

use super::{parse_json, OK};
use crate::auth::{scope, Authorized};
use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::{StripeClient, StripeEvent, VerificationSession};

/// Request to start identity verification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Account being verified.
    pub account_id: AccountId,
}

/// Keys the mobile SDK needs to open the verification flow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    /// Stripe verification session ID.
    pub verification_session_id: String,
    /// Session client secret.
    pub client_secret: String,
    /// Ephemeral key secret scoped to the session.
    pub ephemeral_key_secret: String,
}

fn stripe_client(state: &AppState) -> Result<&StripeClient, ApiError> {
    state
        .stripe
        .as_deref()
        .ok_or_else(|| ApiError::Internal("Stripe not configured".into()))
}

/// Identity document fields shared by every status.
fn session_doc(session: &VerificationSession, status: IdentityStatus) -> IdentityDoc {
    IdentityDoc {
        id: session.id.clone(),
        created: session.created,
        status,
        livemode: session.livemode,
        first_name: None,
        last_name: None,
        date_of_birth: None,
        id_number: None,
    }
}

/// Create a verification session and an ephemeral key for it.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    _auth: Authorized<scope::IdentitySession>,
    body: String,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let CreateSessionRequest { account_id } = parse_json(&body)?;
    let stripe = stripe_client(&state)?;

    state.workflows.ensure_identity_unverified(&account_id).await?;

    let session = stripe.create_verification_session(&account_id).await?;
    let ephemeral_key = stripe.create_ephemeral_key(&session.id).await?;
    let client_secret = session.client_secret.clone().ok_or_else(|| {
        ApiError::ExternalService("verification session has no client secret".into())
    })?;

    state
        .workflows
        .record_identity(&account_id, &session_doc(&session, session.status))
        .await?;

    Ok(Json(CreateSessionResponse {
        verification_session_id: session.id,
        client_secret,
        ephemeral_key_secret: ephemeral_key.secret,
    }))
}

/// Handle Stripe Identity webhooks.
pub async fn stripe_identity_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<&'static str, ApiError> {
    let stripe = stripe_client(&state)?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;

    stripe
        .verify_webhook_signature(&body, signature, Utc::now().timestamp())
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected Stripe webhook");
            e
        })?;

    let event: StripeEvent = parse_json(&body)?;

    let status = match event.event_type.as_str() {
        "identity.verification_session.verified" => IdentityStatus::Verified,
        "identity.verification_session.processing" => IdentityStatus::Processing,
        "identity.verification_session.requires_input" => IdentityStatus::RequiresInput,
        "identity.verification_session.canceled" => IdentityStatus::Canceled,
        other => {
            tracing::debug!(event_id = %event.id, event_type = %other, "Ignoring Stripe event");
            return Ok(OK);
        }
    };

    let session: VerificationSession = serde_json::from_value(event.data.object)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let account_id = session
        .account_id()
        .ok_or_else(|| ApiError::Validation("session has no accountId metadata".into()))
        .and_then(|id| {
            AccountId::new(id).map_err(|e| ApiError::Validation(e.to_string()))
        })?;

    tracing::info!(
        event_id = %event.id,
        session_id = %session.id,
        account_id = %account_id,
        status = ?status,
        "Stripe identity event"
    );

    let doc = if status == IdentityStatus::Verified {
        let verified = stripe.retrieve_verification_session(&session.id).await?;
        let outputs = verified.verified_outputs.clone().unwrap_or_default();
        IdentityDoc {
            first_name: outputs.first_name,
            last_name: outputs.last_name,
            date_of_birth: outputs.dob.and_then(|dob| dob.formatted()),
            id_number: outputs.id_number,
            ..session_doc(&verified, IdentityStatus::Verified)
        }
    } else {
        session_doc(&session, status)
    };

    state.workflows.record_identity(&account_id, &doc).await?;
    Ok(OK)
}
