//! Notification relay.
//!
//! Receives purchase notifications from the subscription-notification relay,
//! classifies them by type and hands them to the matching saga. The saga's status
//! is passed back unchanged so the relay retries exactly when the saga failed
//! transiently.

use std::sync::Arc;

use axum::extract::State;

use purse_core::{NotificationEnvelope, NotificationType, PurseError};

use super::{parse_json, OK};
use crate::auth::{scope, Authorized};
use crate::error::ApiError;
use crate::state::AppState;

/// Classify a notification and dispatch it.
pub async fn relay(
    State(state): State<Arc<AppState>>,
    _auth: Authorized<scope::Relay>,
    body: String,
) -> Result<&'static str, ApiError> {
    let NotificationEnvelope { event } = parse_json(&body)?;
    let event_type = event.event_type.ok_or(PurseError::MissingField("type"))?;

    tracing::info!(
        event_id = ?event.id,
        event_type = ?event_type,
        app_user_id = ?event.app_user_id,
        transaction_id = ?event.transaction_id,
        "Notification received"
    );

    let dispatcher = state.dispatcher.as_ref();
    match event_type {
        NotificationType::NonRenewingPurchase => {
            dispatcher
                .payment_success(&event.to_payment_success()?)
                .await?;
        }
        NotificationType::Cancellation => {
            dispatcher.refund(&event.to_refund_notice()?).await?;
        }
        NotificationType::InitialPurchase => {
            dispatcher
                .initial_purchase(&event.to_subscription_notice()?)
                .await?;
        }
        NotificationType::Renewal => {
            dispatcher.renewal(&event.to_subscription_notice()?).await?;
        }
        NotificationType::Expiration => {
            dispatcher
                .expiration(&event.to_subscription_notice()?)
                .await?;
        }
        NotificationType::Test => {
            tracing::info!(event_id = ?event.id, "Test notification acknowledged");
        }
        NotificationType::Unknown => {
            tracing::info!(event_id = ?event.id, "Ignoring unhandled notification type");
        }
    }

    Ok(OK)
}
