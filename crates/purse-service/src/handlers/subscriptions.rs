//! Subscription lifecycle handlers.

use std::sync::Arc;

use axum::extract::State;

use purse_core::SubscriptionNotice;

use super::{parse_json, OK};
use crate::auth::{scope, Authorized};
use crate::error::ApiError;
use crate::state::AppState;

/// Start a subscription.
pub async fn initial_purchase(
    State(state): State<Arc<AppState>>,
    _auth: Authorized<scope::InitialPurchase>,
    body: String,
) -> Result<&'static str, ApiError> {
    let notice: SubscriptionNotice = parse_json(&body)?;
    state.workflows.initial_purchase(&notice).await?;
    Ok(OK)
}

/// Renew a subscription.
pub async fn renewal(
    State(state): State<Arc<AppState>>,
    _auth: Authorized<scope::Renewal>,
    body: String,
) -> Result<&'static str, ApiError> {
    let notice: SubscriptionNotice = parse_json(&body)?;
    state.workflows.renewal(&notice).await?;
    Ok(OK)
}

/// Expire the active subscription.
pub async fn expiration(
    State(state): State<Arc<AppState>>,
    _auth: Authorized<scope::Expiration>,
    body: String,
) -> Result<&'static str, ApiError> {
    let notice: SubscriptionNotice = parse_json(&body)?;
    state.workflows.expiration(&notice).await?;
    Ok(OK)
}
