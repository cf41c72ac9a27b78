//! Top-up payment handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use purse_core::{AccountId, PaymentSuccess, ProductAmount, ProductId, RefundNotice};

use super::{parse_json, OK};
use crate::auth::{scope, Authorized};
use crate::error::ApiError;
use crate::state::AppState;

/// Credit a successful top-up purchase.
pub async fn payment_success(
    State(state): State<Arc<AppState>>,
    _auth: Authorized<scope::PaymentSuccess>,
    body: String,
) -> Result<&'static str, ApiError> {
    let payment: PaymentSuccess = parse_json(&body)?;
    state.workflows.top_up(&payment).await?;
    Ok(OK)
}

/// Refund a top-up, or handle a subscription cancellation.
pub async fn refund(
    State(state): State<Arc<AppState>>,
    _auth: Authorized<scope::Refund>,
    body: String,
) -> Result<&'static str, ApiError> {
    let notice: RefundNotice = parse_json(&body)?;
    state.workflows.refund(&notice).await?;
    Ok(OK)
}

/// Request to create a payment intent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    /// Purchasing account.
    pub account_id: AccountId,
    /// Top-up product being bought.
    pub product_id: ProductId,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
}

/// Created payment intent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    /// Stripe payment intent ID.
    pub payment_intent_id: String,
    /// Secret the client confirms the payment with.
    pub client_secret: String,
}

/// Create a Stripe payment intent for a top-up product.
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    _auth: Authorized<scope::PaymentIntent>,
    body: String,
) -> Result<Json<CreatePaymentIntentResponse>, ApiError> {
    let request: CreatePaymentIntentRequest = parse_json(&body)?;

    ProductAmount::parse(request.product_id.as_str())?;
    if request.amount <= 0 {
        return Err(ApiError::Validation("amount must be positive".into()));
    }
    if request.currency.trim().is_empty() {
        return Err(ApiError::Validation("currency must not be empty".into()));
    }

    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::Internal("Stripe not configured".into()))?;

    let intent = stripe
        .create_payment_intent(
            request.amount,
            &request.currency,
            &request.account_id,
            &request.product_id,
        )
        .await?;

    let client_secret = intent
        .client_secret
        .ok_or_else(|| ApiError::ExternalService("payment intent has no client secret".into()))?;

    tracing::info!(
        account_id = %request.account_id,
        product_id = %request.product_id,
        payment_intent_id = %intent.id,
        "Payment intent created"
    );

    Ok(Json(CreatePaymentIntentResponse {
        payment_intent_id: intent.id,
        client_secret,
    }))
}
