//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, identity, notifications, payments, subscriptions};
use crate::state::AppState;

/// Maximum concurrent requests for the saga endpoints.
///
/// Sagas are sequences of store writes; bounding them bounds the window in which
/// concurrent events for one account can interleave.
const SAGA_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Sagas (per-endpoint secret, concurrency-limited)
/// - `POST /notifications` - Notification relay
/// - `POST /payments/success` - Credit a top-up
/// - `POST /payments/refund` - Refund a top-up or cancel a subscription
/// - `POST /subscriptions/initial-purchase` - Start a subscription
/// - `POST /subscriptions/renewal` - Renew a subscription
/// - `POST /subscriptions/expiration` - Expire a subscription
///
/// ## Stripe proxies (per-endpoint secret)
/// - `POST /payments/intents` - Create a payment intent
/// - `POST /identity/verification-sessions` - Start identity verification
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/stripe/identity` - Stripe Identity webhooks
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let saga_routes = Router::new()
        .route("/notifications", post(notifications::relay))
        .route("/payments/success", post(payments::payment_success))
        .route("/payments/refund", post(payments::refund))
        .route(
            "/subscriptions/initial-purchase",
            post(subscriptions::initial_purchase),
        )
        .route("/subscriptions/renewal", post(subscriptions::renewal))
        .route("/subscriptions/expiration", post(subscriptions::expiration))
        .layer(ConcurrencyLimitLayer::new(SAGA_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .merge(saga_routes)
        .route("/payments/intents", post(payments::create_payment_intent))
        .route(
            "/identity/verification-sessions",
            post(identity::create_session),
        )
        // Webhooks (no rate limit - controlled by Stripe)
        .route(
            "/webhooks/stripe/identity",
            post(identity::stripe_identity_webhook),
        )
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
