//! Purse HTTP service.
//!
//! Webhook endpoints that keep wallet balances, subscription state and identity
//! verification in sync with the payment processor and the app-store
//! notification relay:
//!
//! - Top-up credits and refunds, applied exactly once per transaction
//! - Subscription lifecycle (initial purchase, renewal, expiration) with the
//!   derived collectible quota
//! - Stripe Identity sessions and webhooks
//! - A relay that classifies store notifications and dispatches them
//!
//! # Authentication
//!
//! Each endpoint compares the `Authorization` header against its own static
//! secret. Stripe webhooks are authenticated by their signature instead.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Health handler has nothing to await

pub mod auth;
pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;
pub mod workflows;

pub use config::{EndpointSecrets, ServiceConfig};
pub use dispatch::{HttpDispatcher, LocalDispatcher, SagaDispatcher};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
pub use workflows::Workflows;
