//! Stripe integration.
//!
//! Stripe handles:
//! - Identity verification sessions and their ephemeral keys
//! - Payment intents for top-up purchases
//! - Webhook signature verification

pub mod client;
pub mod types;

pub use client::StripeClient;
pub use client::StripeError;
pub use types::*;
