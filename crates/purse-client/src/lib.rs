//! Purse internal client.
//!
//! The notification relay uses this crate to call the saga endpoints of a purse
//! deployment over HTTP, each with its own endpoint secret.
//!
//! # Example
//!
//! ```no_run
//! use purse_client::{InternalSecrets, PurseClient};
//! use purse_core::PaymentSuccess;
//!
//! # async fn example(event: PaymentSuccess) -> Result<(), purse_client::ClientError> {
//! let secrets = InternalSecrets {
//!     payment_success: "secret-a".into(),
//!     ..InternalSecrets::default()
//! };
//! let client = PurseClient::new("http://purse.internal:8080", secrets)?;
//!
//! client.payment_success(&event).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod client;
mod error;

pub use client::{ClientOptions, InternalSecrets, PurseClient};
pub use error::ClientError;
