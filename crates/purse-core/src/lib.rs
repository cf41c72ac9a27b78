//! Core types and utilities for purse.
//!
//! This crate provides the foundational types used throughout the purse service:
//!
//! - **Identifiers**: `AccountId`, `TransactionId`, `ProductId`, `ReconciliationId`
//! - **Wallet**: `Balance`, `TopUpIntent`, `ProductAmount`
//! - **Subscriptions**: `Subscription`, `CollectibleUsage`, `Plan`
//! - **Identity**: `IdentityDoc`, `IdentityStatus`
//! - **Events**: endpoint bodies and relay notifications
//! - **Sagas**: ordered mutation with compensation, and reconciliation records
//!
//! # Credits
//!
//! Top-up products encode their credit amount in the product id: `50_topup_v1`
//! credits 50 and its refund debits 50. Balances are integer credits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod events;
pub mod identity;
pub mod ids;
pub mod notification;
pub mod policy;
pub mod product;
pub mod reconciliation;
pub mod saga;
pub mod subscription;
pub mod wallet;

pub use error::{PurseError, Result};
pub use events::{CancelReason, Environment, PaymentSuccess, RefundNotice, SubscriptionNotice};
pub use identity::{IdentityDoc, IdentityStatus};
pub use ids::{AccountId, IdError, ProductId, ReconciliationId, TransactionId};
pub use notification::{NotificationEnvelope, NotificationType, StoreEvent};
pub use policy::{cancellation_action, CancellationAction, CANCELLATION_POLICY};
pub use product::ProductAmount;
pub use reconciliation::ReconciliationRecord;
pub use saga::{CompensationFailure, Saga, SagaFailure};
pub use subscription::{
    CollectibleTiers, CollectibleUsage, Plan, Subscription, DEFAULT_FREE_COLLECTIBLE_LIMIT,
    FREE_PLAN_ID,
};
pub use wallet::{Balance, TopUpIntent};
