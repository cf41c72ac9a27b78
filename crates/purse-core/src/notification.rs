//! Purchase notifications posted by the subscription-notification relay.
//!
//! The relay posts `{ "event": { ... } }` with snake_case fields. Which fields are
//! present depends on the event type, so everything is optional here and the
//! `to_*` conversions enforce what each saga needs.

use serde::Deserialize;

use crate::error::{PurseError, Result};
use crate::events::{CancelReason, Environment, PaymentSuccess, RefundNotice, SubscriptionNotice};
use crate::ids::{AccountId, ProductId, TransactionId};

/// Notification event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// One-off (top-up) purchase.
    NonRenewingPurchase,
    /// Refund or subscription cancellation.
    Cancellation,
    /// First purchase of a subscription.
    InitialPurchase,
    /// Subscription renewed for a new period.
    Renewal,
    /// Subscription ran out.
    Expiration,
    /// Test notification from the relay dashboard.
    Test,
    /// Any other event type.
    #[serde(other)]
    Unknown,
}

/// Envelope posted to the relay endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    /// The event.
    pub event: StoreEvent,
}

/// A store event as delivered by the relay.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct StoreEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<NotificationType>,
    #[serde(default)]
    pub app_user_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub environment: Option<Environment>,
    #[serde(default)]
    pub purchased_at_ms: Option<i64>,
    #[serde(default)]
    pub expiration_at_ms: Option<i64>,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub period_type: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub offer_code: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_in_purchased_currency: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub cancel_reason: Option<CancelReason>,
}

fn required<T: Clone>(value: &Option<T>, field: &'static str) -> Result<T> {
    value.clone().ok_or(PurseError::MissingField(field))
}

impl StoreEvent {
    fn account_id(&self) -> Result<AccountId> {
        Ok(AccountId::new(required(&self.app_user_id, "app_user_id")?)?)
    }

    fn transaction_id(&self) -> Result<TransactionId> {
        Ok(TransactionId::new(required(
            &self.transaction_id,
            "transaction_id",
        )?)?)
    }

    fn product_id(&self) -> Result<ProductId> {
        Ok(ProductId::new(required(&self.product_id, "product_id")?)?)
    }

    /// Body for the top-up endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if a field the top-up saga needs is missing or invalid.
    pub fn to_payment_success(&self) -> Result<PaymentSuccess> {
        Ok(PaymentSuccess {
            account_id: self.account_id()?,
            transaction_id: self.transaction_id()?,
            product_id: self.product_id()?,
            price: required(&self.price, "price")?,
            price_in_purchased_currency: required(
                &self.price_in_purchased_currency,
                "price_in_purchased_currency",
            )?,
            currency: required(&self.currency, "currency")?,
            environment: required(&self.environment, "environment")?,
            purchased_at_ms: required(&self.purchased_at_ms, "purchased_at_ms")?,
        })
    }

    /// Body for the refund endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if a field the refund saga needs is missing or invalid.
    pub fn to_refund_notice(&self) -> Result<RefundNotice> {
        Ok(RefundNotice {
            account_id: self.account_id()?,
            transaction_id: self.transaction_id()?,
            product_id: self.product_id()?,
            environment: required(&self.environment, "environment")?,
            expiration_at_ms: self.expiration_at_ms,
            cancel_reason: self.cancel_reason,
        })
    }

    /// Body for the subscription endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if a field the subscription sagas need is missing or invalid.
    pub fn to_subscription_notice(&self) -> Result<SubscriptionNotice> {
        Ok(SubscriptionNotice {
            account_id: self.account_id()?,
            transaction_id: self.transaction_id()?,
            product_id: self.product_id()?,
            period_type: required(&self.period_type, "period_type")?,
            purchased_at_ms: required(&self.purchased_at_ms, "purchased_at_ms")?,
            expiration_at_ms: self.expiration_at_ms,
            store: required(&self.store, "store")?,
            environment: required(&self.environment, "environment")?,
            country_code: required(&self.country_code, "country_code")?,
            offer_code: self.offer_code.clone(),
            customer_id: None,
            price: required(&self.price, "price")?,
            price_in_purchased_currency: required(
                &self.price_in_purchased_currency,
                "price_in_purchased_currency",
            )?,
            currency: required(&self.currency, "currency")?,
        })
    }
}
