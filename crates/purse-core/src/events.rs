//! Request bodies accepted by the wallet and subscription endpoints.
//!
//! These are the payloads the notification relay fans out to the saga endpoints,
//! shared between the service and `purse-client`.

use serde::{Deserialize, Serialize};

use crate::error::{PurseError, Result};
use crate::ids::{AccountId, ProductId, TransactionId};

/// Store environment a purchase was made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Environment {
    /// Sandbox / test purchases.
    Sandbox,
    /// Real purchases.
    Production,
}

impl Environment {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "SANDBOX",
            Self::Production => "PRODUCTION",
        }
    }
}

/// Why a subscription was cancelled, as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    /// Cancelled or refunded through store customer support.
    CustomerSupport,
    /// The user turned off auto-renewal.
    Unsubscribe,
    /// Renewal payment failed.
    BillingError,
    /// Cancelled by the developer.
    DeveloperInitiated,
    /// The user declined a price increase.
    PriceIncrease,
    /// Any reason this service does not know about.
    #[serde(other)]
    Unknown,
}

/// A successful one-off (top-up) purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSuccess {
    /// Account to credit.
    pub account_id: AccountId,
    /// Store transaction id; the idempotency key within the account.
    pub transaction_id: TransactionId,
    /// Purchased product; encodes the credit amount.
    pub product_id: ProductId,
    /// Price in USD.
    pub price: f64,
    /// Price in the currency the user paid in.
    pub price_in_purchased_currency: f64,
    /// ISO currency code the user paid in.
    pub currency: String,
    /// Store environment.
    pub environment: Environment,
    /// Purchase time in milliseconds since the epoch.
    pub purchased_at_ms: i64,
}

impl PaymentSuccess {
    /// Check field values serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::InvalidField`] for an empty currency or a non-finite price.
    pub fn validate(&self) -> Result<()> {
        validate_money(self.price, self.price_in_purchased_currency, &self.currency)
    }
}

/// A refund or cancellation of a previous purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundNotice {
    /// Account the original purchase belongs to.
    pub account_id: AccountId,
    /// Transaction id of the original purchase.
    pub transaction_id: TransactionId,
    /// Product of the original purchase.
    pub product_id: ProductId,
    /// Store environment.
    pub environment: Environment,
    /// Present when the cancelled purchase is a subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_at_ms: Option<i64>,
    /// Why the store cancelled the purchase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<CancelReason>,
}

/// A subscription lifecycle event (initial purchase, renewal or expiration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionNotice {
    /// Subscribing account.
    pub account_id: AccountId,
    /// Store transaction id of this period.
    pub transaction_id: TransactionId,
    /// Subscribed product; selects the plan.
    pub product_id: ProductId,
    /// Store period type (`NORMAL`, `TRIAL`, `INTRO`, ...).
    pub period_type: String,
    /// Purchase time in milliseconds since the epoch.
    pub purchased_at_ms: i64,
    /// Period end in milliseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_at_ms: Option<i64>,
    /// Store the subscription was bought in (`APP_STORE`, `PLAY_STORE`, ...).
    pub store: String,
    /// Store environment.
    pub environment: Environment,
    /// Storefront country code.
    pub country_code: String,
    /// Redeemed offer code, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_code: Option<String>,
    /// Processor customer id, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Price in USD.
    pub price: f64,
    /// Price in the currency the user paid in.
    pub price_in_purchased_currency: f64,
    /// ISO currency code the user paid in.
    pub currency: String,
}

impl SubscriptionNotice {
    /// Check field values serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::InvalidField`] for empty store metadata, an empty
    /// currency or a non-finite price.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("periodType", &self.period_type), ("store", &self.store)] {
            if value.trim().is_empty() {
                return Err(PurseError::InvalidField {
                    field,
                    reason: "must not be empty".into(),
                });
            }
        }
        validate_money(self.price, self.price_in_purchased_currency, &self.currency)
    }
}

fn validate_money(price: f64, price_in_purchased_currency: f64, currency: &str) -> Result<()> {
    if !price.is_finite() {
        return Err(PurseError::InvalidField {
            field: "price",
            reason: "must be a finite number".into(),
        });
    }
    if !price_in_purchased_currency.is_finite() {
        return Err(PurseError::InvalidField {
            field: "priceInPurchasedCurrency",
            reason: "must be a finite number".into(),
        });
    }
    if currency.trim().is_empty() {
        return Err(PurseError::InvalidField {
            field: "currency",
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}
