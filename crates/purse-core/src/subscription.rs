//! Subscription documents, plans, and the collectible usage quota derived from them.

use serde::{Deserialize, Serialize};

use crate::events::{Environment, SubscriptionNotice};
use crate::ids::{ProductId, TransactionId};

// ============================================================================
// Constants
// ============================================================================

/// Field queried to find the active subscription.
pub const IS_ACTIVE_FIELD: &str = "isActive";

/// Plan id written to the usage document when no subscription is active.
pub const FREE_PLAN_ID: &str = "free";

/// Collectible limit of the free tier unless configured otherwise.
pub const DEFAULT_FREE_COLLECTIBLE_LIMIT: u32 = 5;

/// A subscription period record. At most one per account has `is_active` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Whether this is the account's current subscription.
    pub is_active: bool,
    /// Subscribed product.
    pub product_id: ProductId,
    /// Store period type.
    pub period_type: String,
    /// Purchase time in milliseconds since the epoch.
    pub purchased_ts: i64,
    /// Period end in milliseconds since the epoch.
    #[serde(default)]
    pub expiration_ts: Option<i64>,
    /// Store the subscription was bought in.
    pub store: String,
    /// Store environment.
    pub environment: Environment,
    /// Storefront country code.
    pub country_code: String,
    /// Redeemed offer code.
    #[serde(default)]
    pub offer_code: Option<String>,
    /// Processor customer id.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Store transaction id of this period.
    pub transaction_id: TransactionId,
    /// When the document was written, in milliseconds since the epoch.
    pub ts: i64,
    /// Price in USD.
    pub price: f64,
    /// Price in the purchase currency.
    pub price_in_purchased_currency: f64,
    /// Purchase currency.
    pub currency: String,
}

impl Subscription {
    /// An active subscription document for `notice`.
    #[must_use]
    pub fn active_from(notice: &SubscriptionNotice, ts: i64) -> Self {
        Self {
            is_active: true,
            product_id: notice.product_id.clone(),
            period_type: notice.period_type.clone(),
            purchased_ts: notice.purchased_at_ms,
            expiration_ts: notice.expiration_at_ms,
            store: notice.store.clone(),
            environment: notice.environment,
            country_code: notice.country_code.clone(),
            offer_code: notice.offer_code.clone(),
            customer_id: notice.customer_id.clone(),
            transaction_id: notice.transaction_id.clone(),
            ts,
            price: notice.price,
            price_in_purchased_currency: notice.price_in_purchased_currency,
            currency: notice.currency.clone(),
        }
    }
}

/// Per-account collectible quota, derived from the active subscription's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectibleUsage {
    /// Number of collectibles allowed.
    pub limit: u32,
    /// Number of collectibles used in the current period.
    pub used: u32,
    /// Plan the limit came from (`free` when unsubscribed).
    pub plan_id: String,
    /// Path of the subscription document backing this quota, empty on the free tier.
    pub subscription_doc_path: String,
}

impl CollectibleUsage {
    /// Fresh usage for a paid plan.
    #[must_use]
    pub fn for_plan(limit: u32, plan_id: &ProductId, subscription_doc_path: impl Into<String>) -> Self {
        Self {
            limit,
            used: 0,
            plan_id: plan_id.to_string(),
            subscription_doc_path: subscription_doc_path.into(),
        }
    }

    /// Fresh usage on the free tier.
    #[must_use]
    pub fn free(limit: u32) -> Self {
        Self {
            limit,
            used: 0,
            plan_id: FREE_PLAN_ID.to_string(),
            subscription_doc_path: String::new(),
        }
    }
}

/// Collectible tier flags of a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectibleTiers {
    /// Up to five collectibles.
    #[serde(rename = "upToFive", default)]
    pub up_to_five: bool,
    /// Up to ten collectibles.
    #[serde(rename = "upToTen", default)]
    pub up_to_ten: bool,
    /// Up to fifty collectibles (stored under its historical misspelling).
    #[serde(rename = "upToFifthy", default)]
    pub up_to_fifty: bool,
    /// Up to a hundred collectibles.
    #[serde(rename = "upToHundred", default)]
    pub up_to_hundred: bool,
}

impl CollectibleTiers {
    /// The limit of the richest tier set, if any.
    ///
    /// Tiers are checked in ascending order and the last one set wins.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        [
            (self.up_to_five, 5),
            (self.up_to_ten, 10),
            (self.up_to_fifty, 50),
            (self.up_to_hundred, 100),
        ]
        .into_iter()
        .filter_map(|(set, limit)| set.then_some(limit))
        .last()
    }
}

/// Plan reference data, one document per store product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Store product id this plan describes.
    pub store_product_id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Collectible tier flags.
    #[serde(default)]
    pub collectible: CollectibleTiers,
    /// Stock entitlements; opaque to this service.
    #[serde(default)]
    pub stock: serde_json::Value,
    /// Support entitlements; opaque to this service.
    #[serde(default)]
    pub support: serde_json::Value,
    /// Display prices; opaque to this service.
    #[serde(default)]
    pub price: serde_json::Value,
}

impl Plan {
    /// Collectible limit granted by this plan.
    #[must_use]
    pub fn collectible_limit(&self) -> Option<u32> {
        self.collectible.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn richest_tier_wins() {
        let tiers = CollectibleTiers {
            up_to_five: true,
            up_to_ten: false,
            up_to_fifty: true,
            up_to_hundred: false,
        };
        assert_eq!(tiers.limit(), Some(50));

        let all = CollectibleTiers {
            up_to_five: true,
            up_to_ten: true,
            up_to_fifty: true,
            up_to_hundred: true,
        };
        assert_eq!(all.limit(), Some(100));
    }

    #[test]
    fn no_tier_has_no_limit() {
        assert_eq!(CollectibleTiers::default().limit(), None);
    }

    #[test]
    fn plan_reads_stored_field_names() {
        let plan: Plan = serde_json::from_value(json!({
            "storeProductId": "premium_monthly",
            "title": "Premium",
            "collectible": { "upToFive": true, "upToTen": true, "upToFifthy": false },
            "stock": { "unlimited": true }
        }))
        .unwrap();
        assert_eq!(plan.collectible_limit(), Some(10));
        assert_eq!(plan.support, serde_json::Value::Null);
    }

    #[test]
    fn free_usage_has_no_subscription() {
        let usage = CollectibleUsage::free(DEFAULT_FREE_COLLECTIBLE_LIMIT);
        assert_eq!(usage.plan_id, FREE_PLAN_ID);
        assert_eq!(usage.used, 0);
        assert!(usage.subscription_doc_path.is_empty());
    }
}
