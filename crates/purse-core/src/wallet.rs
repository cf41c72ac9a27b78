//! Wallet documents: the balance and the top-up payment intents that fund it.

use serde::{Deserialize, Serialize};

use crate::events::PaymentSuccess;
use crate::ids::{ProductId, TransactionId};

/// Field holding the balance in the balance document.
pub const BALANCE_FIELD: &str = "balance";

/// Field flipped when a top-up intent is refunded.
pub const REFUNDED_FIELD: &str = "refunded";

/// Per-account balance document. Only ever changed by atomic increments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Balance in credits.
    pub balance: i64,
}

/// Record of a processed top-up purchase.
///
/// Its existence is the source of truth for "this transaction was credited".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpIntent {
    /// Store transaction id.
    pub transaction_id: TransactionId,
    /// Purchased product.
    pub product_id: ProductId,
    /// Price in USD.
    pub price: f64,
    /// Price in the purchase currency.
    pub price_in_purchased_currency: f64,
    /// Purchase currency.
    pub currency: String,
    /// When the intent was recorded, in milliseconds since the epoch.
    pub ts: i64,
    /// Whether the payment succeeded.
    pub success: bool,
    /// Whether the purchase has been refunded.
    pub refunded: bool,
}

impl TopUpIntent {
    /// A successful, unrefunded intent for `payment`.
    #[must_use]
    pub fn succeeded(payment: &PaymentSuccess, ts: i64) -> Self {
        Self {
            transaction_id: payment.transaction_id.clone(),
            product_id: payment.product_id.clone(),
            price: payment.price,
            price_in_purchased_currency: payment.price_in_purchased_currency,
            currency: payment.currency.clone(),
            ts,
            success: true,
            refunded: false,
        }
    }

    /// Whether a refund for `product_id` may be applied to this intent.
    #[must_use]
    pub fn is_refundable_for(&self, product_id: &ProductId) -> bool {
        self.success && !self.refunded && &self.product_id == product_id
    }
}
