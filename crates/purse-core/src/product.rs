//! Credit amounts encoded in product identifiers.
//!
//! Top-up products carry their credit amount as the segment before the first `_`
//! (`50_topup_v1` is worth 50 credits). This is the only place that string is
//! interpreted.

use crate::error::{PurseError, Result};

/// A strictly positive credit amount parsed from a product id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProductAmount(u32);

impl ProductAmount {
    /// Parse the leading numeric token of `product_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PurseError::InvalidProduct`] when the leading token is empty,
    /// not a base-10 integer, out of range, or zero.
    pub fn parse(product_id: &str) -> Result<Self> {
        let token = product_id.split('_').next().unwrap_or_default();
        let invalid = |reason| PurseError::InvalidProduct {
            product_id: product_id.to_string(),
            reason,
        };

        if token.is_empty() {
            return Err(invalid("no leading amount token"));
        }
        if !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("leading token is not numeric"));
        }

        let amount: u32 = token.parse().map_err(|_| invalid("amount out of range"))?;
        if amount == 0 {
            return Err(invalid("amount is zero"));
        }

        Ok(Self(amount))
    }

    /// The amount in credits.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Balance delta applied when the product is purchased.
    #[must_use]
    pub fn credit_delta(self) -> i64 {
        i64::from(self.0)
    }

    /// Balance delta applied when the product is refunded.
    #[must_use]
    pub fn refund_delta(self) -> i64 {
        -i64::from(self.0)
    }
}
