//! Document path layout.
//!
//! Every per-account document lives under `users/{account}`. Paths alternate
//! collection and document segments, so a document path always has an even
//! number of segments and its parent is a collection.

use std::fmt;

use purse_core::{AccountId, ProductId, ReconciliationId, TransactionId};

/// Root collection of per-account documents.
pub const USERS: &str = "users";

/// Collection of plan reference documents.
pub const PLANS: &str = "plans";

/// Collection of reconciliation records.
pub const RECONCILIATION: &str = "reconciliation";

/// Path of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// A top-level collection.
    #[must_use]
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    /// The document `id` inside this collection.
    #[must_use]
    pub fn doc(&self, id: &str) -> DocPath {
        DocPath(format!("{}/{id}", self.0))
    }

    /// The path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl DocPath {
    /// The sub-collection `name` under this document.
    #[must_use]
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{name}", self.0))
    }

    /// The collection containing this document.
    #[must_use]
    pub fn parent(&self) -> CollectionPath {
        let (parent, _) = self.0.rsplit_once('/').unwrap_or(("", &self.0));
        CollectionPath(parent.to_string())
    }

    /// The document id (last segment).
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `users/{account}`.
#[must_use]
pub fn account(account: &AccountId) -> DocPath {
    CollectionPath::root(USERS).doc(account.as_str())
}

/// `users/{account}/wallet/balance`.
#[must_use]
pub fn balance(account_id: &AccountId) -> DocPath {
    account(account_id).collection("wallet").doc("balance")
}

/// `users/{account}/topUpPaymentIntents`.
#[must_use]
pub fn top_up_intents(account_id: &AccountId) -> CollectionPath {
    account(account_id).collection("topUpPaymentIntents")
}

/// `users/{account}/topUpPaymentIntents/{transaction}` - the idempotency key.
#[must_use]
pub fn top_up_intent(account_id: &AccountId, transaction_id: &TransactionId) -> DocPath {
    top_up_intents(account_id).doc(transaction_id.as_str())
}

/// `users/{account}/subscriptions`.
#[must_use]
pub fn subscriptions(account_id: &AccountId) -> CollectionPath {
    account(account_id).collection("subscriptions")
}

/// `users/{account}/subscriptions/{transaction}`.
#[must_use]
pub fn subscription(account_id: &AccountId, transaction_id: &TransactionId) -> DocPath {
    subscriptions(account_id).doc(transaction_id.as_str())
}

/// `users/{account}/usage/collectible`.
#[must_use]
pub fn collectible_usage(account_id: &AccountId) -> DocPath {
    account(account_id).collection("usage").doc("collectible")
}

/// `users/{account}/identity/verification`.
#[must_use]
pub fn identity(account_id: &AccountId) -> DocPath {
    account(account_id).collection("identity").doc("verification")
}

/// `plans/{product}`.
#[must_use]
pub fn plan(product_id: &ProductId) -> DocPath {
    CollectionPath::root(PLANS).doc(product_id.as_str())
}

/// `reconciliation/{id}`.
#[must_use]
pub fn reconciliation(id: &ReconciliationId) -> DocPath {
    CollectionPath::root(RECONCILIATION).doc(&id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct() -> AccountId {
        AccountId::new("acct-1").unwrap()
    }

    #[test]
    fn per_account_layout() {
        let tx = TransactionId::new("tx1").unwrap();
        assert_eq!(balance(&acct()).as_str(), "users/acct-1/wallet/balance");
        assert_eq!(
            top_up_intent(&acct(), &tx).as_str(),
            "users/acct-1/topUpPaymentIntents/tx1"
        );
        assert_eq!(
            subscription(&acct(), &tx).as_str(),
            "users/acct-1/subscriptions/tx1"
        );
        assert_eq!(
            collectible_usage(&acct()).as_str(),
            "users/acct-1/usage/collectible"
        );
    }

    #[test]
    fn parent_and_id() {
        let tx = TransactionId::new("tx9").unwrap();
        let path = subscription(&acct(), &tx);
        assert_eq!(path.id(), "tx9");
        assert_eq!(path.parent(), subscriptions(&acct()));
    }

    #[test]
    fn plan_path() {
        let product = ProductId::new("premium_monthly").unwrap();
        assert_eq!(plan(&product).as_str(), "plans/premium_monthly");
    }
}
