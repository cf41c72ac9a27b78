//! Balance ledger: signed increments on the balance document.

use purse_core::wallet::BALANCE_FIELD;
use purse_core::{AccountId, ProductAmount};
use purse_store::{paths, DocumentStore, FieldUpdate, Result, StoreError};

/// Applies credits and debits to account balances.
///
/// Credits are positive and debits non-positive; a delta with the wrong sign is
/// rejected before touching the store.
#[derive(Clone, Copy)]
pub struct Ledger<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> Ledger<'a> {
    /// A ledger over `store`.
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Add a product's credits to the balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the increment fails.
    pub async fn credit(&self, account_id: &AccountId, amount: ProductAmount) -> Result<()> {
        self.apply(account_id, amount.credit_delta(), Direction::Credit)
            .await
    }

    /// Remove a product's credits from the balance. The balance may go negative.
    ///
    /// # Errors
    ///
    /// Returns an error if the increment fails.
    pub async fn debit(&self, account_id: &AccountId, amount: ProductAmount) -> Result<()> {
        self.apply(account_id, amount.refund_delta(), Direction::Debit)
            .await
    }

    async fn apply(&self, account_id: &AccountId, delta: i64, direction: Direction) -> Result<()> {
        let sign_ok = match direction {
            Direction::Credit => delta > 0,
            Direction::Debit => delta <= 0,
        };
        if !sign_ok {
            return Err(StoreError::InvalidUpdate {
                field: BALANCE_FIELD.to_string(),
                reason: format!("{direction:?} with delta {delta}"),
            });
        }

        self.store
            .update(
                &paths::balance(account_id),
                vec![(BALANCE_FIELD.to_string(), FieldUpdate::Increment(delta))],
            )
            .await?;

        tracing::debug!(account_id = %account_id, delta, "Balance updated");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Credit,
    Debit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use purse_core::Balance;
    use purse_store::{DocumentStoreExt, MemoryStore};

    #[tokio::test]
    async fn credit_then_debit_restores_balance() {
        let store = MemoryStore::new();
        let ledger = Ledger::new(&store);
        let account = AccountId::new("acct").unwrap();
        let amount = ProductAmount::parse("50_topup_v1").unwrap();

        ledger.credit(&account, amount).await.unwrap();
        let balance: Balance = store.get_as(&paths::balance(&account)).await.unwrap().unwrap();
        assert_eq!(balance.balance, 50);

        ledger.debit(&account, amount).await.unwrap();
        ledger.debit(&account, amount).await.unwrap();
        let balance: Balance = store.get_as(&paths::balance(&account)).await.unwrap().unwrap();
        assert_eq!(balance.balance, -50);
    }

    #[tokio::test]
    async fn wrong_sign_is_rejected() {
        let store = MemoryStore::new();
        let ledger = Ledger::new(&store);
        let account = AccountId::new("acct").unwrap();

        let err = ledger.apply(&account, 10, Direction::Debit).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidUpdate { .. }));
        assert!(store.is_empty().await);
    }
}
