//! Idempotency guard for top-up transactions.

use purse_core::{AccountId, TransactionId};
use purse_store::{paths, DocumentStore, Result};

/// Whether `transaction_id` has not yet been processed for `account_id`.
///
/// A transaction is processed once its top-up intent document exists, so a
/// duplicate delivery is a permanent rejection rather than a transient error.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub async fn is_unprocessed(
    store: &dyn DocumentStore,
    account_id: &AccountId,
    transaction_id: &TransactionId,
) -> Result<bool> {
    let intent = store
        .get(&paths::top_up_intent(account_id, transaction_id))
        .await?;
    Ok(intent.is_none())
}
