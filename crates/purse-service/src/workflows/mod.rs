//! Wallet and subscription workflows.
//!
//! Each workflow validates its event, checks the state it depends on, and then runs
//! its mutations as a [`purse_core::Saga`] so a failed later step undoes the earlier
//! ones. Workflows are shared by the HTTP handlers and the in-process relay
//! dispatcher.

pub mod guard;
mod identity;
pub mod ledger;
mod refund;
mod subscriptions;
mod topup;

use std::sync::Arc;

use chrono::Utc;
use purse_core::{AccountId, ReconciliationRecord, SagaFailure, TransactionId};
use purse_store::{paths, DocumentStore, DocumentStoreExt, StoreError};

use crate::error::ApiError;

/// Entry points for the balance and subscription sagas.
#[derive(Clone)]
pub struct Workflows {
    store: Arc<dyn DocumentStore>,
    free_collectible_limit: u32,
}

impl Workflows {
    /// Create workflows over a store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, free_collectible_limit: u32) -> Self {
        Self {
            store,
            free_collectible_limit,
        }
    }

    /// Turn a saga failure into the response error, recording a reconciliation
    /// document when the rollback itself was incomplete.
    async fn fail(
        &self,
        failure: SagaFailure<StoreError>,
        account_id: &AccountId,
        transaction_id: &TransactionId,
    ) -> ApiError {
        if !failure.is_rolled_back() {
            let record = ReconciliationRecord::from_failure(&failure, account_id, transaction_id);
            let path = paths::reconciliation(&record.id);
            match self.store.set_as(&path, &record).await {
                Ok(()) => tracing::error!(
                    saga = failure.saga,
                    account_id = %account_id,
                    transaction_id = %transaction_id,
                    record = %path,
                    "Saga left partial state - manual repair required, reconciliation record written"
                ),
                Err(e) => tracing::error!(
                    saga = failure.saga,
                    account_id = %account_id,
                    transaction_id = %transaction_id,
                    error = %e,
                    "Failed to write reconciliation record - manual repair required"
                ),
            }
        }

        ApiError::Internal(failure.to_string())
    }
}

/// Current time in milliseconds since the epoch.
fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
