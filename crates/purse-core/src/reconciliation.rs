//! Dead-letter records for sagas that could not be rolled back.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, ReconciliationId, TransactionId};
use crate::saga::SagaFailure;

/// A compensation that still has to be applied by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCompensation {
    /// Step whose effect is still in place.
    pub step: String,
    /// Why the compensation failed.
    pub error: String,
}

/// Everything an operator needs to repair an account after a double fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRecord {
    /// Record id.
    pub id: ReconciliationId,
    /// Saga that failed.
    pub workflow: String,
    /// Affected account.
    pub account_id: AccountId,
    /// Transaction that triggered the saga.
    pub transaction_id: TransactionId,
    /// Step that failed first.
    pub failed_step: String,
    /// Error of the failed step.
    pub error: String,
    /// Compensations that did not apply.
    pub compensation_failures: Vec<PendingCompensation>,
    /// When the failure happened.
    pub ts: DateTime<Utc>,
}

impl ReconciliationRecord {
    /// Build a record from a saga failure.
    #[must_use]
    pub fn from_failure<E: fmt::Display>(
        failure: &SagaFailure<E>,
        account_id: &AccountId,
        transaction_id: &TransactionId,
    ) -> Self {
        Self {
            id: ReconciliationId::generate(),
            workflow: failure.saga.to_string(),
            account_id: account_id.clone(),
            transaction_id: transaction_id.clone(),
            failed_step: failure.step.to_string(),
            error: failure.error.to_string(),
            compensation_failures: failure
                .compensation_failures
                .iter()
                .map(|f| PendingCompensation {
                    step: f.step.to_string(),
                    error: f.error.to_string(),
                })
                .collect(),
            ts: Utc::now(),
        }
    }
}
