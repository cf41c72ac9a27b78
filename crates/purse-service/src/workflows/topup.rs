//! Top-up saga: credit a successful one-off purchase exactly once.

use purse_core::{Environment, PaymentSuccess, ProductAmount, Saga, TopUpIntent};
use purse_store::{paths, to_document, StoreError};

use super::guard::is_unprocessed;
use super::ledger::Ledger;
use super::{now_ms, Workflows};
use crate::error::ApiError;

impl Workflows {
    /// Record the top-up intent and credit the product's amount.
    ///
    /// The intent document is the idempotency record: it is created before the
    /// credit and deleted again if the credit fails. Creation fails when the
    /// document exists, so concurrent deliveries that both pass the guard still
    /// credit once.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Forbidden`] for production purchases
    /// - [`ApiError::Validation`] for invalid fields or a product without an amount
    /// - [`ApiError::Conflict`] when the transaction was already processed
    /// - [`ApiError::Internal`] when a store write fails
    pub async fn top_up(&self, payment: &PaymentSuccess) -> Result<(), ApiError> {
        if payment.environment == Environment::Production {
            return Err(ApiError::Forbidden(
                "top-ups are only accepted from the sandbox environment".into(),
            ));
        }
        payment.validate()?;
        let amount = ProductAmount::parse(payment.product_id.as_str())?;

        let account_id = &payment.account_id;
        let transaction_id = &payment.transaction_id;
        let store = self.store.as_ref();

        if !is_unprocessed(store, account_id, transaction_id).await? {
            return Err(duplicate(payment));
        }

        let intent_path = paths::top_up_intent(account_id, transaction_id);
        let intent = to_document(&TopUpIntent::succeeded(payment, now_ms()))?;
        let ledger = Ledger::new(store);

        let result = Saga::<StoreError>::new("top_up")
            .step_with_compensation(
                "create_intent",
                || store.create(&intent_path, intent),
                || store.delete(&intent_path),
            )
            .step("credit_balance", || ledger.credit(account_id, amount))
            .run()
            .await;

        match result {
            Ok(()) => {}
            Err(failure) if matches!(failure.error, StoreError::AlreadyExists(_)) => {
                return Err(duplicate(payment));
            }
            Err(failure) => return Err(self.fail(failure, account_id, transaction_id).await),
        }

        tracing::info!(
            account_id = %account_id,
            transaction_id = %transaction_id,
            product_id = %payment.product_id,
            credits = amount.get(),
            "Top-up credited"
        );
        Ok(())
    }
}

fn duplicate(payment: &PaymentSuccess) -> ApiError {
    tracing::info!(
        account_id = %payment.account_id,
        transaction_id = %payment.transaction_id,
        "Duplicate top-up rejected"
    );
    ApiError::Conflict(format!(
        "transaction {} already processed",
        payment.transaction_id
    ))
}
