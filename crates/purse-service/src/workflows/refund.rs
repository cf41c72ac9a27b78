//! Refund saga: retract a credited top-up, or route a subscription cancellation.

use serde_json::Value;

use purse_core::wallet::REFUNDED_FIELD;
use purse_core::{
    cancellation_action, CancellationAction, ProductAmount, RefundNotice, Saga, TopUpIntent,
};
use purse_store::{paths, DocumentStoreExt, FieldUpdate, StoreError};

use super::ledger::Ledger;
use super::Workflows;
use crate::error::ApiError;

impl Workflows {
    /// Refund a top-up, or handle a subscription cancellation.
    ///
    /// A notice carrying an expiration timestamp cancels a subscription: the
    /// cancellation policy decides whether it expires now or waits for the store's
    /// own expiration event. Otherwise the original intent must be successful,
    /// unrefunded and for the same product; it is marked refunded and the amount
    /// debited, and the mark is reset if the debit fails.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] for a product without an amount
    /// - [`ApiError::Conflict`] when there is no refundable intent
    /// - [`ApiError::Internal`] when a store write fails
    pub async fn refund(&self, notice: &RefundNotice) -> Result<(), ApiError> {
        let account_id = &notice.account_id;
        let transaction_id = &notice.transaction_id;

        if notice.expiration_at_ms.is_some() {
            return match cancellation_action(notice.cancel_reason) {
                CancellationAction::ExpireNow => {
                    tracing::info!(
                        account_id = %account_id,
                        transaction_id = %transaction_id,
                        cancel_reason = ?notice.cancel_reason,
                        "Subscription cancellation expires immediately"
                    );
                    self.expire_active(account_id, transaction_id).await
                }
                CancellationAction::AwaitExpiration => {
                    tracing::info!(
                        account_id = %account_id,
                        transaction_id = %transaction_id,
                        cancel_reason = ?notice.cancel_reason,
                        "Subscription cancellation noted, awaiting expiration"
                    );
                    Ok(())
                }
            };
        }

        let amount = ProductAmount::parse(notice.product_id.as_str())?;
        let store = self.store.as_ref();
        let intent_path = paths::top_up_intent(account_id, transaction_id);

        let intent: TopUpIntent = store.get_as(&intent_path).await?.ok_or_else(|| {
            ApiError::Conflict(format!("no top-up intent for transaction {transaction_id}"))
        })?;

        if !intent.is_refundable_for(&notice.product_id) {
            tracing::info!(
                account_id = %account_id,
                transaction_id = %transaction_id,
                success = intent.success,
                refunded = intent.refunded,
                intent_product = %intent.product_id,
                "Refund rejected"
            );
            return Err(ApiError::Conflict(format!(
                "transaction {transaction_id} is not refundable"
            )));
        }

        let ledger = Ledger::new(store);
        let set_refunded = |refunded: bool| {
            vec![(
                REFUNDED_FIELD.to_string(),
                FieldUpdate::Set(Value::Bool(refunded)),
            )]
        };

        let result = Saga::<StoreError>::new("refund")
            .step_with_compensation(
                "mark_refunded",
                || store.update(&intent_path, set_refunded(true)),
                || store.update(&intent_path, set_refunded(false)),
            )
            .step("debit_balance", || ledger.debit(account_id, amount))
            .run()
            .await;

        if let Err(failure) = result {
            return Err(self.fail(failure, account_id, transaction_id).await);
        }

        tracing::info!(
            account_id = %account_id,
            transaction_id = %transaction_id,
            product_id = %notice.product_id,
            credits = amount.get(),
            "Top-up refunded"
        );
        Ok(())
    }
}
