//! Subscription state machine.
//!
//! Per account there is either no active subscription or exactly one. More than
//! one active document can only come from concurrent writers; it is detected
//! here and never repaired automatically.

use serde_json::Value;

use purse_core::subscription::IS_ACTIVE_FIELD;
use purse_core::{
    AccountId, CollectibleUsage, Plan, ProductId, Saga, Subscription, SubscriptionNotice,
    TransactionId,
};
use purse_store::{paths, to_document, DocPath, DocumentStoreExt, FieldUpdate, StoreError};

use super::{now_ms, Workflows};
use crate::error::ApiError;

fn set_active(active: bool) -> Vec<(String, FieldUpdate)> {
    vec![(
        IS_ACTIVE_FIELD.to_string(),
        FieldUpdate::Set(Value::Bool(active)),
    )]
}

impl Workflows {
    /// Start a subscription for an account without one.
    ///
    /// Writes the new active subscription, then the collectible usage for its
    /// plan. The new subscription is deactivated if the usage write fails.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] for invalid fields
    /// - [`ApiError::Conflict`] when the account already has an active subscription
    /// - [`ApiError::Internal`] for a missing plan or a failed store write
    pub async fn initial_purchase(&self, notice: &SubscriptionNotice) -> Result<(), ApiError> {
        notice.validate()?;
        let account_id = &notice.account_id;
        let transaction_id = &notice.transaction_id;

        let active = self.active_subscriptions(account_id).await?;
        if !active.is_empty() {
            tracing::info!(
                account_id = %account_id,
                transaction_id = %transaction_id,
                active = active.len(),
                "Initial purchase rejected, subscription already active"
            );
            return Err(ApiError::Conflict(
                "account already has an active subscription".into(),
            ));
        }

        let limit = self.plan_limit(&notice.product_id).await?;
        let store = self.store.as_ref();
        let new_path = paths::subscription(account_id, transaction_id);
        let new_doc = to_document(&Subscription::active_from(notice, now_ms()))?;
        let usage_path = paths::collectible_usage(account_id);
        let usage = to_document(&CollectibleUsage::for_plan(
            limit,
            &notice.product_id,
            new_path.as_str(),
        ))?;

        let result = Saga::<StoreError>::new("initial_purchase")
            .step_with_compensation(
                "create_subscription",
                || store.set(&new_path, new_doc),
                || store.update(&new_path, set_active(false)),
            )
            .step("reset_usage", || store.set(&usage_path, usage))
            .run()
            .await;

        if let Err(failure) = result {
            return Err(self.fail(failure, account_id, transaction_id).await);
        }

        tracing::info!(
            account_id = %account_id,
            transaction_id = %transaction_id,
            product_id = %notice.product_id,
            limit,
            "Subscription started"
        );
        Ok(())
    }

    /// Replace the active subscription with a new period.
    ///
    /// An account with no active subscription is renewed anyway (with a warning);
    /// one with several is left untouched. A renewal whose document is already
    /// the active one was applied before and changes nothing.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] for invalid fields
    /// - [`ApiError::Internal`] for a missing plan, several active subscriptions,
    ///   or a failed store write
    pub async fn renewal(&self, notice: &SubscriptionNotice) -> Result<(), ApiError> {
        notice.validate()?;
        let account_id = &notice.account_id;
        let transaction_id = &notice.transaction_id;

        let limit = self.plan_limit(&notice.product_id).await?;

        let mut active = self.active_subscriptions(account_id).await?;
        if active.len() > 1 {
            return Err(ApiError::Internal(format!(
                "account {account_id} has {} active subscriptions",
                active.len()
            )));
        }
        let new_path = paths::subscription(account_id, transaction_id);
        let previous = active.pop();
        if previous.as_ref() == Some(&new_path) {
            tracing::info!(
                account_id = %account_id,
                transaction_id = %transaction_id,
                "Renewal already applied"
            );
            return Ok(());
        }
        if previous.is_none() {
            tracing::warn!(
                account_id = %account_id,
                transaction_id = %transaction_id,
                "Renewal without an active subscription"
            );
        }

        let store = self.store.as_ref();
        let new_doc = to_document(&Subscription::active_from(notice, now_ms()))?;
        let usage_path = paths::collectible_usage(account_id);
        let usage = to_document(&CollectibleUsage::for_plan(
            limit,
            &notice.product_id,
            new_path.as_str(),
        ))?;

        let mut saga = Saga::<StoreError>::new("renewal");
        if let Some(old_path) = &previous {
            saga = saga.step_with_compensation(
                "deactivate_previous",
                || store.update(old_path, set_active(false)),
                || store.update(old_path, set_active(true)),
            );
        }
        let result = saga
            .step_with_compensation(
                "create_subscription",
                || store.set(&new_path, new_doc),
                || store.update(&new_path, set_active(false)),
            )
            .step("reset_usage", || store.set(&usage_path, usage))
            .run()
            .await;

        if let Err(failure) = result {
            return Err(self.fail(failure, account_id, transaction_id).await);
        }

        tracing::info!(
            account_id = %account_id,
            transaction_id = %transaction_id,
            product_id = %notice.product_id,
            previous = ?previous.as_ref().map(DocPath::as_str),
            limit,
            "Subscription renewed"
        );
        Ok(())
    }

    /// End the active subscription and return the account to the free tier.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] for invalid fields
    /// - [`ApiError::Conflict`] unless exactly one subscription is active
    /// - [`ApiError::Internal`] when a store write fails
    pub async fn expiration(&self, notice: &SubscriptionNotice) -> Result<(), ApiError> {
        notice.validate()?;
        self.expire_active(&notice.account_id, &notice.transaction_id)
            .await
    }

    /// Deactivate the single active subscription and reset usage to the free tier.
    pub(super) async fn expire_active(
        &self,
        account_id: &AccountId,
        transaction_id: &TransactionId,
    ) -> Result<(), ApiError> {
        let active = self.active_subscriptions(account_id).await?;
        let [active_path] = active.as_slice() else {
            tracing::info!(
                account_id = %account_id,
                transaction_id = %transaction_id,
                active = active.len(),
                "Expiration rejected"
            );
            return Err(ApiError::Conflict(format!(
                "expected one active subscription, found {}",
                active.len()
            )));
        };

        let store = self.store.as_ref();
        let usage_path = paths::collectible_usage(account_id);
        let usage = to_document(&CollectibleUsage::free(self.free_collectible_limit))?;

        let result = Saga::<StoreError>::new("expiration")
            .step_with_compensation(
                "deactivate_subscription",
                || store.update(active_path, set_active(false)),
                || store.update(active_path, set_active(true)),
            )
            .step("reset_usage", || store.set(&usage_path, usage))
            .run()
            .await;

        if let Err(failure) = result {
            return Err(self.fail(failure, account_id, transaction_id).await);
        }

        tracing::info!(
            account_id = %account_id,
            transaction_id = %transaction_id,
            subscription = %active_path,
            "Subscription expired"
        );
        Ok(())
    }

    /// Paths of the account's active subscriptions.
    async fn active_subscriptions(&self, account_id: &AccountId) -> Result<Vec<DocPath>, ApiError> {
        let snapshots = self
            .store
            .query_eq(
                &paths::subscriptions(account_id),
                IS_ACTIVE_FIELD,
                &Value::Bool(true),
            )
            .await?;
        Ok(snapshots.into_iter().map(|s| s.path).collect())
    }

    /// Collectible limit of a product's plan.
    async fn plan_limit(&self, product_id: &ProductId) -> Result<u32, ApiError> {
        let plan: Plan = self
            .store
            .get_as(&paths::plan(product_id))
            .await?
            .ok_or_else(|| ApiError::Internal(format!("no plan for product {product_id}")))?;

        plan.collectible_limit().ok_or_else(|| {
            ApiError::Internal(format!("plan {product_id} has no collectible tier"))
        })
    }
}
