//! Identity verification document updates.

use purse_core::{AccountId, IdentityDoc};
use purse_store::{paths, DocumentStoreExt};

use super::Workflows;
use crate::error::ApiError;

impl Workflows {
    /// Fail with a conflict if the account's identity is already verified.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] for a verified identity, or
    /// [`ApiError::Internal`] if the read fails.
    pub async fn ensure_identity_unverified(&self, account_id: &AccountId) -> Result<(), ApiError> {
        let existing: Option<IdentityDoc> = self.store.get_as(&paths::identity(account_id)).await?;

        if existing.as_ref().is_some_and(IdentityDoc::is_verified) {
            tracing::info!(account_id = %account_id, "Identity already verified");
            return Err(ApiError::Conflict("identity already verified".into()));
        }
        Ok(())
    }

    /// Write the account's identity document unless it is already verified.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] for a verified identity, or
    /// [`ApiError::Internal`] if a store operation fails.
    pub async fn record_identity(
        &self,
        account_id: &AccountId,
        doc: &IdentityDoc,
    ) -> Result<(), ApiError> {
        self.ensure_identity_unverified(account_id).await?;
        self.store.set_as(&paths::identity(account_id), doc).await?;

        tracing::info!(
            account_id = %account_id,
            session_id = %doc.id,
            status = ?doc.status,
            "Identity updated"
        );
        Ok(())
    }
}
