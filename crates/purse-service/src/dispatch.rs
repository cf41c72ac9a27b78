//! Saga dispatch for the notification relay.
//!
//! The relay classifies a store notification and hands it to a [`SagaDispatcher`].
//! [`HttpDispatcher`] calls the saga endpoints over HTTP with their own secrets, so
//! the relay can run as a separate deployment; [`LocalDispatcher`] runs the
//! workflows in-process.

use async_trait::async_trait;

use purse_client::{ClientError, PurseClient};
use purse_core::{PaymentSuccess, RefundNotice, SubscriptionNotice};

use crate::error::ApiError;
use crate::workflows::Workflows;

/// Runs the saga for a classified notification.
#[async_trait]
pub trait SagaDispatcher: Send + Sync {
    /// Credit a one-off purchase.
    async fn payment_success(&self, event: &PaymentSuccess) -> Result<(), ApiError>;

    /// Refund a purchase or cancel a subscription.
    async fn refund(&self, event: &RefundNotice) -> Result<(), ApiError>;

    /// Start a subscription.
    async fn initial_purchase(&self, event: &SubscriptionNotice) -> Result<(), ApiError>;

    /// Renew a subscription.
    async fn renewal(&self, event: &SubscriptionNotice) -> Result<(), ApiError>;

    /// Expire a subscription.
    async fn expiration(&self, event: &SubscriptionNotice) -> Result<(), ApiError>;
}

/// Calls the saga endpoints through [`PurseClient`].
pub struct HttpDispatcher {
    client: PurseClient,
}

impl HttpDispatcher {
    /// Dispatch through `client`.
    #[must_use]
    pub fn new(client: PurseClient) -> Self {
        Self { client }
    }
}

/// Map a client failure onto the status the endpoint answered with.
fn propagate(err: ClientError) -> ApiError {
    match err {
        ClientError::Api {
            status, message, ..
        } => ApiError::from_status(status, message),
        other => ApiError::ExternalService(other.to_string()),
    }
}

#[async_trait]
impl SagaDispatcher for HttpDispatcher {
    async fn payment_success(&self, event: &PaymentSuccess) -> Result<(), ApiError> {
        self.client.payment_success(event).await.map_err(propagate)
    }

    async fn refund(&self, event: &RefundNotice) -> Result<(), ApiError> {
        self.client.refund(event).await.map_err(propagate)
    }

    async fn initial_purchase(&self, event: &SubscriptionNotice) -> Result<(), ApiError> {
        self.client.initial_purchase(event).await.map_err(propagate)
    }

    async fn renewal(&self, event: &SubscriptionNotice) -> Result<(), ApiError> {
        self.client.renewal(event).await.map_err(propagate)
    }

    async fn expiration(&self, event: &SubscriptionNotice) -> Result<(), ApiError> {
        self.client.expiration(event).await.map_err(propagate)
    }
}

/// Runs the workflows in-process.
pub struct LocalDispatcher {
    workflows: Workflows,
}

impl LocalDispatcher {
    /// Dispatch to `workflows`.
    #[must_use]
    pub fn new(workflows: Workflows) -> Self {
        Self { workflows }
    }
}

#[async_trait]
impl SagaDispatcher for LocalDispatcher {
    async fn payment_success(&self, event: &PaymentSuccess) -> Result<(), ApiError> {
        self.workflows.top_up(event).await
    }

    async fn refund(&self, event: &RefundNotice) -> Result<(), ApiError> {
        self.workflows.refund(event).await
    }

    async fn initial_purchase(&self, event: &SubscriptionNotice) -> Result<(), ApiError> {
        self.workflows.initial_purchase(event).await
    }

    async fn renewal(&self, event: &SubscriptionNotice) -> Result<(), ApiError> {
        self.workflows.renewal(event).await
    }

    async fn expiration(&self, event: &SubscriptionNotice) -> Result<(), ApiError> {
        self.workflows.expiration(event).await
    }
}
