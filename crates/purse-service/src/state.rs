//! Application state.

use std::sync::Arc;

use purse_client::PurseClient;
use purse_store::DocumentStore;

use crate::config::ServiceConfig;
use crate::dispatch::{HttpDispatcher, LocalDispatcher, SagaDispatcher};
use crate::stripe::StripeClient;
use crate::workflows::Workflows;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn DocumentStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Wallet and subscription workflows.
    pub workflows: Workflows,

    /// Where the notification relay sends classified events.
    pub dispatcher: Arc<dyn SagaDispatcher>,

    /// Stripe client for identity and payment intents (optional).
    pub stripe: Option<Arc<StripeClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: ServiceConfig) -> Self {
        let workflows = Workflows::new(Arc::clone(&store), config.free_collectible_limit);

        let dispatcher: Arc<dyn SagaDispatcher> = match &config.internal_base_url {
            Some(url) => match PurseClient::new(url, config.endpoint_secrets.internal()) {
                Ok(client) => {
                    tracing::info!(internal_base_url = %url, "Relay dispatches over HTTP");
                    Arc::new(HttpDispatcher::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create internal client - dispatching in-process");
                    Arc::new(LocalDispatcher::new(workflows.clone()))
                }
            },
            None => {
                tracing::info!("Relay dispatches in-process");
                Arc::new(LocalDispatcher::new(workflows.clone()))
            }
        };

        let stripe = config.stripe_api_key.as_ref().and_then(|key| {
            match StripeClient::with_base_url(
                key,
                config.stripe_webhook_secret.clone(),
                &config.stripe_api_base,
            ) {
                Ok(client) => {
                    tracing::info!("Stripe integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - identity and payment intents unavailable");
        }

        Self {
            store,
            config,
            workflows,
            dispatcher,
            stripe,
        }
    }

    /// Replace the relay's dispatcher.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn SagaDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}
