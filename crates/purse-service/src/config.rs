//! Service configuration.

use serde::Deserialize;
use std::path::Path;

use purse_client::InternalSecrets;
use purse_core::DEFAULT_FREE_COLLECTIBLE_LIMIT;

/// Default Stripe API base URL.
pub const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/purse").
    pub data_dir: String,

    /// Base URL the notification relay calls the saga endpoints on.
    ///
    /// When unset the relay runs the workflows in-process.
    pub internal_base_url: Option<String>,

    /// Per-endpoint authorization secrets.
    pub endpoint_secrets: EndpointSecrets,

    /// Stripe API key (optional).
    pub stripe_api_key: Option<String>,

    /// Stripe webhook signing secret (optional).
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL.
    pub stripe_api_base: String,

    /// Collectible limit written to the usage document on expiration.
    pub free_collectible_limit: u32,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Secrets each endpoint compares its `Authorization` header against.
///
/// An empty secret disables the endpoint: every request gets a 401.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointSecrets {
    /// `POST /notifications`.
    pub relay: String,
    /// `POST /payments/success`.
    pub payment_success: String,
    /// `POST /payments/refund`.
    pub refund: String,
    /// `POST /subscriptions/initial-purchase`.
    pub initial_purchase: String,
    /// `POST /subscriptions/renewal`.
    pub renewal: String,
    /// `POST /subscriptions/expiration`.
    pub expiration: String,
    /// `POST /payments/intents`.
    pub payment_intent: String,
    /// `POST /identity/verification-sessions`.
    pub identity_session: String,
}

impl EndpointSecrets {
    /// The secrets the relay needs to call the saga endpoints.
    #[must_use]
    pub fn internal(&self) -> InternalSecrets {
        InternalSecrets {
            payment_success: self.payment_success.clone(),
            refund: self.refund.clone(),
            initial_purchase: self.initial_purchase.clone(),
            renewal: self.renewal.clone(),
            expiration: self.expiration.clone(),
        }
    }

    fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            relay: var("RELAY_SECRET"),
            payment_success: var("PAYMENT_SUCCESS_SECRET"),
            refund: var("REFUND_SECRET"),
            initial_purchase: var("INITIAL_PURCHASE_SECRET"),
            renewal: var("RENEWAL_SECRET"),
            expiration: var("EXPIRATION_SECRET"),
            payment_intent: var("PAYMENT_INTENT_SECRET"),
            identity_session: var("IDENTITY_SESSION_SECRET"),
        }
    }
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let endpoint_secrets = load_endpoint_secrets();
        let (stripe_api_key, stripe_webhook_secret) = load_stripe_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/purse".into()),
            internal_base_url: std::env::var("INTERNAL_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            endpoint_secrets,
            stripe_api_key,
            stripe_webhook_secret,
            stripe_api_base: std::env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| STRIPE_API_BASE.into()),
            free_collectible_limit: std::env::var("FREE_COLLECTIBLE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_FREE_COLLECTIBLE_LIMIT),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// Load endpoint secrets from file or environment.
fn load_endpoint_secrets() -> EndpointSecrets {
    let secret_paths = [".secrets/endpoints.json", "../.secrets/endpoints.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<EndpointSecrets>(path) {
            tracing::info!(path = %path, "Loaded endpoint secrets from file");
            return secrets;
        }
    }

    tracing::debug!("Endpoint secrets file not found, using environment variables");
    EndpointSecrets::from_env()
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [".secrets/stripe.json", "../.secrets/stripe.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (Some(secrets.api_key), secrets.webhook_secret);
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_API_KEY").ok(),
        std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/purse".into(),
            internal_base_url: None,
            endpoint_secrets: EndpointSecrets::default(),
            stripe_api_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: STRIPE_API_BASE.into(),
            free_collectible_limit: DEFAULT_FREE_COLLECTIBLE_LIMIT,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
