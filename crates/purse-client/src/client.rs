//! Purse HTTP client implementation.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use purse_core::{PaymentSuccess, RefundNotice, SubscriptionNotice};

use crate::error::ClientError;

/// Per-endpoint secrets for the saga endpoints.
///
/// Each endpoint checks its own secret, so a leaked key only opens one route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InternalSecrets {
    /// Secret for `POST /payments/success`.
    pub payment_success: String,
    /// Secret for `POST /payments/refund`.
    pub refund: String,
    /// Secret for `POST /subscriptions/initial-purchase`.
    pub initial_purchase: String,
    /// Secret for `POST /subscriptions/renewal`.
    pub renewal: String,
    /// Secret for `POST /subscriptions/expiration`.
    pub expiration: String,
}

/// Client for the saga endpoints of a purse deployment.
#[derive(Debug, Clone)]
pub struct PurseClient {
    client: Client,
    base_url: String,
    secrets: InternalSecrets,
}

impl PurseClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://purse:8080"`)
    /// * `secrets` - Secrets for each saga endpoint
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, secrets: InternalSecrets) -> Result<Self, ClientError> {
        Self::with_options(base_url, secrets, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        secrets: InternalSecrets,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secrets,
        })
    }

    /// Credit a successful top-up purchase.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn payment_success(&self, event: &PaymentSuccess) -> Result<(), ClientError> {
        self.post("/payments/success", &self.secrets.payment_success, event)
            .await
    }

    /// Refund or cancel a previous purchase.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn refund(&self, event: &RefundNotice) -> Result<(), ClientError> {
        self.post("/payments/refund", &self.secrets.refund, event)
            .await
    }

    /// Start a subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn initial_purchase(&self, event: &SubscriptionNotice) -> Result<(), ClientError> {
        self.post(
            "/subscriptions/initial-purchase",
            &self.secrets.initial_purchase,
            event,
        )
        .await
    }

    /// Renew a subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn renewal(&self, event: &SubscriptionNotice) -> Result<(), ClientError> {
        self.post("/subscriptions/renewal", &self.secrets.renewal, event)
            .await
    }

    /// Expire the active subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn expiration(&self, event: &SubscriptionNotice) -> Result<(), ClientError> {
        self.post("/subscriptions/expiration", &self.secrets.expiration, event)
            .await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        secret: &str,
        body: &B,
    ) -> Result<(), ClientError> {
        if secret.is_empty() {
            return Err(ClientError::Configuration(format!(
                "no secret configured for {path}"
            )));
        }

        let url = format!("{}{path}", self.base_url);
        tracing::debug!(url = %url, "Calling purse endpoint");

        let response = self
            .client
            .post(&url)
            .header("authorization", secret)
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response(response: reqwest::Response) -> Result<(), ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => Err(ClientError::Api {
                code: api_error.error.code,
                message: api_error.error.message,
                status: status.as_u16(),
            }),
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Error body rendered by the service.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    message: String,
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purse_core::{AccountId, Environment, ProductId, TransactionId};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secrets() -> InternalSecrets {
        InternalSecrets {
            payment_success: "ps-secret".into(),
            refund: "refund-secret".into(),
            initial_purchase: "ip-secret".into(),
            renewal: "renewal-secret".into(),
            expiration: "exp-secret".into(),
        }
    }

    fn payment() -> PaymentSuccess {
        PaymentSuccess {
            account_id: AccountId::new("acct").unwrap(),
            transaction_id: TransactionId::new("tx1").unwrap(),
            product_id: ProductId::new("50_topup_v1").unwrap(),
            price: 4.99,
            price_in_purchased_currency: 4.99,
            currency: "USD".into(),
            environment: Environment::Sandbox,
            purchased_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = PurseClient::new("http://localhost:8080/", secrets()).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn sends_endpoint_secret_and_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments/success"))
            .and(header("authorization", "ps-secret"))
            .and(body_partial_json(json!({
                "accountId": "acct",
                "transactionId": "tx1",
                "productId": "50_topup_v1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        let client = PurseClient::new(server.uri(), secrets()).unwrap();
        client.payment_success(&payment()).await.unwrap();
    }

    #[tokio::test]
    async fn maps_error_body_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments/success"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": { "code": "conflict", "message": "transaction already processed" }
            })))
            .mount(&server)
            .await;

        let client = PurseClient::new(server.uri(), secrets()).unwrap();
        let err = client.payment_success(&payment()).await.unwrap_err();

        assert_eq!(err.status(), Some(409));
        match err {
            ClientError::Api { code, .. } => assert_eq!(code, "conflict"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/subscriptions/renewal"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = PurseClient::new(server.uri(), secrets()).unwrap();
        let notice: SubscriptionNotice = serde_json::from_value(json!({
            "accountId": "acct",
            "transactionId": "tx2",
            "productId": "premium_monthly",
            "periodType": "NORMAL",
            "purchasedAtMs": 1,
            "store": "APP_STORE",
            "environment": "SANDBOX",
            "countryCode": "US",
            "price": 9.99,
            "priceInPurchasedCurrency": 9.99,
            "currency": "USD"
        }))
        .unwrap();

        let err = client.renewal(&notice).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn missing_secret_is_configuration_error() {
        let client = PurseClient::new("http://localhost:1", InternalSecrets::default()).unwrap();
        let err = client.payment_success(&payment()).await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
        assert_eq!(err.status(), None);
    }
}
