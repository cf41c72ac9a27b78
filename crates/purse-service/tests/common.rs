//! Common test utilities for purse integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};

use purse_core::{AccountId, Balance, ProductId, TopUpIntent, TransactionId};
use purse_service::{create_router, AppState, EndpointSecrets, ServiceConfig};
use purse_store::{
    paths, CollectionPath, DocPath, Document, DocumentStore, DocumentStoreExt, FieldUpdate,
    MemoryStore, Snapshot, StoreError,
};

/// Store operation a fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Set,
    Update,
    Delete,
    Query,
}

#[derive(Debug)]
struct Fault {
    op: Op,
    path_fragment: String,
    skip: usize,
}

/// A [`MemoryStore`] that fails chosen operations.
///
/// A fault matches an operation on any path containing its fragment. It lets
/// `skip` matching calls through and fails every one after that. Stale paths
/// read as missing, like a read that lost a race with a concurrent writer.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    faults: Mutex<Vec<Fault>>,
    stale: Mutex<Vec<String>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `op` on paths containing `path_fragment`.
    pub fn fail(&self, op: Op, path_fragment: &str) {
        self.fail_after(op, path_fragment, 0);
    }

    /// Fail `op` on paths containing `path_fragment` after `skip` successful calls.
    pub fn fail_after(&self, op: Op, path_fragment: &str, skip: usize) {
        self.faults.lock().unwrap().push(Fault {
            op,
            path_fragment: path_fragment.to_string(),
            skip,
        });
    }

    /// Read documents on paths containing `path_fragment` as missing.
    pub fn stale_reads(&self, path_fragment: &str) {
        self.stale.lock().unwrap().push(path_fragment.to_string());
    }

    /// Remove all faults and stale paths.
    pub fn heal(&self) {
        self.faults.lock().unwrap().clear();
        self.stale.lock().unwrap().clear();
    }

    fn check(&self, op: Op, path: &str) -> purse_store::Result<()> {
        let mut faults = self.faults.lock().unwrap();
        for fault in faults.iter_mut() {
            if fault.op == op && path.contains(&fault.path_fragment) {
                if fault.skip == 0 {
                    return Err(StoreError::Database(format!("injected {op:?} fault on {path}")));
                }
                fault.skip -= 1;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn get(&self, path: &DocPath) -> purse_store::Result<Option<Document>> {
        self.check(Op::Get, path.as_str())?;
        let stale = self
            .stale
            .lock()
            .unwrap()
            .iter()
            .any(|fragment| path.as_str().contains(fragment.as_str()));
        if stale {
            return Ok(None);
        }
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocPath, document: Document) -> purse_store::Result<()> {
        self.check(Op::Set, path.as_str())?;
        self.inner.set(path, document).await
    }

    /// Creates count as sets.
    async fn create(&self, path: &DocPath, document: Document) -> purse_store::Result<()> {
        self.check(Op::Set, path.as_str())?;
        self.inner.create(path, document).await
    }

    async fn update(
        &self,
        path: &DocPath,
        fields: Vec<(String, FieldUpdate)>,
    ) -> purse_store::Result<()> {
        self.check(Op::Update, path.as_str())?;
        self.inner.update(path, fields).await
    }

    async fn delete(&self, path: &DocPath) -> purse_store::Result<()> {
        self.check(Op::Delete, path.as_str())?;
        self.inner.delete(path).await
    }

    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> purse_store::Result<Vec<Snapshot>> {
        self.check(Op::Query, collection.as_str())?;
        self.inner.query_eq(collection, field, value).await
    }
}

/// Secrets every harness endpoint is configured with.
pub fn test_secrets() -> EndpointSecrets {
    EndpointSecrets {
        relay: "relay-secret".into(),
        payment_success: "payment-success-secret".into(),
        refund: "refund-secret".into(),
        initial_purchase: "initial-purchase-secret".into(),
        renewal: "renewal-secret".into(),
        expiration: "expiration-secret".into(),
        payment_intent: "payment-intent-secret".into(),
        identity_session: "identity-session-secret".into(),
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The backing store, for seeding and inspection.
    pub store: Arc<FaultyStore>,
    /// Endpoint secrets the server checks.
    pub secrets: EndpointSecrets,
    /// A test account.
    pub account_id: AccountId,
}

impl TestHarness {
    /// Create a new test harness with an empty store and no Stripe.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a harness with a custom configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(FaultyStore::new());
        let state = AppState::new(store.clone(), config.clone());
        Self::from_state(state, store, config.endpoint_secrets)
    }

    /// Create a harness around a prepared state.
    pub fn from_state(state: AppState, store: Arc<FaultyStore>, secrets: EndpointSecrets) -> Self {
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            secrets,
            account_id: AccountId::new("user-1").unwrap(),
        }
    }

    /// Wallet balance of the test account, zero when never written.
    pub async fn balance(&self) -> i64 {
        self.store
            .get_as::<Balance>(&paths::balance(&self.account_id))
            .await
            .unwrap()
            .map_or(0, |b| b.balance)
    }

    /// The test account's top-up intent for `tx`.
    pub async fn intent(&self, tx: &str) -> Option<TopUpIntent> {
        self.store
            .get_as(&paths::top_up_intent(
                &self.account_id,
                &TransactionId::new(tx).unwrap(),
            ))
            .await
            .unwrap()
    }

    /// The test account's subscription document for `tx`.
    pub async fn subscription(&self, tx: &str) -> Option<Value> {
        self.store
            .get_as(&paths::subscription(
                &self.account_id,
                &TransactionId::new(tx).unwrap(),
            ))
            .await
            .unwrap()
    }

    /// The test account's collectible usage document.
    pub async fn usage(&self) -> Option<Value> {
        self.store
            .get_as(&paths::collectible_usage(&self.account_id))
            .await
            .unwrap()
    }

    /// Write a plan reference document.
    pub async fn seed_plan(&self, product_id: &str, collectible: Value) {
        self.store
            .set_as(
                &paths::plan(&ProductId::new(product_id).unwrap()),
                &json!({
                    "storeProductId": product_id,
                    "title": product_id,
                    "collectible": collectible,
                }),
            )
            .await
            .unwrap();
    }

    /// All reconciliation records.
    pub async fn reconciliation_records(&self) -> Vec<Value> {
        let mut records = Vec::new();
        for workflow in ["top_up", "refund", "initial_purchase", "renewal", "expiration"] {
            let found: Vec<(DocPath, Value)> = self
                .store
                .query_eq_as(
                    &CollectionPath::root(paths::RECONCILIATION),
                    "workflow",
                    &json!(workflow),
                )
                .await
                .unwrap();
            records.extend(found.into_iter().map(|(_, record)| record));
        }
        records
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration with all endpoint secrets set and no external services.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        data_dir: String::new(),
        endpoint_secrets: test_secrets(),
        ..ServiceConfig::default()
    }
}

/// A sandbox top-up body for the test account.
pub fn payment_success(tx: &str, product_id: &str) -> Value {
    json!({
        "accountId": "user-1",
        "transactionId": tx,
        "productId": product_id,
        "price": 0.99,
        "priceInPurchasedCurrency": 0.99,
        "currency": "USD",
        "environment": "SANDBOX",
        "purchasedAtMs": 1_700_000_000_000_i64,
    })
}

/// A top-up refund body for the test account.
pub fn refund(tx: &str, product_id: &str) -> Value {
    json!({
        "accountId": "user-1",
        "transactionId": tx,
        "productId": product_id,
        "environment": "SANDBOX",
    })
}

/// A subscription event body for the test account.
pub fn subscription_notice(tx: &str, product_id: &str) -> Value {
    json!({
        "accountId": "user-1",
        "transactionId": tx,
        "productId": product_id,
        "periodType": "NORMAL",
        "purchasedAtMs": 1_700_000_000_000_i64,
        "expirationAtMs": 1_702_592_000_000_i64,
        "store": "APP_STORE",
        "environment": "SANDBOX",
        "countryCode": "US",
        "price": 4.99,
        "priceInPurchasedCurrency": 4.99,
        "currency": "USD",
    })
}
