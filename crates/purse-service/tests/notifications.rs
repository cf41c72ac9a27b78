//! Notification relay tests.
//!
//! The relay runs the sagas in-process unless an internal base URL is
//! configured, in which case it calls the saga endpoints over HTTP.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{test_config, FaultyStore, TestHarness};
use purse_core::{CancelReason, PaymentSuccess, RefundNotice, SubscriptionNotice};
use purse_service::{ApiError, AppState, SagaDispatcher, ServiceConfig};

const RELAY_SECRET: &str = "relay-secret";
const PLAN: &str = "premium_monthly";

fn event(event_type: &str, tx: &str, product_id: &str) -> Value {
    json!({
        "api_version": "1.0",
        "event": {
            "id": format!("evt-{tx}"),
            "type": event_type,
            "app_user_id": "user-1",
            "product_id": product_id,
            "transaction_id": tx,
            "environment": "SANDBOX",
            "purchased_at_ms": 1_700_000_000_000_i64,
            "expiration_at_ms": 1_702_592_000_000_i64,
            "store": "APP_STORE",
            "period_type": "NORMAL",
            "country_code": "US",
            "price": 4.99,
            "price_in_purchased_currency": 4.99,
            "currency": "USD",
        }
    })
}

fn top_up_event(tx: &str) -> Value {
    let mut body = event("NON_RENEWING_PURCHASE", tx, "50_topup_v1");
    body["event"]
        .as_object_mut()
        .unwrap()
        .remove("expiration_at_ms");
    body
}

async fn relay(harness: &TestHarness, body: &Value) -> axum_test::TestResponse {
    harness
        .server
        .post("/notifications")
        .add_header("authorization", RELAY_SECRET)
        .json(body)
        .await
}

// =============================================================================
// In-process dispatch
// =============================================================================

#[tokio::test]
async fn test_relay_credits_non_renewing_purchase() {
    let harness = TestHarness::new();

    let response = relay(&harness, &top_up_event("tx1")).await;

    response.assert_status_ok();
    response.assert_text("OK");
    assert_eq!(harness.balance().await, 50);
}

#[tokio::test]
async fn test_relay_propagates_saga_status() {
    let harness = TestHarness::new();
    relay(&harness, &top_up_event("tx1")).await.assert_status_ok();

    relay(&harness, &top_up_event("tx1"))
        .await
        .assert_status(StatusCode::CONFLICT);

    let mut production = top_up_event("tx2");
    production["event"]["environment"] = json!("PRODUCTION");
    relay(&harness, &production)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    assert_eq!(harness.balance().await, 50);
}

#[tokio::test]
async fn test_relay_cancellation_refunds_top_up() {
    let harness = TestHarness::new();
    relay(&harness, &top_up_event("tx1")).await.assert_status_ok();

    let mut cancellation = top_up_event("tx1");
    cancellation["event"]["type"] = json!("CANCELLATION");
    relay(&harness, &cancellation).await.assert_status_ok();

    assert_eq!(harness.balance().await, 0);
    assert!(harness.intent("tx1").await.unwrap().refunded);
}

#[tokio::test]
async fn test_relay_drives_subscription_lifecycle() {
    let harness = TestHarness::new();
    harness.seed_plan(PLAN, json!({ "upToHundred": true })).await;

    relay(&harness, &event("INITIAL_PURCHASE", "sub1", PLAN))
        .await
        .assert_status_ok();
    assert_eq!(harness.usage().await.unwrap()["limit"], 100);

    relay(&harness, &event("RENEWAL", "sub2", PLAN))
        .await
        .assert_status_ok();
    assert_eq!(harness.subscription("sub1").await.unwrap()["isActive"], false);
    assert_eq!(harness.subscription("sub2").await.unwrap()["isActive"], true);

    relay(&harness, &event("EXPIRATION", "sub2", PLAN))
        .await
        .assert_status_ok();
    assert_eq!(harness.subscription("sub2").await.unwrap()["isActive"], false);
    assert_eq!(harness.usage().await.unwrap()["planId"], "free");

    // Nothing left to expire.
    relay(&harness, &event("EXPIRATION", "sub2", PLAN))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_relay_acknowledges_test_and_unknown_events() {
    let harness = TestHarness::new();

    relay(&harness, &json!({ "event": { "id": "evt-test", "type": "TEST" } }))
        .await
        .assert_status_ok();
    relay(
        &harness,
        &json!({ "event": { "type": "PRODUCT_CHANGE", "app_user_id": "user-1" } }),
    )
    .await
    .assert_status_ok();

    assert!(harness.usage().await.is_none());
    assert_eq!(harness.balance().await, 0);
}

#[tokio::test]
async fn test_relay_rejects_events_missing_required_fields() {
    let harness = TestHarness::new();

    relay(&harness, &json!({ "event": { "app_user_id": "user-1" } }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let mut no_user = top_up_event("tx1");
    no_user["event"].as_object_mut().unwrap().remove("app_user_id");
    let response = relay(&harness, &no_user).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "validation_failed");

    relay(&harness, &json!({ "not_an_event": {} }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_relay_requires_relay_secret() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/notifications")
        .add_header("authorization", "payment-success-secret")
        .json(&top_up_event("tx1"))
        .await
        .assert_status_unauthorized();

    assert_eq!(harness.balance().await, 0);
}

#[tokio::test]
async fn test_endpoint_without_configured_secret_rejects_everything() {
    let mut config = test_config();
    config.endpoint_secrets.relay = String::new();
    let harness = TestHarness::with_config(config);

    harness
        .server
        .post("/notifications")
        .add_header("authorization", "")
        .json(&top_up_event("tx1"))
        .await
        .assert_status_unauthorized();
}

// =============================================================================
// HTTP dispatch
// =============================================================================

fn http_harness(mock_server: &MockServer) -> TestHarness {
    TestHarness::with_config(ServiceConfig {
        internal_base_url: Some(mock_server.uri()),
        ..test_config()
    })
}

#[tokio::test]
async fn test_relay_calls_saga_endpoint_with_its_secret() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments/success"))
        .and(header("authorization", "payment-success-secret"))
        .and(body_partial_json(json!({
            "accountId": "user-1",
            "transactionId": "tx1",
            "productId": "50_topup_v1",
            "environment": "SANDBOX",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let harness = http_harness(&mock_server);

    relay(&harness, &top_up_event("tx1")).await.assert_status_ok();

    // The saga ran remotely; the local store is untouched.
    assert_eq!(harness.balance().await, 0);
}

#[tokio::test]
async fn test_relay_routes_each_type_to_its_endpoint() {
    let mock_server = MockServer::start().await;
    for (endpoint, secret) in [
        ("/payments/refund", "refund-secret"),
        ("/subscriptions/initial-purchase", "initial-purchase-secret"),
        ("/subscriptions/renewal", "renewal-secret"),
        ("/subscriptions/expiration", "expiration-secret"),
    ] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(header("authorization", secret))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let harness = http_harness(&mock_server);

    for event_type in ["CANCELLATION", "INITIAL_PURCHASE", "RENEWAL", "EXPIRATION"] {
        relay(&harness, &event(event_type, "tx1", PLAN))
            .await
            .assert_status_ok();
    }
}

#[tokio::test]
async fn test_relay_propagates_remote_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments/success"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": { "code": "conflict", "message": "transaction tx1 already processed" }
        })))
        .mount(&mock_server)
        .await;

    let harness = http_harness(&mock_server);

    let response = relay(&harness, &top_up_event("tx1")).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "transaction tx1 already processed");
}

#[tokio::test]
async fn test_relay_maps_unexpected_remote_status_to_internal_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subscriptions/renewal"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    let harness = http_harness(&mock_server);

    relay(&harness, &event("RENEWAL", "sub2", PLAN))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// Custom dispatcher
// =============================================================================

/// Records what the relay dispatches and answers with a fixed result.
#[derive(Default)]
struct RecordingDispatcher {
    refunds: Mutex<Vec<RefundNotice>>,
    renewals: Mutex<Vec<SubscriptionNotice>>,
    conflict: bool,
}

impl RecordingDispatcher {
    fn answer(&self) -> Result<(), ApiError> {
        if self.conflict {
            Err(ApiError::Conflict("already handled".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SagaDispatcher for RecordingDispatcher {
    async fn payment_success(&self, _event: &PaymentSuccess) -> Result<(), ApiError> {
        self.answer()
    }

    async fn refund(&self, event: &RefundNotice) -> Result<(), ApiError> {
        self.refunds.lock().unwrap().push(event.clone());
        self.answer()
    }

    async fn initial_purchase(&self, _event: &SubscriptionNotice) -> Result<(), ApiError> {
        self.answer()
    }

    async fn renewal(&self, event: &SubscriptionNotice) -> Result<(), ApiError> {
        self.renewals.lock().unwrap().push(event.clone());
        self.answer()
    }

    async fn expiration(&self, _event: &SubscriptionNotice) -> Result<(), ApiError> {
        self.answer()
    }
}

fn recording_harness(dispatcher: Arc<RecordingDispatcher>) -> TestHarness {
    let store = Arc::new(FaultyStore::new());
    let config = test_config();
    let secrets = config.endpoint_secrets.clone();
    let state = AppState::new(store.clone(), config).with_dispatcher(dispatcher);
    TestHarness::from_state(state, store, secrets)
}

#[tokio::test]
async fn test_relay_maps_cancellation_fields_into_refund_notice() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let harness = recording_harness(dispatcher.clone());

    let mut body = event("CANCELLATION", "sub1", PLAN);
    body["event"]["cancel_reason"] = json!("CUSTOMER_SUPPORT");

    relay(&harness, &body).await.assert_status_ok();

    let refunds = dispatcher.refunds.lock().unwrap();
    assert_eq!(refunds.len(), 1);
    let notice = &refunds[0];
    assert_eq!(notice.account_id.as_str(), "user-1");
    assert_eq!(notice.transaction_id.as_str(), "sub1");
    assert_eq!(notice.product_id.as_str(), PLAN);
    assert_eq!(notice.expiration_at_ms, Some(1_702_592_000_000));
    assert_eq!(notice.cancel_reason, Some(CancelReason::CustomerSupport));
}

#[tokio::test]
async fn test_relay_returns_dispatcher_failure_status() {
    let dispatcher = Arc::new(RecordingDispatcher {
        conflict: true,
        ..RecordingDispatcher::default()
    });
    let harness = recording_harness(dispatcher.clone());

    relay(&harness, &event("RENEWAL", "sub2", PLAN))
        .await
        .assert_status(StatusCode::CONFLICT);

    let renewals = dispatcher.renewals.lock().unwrap();
    assert_eq!(renewals.len(), 1);
    assert_eq!(renewals[0].transaction_id.as_str(), "sub2");
    assert!(harness.subscription("sub2").await.is_none());
}
