#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use midtrans_service::{
    build_router,
    config::Config,
    models::CreateInvoice,
    services::{InMemoryInvoiceRepository, InvoiceRepository, MidtransClient},
    AppState,
};
use serde_json::{json, Value};
use service_core::config as core_config;
use service_core::utils::notification_signature;
use std::collections::HashMap;
use std::sync::Arc;
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const SERVER_KEY: &str = "SB-Mid-server-test";

/// `Basic base64("SB-Mid-server-test:")`.
pub const AUTHORIZATION: &str = "Basic U0ItTWlkLXNlcnZlci10ZXN0Og==";

pub struct TestApp {
    pub router: Router,
    pub mock_server: MockServer,
    pub invoices: Arc<InMemoryInvoiceRepository>,
    pub config: Config,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_env(&[]).await
    }

    /// Spawn with extra environment variables layered over the test defaults.
    pub async fn spawn_with_env(extra: &[(&str, &str)]) -> Self {
        let mock_server = MockServer::start().await;

        let mut vars: HashMap<String, String> = HashMap::from([
            ("MIDTRANS_SERVER_KEY".to_string(), SERVER_KEY.to_string()),
            ("MIDTRANS_SNAP_BASE_URL".to_string(), mock_server.uri()),
            ("MIDTRANS_API_BASE_URL".to_string(), mock_server.uri()),
        ]);
        for (key, value) in extra {
            vars.insert(key.to_string(), value.to_string());
        }

        let config = Config::from_vars(core_config::Config::default(), |key| {
            vars.get(key).cloned()
        })
        .expect("Failed to build test config");

        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let state = AppState {
            config: config.clone(),
            gateway: Arc::new(MidtransClient::new(config.midtrans.clone())),
            invoices: invoices.clone(),
        };

        Self {
            router: build_router(state),
            mock_server,
            invoices,
            config,
        }
    }

    pub async fn seed_invoice(&self, order_id: &str, gross_amount: i64) {
        self.invoices
            .create(&CreateInvoice::pending(order_id, gross_amount))
            .await
            .expect("Failed to seed invoice");
    }

    pub fn invoice_status(&self, order_id: &str) -> Option<String> {
        self.invoices
            .invoices()
            .into_iter()
            .find(|invoice| invoice.order_id == order_id)
            .map(|invoice| invoice.status)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(uri, body.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: String) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// JSON bodies of every request Midtrans received.
    pub async fn gateway_requests(&self) -> Vec<Value> {
        self.mock_server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
            .collect()
    }
}

/// Notification body signed with the test server key.
pub fn signed_notification(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    transaction_status: &str,
) -> Value {
    json!({
        "order_id": order_id,
        "status_code": status_code,
        "gross_amount": gross_amount,
        "transaction_status": transaction_status,
        "signature_key": notification_signature(order_id, status_code, gross_amount, SERVER_KEY),
    })
}
