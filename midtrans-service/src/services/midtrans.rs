//! Midtrans payment gateway client.
//!
//! Covers the Snap API (hosted checkout) and the Core API (direct charge,
//! status, cancel and expire by order id).

use crate::config::MidtransConfig;
use crate::services::charge::ChargeRequest;
use crate::services::metrics::{GATEWAY_REQUESTS_TOTAL, GATEWAY_REQUEST_DURATION};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status code Midtrans uses for expired transactions; not a failure.
const STATUS_CODE_EXPIRED: u16 = 407;

/// Remote payment gateway operations used by the HTTP handlers.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a Snap (hosted checkout) transaction.
    async fn create_snap_transaction(
        &self,
        request: &SnapTransactionRequest,
    ) -> Result<SnapTransaction, GatewayError>;

    /// Submit a Core API charge with a method-specific payload.
    async fn charge(&self, request: &ChargeRequest) -> Result<Value, GatewayError>;

    async fn status(&self, order_id: &str) -> Result<Value, GatewayError>;

    async fn cancel(&self, order_id: &str) -> Result<Value, GatewayError>;

    async fn expire(&self, order_id: &str) -> Result<Value, GatewayError>;
}

/// Order id and amount, shared by Snap and Core API requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub order_id: String,
    /// Amount in IDR (no minor units).
    pub gross_amount: i64,
}

/// Request to create a Snap transaction.
#[derive(Debug, Clone, Serialize)]
pub struct SnapTransactionRequest {
    pub transaction_details: TransactionDetails,
}

/// Response from Snap transaction creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapTransaction {
    /// Token for the Snap JS popup.
    pub token: String,
    /// Hosted payment page.
    pub redirect_url: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Midtrans credentials not configured")]
    NotConfigured,

    #[error("Midtrans API error ({http_status}): {message}")]
    Api {
        /// HTTP status of the response.
        http_status: u16,
        /// `status_code` reported in the response body, if any.
        status_code: Option<u16>,
        message: String,
        body: Value,
    },

    #[error("Midtrans request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid Midtrans response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    /// The gateway's own status code, falling back to the HTTP status.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::Api {
                http_status,
                status_code,
                ..
            } => status_code.or(Some(*http_status)),
            _ => None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            GatewayError::Api { http_status, .. } => Some(*http_status),
            GatewayError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Human readable message (`status_message` or `error_messages`).
    pub fn message(&self) -> String {
        match self {
            GatewayError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Raw gateway response if there was one, otherwise the message.
    pub fn response_body(&self) -> Value {
        match self {
            GatewayError::Api { body, .. } if !body.is_null() => body.clone(),
            other => Value::String(other.message()),
        }
    }
}

/// Midtrans client for interacting with the Snap and Core APIs.
#[derive(Clone)]
pub struct MidtransClient {
    client: Client,
    config: MidtransConfig,
}

impl MidtransClient {
    /// Create a new Midtrans client.
    pub fn new(config: MidtransConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Check if Midtrans is configured (server key is set).
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn snap_url(&self, path: &str) -> String {
        format!(
            "{}/snap/v1/{}",
            self.config.snap_base_url.trim_end_matches('/'),
            path
        )
    }

    fn core_url(&self, path: &str) -> String {
        format!(
            "{}/v2/{}",
            self.config.api_base_url.trim_end_matches('/'),
            path
        )
    }

    fn order_url(&self, order_id: &str, action: &str) -> String {
        self.core_url(&format!("{}/{}", urlencoding::encode(order_id), action))
    }

    /// Send a request, recording latency and outcome for `operation`.
    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Value, GatewayError> {
        if !self.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let timer = GATEWAY_REQUEST_DURATION
            .with_label_values(&[operation])
            .start_timer();
        let result = self.execute(request).await;
        timer.observe_duration();

        let outcome = match &result {
            Ok(_) => "success",
            Err(GatewayError::Api { .. }) => "api_error",
            Err(_) => "transport_error",
        };
        GATEWAY_REQUESTS_TOTAL
            .with_label_values(&[operation, outcome])
            .inc();

        if let Err(ref e) = result {
            tracing::error!(operation = operation, error = %e, "Midtrans request failed");
        }

        result
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, GatewayError> {
        let response = request
            .basic_auth(self.config.server_key.expose_secret(), None::<&str>)
            .header(header::ACCEPT, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(status = %status, body = %text, "Midtrans response");

        if status.is_success() {
            let body: Value = serde_json::from_str(&text)?;
            if let Some(code) = body_status_code(&body) {
                if code >= 400 && code != STATUS_CODE_EXPIRED {
                    return Err(api_error(status.as_u16(), body));
                }
            }
            Ok(body)
        } else {
            let body = serde_json::from_str(&text).unwrap_or_else(|_| {
                if text.is_empty() {
                    Value::Null
                } else {
                    Value::String(text)
                }
            });
            Err(api_error(status.as_u16(), body))
        }
    }
}

#[async_trait]
impl PaymentGateway for MidtransClient {
    async fn create_snap_transaction(
        &self,
        request: &SnapTransactionRequest,
    ) -> Result<SnapTransaction, GatewayError> {
        let url = self.snap_url("transactions");
        let body = self
            .send("snap_create", self.client.post(&url).json(request))
            .await?;
        let transaction: SnapTransaction = serde_json::from_value(body)?;

        tracing::info!(
            order_id = %request.transaction_details.order_id,
            gross_amount = request.transaction_details.gross_amount,
            "Snap transaction created"
        );

        Ok(transaction)
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<Value, GatewayError> {
        let url = self.core_url("charge");
        let body = self
            .send("charge", self.client.post(&url).json(request))
            .await?;

        tracing::info!(
            order_id = %request.transaction_details.order_id,
            payment_type = %request.payment_type,
            transaction_status = ?body.get("transaction_status"),
            "Core API charge accepted"
        );

        Ok(body)
    }

    async fn status(&self, order_id: &str) -> Result<Value, GatewayError> {
        let url = self.order_url(order_id, "status");
        self.send("status", self.client.get(&url)).await
    }

    async fn cancel(&self, order_id: &str) -> Result<Value, GatewayError> {
        let url = self.order_url(order_id, "cancel");
        let body = self.send("cancel", self.client.post(&url)).await?;
        tracing::info!(order_id = %order_id, "Transaction cancelled");
        Ok(body)
    }

    async fn expire(&self, order_id: &str) -> Result<Value, GatewayError> {
        let url = self.order_url(order_id, "expire");
        let body = self.send("expire", self.client.post(&url)).await?;
        tracing::info!(order_id = %order_id, "Transaction expired");
        Ok(body)
    }
}

/// `status_code` from a response body; Midtrans sends it as a string.
fn body_status_code(body: &Value) -> Option<u16> {
    match body.get("status_code")? {
        Value::String(code) => code.parse().ok(),
        Value::Number(code) => code.as_u64().and_then(|c| u16::try_from(c).ok()),
        _ => None,
    }
}

fn api_error(http_status: u16, body: Value) -> GatewayError {
    let message = body
        .get("status_message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            body.get("error_messages")
                .and_then(Value::as_array)
                .map(|messages| {
                    messages
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
        })
        .or_else(|| body.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("Midtrans returned HTTP {}", http_status));

    GatewayError::Api {
        http_status,
        status_code: body_status_code(&body),
        message,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MidtransEnvironment;
    use serde_json::json;

    fn test_client() -> MidtransClient {
        MidtransClient::new(MidtransConfig::new(
            "SB-Mid-server-test",
            MidtransEnvironment::Sandbox,
        ))
    }

    #[test]
    fn test_is_configured() {
        assert!(test_client().is_configured());

        let client = MidtransClient::new(MidtransConfig::new("", MidtransEnvironment::Sandbox));
        assert!(!client.is_configured());
    }

    #[test]
    fn test_order_url_encodes_order_id() {
        let client = test_client();
        assert_eq!(
            client.order_url("order 1/2", "status"),
            "https://api.sandbox.midtrans.com/v2/order%201%2F2/status"
        );
        assert_eq!(
            client.snap_url("transactions"),
            "https://app.sandbox.midtrans.com/snap/v1/transactions"
        );
    }

    #[test]
    fn test_body_status_code_accepts_strings_and_numbers() {
        assert_eq!(body_status_code(&json!({ "status_code": "201" })), Some(201));
        assert_eq!(body_status_code(&json!({ "status_code": 404 })), Some(404));
        assert_eq!(body_status_code(&json!({ "status_message": "ok" })), None);
    }

    #[test]
    fn test_api_error_prefers_status_message() {
        let err = api_error(
            200,
            json!({ "status_code": "404", "status_message": "Transaction doesn't exist." }),
        );
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.http_status(), Some(200));
        assert_eq!(err.message(), "Transaction doesn't exist.");
    }

    #[test]
    fn test_api_error_joins_snap_error_messages() {
        let err = api_error(
            400,
            json!({ "error_messages": ["transaction_details.gross_amount is required", "order_id has already been taken"] }),
        );
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(
            err.message(),
            "transaction_details.gross_amount is required, order_id has already been taken"
        );
    }

    #[test]
    fn test_response_body_falls_back_to_message() {
        assert_eq!(
            GatewayError::NotConfigured.response_body(),
            json!("Midtrans credentials not configured")
        );
    }
}
