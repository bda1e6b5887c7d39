use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

pub use crate::services::notification::PaymentNotification;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Unsupported payment type")]
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Transaction updated")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure of a status/cancel/expire lookup against the gateway.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayFailureResponse {
    #[schema(example = "Failed to get status")]
    pub message: String,
    /// Gateway response body, or the error message when there was none.
    #[schema(value_type = Object)]
    pub error: Value,
    #[schema(example = 404)]
    pub http_status_code: Option<u16>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapPaymentRequest {
    #[validate(length(min = 1, max = 50, message = "orderId must be 1-50 characters"))]
    #[schema(example = "order-1001")]
    pub order_id: String,
    #[validate(range(min = 1, message = "grossAmount must be at least 1"))]
    #[schema(example = 50000)]
    pub gross_amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SnapPaymentResponse {
    #[schema(example = "66e4fa55-fdac-4ef9-91b5-733b97d1b862")]
    pub token: String,
    #[schema(example = "https://app.sandbox.midtrans.com/snap/v2/vtweb/66e4fa55-fdac-4ef9-91b5-733b97d1b862")]
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoreTransactionRequest {
    #[validate(range(min = 1, message = "grossAmount must be at least 1"))]
    #[schema(example = 50000)]
    pub gross_amount: i64,
    /// One of `bank_transfer`, `gopay` or `qris`; anything else is rejected with 400.
    #[serde(default)]
    #[schema(example = "bank_transfer")]
    pub payment_type: String,
    /// Virtual-account bank for `bank_transfer`; defaults to `bca`.
    #[schema(example = "bni")]
    pub bank_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[validate(length(min = 1, max = 50, message = "orderId must be 1-50 characters"))]
    #[schema(example = "order-1716132459000")]
    pub order_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusResponse {
    #[schema(example = "order-1716132459000")]
    pub order_id: String,
    /// Gateway status response, passed through unchanged.
    #[schema(value_type = Object)]
    pub status: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snap_request_uses_camel_case() {
        let request: SnapPaymentRequest =
            serde_json::from_value(json!({ "orderId": "order-1", "grossAmount": 10000 })).unwrap();
        assert_eq!(request.order_id, "order-1");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_snap_request_validation() {
        let request = SnapPaymentRequest {
            order_id: String::new(),
            gross_amount: 0,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("order_id"));
        assert!(fields.contains_key("gross_amount"));
    }

    #[test]
    fn test_core_request_payment_type_defaults_to_empty() {
        let request: CoreTransactionRequest =
            serde_json::from_value(json!({ "grossAmount": 20000 })).unwrap();
        assert_eq!(request.payment_type, "");
        assert!(request.bank_name.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_failure_response_shape() {
        let body = serde_json::to_value(GatewayFailureResponse {
            message: "Failed to get status".to_string(),
            error: json!({ "status_code": "404" }),
            http_status_code: Some(404),
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "message": "Failed to get status",
                "error": { "status_code": "404" },
                "httpStatusCode": 404
            })
        );
    }
}
