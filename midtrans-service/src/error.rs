//! Route-level failures and their response shapes.

use crate::dtos::{ErrorResponse, GatewayFailureResponse, MessageResponse};
use crate::services::charge::UnsupportedPaymentType;
use crate::services::midtrans::GatewayError;
use crate::services::notification::NotificationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use thiserror::Error;

/// Lookup operation against an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Status,
    Cancel,
    Expire,
}

impl OrderAction {
    fn failure_message(&self) -> &'static str {
        match self {
            OrderAction::Status => "Failed to get status",
            OrderAction::Cancel => "Failed to cancel transaction",
            OrderAction::Expire => "Failed to expire transaction",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Snap transaction creation failed; answered with the gateway's HTTP status.
    #[error("{0}")]
    Snap(GatewayError),

    /// Core charge failed; answered with the `status_code` the gateway reported.
    #[error("{0}")]
    Charge(GatewayError),

    #[error("{source}")]
    OrderLookup {
        action: OrderAction,
        source: GatewayError,
    },

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    UnsupportedPaymentType(#[from] UnsupportedPaymentType),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    App(#[from] AppError),
}

impl ApiError {
    pub fn lookup(action: OrderAction) -> impl FnOnce(GatewayError) -> ApiError {
        move |source| ApiError::OrderLookup { action, source }
    }
}

/// Error status to answer with, falling back to 500 for anything that is not an HTTP error code.
fn error_status(code: Option<u16>) -> StatusCode {
    code.filter(|code| *code >= 400)
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Snap(err) => (
                error_status(err.http_status()),
                Json(ErrorResponse {
                    error: err.message(),
                }),
            )
                .into_response(),
            ApiError::Charge(err) => (
                error_status(err.status_code()),
                Json(ErrorResponse {
                    error: err.message(),
                }),
            )
                .into_response(),
            ApiError::OrderLookup { action, source } => (
                StatusCode::BAD_REQUEST,
                Json(GatewayFailureResponse {
                    message: action.failure_message().to_string(),
                    error: source.response_body(),
                    http_status_code: source.status_code(),
                }),
            )
                .into_response(),
            ApiError::Notification(err) => {
                let (status, message) = match &err {
                    NotificationError::InvalidSignature => {
                        (StatusCode::FORBIDDEN, "Invalid signature")
                    }
                    NotificationError::InvoiceNotFound => {
                        (StatusCode::NOT_FOUND, "Transaction not found")
                    }
                    NotificationError::Repository(e) => {
                        tracing::error!(error = %e, "Failed to process notification");
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    }
                };
                (status, Json(MessageResponse::new(message))).into_response()
            }
            ApiError::UnsupportedPaymentType(_) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Unsupported payment type".to_string(),
                }),
            )
                .into_response(),
            ApiError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: format!("Validation error: {}", err),
                }),
            )
                .into_response(),
            ApiError::App(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_error(http_status: u16, status_code: Option<u16>) -> GatewayError {
        GatewayError::Api {
            http_status,
            status_code,
            message: "Transaction doesn't exist.".to_string(),
            body: json!({ "status_code": "404", "status_message": "Transaction doesn't exist." }),
        }
    }

    #[test]
    fn test_charge_uses_gateway_status_code() {
        let response = ApiError::Charge(api_error(200, Some(404))).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_snap_uses_http_status() {
        let response = ApiError::Snap(api_error(401, None)).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_charge_without_code_is_internal_error() {
        let response = ApiError::Charge(GatewayError::NotConfigured).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_lookup_failure_is_bad_request() {
        let response = ApiError::OrderLookup {
            action: OrderAction::Cancel,
            source: api_error(404, Some(404)),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_failure_is_unprocessable() {
        let response = ApiError::Validation(validator::ValidationErrors::new()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_notification_statuses() {
        let status = |err| ApiError::Notification(err).into_response().status();
        assert_eq!(status(NotificationError::InvalidSignature), StatusCode::FORBIDDEN);
        assert_eq!(status(NotificationError::InvoiceNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(NotificationError::Repository(AppError::DatabaseError(
                anyhow::anyhow!("connection reset")
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
