//! Core API handlers: direct charges, order lookups and notifications.

use axum::{
    extract::{Path, State},
    Json,
};
use secrecy::ExposeSecret;
use serde_json::Value;
use validator::Validate;

use crate::{
    dtos::{
        CoreTransactionRequest, ErrorResponse, GatewayFailureResponse, MessageResponse,
        OrderRequest, PaymentNotification, TransactionStatusResponse,
    },
    error::{ApiError, OrderAction},
    models::{CreateInvoice, DEFAULT_INVOICE_STATUS},
    services::{
        charge::{ChargeRequest, PaymentType},
        metrics::INVOICES_CREATED_TOTAL,
        notification::apply_notification,
    },
    utils::{generate_order_id, JsonBody, ValidatedJson},
    AppState,
};

/// Charge with a method-specific payload and record the resulting invoice.
///
/// The payment type is checked before the amount, so an unknown, empty or
/// missing selector is always a 400.
#[utoipa::path(
    post,
    path = "/api/core/transaction",
    request_body = CoreTransactionRequest,
    responses(
        (status = 200, description = "Charge response from Midtrans"),
        (status = 400, description = "Unsupported payment type or malformed request", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Charge failed", body = ErrorResponse)
    ),
    tag = "Core API"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CoreTransactionRequest>,
) -> Result<Json<Value>, ApiError> {
    let payment_type: PaymentType = payload.payment_type.parse()?;
    payload.validate()?;
    let order_id = generate_order_id();

    let request = ChargeRequest::new(
        order_id.clone(),
        payload.gross_amount,
        payment_type,
        payload.bank_name.as_deref(),
        &state.config.midtrans,
    );

    let response = state
        .gateway
        .charge(&request)
        .await
        .map_err(ApiError::Charge)?;

    let status = response
        .get("transaction_status")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_INVOICE_STATUS);

    state
        .invoices
        .create(&CreateInvoice {
            order_id: order_id.clone(),
            gross_amount: payload.gross_amount,
            status: status.to_string(),
        })
        .await?;
    INVOICES_CREATED_TOTAL
        .with_label_values(&[payment_type.as_str()])
        .inc();

    tracing::info!(
        order_id = %order_id,
        payment_type = %payment_type,
        status = %status,
        "Core transaction created"
    );

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/core/transaction-status/{orderId}",
    params(
        ("orderId" = String, Path, description = "Order id of the transaction")
    ),
    responses(
        (status = 200, description = "Current transaction status", body = TransactionStatusResponse),
        (status = 400, description = "Failed to get status", body = GatewayFailureResponse)
    ),
    tag = "Core API"
)]
pub async fn transaction_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<TransactionStatusResponse>, ApiError> {
    let status = state
        .gateway
        .status(&order_id)
        .await
        .map_err(ApiError::lookup(OrderAction::Status))?;

    Ok(Json(TransactionStatusResponse { order_id, status }))
}

#[utoipa::path(
    post,
    path = "/api/core/transaction-cancel",
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Cancel response from Midtrans"),
        (status = 400, description = "Failed to cancel transaction", body = GatewayFailureResponse)
    ),
    tag = "Core API"
)]
pub async fn cancel_transaction(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<OrderRequest>,
) -> Result<Json<Value>, ApiError> {
    let response = state
        .gateway
        .cancel(&payload.order_id)
        .await
        .map_err(ApiError::lookup(OrderAction::Cancel))?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/core/transaction-expire",
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Expire response from Midtrans"),
        (status = 400, description = "Failed to expire transaction", body = GatewayFailureResponse)
    ),
    tag = "Core API"
)]
pub async fn expire_transaction(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<OrderRequest>,
) -> Result<Json<Value>, ApiError> {
    let response = state
        .gateway
        .expire(&payload.order_id)
        .await
        .map_err(ApiError::lookup(OrderAction::Expire))?;

    Ok(Json(response))
}

/// Payment notification for Core API transactions.
///
/// The signature is checked before the invoice is looked up.
#[utoipa::path(
    post,
    path = "/api/core/transaction-callback",
    request_body = PaymentNotification,
    responses(
        (status = 200, description = "Invoice status updated", body = MessageResponse),
        (status = 403, description = "Invalid signature", body = MessageResponse),
        (status = 404, description = "Transaction not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    tag = "Core API"
)]
pub async fn transaction_callback(
    State(state): State<AppState>,
    Json(notification): Json<PaymentNotification>,
) -> Result<Json<MessageResponse>, ApiError> {
    apply_notification(
        state.invoices.as_ref(),
        state.config.midtrans.server_key.expose_secret(),
        &notification,
    )
    .await?;

    Ok(Json(MessageResponse::new("Transaction updated")))
}
