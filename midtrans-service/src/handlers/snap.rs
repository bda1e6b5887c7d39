//! Snap (hosted checkout) handlers.

use axum::{extract::State, Json};

use crate::{
    dtos::{
        ErrorResponse, MessageResponse, PaymentNotification, SnapPaymentRequest,
        SnapPaymentResponse,
    },
    error::ApiError,
    models::CreateInvoice,
    services::{
        metrics::INVOICES_CREATED_TOTAL,
        midtrans::{SnapTransactionRequest, TransactionDetails},
        notification::sync_order_status,
    },
    utils::ValidatedJson,
    AppState,
};
use secrecy::ExposeSecret;

/// Create a Snap transaction and record a pending invoice for it.
#[utoipa::path(
    post,
    path = "/api/snap/payment",
    request_body = SnapPaymentRequest,
    responses(
        (status = 200, description = "Snap token and redirect URL created", body = SnapPaymentResponse),
        (status = 400, description = "Malformed request or rejected by Midtrans", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Failed to create transaction", body = ErrorResponse)
    ),
    tag = "Snap"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SnapPaymentRequest>,
) -> Result<Json<SnapPaymentResponse>, ApiError> {
    let request = SnapTransactionRequest {
        transaction_details: TransactionDetails {
            order_id: payload.order_id.clone(),
            gross_amount: payload.gross_amount,
        },
    };

    let transaction = state
        .gateway
        .create_snap_transaction(&request)
        .await
        .map_err(ApiError::Snap)?;

    state
        .invoices
        .create(&CreateInvoice::pending(
            payload.order_id.clone(),
            payload.gross_amount,
        ))
        .await?;
    INVOICES_CREATED_TOTAL.with_label_values(&["snap"]).inc();

    tracing::info!(order_id = %payload.order_id, "Snap payment created");

    Ok(Json(SnapPaymentResponse {
        token: transaction.token,
        redirect_url: transaction.redirect_url,
    }))
}

/// Snap payment notification; updates every invoice recorded for the order.
///
/// Notifications without a valid `signature_key` are rejected with 403 and
/// change nothing, the same as on the Core API callback.
#[utoipa::path(
    post,
    path = "/api/snap/payment-callback",
    request_body = PaymentNotification,
    responses(
        (status = 200, description = "Invoice status updated", body = MessageResponse),
        (status = 403, description = "Invalid signature", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    tag = "Snap"
)]
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(notification): Json<PaymentNotification>,
) -> Result<Json<MessageResponse>, ApiError> {
    sync_order_status(
        state.invoices.as_ref(),
        state.config.midtrans.server_key.expose_secret(),
        &notification,
    )
    .await?;

    Ok(Json(MessageResponse::new("Transaction updated")))
}
