pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use services::{InvoiceRepository, PaymentGateway};

pub use startup::Application;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::readiness_check,
        handlers::snap::create_payment,
        handlers::snap::payment_callback,
        handlers::core_api::create_transaction,
        handlers::core_api::transaction_status,
        handlers::core_api::cancel_transaction,
        handlers::core_api::expire_transaction,
        handlers::core_api::transaction_callback,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::GatewayFailureResponse,
            dtos::SnapPaymentRequest,
            dtos::SnapPaymentResponse,
            dtos::CoreTransactionRequest,
            dtos::OrderRequest,
            dtos::TransactionStatusResponse,
            dtos::PaymentNotification,
            services::charge::PaymentType,
            models::Invoice,
        )
    ),
    tags(
        (name = "Snap", description = "Hosted checkout transactions"),
        (name = "Core API", description = "Direct charges, order lookups and notifications"),
        (name = "Operations", description = "Health and readiness probes")
    ),
    info(
        title = "Midtrans Payment API",
        description = "Payment gateway backend for Midtrans Snap and Core API"
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn PaymentGateway>,
    pub invoices: Arc<dyn InvoiceRepository>,
}

pub fn build_router(state: AppState) -> Router {
    let snap_routes = Router::new()
        .route("/payment", post(handlers::snap::create_payment))
        .route("/payment-callback", post(handlers::snap::payment_callback));

    let core_routes = Router::new()
        .route("/transaction", post(handlers::core_api::create_transaction))
        .route(
            "/transaction-status/:order_id",
            get(handlers::core_api::transaction_status),
        )
        .route(
            "/transaction-cancel",
            post(handlers::core_api::cancel_transaction),
        )
        .route(
            "/transaction-expire",
            post(handlers::core_api::expire_transaction),
        )
        .route(
            "/transaction-callback",
            post(handlers::core_api::transaction_callback),
        );

    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/snap", snap_routes)
        .nest("/api/core", core_routes);

    if state.config.environment.docs_enabled() {
        app = app.merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    // Outermost layer runs first: the request id is assigned before the span reads it.
    app.with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
}
