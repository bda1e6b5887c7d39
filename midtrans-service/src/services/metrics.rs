//! Prometheus metrics for midtrans-service.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

/// Handle for the `metrics` recorder fed by the HTTP middleware.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Gateway call counter by operation and outcome.
pub static GATEWAY_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "midtrans_gateway_requests_total",
        "Total number of Midtrans API calls",
        &["operation", "outcome"] // outcome: success, api_error, transport_error
    )
    .expect("Failed to register gateway_requests_total")
});

/// Gateway call latency by operation.
pub static GATEWAY_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "midtrans_gateway_request_duration_seconds",
        "Midtrans API call duration in seconds",
        &["operation"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register gateway_request_duration")
});

/// Webhook notifications by result.
pub static NOTIFICATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "midtrans_notifications_total",
        "Total number of payment notifications by result",
        &["result"] // updated, invalid_signature, not_found, error
    )
    .expect("Failed to register notifications_total")
});

/// Invoices created, by payment type.
pub static INVOICES_CREATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "midtrans_invoices_created_total",
        "Total number of invoices created by payment type",
        &["payment_type"]
    )
    .expect("Failed to register invoices_created_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "midtrans_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Install the HTTP metrics recorder and force the domain metrics.
///
/// Safe to call more than once; only the first call installs a recorder.
pub fn init_metrics() -> anyhow::Result<()> {
    if METRICS_HANDLE.get().is_none() {
        let handle = PrometheusBuilder::new().install_recorder()?;
        let _ = METRICS_HANDLE.set(handle);
    }

    Lazy::force(&GATEWAY_REQUESTS_TOTAL);
    Lazy::force(&GATEWAY_REQUEST_DURATION);
    Lazy::force(&NOTIFICATIONS_TOTAL);
    Lazy::force(&INVOICES_CREATED_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    if let Ok(domain_metrics) = encoder.encode_to_string(&metric_families) {
        output.push_str(&domain_metrics);
    }

    output
}

pub fn record_notification(result: &str) {
    NOTIFICATIONS_TOTAL.with_label_values(&[result]).inc();
}
