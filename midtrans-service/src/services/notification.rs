//! Payment notification (webhook) processing.
//!
//! A notification is only trusted after its `signature_key` matches
//! SHA512(order_id + status_code + gross_amount + server_key). Nothing is read
//! from or written to the invoice store before that check passes.

use crate::models::Invoice;
use crate::services::metrics::record_notification;
use crate::services::repository::InvoiceRepository;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use service_core::error::AppError;
use service_core::utils::verify_notification_signature;
use thiserror::Error;
use utoipa::ToSchema;

/// HTTP notification body sent by Midtrans on a transaction status change.
///
/// Fields default to empty strings so an incomplete payload fails signature
/// verification instead of being rejected as malformed JSON.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PaymentNotification {
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(example = "order-1716132459000")]
    pub order_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(example = "200")]
    pub status_code: String,
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(example = "50000.00")]
    pub gross_amount: String,
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(example = "2496c78cac93a70ca08014bdaaff08eb7119ef79ef69c4833d4399cada077147febc1a231992eb8665a7e26d89b1dc323c13f721d21c7485f70bff06cca6eed3")]
    pub signature_key: String,
    #[serde(default, deserialize_with = "string_or_number")]
    #[schema(example = "settlement")]
    pub transaction_status: String,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Transaction not found")]
    InvoiceNotFound,

    #[error("Failed to persist notification: {0}")]
    Repository(#[from] AppError),
}

impl NotificationError {
    fn metric_label(&self) -> &'static str {
        match self {
            NotificationError::InvalidSignature => "invalid_signature",
            NotificationError::InvoiceNotFound => "not_found",
            NotificationError::Repository(_) => "error",
        }
    }
}

impl PaymentNotification {
    /// Check `signature_key` against the merchant server key.
    ///
    /// Always fails when no server key is configured.
    pub fn verify(&self, server_key: &str) -> Result<(), NotificationError> {
        let valid = !server_key.is_empty()
            && verify_notification_signature(
                &self.order_id,
                &self.status_code,
                &self.gross_amount,
                server_key,
                &self.signature_key,
            );

        if valid {
            Ok(())
        } else {
            tracing::warn!(order_id = %self.order_id, "Notification signature verification failed");
            Err(NotificationError::InvalidSignature)
        }
    }
}

/// Verify a notification and overwrite the matching invoice's status.
///
/// Fails with `InvoiceNotFound` when no invoice exists for the order.
pub async fn apply_notification(
    invoices: &dyn InvoiceRepository,
    server_key: &str,
    notification: &PaymentNotification,
) -> Result<Invoice, NotificationError> {
    let result = async {
        notification.verify(server_key)?;

        let invoice = invoices
            .find_by_order_id(&notification.order_id)
            .await?
            .ok_or(NotificationError::InvoiceNotFound)?;

        let updated = invoices
            .update_status(invoice.id, &notification.transaction_status)
            .await?;
        Ok::<_, NotificationError>(updated)
    }
    .await;

    match &result {
        Ok(invoice) => {
            record_notification("updated");
            tracing::info!(
                order_id = %invoice.order_id,
                status = %invoice.status,
                "Invoice updated from notification"
            );
        }
        Err(e) => {
            record_notification(e.metric_label());
            if !matches!(e, NotificationError::InvalidSignature) {
                tracing::warn!(order_id = %notification.order_id, error = %e, "Notification not applied");
            }
        }
    }

    result
}

/// Verify a notification and overwrite the status of every invoice for its order.
///
/// Returns the number of invoices changed; zero is not an error.
pub async fn sync_order_status(
    invoices: &dyn InvoiceRepository,
    server_key: &str,
    notification: &PaymentNotification,
) -> Result<u64, NotificationError> {
    let result = async {
        notification.verify(server_key)?;
        let updated = invoices
            .update_status_by_order_id(&notification.order_id, &notification.transaction_status)
            .await?;
        Ok::<_, NotificationError>(updated)
    }
    .await;

    match &result {
        Ok(0) => {
            record_notification("not_found");
            tracing::warn!(order_id = %notification.order_id, "Notification matched no invoice");
        }
        Ok(updated) => {
            record_notification("updated");
            tracing::info!(
                order_id = %notification.order_id,
                status = %notification.transaction_status,
                updated = updated,
                "Invoices updated from notification"
            );
        }
        Err(e) => record_notification(e.metric_label()),
    }

    result
}

/// Accept JSON strings and numbers, stringifying numbers as JavaScript would.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(js_number_string(&n)),
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// `String(n)` in JavaScript: integral floats lose their fraction (`10000.00` -> `"10000"`).
fn js_number_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        // f64's Display is the shortest round-trip form without a trailing `.0`.
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
