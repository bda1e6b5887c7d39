//! Invoice model: the local record kept for each gateway transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Status assigned before the gateway reports anything else.
pub const DEFAULT_INVOICE_STATUS: &str = "pending";

/// Invoice row.
///
/// `status` holds the gateway's `transaction_status` verbatim (`pending`,
/// `settlement`, `capture`, `deny`, `cancel`, `expire`, `refund`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Invoice {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "order-1716132459000")]
    pub order_id: String,
    #[schema(example = 50000)]
    pub gross_amount: i64,
    #[schema(example = "pending")]
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub order_id: String,
    pub gross_amount: i64,
    pub status: String,
}

impl CreateInvoice {
    pub fn pending(order_id: impl Into<String>, gross_amount: i64) -> Self {
        Self {
            order_id: order_id.into(),
            gross_amount,
            status: DEFAULT_INVOICE_STATUS.to_string(),
        }
    }
}
