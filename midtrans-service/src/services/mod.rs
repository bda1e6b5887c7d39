pub mod charge;
pub mod metrics;
pub mod midtrans;
pub mod notification;
pub mod repository;

pub use metrics::{get_metrics, init_metrics};
pub use midtrans::{MidtransClient, PaymentGateway};
pub use repository::{InMemoryInvoiceRepository, InvoiceRepository, PgInvoiceRepository};
