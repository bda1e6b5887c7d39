//! Domain models for midtrans-service.

mod invoice;

pub use invoice::{CreateInvoice, Invoice, DEFAULT_INVOICE_STATUS};
