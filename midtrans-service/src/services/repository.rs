//! Invoice persistence.

use crate::models::{CreateInvoice, Invoice};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, instrument};

/// Create/read/update access to the `invoices` table.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn create(&self, input: &CreateInvoice) -> Result<Invoice, AppError>;

    /// First invoice recorded for `order_id`, if any.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Invoice>, AppError>;

    async fn update_status(&self, id: i64, status: &str) -> Result<Invoice, AppError>;

    /// Overwrite the status of every invoice for `order_id`; returns rows changed.
    async fn update_status_by_order_id(
        &self,
        order_id: &str,
        status: &str,
    ) -> Result<u64, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Postgres-backed invoice repository.
#[derive(Clone)]
pub struct PgInvoiceRepository {
    pool: PgPool,
}

impl PgInvoiceRepository {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "midtrans-service"))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the invoices table if it does not exist yet.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl InvoiceRepository for PgInvoiceRepository {
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    async fn create(&self, input: &CreateInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (order_id, gross_amount, status)
            VALUES ($1, $2, $3)
            RETURNING id, order_id, gross_amount, status, created_utc, updated_utc
            "#,
        )
        .bind(&input.order_id)
        .bind(input.gross_amount)
        .bind(&input.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        timer.observe_duration();

        info!(invoice_id = invoice.id, status = %invoice.status, "Invoice created");

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, order_id, gross_amount, status, created_utc, updated_utc
            FROM invoices
            WHERE order_id = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: i64, status: &str) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice_status"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = $2, updated_utc = NOW()
            WHERE id = $1
            RETURNING id, order_id, gross_amount, status, created_utc, updated_utc
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice status: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id)))?;

        timer.observe_duration();

        info!(invoice_id = id, status = %status, "Invoice status updated");

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn update_status_by_order_id(
        &self,
        order_id: &str,
        status: &str,
    ) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice_status_by_order"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2, updated_utc = NOW()
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice status: {}", e))
        })?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}

/// Process-local invoice store for tests and database-less development runs.
#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: Mutex<Vec<Invoice>>,
    next_id: AtomicI64,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored invoice, in insertion order.
    pub fn invoices(&self) -> Vec<Invoice> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Invoice>> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.invoices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn create(&self, input: &CreateInvoice) -> Result<Invoice, AppError> {
        let now = Utc::now();
        let invoice = Invoice {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            order_id: input.order_id.clone(),
            gross_amount: input.gross_amount,
            status: input.status.clone(),
            created_utc: now,
            updated_utc: now,
        };
        self.lock().push(invoice.clone());
        Ok(invoice)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Invoice>, AppError> {
        Ok(self
            .lock()
            .iter()
            .find(|invoice| invoice.order_id == order_id)
            .cloned())
    }

    async fn update_status(&self, id: i64, status: &str) -> Result<Invoice, AppError> {
        let mut invoices = self.lock();
        let invoice = invoices
            .iter_mut()
            .find(|invoice| invoice.id == id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id)))?;
        invoice.status = status.to_string();
        invoice.updated_utc = Utc::now();
        Ok(invoice.clone())
    }

    async fn update_status_by_order_id(
        &self,
        order_id: &str,
        status: &str,
    ) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut updated = 0;
        for invoice in self
            .lock()
            .iter_mut()
            .filter(|invoice| invoice.order_id == order_id)
        {
            invoice.status = status.to_string();
            invoice.updated_utc = now;
            updated += 1;
        }
        Ok(updated)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
