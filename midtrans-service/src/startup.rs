//! Application startup and lifecycle management.

use crate::config::Config;
use crate::services::{
    InMemoryInvoiceRepository, InvoiceRepository, MidtransClient, PaymentGateway,
    PgInvoiceRepository,
};
use crate::{build_router, AppState};
use axum::Router;
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// Port 0 binds a random port, which tests rely on.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let invoices = connect_invoice_store(&config).await?;

        let midtrans = MidtransClient::new(config.midtrans.clone());
        if midtrans.is_configured() {
            tracing::info!(
                environment = ?config.midtrans.environment,
                "Midtrans client initialized"
            );
        } else {
            tracing::warn!(
                "MIDTRANS_SERVER_KEY not configured - gateway calls and notifications will fail"
            );
        }
        let gateway: Arc<dyn PaymentGateway> = Arc::new(midtrans);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        let state = AppState {
            config,
            gateway,
            invoices,
        };

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("midtrans-service listening on port {}", self.port);
        axum::serve(self.listener, self.router).await
    }
}

async fn connect_invoice_store(config: &Config) -> Result<Arc<dyn InvoiceRepository>, AppError> {
    match &config.database.url {
        Some(url) => {
            let repository = PgInvoiceRepository::connect(
                url.expose_secret(),
                config.database.max_connections,
                config.database.min_connections,
            )
            .await?;
            repository.run_migrations().await?;
            Ok(Arc::new(repository))
        }
        None => {
            tracing::warn!("DATABASE_URL not set - invoices are kept in memory only");
            Ok(Arc::new(InMemoryInvoiceRepository::new()))
        }
    }
}
