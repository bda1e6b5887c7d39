use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const SANDBOX_SNAP_BASE_URL: &str = "https://app.sandbox.midtrans.com";
pub const SANDBOX_API_BASE_URL: &str = "https://api.sandbox.midtrans.com";
pub const PRODUCTION_SNAP_BASE_URL: &str = "https://app.midtrans.com";
pub const PRODUCTION_API_BASE_URL: &str = "https://api.midtrans.com";

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub midtrans: MidtransConfig,
    pub service_name: String,
}

/// Deployment environment of the service itself.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Interactive API docs are only mounted outside production.
    pub fn docs_enabled(&self) -> bool {
        *self != Environment::Production
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    /// Postgres URL. `None` keeps invoices in memory (development only).
    pub url: Option<Secret<String>>,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Which Midtrans environment the credentials belong to.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MidtransEnvironment {
    Sandbox,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct MidtransConfig {
    pub server_key: Secret<String>,
    pub environment: MidtransEnvironment,
    /// Redirect target for GoPay deeplinks after payment.
    pub callback_url: Option<String>,
    pub snap_base_url: String,
    pub api_base_url: String,
}

impl MidtransConfig {
    /// Build a config for the given environment using its default endpoints.
    pub fn new(server_key: impl Into<String>, environment: MidtransEnvironment) -> Self {
        let (snap_base_url, api_base_url) = match environment {
            MidtransEnvironment::Sandbox => (SANDBOX_SNAP_BASE_URL, SANDBOX_API_BASE_URL),
            MidtransEnvironment::Production => {
                (PRODUCTION_SNAP_BASE_URL, PRODUCTION_API_BASE_URL)
            }
        };

        Self {
            server_key: Secret::new(server_key.into()),
            environment,
            callback_url: None,
            snap_base_url: snap_base_url.to_string(),
            api_base_url: api_base_url.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.server_key.expose_secret().is_empty()
    }

    /// GoPay callback settings: enabled only when a callback URL is configured.
    pub fn gopay_callback(&self) -> (bool, String) {
        match self.callback_url.as_deref() {
            Some(url) if !url.is_empty() => (true, url.to_string()),
            _ => (false, String::new()),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;
        Self::from_vars(common, |key| env::var(key).ok())
    }

    /// Assemble the configuration from a variable lookup.
    pub fn from_vars<F>(mut common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let environment = Environment::parse(var("APP_ENV").as_deref());
        let is_prod = environment == Environment::Production;

        if let Some(port) = var("PORT") {
            common.port = port.parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid PORT '{}': {}", port, e))
            })?;
        }

        let database_url = var("DATABASE_URL");
        if is_prod && database_url.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_URL is required in production but not set"
            )));
        }
        let max_connections = parse_or(var("DATABASE_MAX_CONNECTIONS"), 10)?;
        let min_connections = parse_or(var("DATABASE_MIN_CONNECTIONS"), 1)?;

        let server_key = var("MIDTRANS_SERVER_KEY").unwrap_or_default();
        if is_prod && server_key.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MIDTRANS_SERVER_KEY is required in production but not set"
            )));
        }
        let midtrans_environment = match var("MIDTRANS_ENV").as_deref() {
            Some("production") => MidtransEnvironment::Production,
            _ => MidtransEnvironment::Sandbox,
        };

        let mut midtrans = MidtransConfig::new(server_key, midtrans_environment);
        midtrans.callback_url = var("MIDTRANS_CALLBACK_URL");
        if let Some(url) = var("MIDTRANS_SNAP_BASE_URL") {
            midtrans.snap_base_url = url;
        }
        if let Some(url) = var("MIDTRANS_API_BASE_URL") {
            midtrans.api_base_url = url;
        }

        Ok(Self {
            common,
            environment,
            database: DatabaseConfig {
                url: database_url.map(Secret::new),
                max_connections,
                min_connections,
            },
            midtrans,
            service_name: "midtrans-service".to_string(),
        })
    }
}

fn parse_or(value: Option<String>, default: u32) -> Result<u32, AppError> {
    match value {
        Some(raw) => raw.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid number '{}': {}", raw, e))
        }),
        None => Ok(default),
    }
}
