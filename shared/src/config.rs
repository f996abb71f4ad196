//! Configuration management for the appointment Lambda.

use std::env;

use crate::{Error, Result};

/// Which storage adapter backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(Error::Config(format!("Unknown STORE_BACKEND: {}", other))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage adapter
    pub store_backend: StoreBackend,
    /// Full connection string, takes precedence over the host/name settings
    pub database_url: Option<String>,
    /// Database host
    pub db_host: Option<String>,
    /// Database name
    pub db_name: String,
    /// Database user, used when the secret carries no username
    pub db_user: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: Option<String>,
    /// Connection pool size
    pub db_max_connections: u32,
    /// AWS region
    pub aws_region: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => StoreBackend::parse(&value)?,
            None => StoreBackend::default(),
        };

        let db_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.parse().map_err(|_| {
                Error::Config(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", value))
            })?,
            None => 5,
        };

        let config = Self {
            store_backend,
            database_url: lookup("DATABASE_URL"),
            db_host: lookup("DATABASE_HOST"),
            db_name: lookup("DATABASE_NAME").unwrap_or_else(|| "appointments".to_string()),
            db_user: lookup("DATABASE_USER").unwrap_or_else(|| "postgres".to_string()),
            db_secret_arn: lookup("DATABASE_URL_SECRET_ARN"),
            db_max_connections,
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        };

        if config.store_backend == StoreBackend::Postgres
            && config.database_url.is_none()
            && config.db_secret_arn.is_none()
        {
            return Err(Error::Config(
                "Postgres backend requires DATABASE_URL or DATABASE_URL_SECRET_ARN"
                    .to_string(),
            ));
        }

        Ok(config)
    }
}
