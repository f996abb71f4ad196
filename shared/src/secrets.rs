//! Database credentials stored in AWS Secrets Manager.
//!
//! The secret is the JSON document RDS writes for managed credentials. Any
//! field it leaves out falls back to the service configuration. The lookup
//! runs once per cold start, when the pool is built.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use tracing::debug;

use crate::{Config, Error, Result};

/// Credentials document for the appointment database.
#[derive(Debug, Deserialize)]
pub struct DatabaseCredentials {
    pub username: Option<String>,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

impl DatabaseCredentials {
    /// Decode the secret's string value.
    pub fn from_secret_string(secret: &str) -> Result<Self> {
        serde_json::from_str(secret)
            .map_err(|e| Error::Config(format!("Malformed database secret: {}", e)))
    }

    /// Connection options for the appointment store, preferring the secret
    /// over `DATABASE_HOST` / `DATABASE_USER` / `DATABASE_NAME`.
    pub fn connect_options(&self, config: &Config) -> Result<PgConnectOptions> {
        let host = self
            .host
            .as_deref()
            .or(config.db_host.as_deref())
            .ok_or_else(|| Error::Config("DATABASE_HOST not set and secret has no host".to_string()))?;

        let mut options = PgConnectOptions::new()
            .host(host)
            .username(self.username.as_deref().unwrap_or(&config.db_user))
            .password(&self.password)
            .database(self.dbname.as_deref().unwrap_or(&config.db_name));
        if let Some(port) = self.port {
            options = options.port(port);
        }

        Ok(options)
    }
}

/// Fetch and decode the credentials secret named by `secret_arn`.
pub async fn fetch_database_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<DatabaseCredentials> {
    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to read database secret {}: {}", secret_arn, e)))?;

    let secret = response
        .secret_string()
        .ok_or_else(|| Error::Aws(format!("Database secret {} is binary", secret_arn)))?;

    debug!("Loaded database credentials from {}", secret_arn);
    DatabaseCredentials::from_secret_string(secret)
}
