//! Database connection management.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::StoreBackend;
use crate::secrets::fetch_database_credentials;
use crate::store::{AppointmentStore, InMemoryAppointmentStore, PgAppointmentStore};
use crate::{Config, Error, Result};

/// Resolve connection options, pulling the password from Secrets Manager
/// when no full `DATABASE_URL` is configured.
async fn connect_options(config: &Config) -> Result<PgConnectOptions> {
    if let Some(url) = &config.database_url {
        return PgConnectOptions::from_str(url).map_err(Error::Database);
    }

    let secret_arn = config
        .db_secret_arn
        .as_deref()
        .ok_or_else(|| Error::Config("DATABASE_URL_SECRET_ARN not set".to_string()))?;

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

    fetch_database_credentials(&secrets_client, secret_arn)
        .await?
        .connect_options(config)
}

/// Create a database connection pool.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let options = connect_options(config).await?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
        .map_err(Error::Database)?;

    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Storage(format!("Migration failed: {}", e)))
}

/// Build the configured appointment store.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn AppointmentStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory appointment store");
            Ok(Arc::new(InMemoryAppointmentStore::new()))
        }
        StoreBackend::Postgres => {
            let pool = create_pool(config).await?;
            run_migrations(&pool).await?;
            info!("Using PostgreSQL appointment store");
            Ok(Arc::new(PgAppointmentStore::new(pool)))
        }
    }
}
