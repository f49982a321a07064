//! Database connection pool management

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::{ConfigError, DatabaseSettings};

/// Errors from building the pool
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Create a PostgreSQL connection pool from settings.
///
/// Connects eagerly, so an unreachable database fails here instead of on
/// the first request.
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, PoolError> {
    let options = settings.connect_options()?;
    let pool = create_pool_with_options(options, settings.max_connections).await?;
    Ok(pool)
}

/// Create a PostgreSQL connection pool with explicit options.
pub async fn create_pool_with_options(
    options: PgConnectOptions,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p reviewctl-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let settings = DatabaseSettings {
            url: Some(url),
            ..Default::default()
        };
        let pool = create_pool(&settings).await.expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    async fn missing_settings_fail_before_connecting() {
        let err = create_pool(&DatabaseSettings::default()).await.unwrap_err();
        assert!(matches!(err, PoolError::Config(ConfigError::MissingDatabase)));
    }
}
