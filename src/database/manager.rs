use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Build the shared connection pool. The pool connects lazily so the router
/// can be constructed (and tests run) without a live database; the first
/// query pays the connection cost.
pub fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_lazy(&url)?;

    Ok(pool)
}

/// Apply embedded migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::migrate!().run(pool).await?;
    info!("database migrations applied");
    Ok(())
}

/// Ping the pool to verify connectivity.
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
