//! Postgres pool and the account schema.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` opens the pool once and applies `migrations/` (`users`, `admins`)
//! before the listener is bound, so no request ever sees a missing table.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::ServerConfig;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect with the configured pool size and run pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn init_pool(config: &ServerConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    tracing::info!(max_connections = config.db_max_connections, "account schema ready");
    Ok(pool)
}
