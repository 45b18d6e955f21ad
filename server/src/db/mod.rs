//! Postgres pool setup.
//!
//! The schema lives in `migrations/` and is embedded at compile time; it is
//! applied before the router starts.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connect to `database_url` and bring the schema up to date.
///
/// # Errors
///
/// Returns the SQLx error from connecting or from a failed migration.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new().max_connections(max_connections).connect(database_url).await?;
    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    tracing::info!(max_connections, "database ready");
    Ok(pool)
}
