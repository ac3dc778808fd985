//! # Database Persistence Layer
//!
//! MySQL persistence for the audit log via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set, every
//! verification call leaves one row in `audit_log`. When absent, the
//! service runs without audit persistence (suitable for development and
//! testing) and says so at startup.
//!
//! Schema migration is owned by the deployment, not this service; the
//! layer only inserts and reads rows.

pub mod audit_log;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

/// Initialize the database connection pool.
///
/// Returns `None` if `DATABASE_URL` is not set. Returns `Err` if the URL
/// is set but the connection fails.
pub async fn init_pool() -> Result<Option<MySqlPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set — audit records will not be persisted");
            return Ok(None);
        }
    };

    let pool = MySqlPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to MySQL");

    Ok(Some(pool))
}
