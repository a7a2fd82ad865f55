//! SQLite-backed persistence for submitted sites and their checks.
//!
//! The pool hands each repository call its own connection and takes it back
//! when the call returns, so no transaction spans two operations. The schema
//! lives in `migrations/` and is embedded at compile time.
use analyzer_common::AnalyzerError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

pub mod models;
pub mod repository;

pub use models::{NewCheck, Url, UrlCheck, UrlSummary};
pub use repository::Repository;

const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A URL with the same normalized name already exists.
    #[error("url already stored: {0}")]
    Duplicate(String),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AnalyzerError {
    fn from(err: StoreError) -> Self {
        AnalyzerError::Store(err.to_string())
    }
}

/// Open a connection pool, creating the database file if needed.
///
/// In-memory databases are private to a connection, so they get a pool of
/// exactly one connection that is never recycled.
pub async fn connect(database_url: &str) -> Result<SqlitePool, StoreError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(opts)
            .await?
    };
    info!(in_memory = is_in_memory(database_url), "store.connected");
    Ok(pool)
}

/// Apply pending schema migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("store.migrated");
    Ok(())
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:pages?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://page_analyzer.db?mode=rwc"));
    }

    #[test]
    fn store_errors_become_store_failures() {
        let err: AnalyzerError = StoreError::Duplicate("https://example.com".into()).into();
        assert!(matches!(err, AnalyzerError::Store(_)));
    }
}
