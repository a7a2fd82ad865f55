//! Queries over `urls` and `url_checks`.
//!
//! Every method is a single atomic operation; writes run in their own
//! transaction, which rolls back if the future errors before `commit`.
use crate::models::{NewCheck, Url, UrlCheck, UrlSummary};
use crate::StoreError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new URL and return its id.
    ///
    /// A name that is already stored yields [`StoreError::Duplicate`].
    pub async fn save_url(&self, name: &str) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r#"INSERT INTO urls (name, created_at)
               VALUES (?1, ?2)
               RETURNING id"#,
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                warn!(name=%name, "store.save_url.duplicate");
                return Err(StoreError::Duplicate(name.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let id: i64 = row.try_get("id")?;
        tx.commit().await?;

        info!(url_id = id, name=%name, "store.save_url");
        Ok(id)
    }

    pub async fn find_url_by_id(&self, id: i64) -> Result<Option<Url>, StoreError> {
        let row = sqlx::query(
            r#"SELECT id, name, created_at
               FROM urls
               WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        debug!(url_id = id, found = row.is_some(), "store.find_url_by_id");
        row.as_ref().map(url_from_row).transpose()
    }

    pub async fn find_url_by_name(&self, name: &str) -> Result<Option<Url>, StoreError> {
        let row = sqlx::query(
            r#"SELECT id, name, created_at
               FROM urls
               WHERE name = ?1"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        debug!(name=%name, found = row.is_some(), "store.find_url_by_name");
        row.as_ref().map(url_from_row).transpose()
    }

    /// One row per URL, newest URL first, joined with its latest check.
    ///
    /// "Latest" is the highest `created_at`, ties going to the higher id.
    pub async fn list_urls_with_last_check(&self) -> Result<Vec<UrlSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
              u.id,
              u.name,
              u.created_at,
              c.status_code AS last_status_code,
              c.created_at  AS last_check_at
            FROM urls u
            LEFT JOIN url_checks c ON c.id = (
              SELECT lc.id
              FROM url_checks lc
              WHERE lc.url_id = u.id
              ORDER BY lc.created_at DESC, lc.id DESC
              LIMIT 1
            )
            ORDER BY u.created_at DESC, u.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        info!(rows = rows.len(), "store.list_urls_with_last_check");

        rows.iter()
            .map(|r| -> Result<UrlSummary, StoreError> {
                Ok(UrlSummary {
                    id: r.try_get("id")?,
                    name: r.try_get("name")?,
                    created_at: r.try_get("created_at")?,
                    last_check_at: r.try_get::<Option<DateTime<Utc>>, _>("last_check_at")?,
                    last_status_code: status_from_db(r.try_get("last_status_code")?),
                })
            })
            .collect()
    }

    /// All checks of one URL, newest first.
    pub async fn list_checks_for_url(&self, url_id: i64) -> Result<Vec<UrlCheck>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, url_id, status_code, title, h1, description, created_at
               FROM url_checks
               WHERE url_id = ?1
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(url_id)
        .fetch_all(&self.pool)
        .await?;
        debug!(url_id, rows = rows.len(), "store.list_checks_for_url");
        rows.iter().map(check_from_row).collect()
    }

    /// Append a check for `url_id` and return its id.
    pub async fn save_check(&self, url_id: i64, check: NewCheck) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"INSERT INTO url_checks
               (url_id, status_code, title, h1, description, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               RETURNING id"#,
        )
        .bind(url_id)
        .bind(check.status_code.map(i64::from))
        .bind(check.title.as_deref())
        .bind(check.h1.as_deref())
        .bind(check.description.as_deref())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        let id: i64 = row.try_get("id")?;
        tx.commit().await?;

        info!(
            url_id,
            check_id = id,
            status_code = ?check.status_code,
            "store.save_check"
        );
        Ok(id)
    }
}

fn url_from_row(r: &SqliteRow) -> Result<Url, StoreError> {
    Ok(Url {
        id: r.try_get("id")?,
        name: r.try_get("name")?,
        created_at: r.try_get("created_at")?,
    })
}

fn check_from_row(r: &SqliteRow) -> Result<UrlCheck, StoreError> {
    Ok(UrlCheck {
        id: r.try_get("id")?,
        url_id: r.try_get("url_id")?,
        status_code: status_from_db(r.try_get("status_code")?),
        title: r.try_get("title")?,
        h1: r.try_get("h1")?,
        description: r.try_get("description")?,
        created_at: r.try_get("created_at")?,
    })
}

// NOTE: out-of-range values can only come from rows written outside this crate.
fn status_from_db(raw: Option<i64>) -> Option<u16> {
    raw.and_then(|code| u16::try_from(code).ok())
}
