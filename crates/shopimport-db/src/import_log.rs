//! Database operations for the `import_log` table.
//!
//! The log is append-only. Every import attempt that reached extraction
//! produces exactly one row, successful or not; rows are never updated.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Outcome of an import attempt, stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Success,
    Failed,
}

impl ImportStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// A row from the `import_log` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportLogRow {
    pub id: i64,
    pub user_id: String,
    pub platform: String,
    pub url: String,
    /// `NULL` for failed attempts.
    pub record: Option<serde_json::Value>,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A log entry to append.
#[derive(Debug, Clone)]
pub struct NewImportLog<'a> {
    pub user_id: &'a str,
    pub platform: &'a str,
    pub url: &'a str,
    pub record: Option<&'a serde_json::Value>,
    pub status: ImportStatus,
    pub error_message: Option<&'a str>,
}

/// Appends one entry to the import log and returns its `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_import_log(pool: &PgPool, entry: &NewImportLog<'_>) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO import_log (user_id, platform, url, record, status, error_message) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(entry.user_id)
    .bind(entry.platform)
    .bind(entry.url)
    .bind(entry.record)
    .bind(entry.status.as_str())
    .bind(entry.error_message)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns the most recent log entries for one user, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_imports(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<ImportLogRow>, DbError> {
    let rows = sqlx::query_as::<_, ImportLogRow>(
        "SELECT id, user_id, platform, url, record, status, error_message, created_at \
         FROM import_log \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the most recent log entries across all users, newest first.
/// Used by operator tooling; the HTTP surface only ever reads per-user.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_recent_imports(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ImportLogRow>, DbError> {
    let rows = sqlx::query_as::<_, ImportLogRow>(
        "SELECT id, user_id, platform, url, record, status, error_message, created_at \
         FROM import_log \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
