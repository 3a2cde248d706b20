//! Database operations for the `product_cache` table.
//!
//! Each row caches the full extracted product record for one source URL.
//! Rows are keyed on the URL, so re-importing the same product overwrites
//! the previous entry in place rather than accumulating history.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `product_cache` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CachedProductRow {
    pub id: i64,
    pub url: String,
    pub platform: String,
    pub product_id: String,
    /// The full product record, stored as JSONB in the wire shape.
    pub record: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns the cached record for `url` if one exists and has not expired
/// as of `now`. Stale rows are left in place; they are overwritten by the
/// next successful import for the same URL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn lookup_fresh(
    pool: &PgPool,
    url: &str,
    now: DateTime<Utc>,
) -> Result<Option<CachedProductRow>, DbError> {
    let row = sqlx::query_as::<_, CachedProductRow>(
        "SELECT id, url, platform, product_id, record, expires_at, updated_at \
         FROM product_cache \
         WHERE url = $1 AND expires_at > $2",
    )
    .bind(url)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Upserts a cache entry for `url`.
///
/// Conflicts on `url` replace the stored record and push `expires_at`
/// forward, so a row never duplicates and stale entries are refreshed on
/// the next successful import.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_cached_product(
    pool: &PgPool,
    url: &str,
    platform: &str,
    product_id: &str,
    record: &serde_json::Value,
    expires_at: DateTime<Utc>,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO product_cache (url, platform, product_id, record, expires_at) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (url) DO UPDATE SET \
             platform   = EXCLUDED.platform, \
             product_id = EXCLUDED.product_id, \
             record     = EXCLUDED.record, \
             expires_at = EXCLUDED.expires_at, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(url)
    .bind(platform)
    .bind(product_id)
    .bind(record)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
