//! The import pipeline: rate check, platform detection, cache lookup,
//! extraction, cache write, and the audit log entry.
//!
//! Every run that passes platform detection appends exactly one log row,
//! whether it ends in a cache hit, a fresh extraction, or an extraction
//! failure. Rejections caused by user input (rate limit, unknown platform,
//! malformed URL) never reach the log.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use shopimport_core::Platform;
use shopimport_db::{ImportStatus, NewImportLog};
use shopimport_scraper::{extract_product, product_id_for, ScrapeError};

use crate::api::AppState;
use crate::rate_limit::RateDecision;

/// Terminal failure of one import run, already classified for the caller.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("unsupported platform for url '{url}'")]
    UnsupportedPlatform { url: String },
    #[error("invalid {platform} url: {reason}")]
    InvalidUrl { platform: &'static str, reason: String },
    #[error(transparent)]
    Extraction(ScrapeError),
    #[error("storage failure: {0}")]
    Storage(#[from] shopimport_db::DbError),
}

/// A completed import: the record plus where it came from.
#[derive(Debug)]
pub struct ImportOutcome {
    pub record: serde_json::Value,
    pub cached: bool,
    pub cache_expires_at: Option<DateTime<Utc>>,
}

/// Runs the full pipeline for one authenticated request.
///
/// # Errors
///
/// Returns an [`ImportError`] classifying the failure; the caller maps it to
/// an HTTP status. Extraction failures have already been recorded in the
/// import log by the time this returns.
pub async fn run_import(
    state: &AppState,
    user_id: &str,
    url: &str,
    use_cache: bool,
) -> Result<ImportOutcome, ImportError> {
    if let RateDecision::Denied { retry_after_secs } = state.rate_limiter.check(user_id).await {
        tracing::info!(user_id, retry_after_secs, "rate limit exceeded");
        return Err(ImportError::RateLimited { retry_after_secs });
    }

    let platform = Platform::identify(url).ok_or_else(|| ImportError::UnsupportedPlatform {
        url: url.to_string(),
    })?;
    if product_id_for(platform, url).is_none() {
        return Err(ImportError::InvalidUrl {
            platform: platform.as_str(),
            reason: "could not derive a product id from the URL path".to_string(),
        });
    }

    if use_cache {
        match shopimport_db::lookup_fresh(&state.pool, url, Utc::now()).await {
            Ok(Some(entry)) => {
                tracing::debug!(url, platform = %platform, "cache hit");
                log_attempt(state, user_id, platform, url, Ok(&entry.record)).await?;
                return Ok(ImportOutcome {
                    record: entry.record,
                    cached: true,
                    cache_expires_at: Some(entry.expires_at),
                });
            }
            Ok(None) => {}
            // A failed read degrades to a miss; the cache is an optimization.
            Err(e) => tracing::warn!(url, error = %e, "cache lookup failed, treating as miss"),
        }
    }

    let record = match extract_product(&state.fetcher, url).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(url, platform = %platform, error = %e, "extraction failed");
            let message = e.to_string();
            log_attempt(state, user_id, platform, url, Err(&message)).await?;
            return Err(ImportError::Extraction(e));
        }
    };

    let value = serde_json::to_value(&record).map_err(|e| {
        ImportError::Extraction(ScrapeError::Parse {
            url: url.to_string(),
            reason: format!("record serialization failed: {e}"),
        })
    })?;

    let expires_at = Utc::now() + Duration::days(state.cache_ttl_days);
    let cache_expires_at = match shopimport_db::upsert_cached_product(
        &state.pool,
        url,
        platform.as_str(),
        &record.source.product_id,
        &value,
        expires_at,
    )
    .await
    {
        Ok(_) => Some(expires_at),
        // A failed write does not fail the import; the record still goes out.
        Err(e) => {
            tracing::warn!(url, error = %e, "cache write failed");
            None
        }
    };

    log_attempt(state, user_id, platform, url, Ok(&value)).await?;

    Ok(ImportOutcome {
        record: value,
        cached: false,
        cache_expires_at,
    })
}

/// Appends the single audit row for a run that passed platform detection.
async fn log_attempt(
    state: &AppState,
    user_id: &str,
    platform: Platform,
    url: &str,
    outcome: Result<&serde_json::Value, &str>,
) -> Result<(), ImportError> {
    let entry = match outcome {
        Ok(record) => NewImportLog {
            user_id,
            platform: platform.as_str(),
            url,
            record: Some(record),
            status: ImportStatus::Success,
            error_message: None,
        },
        Err(message) => NewImportLog {
            user_id,
            platform: platform.as_str(),
            url,
            record: None,
            status: ImportStatus::Failed,
            error_message: Some(message),
        },
    };

    shopimport_db::insert_import_log(&state.pool, &entry).await?;
    Ok(())
}
