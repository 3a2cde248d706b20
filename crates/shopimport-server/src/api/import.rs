//! POST /api/v1/imports

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AppState};
use crate::importer::{run_import, ImportError};
use crate::middleware::UserId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub url: String,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

const fn default_use_cache() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportResponse {
    success: bool,
    data: serde_json::Value,
    cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_expires_at: Option<DateTime<Utc>>,
}

pub async fn import_product(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    Json(request): Json<ImportRequest>,
) -> Response {
    let url = request.url.trim();
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("url is required")),
        )
            .into_response();
    }

    match run_import(&state, &user.0, url, request.use_cache).await {
        Ok(outcome) => Json(ImportResponse {
            success: true,
            data: outcome.record,
            cached: outcome.cached,
            cache_expires_at: outcome.cache_expires_at,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Maps a pipeline failure to its HTTP shape. Extraction and storage
/// details stay server-side; the caller gets a generic message while the
/// import log retains the specifics.
fn error_response(error: &ImportError) -> Response {
    match error {
        ImportError::RateLimited { retry_after_secs } => {
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ApiError::rate_limited(*retry_after_secs)),
            )
                .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert("retry-after", value);
            }
            response
        }
        ImportError::UnsupportedPlatform { .. } => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                "unsupported platform: supported sites are AliExpress, Amazon, and Jumia",
            )),
        )
            .into_response(),
        ImportError::InvalidUrl { platform, reason } => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(format!("invalid {platform} url: {reason}"))),
        )
            .into_response(),
        ImportError::Extraction(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new("failed to import product")),
        )
            .into_response(),
        ImportError::Storage(e) => {
            tracing::error!(error = %e, "storage failure during import");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("failed to record import")),
            )
                .into_response()
        }
    }
}
