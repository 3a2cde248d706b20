//! GET /api/v1/imports/recent

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopimport_db::ImportLogRow;

use crate::api::{ApiError, AppState};
use crate::middleware::UserId;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentResponse {
    success: bool,
    data: Vec<ImportLogItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportLogItem {
    id: i64,
    platform: String,
    url: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl From<ImportLogRow> for ImportLogItem {
    fn from(row: ImportLogRow) -> Self {
        Self {
            id: row.id,
            platform: row.platform,
            url: row.url,
            status: row.status,
            error_message: row.error_message,
            record: row.record,
            created_at: row.created_at,
        }
    }
}

fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(20).clamp(1, 100)
}

/// The caller's own import history, newest first.
pub async fn list_recent(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    Query(query): Query<RecentQuery>,
) -> Response {
    let limit = normalize_limit(query.limit);
    match shopimport_db::list_recent_imports(&state.pool, &user.0, limit).await {
        Ok(rows) => Json(RecentResponse {
            success: true,
            data: rows.into_iter().map(ImportLogItem::from).collect(),
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to list recent imports");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("failed to list recent imports")),
            )
                .into_response()
        }
    }
}
