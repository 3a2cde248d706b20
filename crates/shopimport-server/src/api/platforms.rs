//! GET /api/v1/platforms

use axum::Json;
use serde::Serialize;

use shopimport_core::{Platform, PlatformInfo};

#[derive(Debug, Serialize)]
pub(crate) struct PlatformsResponse {
    success: bool,
    data: Vec<PlatformInfo>,
}

/// Static metadata for the supported platforms. No pipeline logic involved.
pub async fn list_platforms() -> Json<PlatformsResponse> {
    Json(PlatformsResponse {
        success: true,
        data: Platform::ALL.iter().map(|p| p.info()).collect(),
    })
}
