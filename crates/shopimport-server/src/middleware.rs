use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The authenticated caller's identity, stored as a request extension by
/// [`require_bearer_auth`]. Derived from the bearer token, never the token
/// itself, so the raw credential is not persisted in the import log.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

/// Identity used when auth is disabled in development.
const ANONYMOUS_USER: &str = "anonymous";

/// API key auth settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `SHOPIMPORT_API_KEYS` (comma-separated bearer
    /// tokens).
    ///
    /// In development, empty/missing keys disable auth for local iteration.
    /// In non-development envs, empty/missing keys fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("SHOPIMPORT_API_KEYS").unwrap_or_default();
        let keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "SHOPIMPORT_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(HashSet::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "SHOPIMPORT_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self::from_keys(keys))
    }

    /// Builds an enabled auth config from an explicit key set.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            api_keys: Arc::new(keys.into_iter().collect()),
            enabled: true,
        }
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

/// Stable, token-derived user identity: lowercase hex SHA-256 of the bearer
/// token. Two requests with the same token always map to the same identity.
#[must_use]
pub fn user_id_for_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
///
/// On success, inserts a [`UserId`] extension derived from the token. When
/// auth is disabled (development), all requests share the anonymous identity.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        req.extensions_mut()
            .insert(UserId(ANONYMOUS_USER.to_string()));
        return next.run(req).await;
    }

    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));

    match token {
        Some(token) if auth.allows(token) => {
            let user_id = user_id_for_token(token);
            req.extensions_mut().insert(UserId(user_id));
            next.run(req).await
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(ApiError::new("missing or invalid bearer token")),
        )
            .into_response(),
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn user_id_is_stable_and_opaque() {
        let a = user_id_for_token("token-a");
        let b = user_id_for_token("token-b");

        assert_eq!(a, user_id_for_token("token-a"));
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!a.contains("token-a"));
    }

    #[test]
    fn from_keys_enables_auth() {
        let state = AuthState::from_keys(["k1".to_string(), "k2".to_string()]);
        assert!(state.enabled);
        assert!(state.allows("k1"));
        assert!(!state.allows("k3"));
    }
}
