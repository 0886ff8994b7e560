use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Paths that never require a key, so health checks and dashboards keep
/// working when the instance is locked down.
const EXEMPT_PATHS: &[&str] = &["/health", "/api/v1/cache/stats", "/api/v1/generator/status"];

/// The authenticated caller, stored in request extensions for handlers
/// and the concurrency limiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
}

impl Principal {
    /// Stable anonymous identity used in open mode and on exempt paths.
    pub fn anonymous() -> Self {
        Self {
            id: "anonymous".to_string(),
        }
    }

    /// Identity derived from an accepted key: "user_" plus the key's
    /// first eight characters.
    pub fn from_api_key(key: &str) -> Self {
        let prefix: String = key.chars().take(8).collect();
        Self {
            id: format!("user_{prefix}"),
        }
    }
}

/// API-key allow-list. An empty list means open mode: everything passes
/// as anonymous.
pub struct ApiKeyAuth {
    keys: HashSet<String>,
}

impl ApiKeyAuth {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys: keys.into_iter().filter(|k| !k.is_empty()).collect(),
        }
    }

    pub fn open_mode(&self) -> bool {
        self.keys.is_empty()
    }

    /// Resolve the caller from a presented key, if any. `Err` means the
    /// request must be rejected.
    pub fn authenticate(&self, presented: Option<&str>) -> Result<Principal, AppError> {
        if self.open_mode() {
            return Ok(Principal::anonymous());
        }
        match presented {
            Some(key) if self.keys.contains(key) => Ok(Principal::from_api_key(key)),
            Some(_) => Err(AppError::Auth("invalid API key".to_string())),
            None => Err(AppError::Auth("missing API key".to_string())),
        }
    }
}

/// `Authorization: Bearer <key>` wins over `X-API-Key`.
fn presented_key(request: &Request<Body>) -> Option<String> {
    if let Some(auth) = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Middleware. Expects `Arc<ApiKeyAuth>` in the request extensions.
/// Successful requests carry the resolved `Principal` in extensions and
/// an `X-User-ID` response header.
pub async fn require_api_key(mut request: Request<Body>, next: Next) -> Response {
    let Some(auth) = request.extensions().get::<Arc<ApiKeyAuth>>().cloned() else {
        return AppError::Internal("auth not configured".to_string()).into_response();
    };

    let path = request.uri().path().to_string();
    let principal = if EXEMPT_PATHS.contains(&path.as_str()) {
        Principal::anonymous()
    } else {
        let presented = presented_key(&request);
        match auth.authenticate(presented.as_deref()) {
            Ok(principal) => principal,
            Err(err) => {
                tracing::warn!(path = %path, "rejected unauthenticated request");
                let mut response = err.into_response();
                response.headers_mut().insert(
                    "www-authenticate",
                    HeaderValue::from_static("Bearer"),
                );
                return response;
            }
        }
    };

    let user_header = HeaderValue::from_str(&principal.id)
        .unwrap_or_else(|_| HeaderValue::from_static("anonymous"));
    request.extensions_mut().insert(principal);

    let mut response = next.run(request).await;
    response.headers_mut().insert("x-user-id", user_header);
    response
}
