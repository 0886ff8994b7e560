use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::admission::Principal;
use crate::config::ConcurrencyConfig;
use crate::error::AppError;

/// Dual-semaphore concurrency gate for generation-heavy routes: one
/// global ceiling for the whole process plus a lazily created per-user
/// ceiling. Both permits are held for the duration of the handler.
pub struct ConcurrencyLimiter {
    global: Arc<Semaphore>,
    per_user: Mutex<HashMap<String, Arc<Semaphore>>>,
    config: ConcurrencyConfig,
}

#[derive(Debug, Serialize)]
pub struct ConcurrencyStats {
    pub global_limit: usize,
    pub global_available: usize,
    pub global_locked: bool,
    pub per_user_limit: usize,
    pub users: BTreeMap<String, SemaphoreStats>,
}

#[derive(Debug, Serialize)]
pub struct SemaphoreStats {
    pub available: usize,
    pub locked: bool,
}

/// Permits released when dropped, after the handler finishes.
pub struct AdmissionPermits {
    _global: OwnedSemaphorePermit,
    _user: OwnedSemaphorePermit,
    pub global_available: usize,
    pub user_available: usize,
}

impl ConcurrencyLimiter {
    pub fn new(config: ConcurrencyConfig) -> Self {
        Self {
            global: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            per_user: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn user_semaphore(&self, user: &str) -> Arc<Semaphore> {
        let mut map = self
            .per_user
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(user.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.config.max_concurrent_per_user)))
            .clone()
    }

    /// Acquire the global and the per-user permit, in that order. One
    /// deadline covers both acquires so a saturated instance never holds
    /// a request beyond the configured timeout. `None` means the caller
    /// must be told the service is saturated.
    pub async fn acquire(&self, user: &str) -> Option<AdmissionPermits> {
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(self.config.acquire_timeout_secs);

        let global = tokio::time::timeout_at(deadline, self.global.clone().acquire_owned())
            .await
            .ok()?
            .ok()?;
        let user_sem = self.user_semaphore(user);
        let user_permit = tokio::time::timeout_at(deadline, user_sem.clone().acquire_owned())
            .await
            .ok()?
            .ok()?;

        Some(AdmissionPermits {
            global_available: self.global.available_permits(),
            user_available: user_sem.available_permits(),
            _global: global,
            _user: user_permit,
        })
    }

    pub fn stats(&self) -> ConcurrencyStats {
        let users = self
            .per_user
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(user, sem)| {
                let available = sem.available_permits();
                (
                    user.clone(),
                    SemaphoreStats {
                        available,
                        locked: available == 0,
                    },
                )
            })
            .collect();
        let global_available = self.global.available_permits();
        ConcurrencyStats {
            global_limit: self.config.max_concurrent_requests,
            global_available,
            global_locked: global_available == 0,
            per_user_limit: self.config.max_concurrent_per_user,
            users,
        }
    }
}

/// Only generation-heavy routes are gated: deck creation and downloads.
fn is_gated(method: &Method, path: &str) -> bool {
    (method == Method::POST && path == "/api/v1/presentations") || path.ends_with("/download")
}

fn header_usize(value: usize) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

/// Middleware. Expects `Arc<ConcurrencyLimiter>` in request extensions;
/// the `Principal` must already be resolved by the auth layer.
pub async fn limit_concurrency(request: Request<Body>, next: Next) -> Response {
    let Some(limiter) = request
        .extensions()
        .get::<Arc<ConcurrencyLimiter>>()
        .cloned()
    else {
        return AppError::Internal("concurrency limiter not configured".to_string())
            .into_response();
    };

    if !is_gated(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    // Authenticated callers get a semaphore per principal; in open mode
    // the per-user ceiling falls back to the client address.
    let user = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .unwrap_or_else(Principal::anonymous);
    let key = if user.id == "anonymous" {
        format!("ip_{}", crate::admission::rate_limit::client_ip(&request))
    } else {
        user.id.clone()
    };

    let Some(permits) = limiter.acquire(&key).await else {
        tracing::warn!(user = %user.id, "concurrency limit reached, shedding request");
        return AppError::Unavailable(
            "server is at capacity, please retry shortly".to_string(),
        )
        .into_response();
    };

    let global_available = permits.global_available;
    let user_available = permits.user_available;
    let mut response = next.run(request).await;
    drop(permits);

    let headers = response.headers_mut();
    headers.insert(
        "x-concurrency-user-id",
        HeaderValue::from_str(&key).unwrap_or(HeaderValue::from_static("anonymous")),
    );
    headers.insert(
        "x-concurrency-global-limit",
        header_usize(limiter.config.max_concurrent_requests),
    );
    headers.insert(
        "x-concurrency-global-available",
        header_usize(global_available),
    );
    headers.insert(
        "x-concurrency-user-limit",
        header_usize(limiter.config.max_concurrent_per_user),
    );
    headers.insert("x-concurrency-user-available", header_usize(user_available));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(global: usize, per_user: usize) -> ConcurrencyLimiter {
        ConcurrencyLimiter::new(ConcurrencyConfig {
            max_concurrent_requests: global,
            max_concurrent_per_user: per_user,
            acquire_timeout_secs: 1,
        })
    }

    #[test]
    fn test_gated_routes() {
        assert!(is_gated(&Method::POST, "/api/v1/presentations"));
        assert!(is_gated(
            &Method::GET,
            "/api/v1/presentations/abc/download"
        ));
        assert!(!is_gated(&Method::GET, "/api/v1/presentations"));
        assert!(!is_gated(&Method::GET, "/api/v1/presentations/abc"));
        assert!(!is_gated(&Method::GET, "/health"));
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let l = limiter(2, 2);
        let p1 = l.acquire("user_a").await.unwrap();
        assert_eq!(l.stats().global_available, 1);
        drop(p1);
        assert_eq!(l.stats().global_available, 2);
    }

    #[tokio::test]
    async fn test_per_user_ceiling() {
        let l = limiter(10, 1);
        let _held = l.acquire("user_a").await.unwrap();
        // same user blocked, other user fine
        assert!(l.acquire("user_a").await.is_none());
        assert!(l.acquire("user_b").await.is_some());
    }

    #[tokio::test]
    async fn test_global_ceiling_across_users() {
        let l = limiter(1, 5);
        let _held = l.acquire("user_a").await.unwrap();
        assert!(l.acquire("user_b").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_within_one_timeout_across_both_semaphores() {
        let l = limiter(2, 1);
        let held_a = l.acquire("user_a").await.unwrap();
        let _held_b = l.acquire("user_b").await.unwrap();

        // Global frees halfway through the wait, but user_b's own permit
        // stays held. The deadline is shared, so the rejection lands at
        // one timeout, not one per semaphore.
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            drop(held_a);
        });

        let start = tokio::time::Instant::now();
        assert!(l.acquire("user_b").await.is_none());
        assert!(start.elapsed() <= Duration::from_millis(1100));
    }

    #[tokio::test]
    async fn test_stats_track_users() {
        let l = limiter(4, 1);
        let _a = l.acquire("user_a").await.unwrap();
        let _b = l.acquire("user_b").await.unwrap();
        let stats = l.stats();
        assert_eq!(stats.users.len(), 2);
        assert_eq!(stats.global_available, 2);
        assert_eq!(stats.global_limit, 4);
        assert!(!stats.global_locked);
        assert_eq!(stats.per_user_limit, 1);
        assert!(stats.users["user_a"].locked);
        assert_eq!(stats.users["user_a"].available, 0);
    }
}
