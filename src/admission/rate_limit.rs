use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::cache::DeckCache;
use crate::config::RateLimitConfig;
use crate::error::AppError;

const MINUTE_SECS: i64 = 60;
const HOUR_SECS: i64 = 3600;

/// Fixed-window rate limiter keyed by client IP. Counters live in the
/// response cache partition, so they expire with it and survive nothing
/// past process restart.
pub struct RateLimiter {
    cache: Arc<DeckCache>,
    config: RateLimitConfig,
}

/// Per-window counter persisted in the cache.
#[derive(Debug, Serialize, Deserialize)]
struct WindowCounter {
    count: u64,
    window_start: i64,
}

/// Remaining quota after a request has been admitted.
#[derive(Debug, PartialEq, Eq)]
pub struct RateQuota {
    pub minute_remaining: u64,
    pub hour_remaining: u64,
}

/// A rejected request, with the seconds until the violated window rolls.
#[derive(Debug, PartialEq, Eq)]
pub struct RateExceeded {
    pub retry_after_secs: i64,
}

impl RateLimiter {
    pub fn new(cache: Arc<DeckCache>, config: RateLimitConfig) -> Self {
        Self { cache, config }
    }

    fn load_counter(&self, key: &str, window_start: i64) -> WindowCounter {
        self.cache
            .get_response(key)
            .and_then(|v| serde_json::from_value::<WindowCounter>(v).ok())
            .filter(|c| c.window_start == window_start)
            .unwrap_or(WindowCounter {
                count: 0,
                window_start,
            })
    }

    fn store_counter(&self, key: String, counter: &WindowCounter) {
        if let Ok(value) = serde_json::to_value(counter) {
            self.cache.set_response(key, value);
        }
    }

    /// Admit or reject one request from `client` at epoch second `now`.
    /// Counters are only advanced on admission.
    pub fn check(&self, client: &str, now: i64) -> Result<RateQuota, RateExceeded> {
        let minute_start = now - now.rem_euclid(MINUTE_SECS);
        let hour_start = now - now.rem_euclid(HOUR_SECS);
        let minute_key = format!("ratelimit:minute:{client}");
        let hour_key = format!("ratelimit:hour:{client}");

        let mut minute = self.load_counter(&minute_key, minute_start);
        let mut hour = self.load_counter(&hour_key, hour_start);

        let minute_full = minute.count >= self.config.requests_per_minute;
        let hour_full = hour.count >= self.config.requests_per_hour;
        if minute_full || hour_full {
            let minute_reset = minute_start + MINUTE_SECS - now;
            let hour_reset = hour_start + HOUR_SECS - now;
            let retry_after_secs = match (minute_full, hour_full) {
                (true, true) => minute_reset.max(hour_reset),
                (false, true) => hour_reset,
                _ => minute_reset,
            };
            return Err(RateExceeded { retry_after_secs });
        }

        minute.count += 1;
        hour.count += 1;
        self.store_counter(minute_key, &minute);
        self.store_counter(hour_key, &hour);

        Ok(RateQuota {
            minute_remaining: self.config.requests_per_minute - minute.count,
            hour_remaining: self.config.requests_per_hour - hour.count,
        })
    }

    pub fn minute_limit(&self) -> u64 {
        self.config.requests_per_minute
    }

    pub fn hour_limit(&self) -> u64 {
        self.config.requests_per_hour
    }
}

/// Best-effort client identity: first X-Forwarded-For hop, then
/// X-Real-IP, then the socket peer address.
pub fn client_ip(request: &Request<Body>) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = request
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
    {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_u64(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

/// Middleware. Expects `Arc<RateLimiter>` in the request extensions.
pub async fn rate_limit(request: Request<Body>, next: Next) -> Response {
    let Some(limiter) = request.extensions().get::<Arc<RateLimiter>>().cloned() else {
        return AppError::Internal("rate limiter not configured".to_string()).into_response();
    };

    let client = client_ip(&request);
    let now = chrono::Utc::now().timestamp();

    match limiter.check(&client, now) {
        Ok(quota) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-minute-limit", header_u64(limiter.minute_limit()));
            headers.insert(
                "x-ratelimit-minute-remaining",
                header_u64(quota.minute_remaining),
            );
            headers.insert("x-ratelimit-hour-limit", header_u64(limiter.hour_limit()));
            headers.insert("x-ratelimit-hour-remaining", header_u64(quota.hour_remaining));
            response
        }
        Err(exceeded) => {
            tracing::warn!(
                client = %client,
                retry_after = exceeded.retry_after_secs,
                "rate limit exceeded"
            );
            let mut response = AppError::RateLimited(format!(
                "too many requests, retry in {} seconds",
                exceeded.retry_after_secs
            ))
            .into_response();
            response.headers_mut().insert(
                "retry-after",
                header_u64(exceeded.retry_after_secs.max(0) as u64),
            );
            response
        }
    }
}
