pub mod presentations;
pub mod system;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::admission::auth::ApiKeyAuth;
use crate::admission::concurrency::ConcurrencyLimiter;
use crate::admission::rate_limit::RateLimiter;
use crate::admission::{auth, concurrency, rate_limit};
use crate::cache::DeckCache;
use crate::config::AppConfig;
use crate::generator::deck::DeckBuilder;
use crate::storage::store::PresentationStore;

/// Everything the handlers need, shared behind one Arc.
pub struct AppState {
    pub config: AppConfig,
    pub cache: Arc<DeckCache>,
    pub store: PresentationStore,
    pub deck: DeckBuilder,
    pub concurrency: Arc<ConcurrencyLimiter>,
}

pub type SharedState = Arc<AppState>;

/// Full application router with the admission pipeline attached.
/// Requests pass the rate limiter, then auth, then the concurrency
/// limiter, then the handler.
pub fn router(state: SharedState) -> Router {
    let rate_limiter = Arc::new(RateLimiter::new(
        state.cache.clone(),
        state.config.rate_limit.clone(),
    ));
    let api_auth = Arc::new(ApiKeyAuth::new(state.config.auth.api_keys.clone()));
    let concurrency_limiter = state.concurrency.clone();

    let allowed_origin = &state.config.cors.allowed_origin;
    let cors = match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) if allowed_origin != "*" => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::permissive(),
    };

    Router::new()
        .route("/health", get(system::health))
        .route(
            "/api/v1/presentations",
            post(presentations::create).get(presentations::list),
        )
        .route(
            "/api/v1/presentations/search/{topic}",
            get(presentations::search),
        )
        .route(
            "/api/v1/presentations/{id}",
            get(presentations::get_one).delete(presentations::delete),
        )
        .route(
            "/api/v1/presentations/{id}/configure",
            post(presentations::configure),
        )
        .route(
            "/api/v1/presentations/{id}/download",
            get(presentations::download),
        )
        .route("/api/v1/cache/stats", get(system::cache_stats))
        .route("/api/v1/cache/clear", post(system::cache_clear))
        .route("/api/v1/generator/status", get(system::generator_status))
        .route("/api/v1/generator/switch", post(system::generator_switch))
        .route("/api/v1/concurrency/stats", get(system::concurrency_stats))
        .route("/api/v1/aspect-ratios", get(system::aspect_ratios))
        .with_state(state)
        // Layer order is inside-out: the last layer added runs first, so
        // the request passes rate limiting, then auth, then concurrency.
        .layer(middleware::from_fn(concurrency::limit_concurrency))
        .layer(middleware::from_fn(auth::require_api_key))
        .layer(middleware::from_fn(rate_limit::rate_limit))
        .layer(Extension(rate_limiter))
        .layer(Extension(api_auth))
        .layer(Extension(concurrency_limiter))
        .layer(cors)
}
