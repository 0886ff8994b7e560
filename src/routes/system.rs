use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::SharedState;
use crate::aspect::AspectRatio;
use crate::error::{AppError, AppResult, LoggedJson};
use crate::generator::openai::OpenAiGenerator;
use crate::generator::placeholder::PlaceholderGenerator;
use crate::generator::GeneratorKind;

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "slidesmith",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/v1/cache/stats
pub async fn cache_stats(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let stats = state.cache.stats();
    Json(json!({ "partitions": stats }))
}

/// POST /api/v1/cache/clear
pub async fn cache_clear(State(state): State<SharedState>) -> Json<serde_json::Value> {
    state.cache.clear_all();
    tracing::info!("all cache partitions cleared");
    Json(json!({ "status": "cleared" }))
}

/// GET /api/v1/generator/status
pub async fn generator_status(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "active": state.deck.generator().kind(),
        "openai_configured": !state.config.generation.openai_api_key.is_empty(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub generator: GeneratorKind,
}

/// POST /api/v1/generator/switch
///
/// Swaps the active generator at runtime. Switching to OpenAI requires a
/// configured API key.
pub async fn generator_switch(
    State(state): State<SharedState>,
    LoggedJson(input): LoggedJson<SwitchRequest>,
) -> AppResult<Json<serde_json::Value>> {
    match input.generator {
        GeneratorKind::Placeholder => {
            state.deck.generator().swap(Arc::new(PlaceholderGenerator));
        }
        GeneratorKind::Openai => {
            let api_key = state.config.generation.openai_api_key.clone();
            if api_key.is_empty() {
                return Err(AppError::Validation(
                    "cannot switch to openai: no API key configured".to_string(),
                ));
            }
            state.deck.generator().swap(Arc::new(OpenAiGenerator::new(
                api_key,
                state.config.generation.clone(),
            )));
        }
    }
    Ok(Json(json!({ "active": state.deck.generator().kind() })))
}

/// GET /api/v1/concurrency/stats
pub async fn concurrency_stats(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({ "concurrency": state.concurrency.stats() }))
}

/// GET /api/v1/aspect-ratios
pub async fn aspect_ratios() -> Json<serde_json::Value> {
    let presets: Vec<serde_json::Value> = AspectRatio::presets()
        .iter()
        .map(|preset| {
            let (width, height) = preset.dimensions();
            json!({
                "id": preset.as_str(),
                "name": preset.name(),
                "description": preset.description(),
                "orientation": preset.orientation(),
                "width_inches": width,
                "height_inches": height,
            })
        })
        .collect();
    Json(json!({
        "presets": presets,
        "custom": {
            "id": "custom",
            "min_inches": 5.0,
            "max_inches": 20.0,
        },
    }))
}
