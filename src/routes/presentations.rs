use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::SharedState;
use crate::aspect;
use crate::error::{AppError, AppResult, LoggedJson};
use crate::render::pptx;
use crate::themes::{Theme, ThemeConfig};
use crate::types::{
    validate_aspect, validate_create, ConfigurePresentation, CreatePresentation, Presentation,
};

/// POST /api/v1/presentations
pub async fn create(
    State(state): State<SharedState>,
    LoggedJson(input): LoggedJson<CreatePresentation>,
) -> AppResult<Json<Presentation>> {
    validate_create(&input).map_err(AppError::Validation)?;

    let theme = input.theme.unwrap_or(Theme::Modern);
    let mut presentation = Presentation::new(
        input.topic.clone(),
        input.num_slides,
        input.custom_content.clone(),
    );
    presentation.theme = theme;
    presentation.font = input
        .font
        .clone()
        .unwrap_or_else(|| ThemeConfig::font(theme).to_string());
    presentation.colors = input
        .colors
        .clone()
        .unwrap_or_else(|| ThemeConfig::colors(theme));
    if let Some(aspect_ratio) = input.aspect_ratio {
        presentation.aspect_ratio = aspect_ratio;
    }
    presentation.custom_width = input.custom_width;
    presentation.custom_height = input.custom_height;

    presentation.slides = state
        .deck
        .generate(
            &input.topic,
            input.num_slides,
            input.custom_content.as_deref(),
            theme,
            &presentation.font,
            &presentation.colors,
        )
        .await;

    if !state.store.save(&mut presentation).await {
        return Err(AppError::Internal(
            "failed to persist presentation".to_string(),
        ));
    }

    tracing::info!(
        id = %presentation.id,
        topic = %input.topic,
        num_slides = input.num_slides,
        "presentation created"
    );
    Ok(Json(presentation))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/v1/presentations
pub async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = params.limit.clamp(1, 100);
    let offset = params.offset.max(0);
    let presentations = state.store.list(limit, offset).await;
    Ok(Json(json!({
        "count": presentations.len(),
        "presentations": presentations,
    })))
}

/// GET /api/v1/presentations/search/{topic}
pub async fn search(
    State(state): State<SharedState>,
    Path(topic): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation(
            "search topic must not be empty".to_string(),
        ));
    }
    let presentations = state.store.search(topic).await;
    Ok(Json(json!({
        "count": presentations.len(),
        "presentations": presentations,
    })))
}

/// GET /api/v1/presentations/{id}
pub async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> AppResult<Json<Presentation>> {
    state
        .store
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("presentation {id} not found")))
}

/// DELETE /api/v1/presentations/{id}
pub async fn delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    if state.store.delete(&id).await {
        tracing::info!(id = %id, "presentation deleted");
        Ok(Json(json!({
            "message": format!("presentation {id} deleted"),
            "id": id,
        })))
    } else {
        Err(AppError::NotFound(format!("presentation {id} not found")))
    }
}

/// POST /api/v1/presentations/{id}/configure
///
/// Styling only. A new theme re-derives font and colors unless the
/// request overrides them explicitly; slide content is never touched.
pub async fn configure(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    LoggedJson(input): LoggedJson<ConfigurePresentation>,
) -> AppResult<Json<Presentation>> {
    let mut presentation = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("presentation {id} not found")))?;

    if let Some(theme) = input.theme {
        presentation.theme = theme;
        presentation.font = input
            .font
            .clone()
            .unwrap_or_else(|| ThemeConfig::font(theme).to_string());
        presentation.colors = input
            .colors
            .clone()
            .unwrap_or_else(|| ThemeConfig::colors(theme));
    } else {
        if let Some(font) = input.font {
            presentation.font = font;
        }
        if let Some(colors) = input.colors {
            presentation.colors = colors;
        }
    }
    if let Some(aspect_ratio) = input.aspect_ratio {
        presentation.aspect_ratio = aspect_ratio;
    }
    if input.custom_width.is_some() {
        presentation.custom_width = input.custom_width;
    }
    if input.custom_height.is_some() {
        presentation.custom_height = input.custom_height;
    }
    validate_aspect(
        Some(presentation.aspect_ratio),
        presentation.custom_width,
        presentation.custom_height,
    )
    .map_err(AppError::Validation)?;

    // Drop the cached entity first so a concurrent read cannot observe
    // the old styling while the save is in flight.
    state.store.cache().delete_presentation(&id);
    if !state.store.save(&mut presentation).await {
        return Err(AppError::Internal(
            "failed to persist configuration".to_string(),
        ));
    }

    tracing::info!(id = %id, theme = %presentation.theme, "presentation reconfigured");
    Ok(Json(presentation))
}

/// GET /api/v1/presentations/{id}/download
///
/// Renders the deck to PPTX and streams it back. The entity cache is
/// bypassed so the freshest persisted styling is rendered.
pub async fn download(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    state.store.cache().delete_presentation(&id);
    let mut presentation = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("presentation {id} not found")))?;

    // Older records configured to a non-modern theme may still carry the
    // modern styling defaults; repair them before rendering.
    if presentation.theme != Theme::Modern
        && presentation.font == ThemeConfig::font(Theme::Modern)
        && presentation.colors == ThemeConfig::colors(Theme::Modern)
    {
        presentation.font = ThemeConfig::font(presentation.theme).to_string();
        presentation.colors = ThemeConfig::colors(presentation.theme);
        if !state.store.save(&mut presentation).await {
            tracing::warn!(id = %id, "failed to persist repaired styling defaults");
        }
    }

    let output_dir = state.config.generation.output_dir.clone();
    let to_render = presentation.clone();
    let path = tokio::task::spawn_blocking(move || pptx::render_pptx(&to_render, &output_dir))
        .await
        .map_err(|e| AppError::Internal(format!("render task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("render failed: {e}")))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read rendered file: {e}")))?;

    let (page_w, page_h) = aspect::page_size(
        presentation.aspect_ratio,
        presentation.custom_width,
        presentation.custom_height,
    );
    tracing::info!(
        id = %id,
        bytes = bytes.len(),
        page_w,
        page_h,
        "presentation rendered"
    );

    let filename = format!("presentation_{id}.pptx");
    Ok((
        [
            (header::CONTENT_TYPE, pptx::PPTX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
