use crate::aspect::AspectRatio;
use crate::themes::{Theme, ThemeConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlideType {
    Title,
    BulletPoints,
    TwoColumn,
    ContentWithImage,
}

impl SlideType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideType::Title => "title",
            SlideType::BulletPoints => "bullet_points",
            SlideType::TwoColumn => "two_column",
            SlideType::ContentWithImage => "content_with_image",
        }
    }

    /// Parse a persisted value, coercing anything unknown to bullet points.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "title" => SlideType::Title,
            "two_column" => SlideType::TwoColumn,
            "content_with_image" => SlideType::ContentWithImage,
            _ => SlideType::BulletPoints,
        }
    }
}

impl std::fmt::Display for SlideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Slide {
    pub slide_type: SlideType,
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub image_suggestion: Option<String>,
    #[serde(default)]
    pub citations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Presentation {
    pub id: String,
    pub topic: String,
    pub num_slides: usize,
    #[serde(default)]
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub custom_content: Option<String>,
    pub theme: Theme,
    pub font: String,
    pub colors: BTreeMap<String, String>,
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub custom_width: Option<f64>,
    #[serde(default)]
    pub custom_height: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Presentation {
    /// Fresh presentation with theme-derived styling defaults.
    pub fn new(topic: String, num_slides: usize, custom_content: Option<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        let theme = Theme::Modern;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic,
            num_slides,
            slides: Vec::new(),
            custom_content,
            theme,
            font: ThemeConfig::font(theme).to_string(),
            colors: ThemeConfig::colors(theme),
            aspect_ratio: AspectRatio::Widescreen16x9,
            custom_width: None,
            custom_height: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request body for `POST /api/v1/presentations`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePresentation {
    pub topic: String,
    pub num_slides: usize,
    #[serde(default)]
    pub custom_content: Option<String>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub colors: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default)]
    pub custom_width: Option<f64>,
    #[serde(default)]
    pub custom_height: Option<f64>,
}

/// Request body for `POST /api/v1/presentations/{id}/configure`.
/// Styling only; slide content is never touched here.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurePresentation {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub colors: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(default)]
    pub custom_width: Option<f64>,
    #[serde(default)]
    pub custom_height: Option<f64>,
}

pub const TOPIC_MAX_CHARS: usize = 200;
pub const CUSTOM_CONTENT_MAX_CHARS: usize = 2000;
pub const MIN_SLIDES: usize = 1;
pub const MAX_SLIDES: usize = 20;

/// Validate creation input. Returns the human-readable reason on failure.
pub fn validate_create(input: &CreatePresentation) -> Result<(), String> {
    if input.topic.is_empty() || input.topic.chars().count() > TOPIC_MAX_CHARS {
        return Err(format!("topic must be 1-{TOPIC_MAX_CHARS} characters"));
    }
    if input.num_slides < MIN_SLIDES || input.num_slides > MAX_SLIDES {
        return Err(format!(
            "num_slides must be between {MIN_SLIDES} and {MAX_SLIDES}"
        ));
    }
    if let Some(ref content) = input.custom_content {
        if content.chars().count() > CUSTOM_CONTENT_MAX_CHARS {
            return Err(format!(
                "custom_content must be at most {CUSTOM_CONTENT_MAX_CHARS} characters"
            ));
        }
    }
    validate_aspect(input.aspect_ratio, input.custom_width, input.custom_height)
}

/// Custom aspect ratio needs both dimensions, each within [5, 20] inches.
pub fn validate_aspect(
    aspect_ratio: Option<AspectRatio>,
    custom_width: Option<f64>,
    custom_height: Option<f64>,
) -> Result<(), String> {
    if aspect_ratio == Some(AspectRatio::Custom) {
        let (Some(w), Some(h)) = (custom_width, custom_height) else {
            return Err("custom aspect ratio requires custom_width and custom_height".to_string());
        };
        if !crate::aspect::valid_custom_dimensions(w, h) {
            return Err(format!(
                "custom dimensions {w}x{h} out of range: each must be between 5 and 20 inches"
            ));
        }
    } else {
        for dim in [custom_width, custom_height].into_iter().flatten() {
            if !(5.0..=20.0).contains(&dim) {
                return Err(format!(
                    "custom dimension {dim} out of range: must be between 5 and 20 inches"
                ));
            }
        }
    }
    Ok(())
}
