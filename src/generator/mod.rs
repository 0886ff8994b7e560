pub mod deck;
pub mod openai;
pub mod placeholder;

use crate::types::{Slide, SlideType};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Default body-slide rotation when the caller does not restrict types.
pub const DEFAULT_BODY_TYPES: [SlideType; 3] = [
    SlideType::BulletPoints,
    SlideType::TwoColumn,
    SlideType::ContentWithImage,
];

/// Content generation seam. Implementations are total: any upstream
/// failure is absorbed internally (deterministic fallback), never returned.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn kind(&self) -> GeneratorKind;

    /// Produce exactly `count` body slides for the topic, distributed
    /// round-robin across `allowed_types` (or the default rotation).
    async fn generate_body_slides(
        &self,
        topic: &str,
        count: usize,
        custom_content: Option<&str>,
        allowed_types: Option<&[SlideType]>,
    ) -> Vec<Slide>;

    /// Produce (title, subtitle) for the dedicated title slide.
    async fn generate_title(&self, topic: &str, custom_content: Option<&str>) -> (String, String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Placeholder,
    Openai,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Placeholder => "placeholder",
            GeneratorKind::Openai => "openai",
        }
    }
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Swappable generator binding. The admin switch endpoint replaces which
/// variant instance is bound; readers grab a cheap Arc clone per request.
#[derive(Clone)]
pub struct SharedGenerator {
    inner: Arc<RwLock<Arc<dyn ContentGenerator>>>,
}

impl SharedGenerator {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(generator)),
        }
    }

    pub fn current(&self) -> Arc<dyn ContentGenerator> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn swap(&self, generator: Arc<dyn ContentGenerator>) {
        let kind = generator.kind();
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = generator;
        tracing::info!(generator = %kind, "generator switched");
    }

    pub fn kind(&self) -> GeneratorKind {
        self.current().kind()
    }
}
