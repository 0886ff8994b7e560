use super::SharedGenerator;
use crate::cache::{self, DeckCache};
use crate::themes::Theme;
use crate::types::{Slide, SlideType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Orchestrates deck generation: cache check, dedicated title-slide call,
/// body slides, cache fill. Always yields exactly `num_slides` slides with
/// the title slide first.
pub struct DeckBuilder {
    generator: SharedGenerator,
    cache: Arc<DeckCache>,
}

impl DeckBuilder {
    pub fn new(generator: SharedGenerator, cache: Arc<DeckCache>) -> Self {
        Self { generator, cache }
    }

    pub fn generator(&self) -> &SharedGenerator {
        &self.generator
    }

    pub async fn generate(
        &self,
        topic: &str,
        num_slides: usize,
        custom_content: Option<&str>,
        theme: Theme,
        font: &str,
        colors: &BTreeMap<String, String>,
    ) -> Vec<Slide> {
        let key = cache::stable_key(&serde_json::json!({
            "topic": topic,
            "num_slides": num_slides,
            "custom_content": custom_content,
            "theme": theme.as_str(),
            "font": font,
            "colors": colors,
        }));

        if let Some(cached) = self.cache.get_generation(&key) {
            tracing::debug!(topic, num_slides, "generation cache hit");
            return cached;
        }

        let generator = self.generator.current();
        let (title, subtitle) = generator.generate_title(topic, custom_content).await;
        let mut slides = Vec::with_capacity(num_slides);
        slides.push(Slide {
            slide_type: SlideType::Title,
            title,
            content: vec![subtitle],
            image_suggestion: None,
            citations: Vec::new(),
        });

        if num_slides > 1 {
            let body = generator
                .generate_body_slides(topic, num_slides - 1, custom_content, None)
                .await;
            slides.extend(body);
        }

        self.cache.set_generation(key, slides.clone());
        slides
    }
}
