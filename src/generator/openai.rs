use super::placeholder::PlaceholderGenerator;
use super::{ContentGenerator, GeneratorKind, DEFAULT_BODY_TYPES};
use crate::config::GenerationConfig;
use crate::types::{Slide, SlideType};
use async_trait::async_trait;
use serde_json::json;

/// OpenAI-backed generator. Content is produced in two chat calls: a
/// free-form drafting call, then a low-temperature reformat-to-JSON call.
/// Every failure path falls back to the placeholder generator, so
/// generation as a whole never errors.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: GenerationConfig,
    api_key: String,
    fallback: PlaceholderGenerator,
}

/// Sample structure given to the reformat call so the model mirrors our
/// slide schema exactly.
fn sample_output() -> serde_json::Value {
    json!({
        "slides": [
            {
                "slide_type": "bullet_points",
                "title": "Introduction to Topic",
                "content": [
                    "Key point about the topic",
                    "Important aspect to consider",
                    "Supporting detail"
                ],
                "image_suggestion": null,
                "citations": ["Research paper on topic (2023)"]
            },
            {
                "slide_type": "two_column",
                "title": "Features vs Benefits",
                "content": [
                    "Column 1: Feature 1",
                    "Column 2: Benefit 1"
                ],
                "image_suggestion": null,
                "citations": ["Expert analysis on topic"]
            },
            {
                "slide_type": "content_with_image",
                "title": "Visual Overview",
                "content": ["Main content point", "Supporting information"],
                "image_suggestion": "Diagram showing topic relationships",
                "citations": ["Visual guide on topic"]
            }
        ]
    })
}

impl OpenAiGenerator {
    pub fn new(api_key: String, config: GenerationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_key,
            fallback: PlaceholderGenerator,
        }
    }

    async fn chat(
        &self,
        prompt: String,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, String> {
        let url = format!(
            "{}/chat/completions",
            self.config.openai_base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.openai_model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("upstream returned {status}"));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("invalid response body: {e}"))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| "response missing message content".to_string())
    }

    async fn draft_content(
        &self,
        topic: &str,
        count: usize,
        custom_content: Option<&str>,
        types: &[SlideType],
    ) -> Result<String, String> {
        let type_names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        let context = custom_content
            .map(|c| format!("Additional context to incorporate: {c}\n"))
            .unwrap_or_default();
        let prompt = format!(
            "Draft content for {count} presentation slides about \"{topic}\".\n\
             {context}\
             For each slide choose one of these slide types: {}.\n\
             Give each slide a short title, 3-5 concise content lines, and 1-2 \
             citation strings. For two_column slides prefix each line with \
             \"Column 1:\" or \"Column 2:\". For content_with_image slides also \
             suggest an image.",
            type_names.join(", ")
        );
        self.chat(prompt, self.config.max_tokens, self.config.temperature)
            .await
    }

    async fn reformat_to_json(&self, topic: &str, draft: &str) -> Result<String, String> {
        let prompt = format!(
            "Convert the following draft slide content about \"{topic}\" into \
             JSON matching this exact structure (respond with JSON only, no \
             commentary):\n{}\n\nDraft:\n{draft}",
            serde_json::to_string_pretty(&sample_output()).unwrap_or_default()
        );
        self.chat(prompt, self.config.max_tokens, self.config.format_temperature)
            .await
    }

    fn parse_slides(payload: &str) -> Result<Vec<Slide>, String> {
        let stripped = strip_code_fences(payload);
        let value: serde_json::Value =
            serde_json::from_str(stripped).map_err(|e| format!("invalid JSON: {e}"))?;
        let raw_slides = value["slides"]
            .as_array()
            .ok_or_else(|| "missing slides array".to_string())?;

        let mut slides = Vec::with_capacity(raw_slides.len());
        for raw in raw_slides {
            let slide_type = raw["slide_type"]
                .as_str()
                .map(SlideType::parse_or_default)
                .unwrap_or(SlideType::BulletPoints);
            let title = raw["title"].as_str().unwrap_or("Untitled Slide").to_string();
            let content = raw["content"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            let image_suggestion = raw["image_suggestion"].as_str().map(str::to_string);
            let citations = raw["citations"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            slides.push(Slide {
                slide_type,
                title,
                content,
                image_suggestion,
                citations,
            });
        }
        Ok(slides)
    }
}

/// Strip a surrounding ```json ... ``` fence if the model added one.
fn strip_code_fences(s: &str) -> &str {
    let s = s.trim();
    let s = s.strip_prefix("```json").or_else(|| s.strip_prefix("```")).unwrap_or(s);
    s.strip_suffix("```").unwrap_or(s).trim()
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Openai
    }

    async fn generate_body_slides(
        &self,
        topic: &str,
        count: usize,
        custom_content: Option<&str>,
        allowed_types: Option<&[SlideType]>,
    ) -> Vec<Slide> {
        let types: &[SlideType] = match allowed_types {
            Some(t) if !t.is_empty() => t,
            _ => &DEFAULT_BODY_TYPES,
        };

        let attempt = async {
            let draft = self.draft_content(topic, count, custom_content, types).await?;
            let formatted = self.reformat_to_json(topic, &draft).await?;
            Self::parse_slides(&formatted)
        };

        match attempt.await {
            Ok(mut slides) if !slides.is_empty() => {
                // The model may over- or under-produce; pad from the
                // fallback and trim so the count contract holds.
                if slides.len() < count {
                    let missing = count - slides.len();
                    let padding = self
                        .fallback
                        .generate_body_slides(topic, missing, custom_content, allowed_types)
                        .await;
                    slides.extend(padding);
                }
                slides.truncate(count);
                slides
            }
            Ok(_) => {
                tracing::warn!(topic, "openai returned no slides, using placeholder");
                self.fallback
                    .generate_body_slides(topic, count, custom_content, allowed_types)
                    .await
            }
            Err(e) => {
                tracing::warn!(topic, error = %e, "openai generation failed, using placeholder");
                self.fallback
                    .generate_body_slides(topic, count, custom_content, allowed_types)
                    .await
            }
        }
    }

    async fn generate_title(&self, topic: &str, custom_content: Option<&str>) -> (String, String) {
        let context = custom_content
            .map(|c| format!("Additional context to incorporate: {c}\n"))
            .unwrap_or_default();
        let prompt = format!(
            "Write a presentation title and subtitle for the topic \"{topic}\".\n\
             {context}\
             Respond in exactly two lines:\nTITLE: <title>\nSUBTITLE: <subtitle>"
        );

        match self
            .chat(prompt, self.config.title_max_tokens, self.config.temperature)
            .await
        {
            Ok(content) => {
                let mut parts = content.splitn(2, "SUBTITLE:");
                let title = parts
                    .next()
                    .unwrap_or("")
                    .replace("TITLE:", "")
                    .trim()
                    .to_string();
                match parts.next() {
                    Some(subtitle) if !title.is_empty() => (title, subtitle.trim().to_string()),
                    _ => self.fallback.generate_title(topic, custom_content).await,
                }
            }
            Err(e) => {
                tracing::warn!(topic, error = %e, "openai title generation failed, using placeholder");
                self.fallback.generate_title(topic, custom_content).await
            }
        }
    }
}
