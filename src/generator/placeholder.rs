use super::{ContentGenerator, GeneratorKind, DEFAULT_BODY_TYPES};
use crate::types::{Slide, SlideType};
use async_trait::async_trait;

/// Deterministic generator used for development and as the fallback when
/// the remote model fails. A total function: no failure modes.
#[derive(Default)]
pub struct PlaceholderGenerator;

impl PlaceholderGenerator {
    fn slide_title(topic: &str, slide_number: usize, slide_type: SlideType) -> String {
        match slide_type {
            SlideType::BulletPoints => format!("Key Point {slide_number}"),
            SlideType::TwoColumn => format!("Comparison {slide_number}"),
            SlideType::ContentWithImage => format!("Visual {slide_number}"),
            SlideType::Title => topic.to_string(),
        }
    }

    fn citations(topic: &str) -> Vec<String> {
        vec![
            format!("Research paper on {topic}"),
            format!("Industry report on {topic}"),
        ]
    }

    fn bullet_slide(topic: &str, slide_number: usize, custom_content: Option<&str>) -> Slide {
        let title = Self::slide_title(topic, slide_number, SlideType::BulletPoints);
        let mut content = vec![
            format!("Important aspect of {topic}"),
            format!("Supporting detail for {title}"),
            format!("Additional information about {topic}"),
            format!("Conclusion for {title}"),
        ];
        if let Some(extra) = custom_content {
            content.push(format!("Custom content: {}...", truncate(extra, 50)));
        }
        Slide {
            slide_type: SlideType::BulletPoints,
            title,
            content,
            image_suggestion: None,
            citations: Self::citations(topic),
        }
    }

    fn two_column_slide(topic: &str, slide_number: usize, custom_content: Option<&str>) -> Slide {
        let title = Self::slide_title(topic, slide_number, SlideType::TwoColumn);
        let mut content = vec![
            format!("Column 1: Feature of {topic}"),
            format!("Column 2: Benefit of {topic}"),
            format!("Column 1: Advantage of {topic}"),
            format!("Column 2: Result of {topic}"),
        ];
        if custom_content.is_some() {
            content.push("Column 1: Custom aspect".to_string());
            content.push("Column 2: Custom benefit".to_string());
        }
        Slide {
            slide_type: SlideType::TwoColumn,
            title,
            content,
            image_suggestion: None,
            citations: Self::citations(topic),
        }
    }

    fn image_slide(topic: &str, slide_number: usize, custom_content: Option<&str>) -> Slide {
        let title = Self::slide_title(topic, slide_number, SlideType::ContentWithImage);
        let mut content = vec![
            format!("Main content about {topic}"),
            format!("Supporting text for {title}"),
            "Additional context and details".to_string(),
        ];
        if let Some(extra) = custom_content {
            content.push(format!("Custom content: {}...", truncate(extra, 50)));
        }
        Slide {
            slide_type: SlideType::ContentWithImage,
            title: title.clone(),
            content,
            image_suggestion: Some(format!("Image related to {topic} - {title}")),
            citations: Self::citations(topic),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl ContentGenerator for PlaceholderGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Placeholder
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

        (0..count)
            .map(|i| {
                let slide_number = i + 1;
                match types[i % types.len()] {
                    SlideType::TwoColumn => {
                        Self::two_column_slide(topic, slide_number, custom_content)
                    }
                    SlideType::ContentWithImage => {
                        Self::image_slide(topic, slide_number, custom_content)
                    }
                    _ => Self::bullet_slide(topic, slide_number, custom_content),
                }
            })
            .collect()
    }

    async fn generate_title(&self, topic: &str, custom_content: Option<&str>) -> (String, String) {
        let date = chrono::Utc::now().format("%B %d, %Y");
        let subtitle = match custom_content {
            Some(extra) => format!("{}... | Generated on {date}", truncate(extra, 50)),
            None => format!("Generated on {date}"),
        };
        (topic.to_string(), subtitle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generates_exact_count() {
        let gen = PlaceholderGenerator;
        for n in 0..=19 {
            let slides = gen.generate_body_slides("Rust", n, None, None).await;
            assert_eq!(slides.len(), n);
        }
    }

    #[tokio::test]
    async fn test_round_robin_over_default_types() {
        let gen = PlaceholderGenerator;
        let slides = gen.generate_body_slides("Rust", 6, None, None).await;
        assert_eq!(slides[0].slide_type, SlideType::BulletPoints);
        assert_eq!(slides[1].slide_type, SlideType::TwoColumn);
        assert_eq!(slides[2].slide_type, SlideType::ContentWithImage);
        assert_eq!(slides[3].slide_type, SlideType::BulletPoints);
    }

    #[tokio::test]
    async fn test_restricted_type_set() {
        let gen = PlaceholderGenerator;
        let slides = gen
            .generate_body_slides("Rust", 4, None, Some(&[SlideType::TwoColumn]))
            .await;
        assert!(slides.iter().all(|s| s.slide_type == SlideType::TwoColumn));
    }

    #[tokio::test]
    async fn test_body_slides_carry_citations() {
        let gen = PlaceholderGenerator;
        let slides = gen.generate_body_slides("Rust", 3, None, None).await;
        assert!(slides.iter().all(|s| s.citations.len() == 2));
    }

    #[tokio::test]
    async fn test_title_includes_custom_content() {
        let gen = PlaceholderGenerator;
        let (title, subtitle) = gen.generate_title("Rust", Some("memory safety")).await;
        assert_eq!(title, "Rust");
        assert!(subtitle.starts_with("memory safety"));
        assert!(subtitle.contains("Generated on"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo");
        assert_eq!(truncate("short", 50), "short");
    }
}
