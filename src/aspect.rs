use serde::{Deserialize, Serialize};

pub const MIN_DIMENSION_INCHES: f64 = 5.0;
pub const MAX_DIMENSION_INCHES: f64 = 20.0;

/// Page dimension preset, or explicit custom width/height in inches.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Widescreen16x9,
    #[serde(rename = "4:3")]
    Standard4x3,
    #[serde(rename = "A4")]
    A4Portrait,
    #[serde(rename = "A4_L")]
    A4Landscape,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "custom")]
    Custom,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Widescreen16x9 => "16:9",
            AspectRatio::Standard4x3 => "4:3",
            AspectRatio::A4Portrait => "A4",
            AspectRatio::A4Landscape => "A4_L",
            AspectRatio::Square => "1:1",
            AspectRatio::Custom => "custom",
        }
    }

    /// Parse a persisted value, coercing anything unknown to widescreen.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "4:3" => AspectRatio::Standard4x3,
            "A4" => AspectRatio::A4Portrait,
            "A4_L" => AspectRatio::A4Landscape,
            "1:1" => AspectRatio::Square,
            "custom" => AspectRatio::Custom,
            _ => AspectRatio::Widescreen16x9,
        }
    }

    /// Preset width/height in inches. Custom falls back to widescreen here;
    /// callers with validated custom dimensions use those directly.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            AspectRatio::Widescreen16x9 | AspectRatio::Custom => (13.33, 7.5),
            AspectRatio::Standard4x3 => (10.0, 7.5),
            AspectRatio::A4Portrait => (8.27, 11.69),
            AspectRatio::A4Landscape => (11.69, 8.27),
            AspectRatio::Square => (10.0, 10.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AspectRatio::Widescreen16x9 => "Widescreen (16:9)",
            AspectRatio::Standard4x3 => "Standard (4:3)",
            AspectRatio::A4Portrait => "A4 Portrait",
            AspectRatio::A4Landscape => "A4 Landscape",
            AspectRatio::Square => "Square (1:1)",
            AspectRatio::Custom => "Custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AspectRatio::Widescreen16x9 => "Standard widescreen format, great for modern displays",
            AspectRatio::Standard4x3 => "Traditional standard format, good for older projectors",
            AspectRatio::A4Portrait => "A4 paper ratio in portrait orientation",
            AspectRatio::A4Landscape => "A4 paper ratio in landscape orientation",
            AspectRatio::Square => "Square format, great for social media and mobile",
            AspectRatio::Custom => "Custom dimensions",
        }
    }

    pub fn orientation(&self) -> &'static str {
        let (w, h) = self.dimensions();
        if w > h {
            "landscape"
        } else if h > w {
            "portrait"
        } else {
            "square"
        }
    }

    /// Named presets, excluding custom.
    pub fn presets() -> [AspectRatio; 5] {
        [
            AspectRatio::Widescreen16x9,
            AspectRatio::Standard4x3,
            AspectRatio::A4Portrait,
            AspectRatio::A4Landscape,
            AspectRatio::Square,
        ]
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn valid_custom_dimensions(width: f64, height: f64) -> bool {
    (MIN_DIMENSION_INCHES..=MAX_DIMENSION_INCHES).contains(&width)
        && (MIN_DIMENSION_INCHES..=MAX_DIMENSION_INCHES).contains(&height)
}

/// Effective page size in inches for a presentation's ratio + custom dims.
pub fn page_size(
    aspect_ratio: AspectRatio,
    custom_width: Option<f64>,
    custom_height: Option<f64>,
) -> (f64, f64) {
    if aspect_ratio == AspectRatio::Custom {
        if let (Some(w), Some(h)) = (custom_width, custom_height) {
            return (w, h);
        }
    }
    aspect_ratio.dimensions()
}
