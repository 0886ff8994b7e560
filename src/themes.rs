use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named styling bundle: a default font plus a five-role color palette.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Modern,
    Classic,
    Minimal,
    Corporate,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Modern => "modern",
            Theme::Classic => "classic",
            Theme::Minimal => "minimal",
            Theme::Corporate => "corporate",
        }
    }

    /// Parse a persisted value, coercing anything unknown to modern.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "classic" => Theme::Classic,
            "minimal" => Theme::Minimal,
            "corporate" => Theme::Corporate,
            _ => Theme::Modern,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ThemeConfig;

impl ThemeConfig {
    pub fn font(theme: Theme) -> &'static str {
        match theme {
            Theme::Modern => "Segoe UI",
            Theme::Classic => "Georgia",
            Theme::Minimal => "Arial",
            Theme::Corporate => "Roboto",
        }
    }

    fn palette(theme: Theme) -> [(&'static str, &'static str); 5] {
        match theme {
            Theme::Modern => [
                ("primary", "#2E86AB"),
                ("secondary", "#A23B72"),
                ("background", "#FFFFFF"),
                ("text", "#2C3E50"),
                ("accent", "#3498DB"),
            ],
            Theme::Classic => [
                ("primary", "#1F4E79"),
                ("secondary", "#D4AF37"),
                ("background", "#F8F9FA"),
                ("text", "#2C3E50"),
                ("accent", "#4682B4"),
            ],
            Theme::Minimal => [
                ("primary", "#E74C3C"),
                ("secondary", "#F39C12"),
                ("background", "#000000"),
                ("text", "#FFFFFF"),
                ("accent", "#ECF0F1"),
            ],
            Theme::Corporate => [
                ("primary", "#3498DB"),
                ("secondary", "#2ECC71"),
                ("background", "#1A1A2E"),
                ("text", "#E8E8E8"),
                ("accent", "#F39C12"),
            ],
        }
    }

    pub fn colors(theme: Theme) -> BTreeMap<String, String> {
        Self::palette(theme)
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn color(theme: Theme, role: &str) -> Option<&'static str> {
        Self::palette(theme)
            .iter()
            .find(|(k, _)| *k == role)
            .map(|(_, v)| *v)
    }
}
