use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_FAMILY: &str = "Georgia, serif";
pub const DEFAULT_LINE_HEIGHT: f32 = 1.5;
pub const MIN_LINE_HEIGHT: f32 = 1.0;
pub const MAX_LINE_HEIGHT: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// How a comma-separated field is laid out in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    #[default]
    Bulleted,
    Inline,
}

impl ListMode {
    pub fn toggled(self) -> Self {
        match self {
            ListMode::Bulleted => ListMode::Inline,
            ListMode::Inline => ListMode::Bulleted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListMode::Bulleted => "bulleted",
            ListMode::Inline => "inline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageAlign {
    #[default]
    Left,
    Right,
}

impl ImageAlign {
    pub fn toggled(self) -> Self {
        match self {
            ImageAlign::Left => ImageAlign::Right,
            ImageAlign::Right => ImageAlign::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageAlign::Left => "left",
            ImageAlign::Right => "right",
        }
    }
}

/// Peripheral styling state persisted next to the answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub font_family: String,
    pub line_height: f32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub list_modes: BTreeMap<String, ListMode>,
    pub image_align: ImageAlign,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            line_height: DEFAULT_LINE_HEIGHT,
            list_modes: BTreeMap::new(),
            image_align: ImageAlign::default(),
        }
    }
}

impl Settings {
    pub fn list_mode(&self, field: &str) -> ListMode {
        self.list_modes.get(field).copied().unwrap_or_default()
    }

    pub fn set_list_mode(&mut self, field: impl Into<String>, mode: ListMode) {
        self.list_modes.insert(field.into(), mode);
    }

    /// Flips the display mode of `field` and returns the new mode.
    pub fn toggle_list_mode(&mut self, field: &str) -> ListMode {
        let mode = self.list_mode(field).toggled();
        self.set_list_mode(field, mode);
        mode
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn toggle_image_align(&mut self) -> ImageAlign {
        self.image_align = self.image_align.toggled();
        self.image_align
    }

    /// Blank families fall back to the default font.
    pub fn set_font_family(&mut self, family: &str) {
        let family = family.trim();
        self.font_family = if family.is_empty() {
            DEFAULT_FONT_FAMILY.to_string()
        } else {
            family.to_string()
        };
    }

    /// Stores the line height clamped to the supported range.
    pub fn set_line_height(&mut self, value: f32) -> f32 {
        self.line_height = if value.is_finite() {
            value.clamp(MIN_LINE_HEIGHT, MAX_LINE_HEIGHT)
        } else {
            DEFAULT_LINE_HEIGHT
        };
        self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_modes_default_to_bulleted_and_toggle() {
        let mut settings = Settings::default();
        assert_eq!(settings.list_mode("skills"), ListMode::Bulleted);
        assert_eq!(settings.toggle_list_mode("skills"), ListMode::Inline);
        assert_eq!(settings.list_mode("skills"), ListMode::Inline);
        assert_eq!(settings.list_mode("hobbies"), ListMode::Bulleted);
    }

    #[test]
    fn line_height_is_clamped() {
        let mut settings = Settings::default();
        assert_eq!(settings.set_line_height(9.0), MAX_LINE_HEIGHT);
        assert_eq!(settings.set_line_height(0.2), MIN_LINE_HEIGHT);
        assert_eq!(settings.set_line_height(f32::NAN), DEFAULT_LINE_HEIGHT);
    }

    #[test]
    fn partial_snapshots_fill_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "theme": "dark" }"#).expect("settings");
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.font_family, DEFAULT_FONT_FAMILY);
        assert_eq!(settings.image_align, ImageAlign::Left);
    }
}
