//! Color themes.
//!
//! A theme maps semantic color roles (`"bg"`, `"water"`, `"road_primary"`,
//! `"railway"`, ...) to color strings. Themes load from the flat JSON shape
//! used by poster theme files:
//!
//! ```json
//! { "name": "Noir", "bg": "#000000", "water": "#0A1A2A" }
//! ```
//!
//! Renderers never fail on a missing or malformed role; they fall back to
//! their own default color.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::Rgba8;
use crate::error::ConfigError;

/// Per-layer theme replacements: role to color string.
pub type ThemeOverrides = BTreeMap<String, String>;

/// A named palette of color roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    colors: BTreeMap<String, String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::feature_based()
    }
}

impl Theme {
    /// An empty palette. Every lookup falls back to the caller's default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            colors: BTreeMap::new(),
        }
    }

    /// The built-in greyscale "Feature-Based Shading" palette.
    pub fn feature_based() -> Self {
        Self::new("Feature-Based Shading")
            .with("bg", "#FFFFFF")
            .with("text", "#000000")
            .with("gradient_color", "#FFFFFF")
            .with("water", "#C0C0C0")
            .with("parks", "#F0F0F0")
            .with("road_motorway", "#0A0A0A")
            .with("road_primary", "#1A1A1A")
            .with("road_secondary", "#2A2A2A")
            .with("road_tertiary", "#3A3A3A")
            .with("road_residential", "#4A4A4A")
            .with("road_default", "#3A3A3A")
    }

    /// Parse a theme from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style [`Theme::set`].
    pub fn with(mut self, role: &str, color: &str) -> Self {
        self.set(role, color);
        self
    }

    pub fn set(&mut self, role: &str, color: &str) {
        self.colors.insert(role.to_owned(), color.to_owned());
    }

    /// Raw color string for a role.
    pub fn get(&self, role: &str) -> Option<&str> {
        self.colors.get(role).map(String::as_str)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.colors.keys().map(String::as_str)
    }

    /// A copy of this theme with `overrides` replacing matching roles.
    pub fn with_overrides(&self, overrides: &ThemeOverrides) -> Theme {
        let mut merged = self.clone();
        for (role, color) in overrides {
            merged.colors.insert(role.clone(), color.clone());
        }
        merged
    }

    /// Parsed color for a role, if present and valid.
    ///
    /// A present but unparseable value is logged and treated as absent.
    pub fn color(&self, role: &str) -> Option<Rgba8> {
        let raw = self.get(role)?;
        match Rgba8::from_hex(raw) {
            Ok(c) => Some(c),
            Err(e) => {
                log::warn!("theme `{}`: role `{}`: {}", self.name, role, e);
                None
            }
        }
    }

    /// Parsed color for a role, or `fallback`.
    pub fn color_or(&self, role: &str, fallback: Rgba8) -> Rgba8 {
        self.color(role).unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette() {
        let t = Theme::default();
        assert_eq!(t.name, "Feature-Based Shading");
        assert_eq!(t.color("water"), Some(Rgba8::opaque(0xC0, 0xC0, 0xC0)));
        assert_eq!(t.color("railway"), None);
        assert_eq!(t.roles().count(), 11);
    }

    #[test]
    fn test_overrides_replace_roles() {
        let mut o = ThemeOverrides::new();
        o.insert("water".into(), "#4A90E2".into());
        o.insert("railway".into(), "#8B4513".into());
        let merged = Theme::default().with_overrides(&o);
        assert_eq!(merged.get("water"), Some("#4A90E2"));
        assert_eq!(merged.get("railway"), Some("#8B4513"));
        assert_eq!(merged.get("bg"), Some("#FFFFFF"));
    }

    #[test]
    fn test_bad_color_falls_back() {
        let t = Theme::new("broken").with("water", "blue-ish");
        let fallback = Rgba8::opaque(1, 2, 3);
        assert_eq!(t.color_or("water", fallback), fallback);
        assert_eq!(t.color_or("parks", fallback), fallback);
    }

    #[test]
    fn test_json_flat_shape() {
        let t = Theme::from_json(r##"{"name": "Noir", "bg": "#000000", "water": "#0a1a2a"}"##)
            .unwrap();
        assert_eq!(t.name, "Noir");
        assert_eq!(t.color("water"), Some(Rgba8::opaque(0x0A, 0x1A, 0x2A)));

        let back = serde_json::to_value(&t).unwrap();
        assert_eq!(back["bg"], "#000000");
        assert!(Theme::from_json("[1, 2]").is_err());
    }
}
