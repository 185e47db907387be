//! Serializable compositor configuration.
//!
//! [`CompositorConfig`] is the plain-data form of a compositor: canvas size,
//! dpi, background and the layer list. It leaves out everything that cannot
//! be written down as JSON (rendered rasters, fetched data, render callbacks)
//! and the theme, which callers load themselves.

use serde::{Deserialize, Serialize};

use crate::basics::clamp_unit;
use crate::blend::BlendMode;
use crate::color::Rgb8;
use crate::error::ConfigError;
use crate::layer::{Layer, LayerType};
use crate::theme::ThemeOverrides;

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 1600;
pub const DEFAULT_DPI: u32 = 150;

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

fn default_opacity() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}

/// One layer as configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub layer_type: LayerType,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// `None` stacks the layer on top when added.
    #[serde(default)]
    pub z_index: Option<i32>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "ThemeOverrides::is_empty")]
    pub theme_overrides: ThemeOverrides,
}

impl LayerConfig {
    pub fn new(name: impl Into<String>, layer_type: impl Into<LayerType>) -> Self {
        Self {
            name: name.into(),
            layer_type: layer_type.into(),
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            z_index: None,
            visible: true,
            theme_overrides: ThemeOverrides::new(),
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    /// A layer with these settings and no renderer.
    pub fn to_layer(&self) -> Layer {
        let mut layer = Layer::new(self.name.clone(), self.layer_type.clone())
            .with_opacity(self.opacity)
            .with_blend_mode(self.blend_mode)
            .with_visible(self.visible)
            .with_theme_overrides(self.theme_overrides.clone());
        layer.z_index = self.z_index;
        layer
    }

    pub fn from_layer(layer: &Layer) -> Self {
        Self {
            name: layer.name().to_owned(),
            layer_type: layer.layer_type().clone(),
            opacity: clamp_unit(layer.opacity()),
            blend_mode: layer.blend_mode(),
            z_index: Some(layer.z_index()),
            visible: layer.is_visible(),
            theme_overrides: layer.theme_overrides().clone(),
        }
    }
}

/// A whole compositor as configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositorConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default)]
    pub background_color: Rgb8,
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            dpi: DEFAULT_DPI,
            background_color: Rgb8::WHITE,
            layers: Vec::new(),
        }
    }
}

impl CompositorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let cfg = CompositorConfig::from_json("{}").unwrap();
        assert_eq!(cfg, CompositorConfig::default());

        let cfg = CompositorConfig::from_json(
            r#"{"layers": [{"name": "rail", "layer_type": "railway"}]}"#,
        )
        .unwrap();
        let layer = &cfg.layers[0];
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.blend_mode, BlendMode::Normal);
        assert_eq!(layer.z_index, None);
        assert!(layer.visible);
        assert_eq!(layer.layer_type, LayerType::Railway);
    }

    #[test]
    fn test_unknown_blend_mode_is_an_error() {
        let err = CompositorConfig::from_json(
            r#"{"layers": [{"name": "x", "layer_type": "city", "blend_mode": "glow"}]}"#,
        );
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_json_shape() {
        let cfg = CompositorConfig {
            layers: vec![LayerConfig::new("c", "city")
                .with_blend_mode(BlendMode::SoftLight)
                .with_z_index(3)],
            ..CompositorConfig::default()
        };
        let v: serde_json::Value = serde_json::from_str(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(v["background_color"], serde_json::json!([255, 255, 255]));
        assert_eq!(v["layers"][0]["blend_mode"], "soft_light");
        assert_eq!(v["layers"][0]["z_index"], 3);
        assert!(v["layers"][0].get("theme_overrides").is_none());
    }

    #[test]
    fn test_layer_conversion_clamps() {
        let layer = LayerConfig::new("t", "transit").with_opacity(4.0).to_layer();
        assert_eq!(layer.opacity(), 1.0);
        let back = LayerConfig::from_layer(&layer);
        assert_eq!(back.opacity, 1.0);
        assert_eq!(back.z_index, Some(0));
    }
}
