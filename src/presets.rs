//! Canned layer stacks.
//!
//! Each preset is a short list of layer settings that work well together,
//! ready to feed into [`Compositor::add_layer`](crate::Compositor::add_layer)
//! through [`LayerPreset::layer_configs`].

use crate::blend::BlendMode;
use crate::config::LayerConfig;
use crate::error::ConfigError;

/// One layer of a preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetLayer {
    pub name: &'static str,
    pub layer_type: &'static str,
    pub opacity: f64,
    pub blend_mode: BlendMode,
    pub z_index: i32,
}

impl PresetLayer {
    pub fn to_config(&self) -> LayerConfig {
        LayerConfig::new(self.name, self.layer_type)
            .with_opacity(self.opacity)
            .with_blend_mode(self.blend_mode)
            .with_z_index(self.z_index)
    }
}

/// A named layer stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerPreset {
    pub name: &'static str,
    /// Short human-readable title.
    pub label: &'static str,
    pub layers: &'static [PresetLayer],
}

impl LayerPreset {
    pub fn layer_configs(&self) -> Vec<LayerConfig> {
        self.layers.iter().map(PresetLayer::to_config).collect()
    }
}

const fn layer(
    name: &'static str,
    layer_type: &'static str,
    opacity: f64,
    blend_mode: BlendMode,
    z_index: i32,
) -> PresetLayer {
    PresetLayer {
        name,
        layer_type,
        opacity,
        blend_mode,
        z_index,
    }
}

static PRESETS: [LayerPreset; 5] = [
    LayerPreset {
        name: "city_railway_overlay",
        label: "City + Railways",
        layers: &[
            layer("city_base", "city", 1.0, BlendMode::Normal, 0),
            layer("railway_overlay", "railway", 0.9, BlendMode::Multiply, 1),
        ],
    },
    LayerPreset {
        name: "cycling_highlight",
        label: "Cycling Routes",
        layers: &[
            layer("city_faded", "city", 0.5, BlendMode::Normal, 0),
            layer("cycling_highlight", "cycling", 1.0, BlendMode::Screen, 1),
        ],
    },
    LayerPreset {
        name: "transit_focus",
        label: "Public Transit",
        layers: &[
            layer("city_subtle", "city", 0.3, BlendMode::Multiply, 0),
            layer("transit_lines", "transit", 1.0, BlendMode::Normal, 1),
        ],
    },
    LayerPreset {
        name: "coastal_city",
        label: "Coastal/Maritime",
        layers: &[
            layer("city_land", "city", 0.7, BlendMode::Normal, 0),
            layer("maritime_water", "maritime", 0.8, BlendMode::Overlay, 1),
        ],
    },
    LayerPreset {
        name: "triple_transit",
        label: "All Transit Layers",
        layers: &[
            layer("city_base", "city", 0.4, BlendMode::Normal, 0),
            layer("railway_layer", "railway", 0.7, BlendMode::Multiply, 1),
            layer("transit_layer", "transit", 0.9, BlendMode::Screen, 2),
        ],
    },
];

/// Every preset, in catalog order.
pub fn all() -> &'static [LayerPreset] {
    &PRESETS
}

pub fn names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

/// Look up a preset by name.
pub fn find(name: &str) -> Result<&'static LayerPreset, ConfigError> {
    PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ConfigError::UnknownPreset {
            name: name.to_owned(),
            available: names(),
        })
}
