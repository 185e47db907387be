//! Layers and the render callback contract.
//!
//! A [`Layer`] is one entry in a compositor's stack: a name, a type tag, how
//! it blends, and optionally a [`RenderLayer`] that paints its content. The
//! layer also carries a [`LayerData`] map so a renderer can fetch its source
//! data once and reuse it on every later render.

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::basics::clamp_unit;
use crate::blend::BlendMode;
use crate::error::RenderResult;
use crate::surface::Surface;
use crate::theme::ThemeOverrides;

// ============================================================================
// LayerType
// ============================================================================

/// The kind of map content a layer holds.
///
/// The type carries no behavior in the blend algebra; it selects a renderer
/// and labels placeholders. Unrecognized names are kept as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerType {
    City,
    Railway,
    Cycling,
    Transit,
    Maritime,
    Custom(String),
}

impl LayerType {
    /// The five built-in map types.
    pub const STANDARD: [LayerType; 5] = [
        LayerType::City,
        LayerType::Railway,
        LayerType::Cycling,
        LayerType::Transit,
        LayerType::Maritime,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            LayerType::City => "city",
            LayerType::Railway => "railway",
            LayerType::Cycling => "cycling",
            LayerType::Transit => "transit",
            LayerType::Maritime => "maritime",
            LayerType::Custom(s) => s,
        }
    }
}

impl From<&str> for LayerType {
    fn from(s: &str) -> Self {
        match s {
            "city" => LayerType::City,
            "railway" => LayerType::Railway,
            "cycling" => LayerType::Cycling,
            "transit" => LayerType::Transit,
            "maritime" => LayerType::Maritime,
            other => LayerType::Custom(other.to_owned()),
        }
    }
}

impl From<String> for LayerType {
    fn from(s: String) -> Self {
        LayerType::from(s.as_str())
    }
}

impl From<LayerType> for String {
    fn from(t: LayerType) -> Self {
        match t {
            LayerType::Custom(s) => s,
            other => other.as_str().to_owned(),
        }
    }
}

impl FromStr for LayerType {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(LayerType::from(s))
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LayerData
// ============================================================================

/// Per-layer content cache: string keys to values of any type.
///
/// This is separate from the compositor's raster cache. Clearing rasters
/// never drops fetched data, so re-rendering after an opacity or theme change
/// does not fetch again.
#[derive(Default)]
pub struct LayerData {
    entries: HashMap<String, Box<dyn Any>>,
}

impl LayerData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Value under `key`, if present and of type `T`.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key)?.downcast_mut()
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn insert<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    /// Value under `key`, computing and storing it first if missing.
    ///
    /// An entry of a different type is replaced.
    pub fn get_or_insert_with<T: 'static, F: FnOnce() -> T>(&mut self, key: &str, f: F) -> &mut T {
        let slot = match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut e) => {
                if !e.get().is::<T>() {
                    e.insert(Box::new(f()));
                }
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(Box::new(f())),
        };
        match slot.downcast_mut::<T>() {
            Some(v) => v,
            None => unreachable!("slot was just filled with the requested type"),
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for LayerData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("LayerData").field("keys", &keys).finish()
    }
}

// ============================================================================
// RenderLayer
// ============================================================================

/// Paints a layer's content onto a transparent surface.
///
/// `data` persists between calls for the same layer; implementations use it
/// to fetch source data once. Returning an error aborts the composite.
pub trait RenderLayer {
    fn render(&self, surface: &mut Surface, data: &mut LayerData) -> RenderResult;
}

impl<F> RenderLayer for F
where
    F: Fn(&mut Surface, &mut LayerData) -> RenderResult,
{
    fn render(&self, surface: &mut Surface, data: &mut LayerData) -> RenderResult {
        self(surface, data)
    }
}

// ============================================================================
// Layer
// ============================================================================

/// One entry in the layer stack.
pub struct Layer {
    pub(crate) name: String,
    pub(crate) layer_type: LayerType,
    pub(crate) opacity: f64,
    pub(crate) blend_mode: BlendMode,
    pub(crate) visible: bool,
    pub(crate) z_index: Option<i32>,
    pub(crate) data: LayerData,
    pub(crate) renderer: Option<Box<dyn RenderLayer>>,
    pub(crate) theme_overrides: ThemeOverrides,
    pub(crate) seq: u64,
}

impl Layer {
    /// A visible, fully opaque, normally blended layer with no renderer.
    pub fn new(name: impl Into<String>, layer_type: impl Into<LayerType>) -> Self {
        Self {
            name: name.into(),
            layer_type: layer_type.into(),
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            visible: true,
            z_index: None,
            data: LayerData::new(),
            renderer: None,
            theme_overrides: ThemeOverrides::new(),
            seq: 0,
        }
    }

    /// Opacity, clamped to [0, 1].
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = clamp_unit(opacity);
        self
    }

    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    /// Explicit stacking position. Without one the layer goes on top.
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_renderer<R: RenderLayer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn with_boxed_renderer(mut self, renderer: Box<dyn RenderLayer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_data(mut self, data: LayerData) -> Self {
        self.data = data;
        self
    }

    pub fn with_theme_overrides(mut self, overrides: ThemeOverrides) -> Self {
        self.theme_overrides = overrides;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layer_type(&self) -> &LayerType {
        &self.layer_type
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Stacking position; 0 until assigned by the compositor.
    pub fn z_index(&self) -> i32 {
        self.z_index.unwrap_or(0)
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn data(&self) -> &LayerData {
        &self.data
    }

    pub fn theme_overrides(&self) -> &ThemeOverrides {
        &self.theme_overrides
    }

    /// Sort key: z-index, then insertion order.
    pub(crate) fn stack_key(&self) -> (i32, u64) {
        (self.z_index(), self.seq)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("layer_type", &self.layer_type)
            .field("opacity", &self.opacity)
            .field("blend_mode", &self.blend_mode)
            .field("visible", &self.visible)
            .field("z_index", &self.z_index)
            .field("renderer", &self.renderer.is_some())
            .field("data", &self.data)
            .field("theme_overrides", &self.theme_overrides)
            .finish()
    }
}
