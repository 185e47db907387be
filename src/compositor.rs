//! The layer compositor.
//!
//! A [`Compositor`] owns an ordered stack of [`Layer`]s and folds them,
//! bottom to top, onto an opaque background:
//!
//! ```text
//! result = background
//! for layer in layers (ascending z-index, then insertion order):
//!     if layer is visible:
//!         result = blend(result, raster(layer), layer.blend_mode)
//! ```
//!
//! `raster(layer)` renders the layer onto a transparent [`Surface`], resizes
//! it to the canvas if needed, scales its alpha by the layer opacity, and
//! caches the result by layer name. Every mutation that can change a layer's
//! pixels drops the affected cache entries; see the individual methods.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use crate::basics::clamp_unit;
use crate::blend::{blend_into, BlendMode};
use crate::color::{Rgb8, Rgba8};
use crate::config::{CompositorConfig, LayerConfig, DEFAULT_DPI, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::{CompositeError, ConfigError};
use crate::export::{self, ExportFormat, DEFAULT_JPEG_QUALITY};
use crate::layer::{Layer, LayerData, RenderLayer};
use crate::raster::{self, Raster};
use crate::surface::Surface;
use crate::theme::{Theme, ThemeOverrides};

/// Default preview bound, a third of the default canvas.
pub const PREVIEW_SIZE: (u32, u32) = (400, 533);

/// Point size of the label drawn for layers without a renderer.
const PLACEHOLDER_FONT_PT: f64 = 20.0;

/// Color of the placeholder label: black at half opacity.
const PLACEHOLDER_COLOR: Rgba8 = Rgba8::new(0, 0, 0, 128);

pub struct Compositor {
    width: u32,
    height: u32,
    dpi: u32,
    background: Rgb8,
    theme: Theme,
    supersample: u32,
    layers: Vec<Layer>,
    cache: HashMap<String, Raster>,
    next_seq: u64,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Compositor {
    /// An empty compositor at 150 dpi on a white background.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            dpi: DEFAULT_DPI,
            background: Rgb8::WHITE,
            theme: Theme::default(),
            supersample: 1,
            layers: Vec::new(),
            cache: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_background(mut self, color: Rgb8) -> Self {
        self.background = color;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Render layers at `factor` times the canvas resolution and shrink.
    pub fn with_supersample(mut self, factor: u32) -> Self {
        self.supersample = factor.max(1);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn background_color(&self) -> Rgb8 {
        self.background
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn supersample(&self) -> u32 {
        self.supersample
    }

    /// Layers in compositing order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(Layer::name).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get_layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    fn sort_layers(&mut self) {
        self.layers.sort_by_key(Layer::stack_key);
    }

    fn invalidate(&mut self, name: &str) {
        self.cache.remove(name);
    }

    // ------------------------------------------------------------------------
    // Stack mutation
    // ------------------------------------------------------------------------

    /// Add a layer. Without an explicit z-index it goes on top of the stack.
    ///
    /// Clears the whole raster cache.
    pub fn add_layer(&mut self, mut layer: Layer) -> Result<(), CompositeError> {
        if self.index_of(&layer.name).is_some() {
            return Err(CompositeError::DuplicateLayer(layer.name));
        }
        if layer.z_index.is_none() {
            layer.z_index = Some(self.layers.len() as i32);
        }
        layer.seq = self.next_seq;
        self.next_seq += 1;
        log::debug!(
            "adding layer `{}` ({}) at z={}",
            layer.name,
            layer.layer_type,
            layer.z_index()
        );
        self.layers.push(layer);
        self.sort_layers();
        self.cache.clear();
        Ok(())
    }

    /// Remove a layer by name and hand it back.
    pub fn take_layer(&mut self, name: &str) -> Option<Layer> {
        let idx = self.index_of(name)?;
        let layer = self.layers.remove(idx);
        self.cache.clear();
        Some(layer)
    }

    /// Remove a layer by name. Returns whether it existed.
    pub fn remove_layer(&mut self, name: &str) -> bool {
        self.take_layer(name).is_some()
    }

    /// Give a layer a new z-index and restack. Returns whether it existed.
    pub fn move_layer(&mut self, name: &str, z_index: i32) -> bool {
        let Some(idx) = self.index_of(name) else {
            return false;
        };
        self.layers[idx].z_index = Some(z_index);
        self.sort_layers();
        self.cache.clear();
        true
    }

    /// Set a layer's opacity, clamped to [0, 1]. Only that layer re-renders.
    pub fn set_layer_opacity(&mut self, name: &str, opacity: f64) -> bool {
        let Some(idx) = self.index_of(name) else {
            return false;
        };
        self.layers[idx].opacity = clamp_unit(opacity);
        self.invalidate(name);
        true
    }

    /// Set a layer's blend mode. Clears the whole raster cache.
    pub fn set_layer_blend_mode(&mut self, name: &str, mode: BlendMode) -> bool {
        let Some(idx) = self.index_of(name) else {
            return false;
        };
        self.layers[idx].blend_mode = mode;
        self.cache.clear();
        true
    }

    /// Flip a layer's visibility. Returns the new state, or `None` if there
    /// is no such layer.
    pub fn toggle_layer_visibility(&mut self, name: &str) -> Option<bool> {
        let idx = self.index_of(name)?;
        let layer = &mut self.layers[idx];
        layer.visible = !layer.visible;
        let visible = layer.visible;
        self.cache.clear();
        Some(visible)
    }

    pub fn set_layer_visibility(&mut self, name: &str, visible: bool) -> bool {
        let Some(idx) = self.index_of(name) else {
            return false;
        };
        self.layers[idx].visible = visible;
        self.cache.clear();
        true
    }

    /// Bind a new render callback. Only that layer re-renders.
    pub fn set_layer_renderer<R>(&mut self, name: &str, renderer: R) -> bool
    where
        R: RenderLayer + 'static,
    {
        let Some(idx) = self.index_of(name) else {
            return false;
        };
        self.layers[idx].renderer = Some(Box::new(renderer));
        self.invalidate(name);
        true
    }

    /// Replace a layer's theme overrides. Only that layer re-renders.
    pub fn set_layer_theme_overrides(&mut self, name: &str, overrides: ThemeOverrides) -> bool {
        let Some(idx) = self.index_of(name) else {
            return false;
        };
        self.layers[idx].theme_overrides = overrides;
        self.invalidate(name);
        true
    }

    /// Mutable access to a layer's content cache.
    ///
    /// Assumes the caller changes something, so the layer re-renders.
    pub fn layer_data_mut(&mut self, name: &str) -> Option<&mut LayerData> {
        let idx = self.index_of(name)?;
        self.cache.remove(name);
        Some(&mut self.layers[idx].data)
    }

    /// Replace the palette. Clears the whole raster cache.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.cache.clear();
    }

    /// Change the background. Layer rasters do not include it, so the cache
    /// is kept.
    pub fn set_background_color(&mut self, color: Rgb8) {
        self.background = color;
    }

    /// Change the canvas size. Clears the whole raster cache.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.cache.clear();
    }

    pub fn set_supersample(&mut self, factor: u32) {
        self.supersample = factor.max(1);
        self.cache.clear();
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Whether a rendered raster for `name` is cached.
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Rendered raster for the named layer, from the cache when possible.
    ///
    /// Returns `Ok(None)` if there is no such layer. Visibility is not
    /// consulted.
    pub fn render_layer(&mut self, name: &str) -> Result<Option<&Raster>, CompositeError> {
        match self.index_of(name) {
            Some(idx) => self.layer_raster(idx).map(Some),
            None => Ok(None),
        }
    }

    fn layer_raster(&mut self, idx: usize) -> Result<&Raster, CompositeError> {
        let name = self.layers[idx].name.clone();
        if self.cache.contains_key(&name) {
            log::debug!("layer `{}`: cache hit", name);
            return Ok(&self.cache[&name]);
        }

        let started = Instant::now();
        let theme = self.theme.with_overrides(&self.layers[idx].theme_overrides);
        let mut surface = Surface::new(
            self.width,
            self.height,
            self.dpi as f64,
            self.supersample,
            theme,
        );

        let layer = &mut self.layers[idx];
        match &layer.renderer {
            Some(renderer) => {
                renderer
                    .render(&mut surface, &mut layer.data)
                    .map_err(|source| CompositeError::Render {
                        layer: name.clone(),
                        source,
                    })?;
            }
            None => {
                let label = format!("Layer: {}\nType: {}", layer.name, layer.layer_type);
                surface.draw_text_centered(
                    &label,
                    self.width as f64 * 0.5,
                    self.height as f64 * 0.5,
                    PLACEHOLDER_FONT_PT,
                    PLACEHOLDER_COLOR,
                );
            }
        }

        let mut raster = raster::resize_smooth(surface.into_raster(), self.width, self.height);
        raster::scale_alpha(&mut raster, layer.opacity);
        log::debug!(
            "layer `{}`: rendered in {:.1} ms",
            name,
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(self.cache.entry(name).or_insert(raster))
    }

    /// Blend every visible layer onto the background.
    pub fn composite(&mut self) -> Result<Raster, CompositeError> {
        let mut result = raster::background(self.width, self.height, self.background);
        for idx in 0..self.layers.len() {
            if !self.layers[idx].visible {
                continue;
            }
            let mode = self.layers[idx].blend_mode;
            let overlay = self.layer_raster(idx)?;
            blend_into(&mut result, overlay, mode)?;
        }
        Ok(result)
    }

    /// The composite shrunk to fit the default preview bound.
    pub fn preview(&mut self) -> Result<Raster, CompositeError> {
        self.preview_within(PREVIEW_SIZE.0, PREVIEW_SIZE.1)
    }

    /// The composite shrunk to fit within `max_width` x `max_height`.
    pub fn preview_within(
        &mut self,
        max_width: u32,
        max_height: u32,
    ) -> Result<Raster, CompositeError> {
        let full = self.composite()?;
        Ok(raster::fit_within(&full, max_width, max_height))
    }

    /// Composite and write to `path`. `quality` applies to JPEG only.
    pub fn export(
        &mut self,
        path: impl AsRef<Path>,
        format: ExportFormat,
        quality: u8,
    ) -> Result<(), CompositeError> {
        let result = self.composite()?;
        export::save(&result, path.as_ref(), format, quality, self.background)
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Plain-data description of the canvas and the layer stack.
    pub fn to_config(&self) -> CompositorConfig {
        CompositorConfig {
            width: self.width,
            height: self.height,
            dpi: self.dpi,
            background_color: self.background,
            layers: self.layers.iter().map(LayerConfig::from_layer).collect(),
        }
    }

    /// Rebuild a compositor from configuration. Layers come back without
    /// renderers and render as placeholders until one is bound.
    ///
    /// A duplicate layer name keeps the first layer and logs a warning.
    pub fn from_config(config: &CompositorConfig) -> Self {
        let mut compositor = Compositor::new(config.width, config.height)
            .with_dpi(config.dpi)
            .with_background(config.background_color);
        for layer in &config.layers {
            if let Err(e) = compositor.add_layer(layer.to_layer()) {
                log::warn!("skipping layer: {}", e);
            }
        }
        compositor
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        self.to_config().to_json()
    }

    /// Parse JSON configuration, then build as [`Compositor::from_config`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config = CompositorConfig::from_json(json)?;
        Ok(Self::from_config(&config))
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dpi", &self.dpi)
            .field("background", &self.background)
            .field("theme", &self.theme.name)
            .field("supersample", &self.supersample)
            .field("layers", &self.layers)
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Build a compositor from layer configs, composite it, and optionally save.
///
/// Layers render as placeholders. The output format is guessed from the
/// file extension (PNG when unknown) and JPEG uses quality 95.
pub fn compose_layers(
    configs: &[LayerConfig],
    width: u32,
    height: u32,
    output: Option<&Path>,
) -> Result<Raster, CompositeError> {
    let mut compositor = Compositor::new(width, height);
    for config in configs {
        compositor.add_layer(config.to_layer())?;
    }
    let result = compositor.composite()?;
    if let Some(path) = output {
        let format = ExportFormat::from_path(path).unwrap_or_default();
        export::save(&result, path, format, DEFAULT_JPEG_QUALITY, compositor.background)?;
    }
    Ok(result)
}
