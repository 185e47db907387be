//! # poster-layers
//!
//! Multi-layer raster compositor for stylized city poster maps.
//!
//! A poster is a stack of named layers. Each layer draws itself onto a
//! transparent canvas through a render callback, and the compositor caches
//! those canvases, applies per-layer opacity, and blends them bottom to top
//! over a solid background with one of sixteen Photoshop-style blend modes.
//!
//! ## Pipeline
//!
//! 1. **Geometry** ([`geometry`]) supplies map features through a
//!    [`GeoSource`] and projects them with a [`Viewport`].
//! 2. **Renderers** ([`renderers`]) draw features onto a [`Surface`] using
//!    theme colors, via a scanline rasterizer ([`rasterizer`], [`path`]).
//! 3. **Compositor** ([`compositor`]) caches each layer's raster, scales it
//!    by opacity, and blends the stack ([`blend`]).
//! 4. **Export** ([`export`]) writes PNG, JPEG, or BMP.
//!
//! ```
//! use poster_layers::{BlendMode, Compositor, Layer, LayerData, RenderResult, Rgba8, Surface};
//!
//! fn paper(s: &mut Surface, _: &mut LayerData) -> RenderResult {
//!     s.fill_rect(0.0, 0.0, 64.0, 64.0, Rgba8::opaque(200, 200, 200));
//!     Ok(())
//! }
//!
//! let mut poster = Compositor::new(64, 64);
//! poster.add_layer(Layer::new("base", "city").with_renderer(paper)).unwrap();
//! poster
//!     .add_layer(Layer::new("rails", "railway").with_blend_mode(BlendMode::Multiply))
//!     .unwrap();
//! let image = poster.composite().unwrap();
//! assert_eq!(image.dimensions(), (64, 64));
//! ```

// Foundation
pub mod basics;
pub mod color;
pub mod error;

// Rasterization
pub mod glyphs;
pub mod path;
pub mod raster;
pub mod rasterizer;
pub mod surface;

// Blending and layers
pub mod blend;
pub mod layer;
pub mod theme;

// Composition
pub mod compositor;
pub mod config;
pub mod export;
pub mod presets;

// Map content
pub mod geometry;
pub mod renderers;

pub use blend::BlendMode;
pub use color::{Rgb8, Rgba8};
pub use compositor::{compose_layers, Compositor};
pub use config::{CompositorConfig, LayerConfig};
pub use error::{BoxError, ColorError, CompositeError, ConfigError, RenderResult};
pub use export::ExportFormat;
pub use geometry::{Feature, FeatureCollection, FeatureKind, GeoSource, Geometry, Viewport};
pub use layer::{Layer, LayerData, LayerType, RenderLayer};
pub use raster::Raster;
pub use renderers::{build_composition, RendererRegistry};
pub use surface::Surface;
pub use theme::{Theme, ThemeOverrides};
