//! Render callbacks for the standard poster layer types.
//!
//! Each renderer fetches its feature kinds from a shared [`GeoSource`] the
//! first time it runs and keeps them in the layer's [`LayerData`] under the
//! keys in [`keys`]. A failed fetch is stored as "no data" and is not
//! retried, so re-rendering after an opacity or theme change is cheap.
//!
//! Line widths are given in points, as on a printed poster, and converted
//! with the surface dpi.

use std::collections::HashMap;
use std::rc::Rc;

use crate::basics::{LineCap, Point};
use crate::color::Rgba8;
use crate::compositor::Compositor;
use crate::config::CompositorConfig;
use crate::error::RenderResult;
use crate::geometry::{Feature, FeatureCollection, FeatureKind, GeoSource, Projector, Viewport};
use crate::layer::{Layer, LayerData, LayerType, RenderLayer};
use crate::surface::Surface;

/// [`LayerData`] keys used by the standard renderers.
pub mod keys {
    pub const GRAPH: &str = "graph";
    pub const WATER: &str = "water";
    pub const PARKS: &str = "parks";
    pub const RAILWAYS: &str = "railways";
    pub const CYCLE_ROUTES: &str = "cycle_routes";
    pub const CYCLEWAYS: &str = "cycleways";
    pub const TRANSIT: &str = "transit";
    pub const COASTLINE: &str = "coastline";
}

/// What a renderer keeps per key: the features, or `None` after a failed
/// fetch.
pub type Fetched = Option<FeatureCollection>;

// Fallback colors, used when the theme has no valid value for a role.
const WATER: Rgba8 = Rgba8::opaque(0xA8, 0xD5, 0xF0);
const PARKS: Rgba8 = Rgba8::opaque(0xC8, 0xE6, 0xC9);
const RAILWAY: Rgba8 = Rgba8::opaque(0x8B, 0x45, 0x13);
const CYCLEWAY: Rgba8 = Rgba8::opaque(0x4C, 0xAF, 0x50);
const CYCLE_ROUTE: Rgba8 = Rgba8::opaque(0xFF, 0x98, 0x00);
const TRANSIT: Rgba8 = Rgba8::opaque(0xE9, 0x1E, 0x63);
const TRANSIT_TRAM: Rgba8 = Rgba8::opaque(0x21, 0x96, 0xF3);
const TRANSIT_BUS: Rgba8 = Rgba8::opaque(0xFF, 0x57, 0x22);
const TRANSIT_TRAIN: Rgba8 = Rgba8::opaque(0x9C, 0x27, 0xB0);
const SEA: Rgba8 = Rgba8::opaque(0x4A, 0x90, 0xE2);
const SEA_EDGE: Rgba8 = Rgba8::opaque(0x2E, 0x5C, 0x8A);
const COASTLINE: Rgba8 = Rgba8::opaque(0x1A, 0x52, 0x76);
const STREET_LIGHT: Rgba8 = Rgba8::opaque(0xD0, 0xD0, 0xD0);

const NO_DATA_LABEL_PT: f64 = 10.0;

// ============================================================================
// Shared helpers
// ============================================================================

/// Fetch `kind` into `data[key]` unless an earlier render already did.
fn fetch_once(data: &mut LayerData, source: &dyn GeoSource, key: &str, kind: FeatureKind) {
    data.get_or_insert_with::<Fetched, _>(key, || match source.fetch(kind) {
        Ok(features) => Some(features),
        Err(e) => {
            log::warn!("fetching {:?} failed: {}", kind, e);
            None
        }
    });
}

fn fetched<'a>(data: &'a LayerData, key: &str) -> Option<&'a FeatureCollection> {
    data.get::<Fetched>(key).and_then(Option::as_ref)
}

fn fill_polygons(
    surface: &mut Surface,
    proj: &Projector,
    features: &FeatureCollection,
    color: Rgba8,
) {
    for poly in features.polygons() {
        let exterior = proj.project_all(&poly.exterior);
        let holes: Vec<Vec<Point>> = poly.holes.iter().map(|h| proj.project_all(h)).collect();
        surface.fill_polygon(&exterior, &holes, color);
    }
}

fn outline_polygons(
    surface: &mut Surface,
    proj: &Projector,
    features: &FeatureCollection,
    width: f64,
    color: Rgba8,
) {
    for poly in features.polygons() {
        for ring in std::iter::once(&poly.exterior).chain(&poly.holes) {
            let mut pts = proj.project_all(ring);
            if let Some(&first) = pts.first() {
                pts.push(first);
            }
            surface.stroke_polyline(&pts, width, color, LineCap::Round);
        }
    }
}

fn stroke_lines<'a>(
    surface: &mut Surface,
    proj: &Projector,
    lines: impl Iterator<Item = (&'a Feature, &'a [Point])>,
    width: f64,
    color: Rgba8,
) {
    for (_, line) in lines {
        surface.stroke_polyline(&proj.project_all(line), width, color, LineCap::Round);
    }
}

/// All streets in one flat color, for context under an overlay.
fn light_streets(
    surface: &mut Surface,
    proj: &Projector,
    streets: &FeatureCollection,
    color: Rgba8,
    width_pt: f64,
) {
    let width = surface.points_to_pixels(width_pt);
    stroke_lines(surface, proj, streets.lines(), width, color);
}

fn no_data_label(surface: &mut Surface, text: &str) {
    let color = surface.theme().color_or("text", Rgba8::BLACK);
    let (cx, cy) = (surface.width() as f64 * 0.5, surface.height() as f64 * 0.5);
    surface.draw_text_centered(text, cx, cy, NO_DATA_LABEL_PT, color);
}

// ============================================================================
// Road classes
// ============================================================================

/// Street hierarchy derived from the `highway` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoadClass {
    Default,
    Residential,
    Tertiary,
    Secondary,
    Primary,
    Motorway,
}

impl RoadClass {
    /// Class for a `highway` tag value. Multi-valued tags (`a;b`) use the
    /// first value; a missing tag counts as `unclassified`.
    pub fn from_highway(tag: Option<&str>) -> Self {
        let value = tag
            .and_then(|t| t.split(';').next())
            .map(str::trim)
            .unwrap_or("unclassified");
        match value {
            "motorway" | "motorway_link" => RoadClass::Motorway,
            "trunk" | "trunk_link" | "primary" | "primary_link" => RoadClass::Primary,
            "secondary" | "secondary_link" => RoadClass::Secondary,
            "tertiary" | "tertiary_link" => RoadClass::Tertiary,
            "residential" | "living_street" | "unclassified" => RoadClass::Residential,
            _ => RoadClass::Default,
        }
    }

    /// Line width in points.
    pub fn width_pt(self) -> f64 {
        match self {
            RoadClass::Motorway => 1.2,
            RoadClass::Primary => 1.0,
            RoadClass::Secondary => 0.8,
            RoadClass::Tertiary => 0.6,
            RoadClass::Residential | RoadClass::Default => 0.4,
        }
    }

    /// Theme role for the line color.
    pub fn color_role(self) -> &'static str {
        match self {
            RoadClass::Motorway => "road_motorway",
            RoadClass::Primary => "road_primary",
            RoadClass::Secondary => "road_secondary",
            RoadClass::Tertiary => "road_tertiary",
            RoadClass::Residential => "road_residential",
            RoadClass::Default => "road_default",
        }
    }

    fn fallback_color(self) -> Rgba8 {
        match self {
            RoadClass::Motorway => Rgba8::opaque(0x0A, 0x0A, 0x0A),
            RoadClass::Primary => Rgba8::opaque(0x1A, 0x1A, 0x1A),
            RoadClass::Secondary => Rgba8::opaque(0x2A, 0x2A, 0x2A),
            RoadClass::Tertiary | RoadClass::Default => Rgba8::opaque(0x3A, 0x3A, 0x3A),
            RoadClass::Residential => Rgba8::opaque(0x4A, 0x4A, 0x4A),
        }
    }
}

// ============================================================================
// City
// ============================================================================

/// Water, parks, and the street network styled by road class.
pub struct CityRenderer {
    source: Rc<dyn GeoSource>,
    viewport: Viewport,
}

impl CityRenderer {
    pub fn new(source: Rc<dyn GeoSource>, viewport: Viewport) -> Self {
        Self { source, viewport }
    }
}

impl RenderLayer for CityRenderer {
    fn render(&self, surface: &mut Surface, data: &mut LayerData) -> RenderResult {
        let src = self.source.as_ref();
        fetch_once(data, src, keys::GRAPH, FeatureKind::StreetNetwork);
        fetch_once(data, src, keys::WATER, FeatureKind::Water);
        fetch_once(data, src, keys::PARKS, FeatureKind::Parks);

        let Some(streets) = fetched(data, keys::GRAPH) else {
            no_data_label(surface, "No street data available");
            return Ok(());
        };
        let proj = self.viewport.projector(surface.width(), surface.height());
        let theme = surface.theme().clone();

        if let Some(water) = fetched(data, keys::WATER) {
            fill_polygons(surface, &proj, water, theme.color_or("water", WATER));
        }
        if let Some(parks) = fetched(data, keys::PARKS) {
            fill_polygons(surface, &proj, parks, theme.color_or("parks", PARKS));
        }

        // Minor roads first so major roads stay on top.
        let mut roads: Vec<(RoadClass, &[Point])> = streets
            .lines()
            .map(|(f, line)| (RoadClass::from_highway(f.tag("highway")), line))
            .collect();
        roads.sort_by_key(|(class, _)| *class);
        for (class, line) in roads {
            let color = theme.color_or(class.color_role(), class.fallback_color());
            let width = surface.points_to_pixels(class.width_pt());
            surface.stroke_polyline(&proj.project_all(line), width, color, LineCap::Round);
        }
        Ok(())
    }
}

// ============================================================================
// Railway
// ============================================================================

/// Railway lines and stations over water and faint streets.
pub struct RailwayRenderer {
    source: Rc<dyn GeoSource>,
    viewport: Viewport,
    include_roads: bool,
}

impl RailwayRenderer {
    pub fn new(source: Rc<dyn GeoSource>, viewport: Viewport) -> Self {
        Self {
            source,
            viewport,
            include_roads: true,
        }
    }

    pub fn include_roads(mut self, include: bool) -> Self {
        self.include_roads = include;
        self
    }
}

impl RenderLayer for RailwayRenderer {
    fn render(&self, surface: &mut Surface, data: &mut LayerData) -> RenderResult {
        let src = self.source.as_ref();
        fetch_once(data, src, keys::RAILWAYS, FeatureKind::Railways);
        if self.include_roads {
            fetch_once(data, src, keys::GRAPH, FeatureKind::StreetNetwork);
        }
        fetch_once(data, src, keys::WATER, FeatureKind::Water);

        let proj = self.viewport.projector(surface.width(), surface.height());
        let theme = surface.theme().clone();

        if let Some(water) = fetched(data, keys::WATER) {
            fill_polygons(surface, &proj, water, theme.color_or("water", WATER));
        }
        if self.include_roads {
            if let Some(streets) = fetched(data, keys::GRAPH) {
                light_streets(surface, &proj, streets, Rgba8::opaque(0xDD, 0xDD, 0xDD), 0.3);
            }
        }
        if let Some(railways) = fetched(data, keys::RAILWAYS) {
            let color = theme.color_or("railway", RAILWAY);
            let width = surface.points_to_pixels(2.5);
            stroke_lines(surface, &proj, railways.lines(), width, color);

            // Station markers are 50 pt² in area.
            let radius = surface.points_to_pixels(50f64.sqrt() * 0.5);
            for (f, p) in railways.points() {
                if f.tag("railway") == Some("station") {
                    surface.fill_circle(proj.project(p), radius, color);
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Cycling
// ============================================================================

/// Dedicated cycleways solid, signed cycle routes dashed.
pub struct CyclingRenderer {
    source: Rc<dyn GeoSource>,
    viewport: Viewport,
    include_roads: bool,
}

impl CyclingRenderer {
    pub fn new(source: Rc<dyn GeoSource>, viewport: Viewport) -> Self {
        Self {
            source,
            viewport,
            include_roads: true,
        }
    }

    pub fn include_roads(mut self, include: bool) -> Self {
        self.include_roads = include;
        self
    }
}

impl RenderLayer for CyclingRenderer {
    fn render(&self, surface: &mut Surface, data: &mut LayerData) -> RenderResult {
        let src = self.source.as_ref();
        fetch_once(data, src, keys::CYCLE_ROUTES, FeatureKind::CycleRoutes);
        fetch_once(data, src, keys::CYCLEWAYS, FeatureKind::Cycleways);
        if self.include_roads {
            fetch_once(data, src, keys::GRAPH, FeatureKind::StreetNetwork);
        }
        fetch_once(data, src, keys::WATER, FeatureKind::Water);

        let proj = self.viewport.projector(surface.width(), surface.height());
        let theme = surface.theme().clone();

        if let Some(water) = fetched(data, keys::WATER) {
            fill_polygons(surface, &proj, water, theme.color_or("water", WATER));
        }
        if self.include_roads {
            if let Some(streets) = fetched(data, keys::GRAPH) {
                light_streets(surface, &proj, streets, Rgba8::opaque(0xE0, 0xE0, 0xE0), 0.3);
            }
        }
        if let Some(cycleways) = fetched(data, keys::CYCLEWAYS) {
            let width = surface.points_to_pixels(2.0);
            let color = theme.color_or("cycleway", CYCLEWAY);
            stroke_lines(surface, &proj, cycleways.lines(), width, color);
        }
        if let Some(routes) = fetched(data, keys::CYCLE_ROUTES) {
            let width = surface.points_to_pixels(2.5);
            let color = theme.color_or("cycle_route", CYCLE_ROUTE);
            // Dashes of 3.7 and gaps of 1.6 line widths.
            let pattern = [width * 3.7, width * 1.6];
            for (_, line) in routes.lines() {
                surface.stroke_dashed(&proj.project_all(line), width, &pattern, color);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Transit
// ============================================================================

/// Transit lines colored by mode, with stops as ringed dots.
pub struct TransitRenderer {
    source: Rc<dyn GeoSource>,
    viewport: Viewport,
    include_roads: bool,
}

impl TransitRenderer {
    pub fn new(source: Rc<dyn GeoSource>, viewport: Viewport) -> Self {
        Self {
            source,
            viewport,
            include_roads: true,
        }
    }

    pub fn include_roads(mut self, include: bool) -> Self {
        self.include_roads = include;
        self
    }
}

/// Theme role and fallback for a `route_type` tag.
fn transit_style(route_type: Option<&str>) -> (&'static str, Rgba8) {
    match route_type {
        Some("subway") => ("transit_subway", TRANSIT),
        Some("tram") => ("transit_tram", TRANSIT_TRAM),
        Some("bus") => ("transit_bus", TRANSIT_BUS),
        Some("train") => ("transit_train", TRANSIT_TRAIN),
        _ => ("transit", TRANSIT),
    }
}

impl RenderLayer for TransitRenderer {
    fn render(&self, surface: &mut Surface, data: &mut LayerData) -> RenderResult {
        let src = self.source.as_ref();
        fetch_once(data, src, keys::TRANSIT, FeatureKind::Transit);
        if self.include_roads {
            fetch_once(data, src, keys::GRAPH, FeatureKind::StreetNetwork);
        }
        fetch_once(data, src, keys::WATER, FeatureKind::Water);

        let proj = self.viewport.projector(surface.width(), surface.height());
        let theme = surface.theme().clone();

        if let Some(water) = fetched(data, keys::WATER) {
            fill_polygons(surface, &proj, water, theme.color_or("water", WATER));
        }
        if self.include_roads {
            if let Some(streets) = fetched(data, keys::GRAPH) {
                light_streets(surface, &proj, streets, Rgba8::opaque(0xE8, 0xE8, 0xE8), 0.3);
            }
        }
        if let Some(transit) = fetched(data, keys::TRANSIT) {
            let width = surface.points_to_pixels(3.0);
            for (f, line) in transit.lines() {
                let (role, fallback) = transit_style(f.tag("route_type"));
                let color = theme.color_or(role, fallback);
                surface.stroke_polyline(&proj.project_all(line), width, color, LineCap::Round);
            }

            // Stop markers are 30 pt² in area.
            let radius = surface.points_to_pixels(30f64.sqrt() * 0.5);
            let edge_width = surface.points_to_pixels(1.0);
            let fill = theme.color_or("transit_stop", Rgba8::WHITE);
            let edge = theme.color_or("transit", TRANSIT);
            for (_, p) in transit.points() {
                let c = proj.project(p);
                surface.fill_circle(c, radius, fill);
                surface.stroke_circle(c, radius, edge_width, edge);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Maritime
// ============================================================================

/// Sea and water with outlined shores, a bold coastline, and light streets.
pub struct MaritimeRenderer {
    source: Rc<dyn GeoSource>,
    viewport: Viewport,
    include_coastline: bool,
}

impl MaritimeRenderer {
    pub fn new(source: Rc<dyn GeoSource>, viewport: Viewport) -> Self {
        Self {
            source,
            viewport,
            include_coastline: true,
        }
    }

    pub fn include_coastline(mut self, include: bool) -> Self {
        self.include_coastline = include;
        self
    }
}

impl RenderLayer for MaritimeRenderer {
    fn render(&self, surface: &mut Surface, data: &mut LayerData) -> RenderResult {
        let src = self.source.as_ref();
        fetch_once(data, src, keys::WATER, FeatureKind::Sea);
        if self.include_coastline {
            fetch_once(data, src, keys::COASTLINE, FeatureKind::Coastline);
        }
        fetch_once(data, src, keys::GRAPH, FeatureKind::StreetNetwork);

        let proj = self.viewport.projector(surface.width(), surface.height());
        let theme = surface.theme().clone();

        if let Some(water) = fetched(data, keys::WATER) {
            fill_polygons(surface, &proj, water, theme.color_or("water", SEA));
            let edge_width = surface.points_to_pixels(1.0);
            let edge = theme.color_or("water_edge", SEA_EDGE);
            outline_polygons(surface, &proj, water, edge_width, edge);
        }
        if self.include_coastline {
            if let Some(coast) = fetched(data, keys::COASTLINE) {
                let width = surface.points_to_pixels(3.0);
                let color = theme.color_or("coastline", COASTLINE);
                stroke_lines(surface, &proj, coast.lines(), width, color);
            }
        }
        if let Some(streets) = fetched(data, keys::GRAPH) {
            let color = theme.color_or("street_light", STREET_LIGHT);
            light_streets(surface, &proj, streets, color, 0.4);
        }
        Ok(())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Creates a fresh renderer for one layer.
pub type RendererFactory = Box<dyn Fn() -> Box<dyn RenderLayer>>;

/// Lookup table from layer type to renderer factory.
#[derive(Default)]
pub struct RendererRegistry {
    factories: HashMap<LayerType, RendererFactory>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five built-in renderers, sharing one source and viewport.
    pub fn standard(source: Rc<dyn GeoSource>, viewport: Viewport) -> Self {
        let mut reg = Self::new();
        let s = source.clone();
        reg.register(LayerType::City, move || {
            Box::new(CityRenderer::new(s.clone(), viewport))
        });
        let s = source.clone();
        reg.register(LayerType::Railway, move || {
            Box::new(RailwayRenderer::new(s.clone(), viewport))
        });
        let s = source.clone();
        reg.register(LayerType::Cycling, move || {
            Box::new(CyclingRenderer::new(s.clone(), viewport))
        });
        let s = source.clone();
        reg.register(LayerType::Transit, move || {
            Box::new(TransitRenderer::new(s.clone(), viewport))
        });
        let s = source;
        reg.register(LayerType::Maritime, move || {
            Box::new(MaritimeRenderer::new(s.clone(), viewport))
        });
        reg
    }

    /// Register or replace the factory for a layer type.
    pub fn register<F>(&mut self, layer_type: LayerType, factory: F)
    where
        F: Fn() -> Box<dyn RenderLayer> + 'static,
    {
        self.factories.insert(layer_type, Box::new(factory));
    }

    pub fn contains(&self, layer_type: &LayerType) -> bool {
        self.factories.contains_key(layer_type)
    }

    pub fn create(&self, layer_type: &LayerType) -> Option<Box<dyn RenderLayer>> {
        self.factories.get(layer_type).map(|f| f())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Build a compositor from configuration, binding a renderer to every layer.
///
/// Layers whose type has no registered renderer, and layers repeating an
/// earlier name, are skipped with a warning.
pub fn build_composition(config: &CompositorConfig, registry: &RendererRegistry) -> Compositor {
    let mut compositor = Compositor::new(config.width, config.height)
        .with_dpi(config.dpi)
        .with_background(config.background_color);
    for layer_config in &config.layers {
        let Some(renderer) = registry.create(&layer_config.layer_type) else {
            log::warn!(
                "skipping layer `{}`: unknown layer type `{}`",
                layer_config.name,
                layer_config.layer_type
            );
            continue;
        };
        let layer: Layer = layer_config.to_layer().with_boxed_renderer(renderer);
        if let Err(e) = compositor.add_layer(layer) {
            log::warn!("skipping layer: {}", e);
        }
    }
    compositor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerConfig;
    use crate::geometry::{Geometry, MemorySource, Polygon};
    use crate::raster;
    use std::cell::Cell;

    /// Counts fetches per call and serves everything from memory.
    struct CountingSource {
        inner: MemorySource,
        calls: Cell<usize>,
    }

    impl GeoSource for CountingSource {
        fn fetch(&self, kind: FeatureKind) -> Result<FeatureCollection, crate::error::BoxError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.fetch(kind)
        }
    }

    fn line(pts: &[(f64, f64)]) -> Geometry {
        Geometry::LineString(pts.iter().map(|&p| Point::from(p)).collect())
    }

    fn streets() -> FeatureCollection {
        vec![
            Feature::new(line(&[(-100.0, 0.0), (100.0, 0.0)])).with_tag("highway", "motorway"),
            Feature::new(line(&[(0.0, -100.0), (0.0, 100.0)])).with_tag("highway", "residential"),
        ]
        .into_iter()
        .collect()
    }

    fn water() -> FeatureCollection {
        let sq = vec![
            Point::new(-100.0, -100.0),
            Point::new(-50.0, -100.0),
            Point::new(-50.0, -50.0),
            Point::new(-100.0, -50.0),
        ];
        vec![Feature::new(Geometry::Polygon(Polygon::new(sq)))]
            .into_iter()
            .collect()
    }

    fn viewport() -> Viewport {
        Viewport::new(Point::new(0.0, 0.0), 100.0)
    }

    #[test]
    fn test_road_classes() {
        assert_eq!(RoadClass::from_highway(Some("trunk_link")), RoadClass::Primary);
        assert_eq!(RoadClass::from_highway(Some("secondary;tertiary")), RoadClass::Secondary);
        assert_eq!(RoadClass::from_highway(None), RoadClass::Residential);
        assert_eq!(RoadClass::from_highway(Some("footway")), RoadClass::Default);
        assert_eq!(RoadClass::Motorway.width_pt(), 1.2);
        assert_eq!(RoadClass::Default.color_role(), "road_default");
    }

    #[test]
    fn test_transit_styles() {
        assert_eq!(transit_style(Some("tram")).0, "transit_tram");
        assert_eq!(transit_style(Some("ferry")).0, "transit");
        assert_eq!(transit_style(None).1, TRANSIT);
    }

    #[test]
    fn test_city_fetches_once() {
        let source = Rc::new(CountingSource {
            inner: MemorySource::new()
                .with(FeatureKind::StreetNetwork, streets())
                .with(FeatureKind::Water, water()),
            calls: Cell::new(0),
        });
        let renderer = CityRenderer::new(source.clone(), viewport());
        let mut data = LayerData::new();
        for _ in 0..3 {
            let mut s = Surface::new(60, 80, 72.0, 1, crate::theme::Theme::default());
            renderer.render(&mut s, &mut data).unwrap();
        }
        // Streets, water, and parks; parks fails once and is remembered.
        assert_eq!(source.calls.get(), 3);
        assert!(data.get::<Fetched>(keys::PARKS).map_or(false, Option::is_none));
    }

    #[test]
    fn test_city_draws_streets_and_water() {
        let source: Rc<dyn GeoSource> = Rc::new(
            MemorySource::new()
                .with(FeatureKind::StreetNetwork, streets())
                .with(FeatureKind::Water, water()),
        );
        let renderer = CityRenderer::new(source, viewport());
        // 300 dpi makes the motorway five pixels wide.
        let mut s = Surface::new(60, 80, 300.0, 1, crate::theme::Theme::default());
        renderer.render(&mut s, &mut LayerData::new()).unwrap();

        // The motorway runs across the middle row.
        assert_eq!(s.pixel(10, 40), Rgba8::opaque(0x0A, 0x0A, 0x0A));
        // Water occupies the lower left corner.
        assert_eq!(s.pixel(2, 77), Rgba8::opaque(0xC0, 0xC0, 0xC0));
        assert_eq!(s.pixel(55, 5), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_city_without_streets_draws_label() {
        let source: Rc<dyn GeoSource> = Rc::new(MemorySource::new());
        let renderer = CityRenderer::new(source, viewport());
        let mut s = Surface::new(300, 100, 72.0, 1, crate::theme::Theme::default());
        renderer.render(&mut s, &mut LayerData::new()).unwrap();
        let raster = s.into_raster();
        assert!(raster.pixels().any(|p| p.0[3] > 0));
        assert_eq!(raster::pixel(&raster, 0, 0), Rgba8::TRANSPARENT);
    }

    #[test]
    fn test_theme_override_reaches_renderer() {
        let rails: FeatureCollection = vec![Feature::new(line(&[(-100.0, 0.0), (100.0, 0.0)]))]
            .into_iter()
            .collect();
        let source: Rc<dyn GeoSource> =
            Rc::new(MemorySource::new().with(FeatureKind::Railways, rails));
        let renderer = RailwayRenderer::new(source, viewport()).include_roads(false);
        let theme = crate::theme::Theme::default().with("railway", "#00FF00");
        let mut s = Surface::new(60, 80, 72.0, 1, theme);
        renderer.render(&mut s, &mut LayerData::new()).unwrap();
        assert_eq!(s.pixel(30, 40), Rgba8::opaque(0, 255, 0));
    }

    #[test]
    fn test_registry_skips_unknown_types() {
        let source: Rc<dyn GeoSource> = Rc::new(MemorySource::new());
        let registry = RendererRegistry::standard(source, viewport());
        assert_eq!(registry.len(), 5);
        assert!(LayerType::STANDARD.iter().all(|t| registry.contains(t)));

        let config = CompositorConfig {
            width: 20,
            height: 20,
            layers: vec![
                LayerConfig::new("streets", "city"),
                LayerConfig::new("stars", "starmap"),
                LayerConfig::new("streets", "railway"),
                LayerConfig::new("coast", "maritime").with_z_index(5),
            ],
            ..CompositorConfig::default()
        };
        let mut c = build_composition(&config, &registry);
        assert_eq!(c.layer_names(), vec!["streets", "coast"]);
        assert!(c.layers().iter().all(Layer::has_renderer));
        c.composite().unwrap();
    }
}
