//! Planar map features and the viewport that puts them on a canvas.
//!
//! Fetching map data is somebody else's job: a [`GeoSource`] hands over
//! [`FeatureCollection`]s already projected to a planar coordinate system in
//! meters (x east, y north). The [`Viewport`] crops that plane around a center
//! point and maps it onto canvas pixels.

use std::collections::{BTreeMap, HashMap};

use crate::basics::{Point, Rect};
use crate::error::BoxError;

// ============================================================================
// Features
// ============================================================================

/// A polygon with optional holes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>) -> Self {
        Self {
            exterior,
            holes: Vec::new(),
        }
    }

    pub fn with_hole(mut self, hole: Vec<Point>) -> Self {
        self.holes.push(hole);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(Vec<Point>),
    MultiLineString(Vec<Vec<Point>>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn is_polygonal(&self) -> bool {
        matches!(self, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, Geometry::LineString(_) | Geometry::MultiLineString(_))
    }
}

/// A geometry with OpenStreetMap-style string tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub tags: BTreeMap<String, String>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// An ordered set of features of one kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Every polygon, with multipolygons flattened.
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        self.features.iter().flat_map(|f| match &f.geometry {
            Geometry::Polygon(p) => std::slice::from_ref(p),
            Geometry::MultiPolygon(ps) => ps.as_slice(),
            _ => &[][..],
        })
    }

    /// Every line string paired with its feature, with multi-lines flattened.
    pub fn lines(&self) -> impl Iterator<Item = (&Feature, &[Point])> {
        self.features.iter().flat_map(|f| {
            let parts: Vec<&[Point]> = match &f.geometry {
                Geometry::LineString(l) => vec![l.as_slice()],
                Geometry::MultiLineString(ls) => ls.iter().map(Vec::as_slice).collect(),
                _ => Vec::new(),
            };
            parts.into_iter().map(move |l| (f, l))
        })
    }

    /// Every point feature.
    pub fn points(&self) -> impl Iterator<Item = (&Feature, Point)> {
        self.features.iter().filter_map(|f| match f.geometry {
            Geometry::Point(p) => Some((f, p)),
            _ => None,
        })
    }

    pub fn has_polygons(&self) -> bool {
        self.polygons().next().is_some()
    }

    pub fn has_lines(&self) -> bool {
        self.features.iter().any(|f| f.geometry.is_linear())
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;
    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

// ============================================================================
// Sources
// ============================================================================

/// The kinds of map data renderers ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    /// Street center lines tagged with `highway`.
    StreetNetwork,
    Water,
    /// Water including open sea, for coastal maps.
    Sea,
    Parks,
    /// Railway lines and station points.
    Railways,
    CycleRoutes,
    Cycleways,
    /// Transit lines tagged with `route_type`, and stop points.
    Transit,
    Coastline,
}

impl FeatureKind {
    /// OpenStreetMap tags that select this kind of data.
    pub fn osm_tags(self) -> &'static [(&'static str, &'static str)] {
        match self {
            FeatureKind::StreetNetwork => &[("highway", "*")],
            FeatureKind::Water => &[("natural", "water"), ("waterway", "riverbank")],
            FeatureKind::Sea => &[
                ("natural", "water"),
                ("waterway", "riverbank"),
                ("place", "sea"),
            ],
            FeatureKind::Parks => &[("leisure", "park"), ("landuse", "grass")],
            FeatureKind::Railways => &[
                ("railway", "rail"),
                ("railway", "subway"),
                ("railway", "tram"),
                ("railway", "light_rail"),
                ("railway", "monorail"),
                ("railway", "funicular"),
                ("railway", "station"),
            ],
            FeatureKind::CycleRoutes => &[("route", "bicycle"), ("bicycle", "designated")],
            FeatureKind::Cycleways => &[("highway", "cycleway")],
            FeatureKind::Transit => &[
                ("route", "subway"),
                ("route", "tram"),
                ("route", "bus"),
                ("route", "train"),
                ("public_transport", "stop_position"),
            ],
            FeatureKind::Coastline => &[("natural", "coastline")],
        }
    }
}

/// Supplies planar feature data for a fixed area.
///
/// Implementations may block on network or disk I/O. Renderers call each
/// kind at most once per layer and remember failures.
pub trait GeoSource {
    fn fetch(&self, kind: FeatureKind) -> Result<FeatureCollection, BoxError>;
}

/// A [`GeoSource`] backed by collections already in memory.
///
/// Kinds that were never inserted are reported as errors, the same way a
/// network source reports data it could not retrieve.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: HashMap<FeatureKind, FeatureCollection>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: FeatureKind, features: FeatureCollection) -> Self {
        self.insert(kind, features);
        self
    }

    pub fn insert(&mut self, kind: FeatureKind, features: FeatureCollection) {
        self.collections.insert(kind, features);
    }
}

impl GeoSource for MemorySource {
    fn fetch(&self, kind: FeatureKind) -> Result<FeatureCollection, BoxError> {
        self.collections
            .get(&kind)
            .cloned()
            .ok_or_else(|| format!("no {:?} data loaded", kind).into())
    }
}

// ============================================================================
// Viewport
// ============================================================================

/// A square window of `2 * distance` meters around `center`, cropped to the
/// canvas aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Point,
    pub distance: f64,
}

impl Viewport {
    pub fn new(center: Point, distance: f64) -> Self {
        Self { center, distance }
    }

    /// Planar bounds for a canvas of the given aspect ratio (width / height).
    ///
    /// The requested distance is kept on the long side and the short side is
    /// cut inward, so the crop never reaches past the requested radius.
    pub fn crop_limits(&self, aspect: f64) -> Rect {
        let mut half_x = self.distance;
        let mut half_y = self.distance;
        if aspect > 1.0 {
            half_y = half_x / aspect;
        } else {
            half_x = half_y * aspect;
        }
        Rect::new(
            self.center.x - half_x,
            self.center.y - half_y,
            self.center.x + half_x,
            self.center.y + half_y,
        )
    }

    /// Mapping from planar coordinates to a `width` x `height` canvas.
    pub fn projector(&self, width: u32, height: u32) -> Projector {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f64 / height as f64
        };
        let bounds = self.crop_limits(aspect);
        let sx = if bounds.width() > 0.0 {
            width as f64 / bounds.width()
        } else {
            0.0
        };
        let sy = if bounds.height() > 0.0 {
            height as f64 / bounds.height()
        } else {
            0.0
        };
        Projector { bounds, sx, sy }
    }
}

/// Planar to canvas transform. Canvas y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    bounds: Rect,
    sx: f64,
    sy: f64,
}

impl Projector {
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Canvas pixels per planar unit along x.
    pub fn scale(&self) -> f64 {
        self.sx
    }

    #[inline]
    pub fn project(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.bounds.x1) * self.sx,
            (self.bounds.y2 - p.y) * self.sy,
        )
    }

    pub fn project_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|&p| self.project(p)).collect()
    }
}
