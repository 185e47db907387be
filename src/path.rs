//! Fillable paths and the geometry that produces them.
//!
//! A [`Path`] is a list of closed contours in pixel space. Strokes, dashes,
//! circles and rectangles are all turned into contours here and then handed
//! to the [`Rasterizer`]. Every generated contour winds the same way, so the
//! pieces of a stroke union cleanly under the non-zero rule.

use std::f64::consts::PI;

use crate::basics::{LineCap, Point};
use crate::rasterizer::Rasterizer;

/// Maximum number of dash/gap entries honored in a dash pattern.
const MAX_DASHES: usize = 32;

/// Points closer than this are treated as the same vertex.
const VERTEX_DIST_EPSILON: f64 = 1e-9;

// ============================================================================
// Path
// ============================================================================

/// A set of closed contours. The closing edge of each contour is implied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    contours: Vec<Vec<Point>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new contour at (x, y).
    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.contours.push(vec![Point::new(x, y)]);
        self
    }

    /// Extend the current contour, starting one if none is open.
    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        match self.contours.last_mut() {
            Some(c) => c.push(Point::new(x, y)),
            None => self.contours.push(vec![Point::new(x, y)]),
        }
        self
    }

    /// Append an already built contour.
    pub fn push_contour(&mut self, contour: Vec<Point>) {
        if contour.len() >= 3 {
            self.contours.push(contour);
        }
    }

    /// Append every contour of `other`.
    pub fn append(&mut self, other: Path) {
        self.contours.extend(other.contours);
    }

    pub fn contours(&self) -> &[Vec<Point>] {
        &self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.len() < 3)
    }

    /// Axis-aligned rectangle.
    pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Self {
        let mut p = Path::new();
        p.push_contour(vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ]);
        p
    }

    /// Circle approximated with enough vertices to look round at this size.
    pub fn circle(center: Point, radius: f64) -> Self {
        let mut p = Path::new();
        p.push_contour(circle_points(center, radius));
        p
    }

    /// Feed every contour to the rasterizer.
    pub fn rasterize(&self, ras: &mut Rasterizer) {
        for c in &self.contours {
            ras.add_contour(c);
        }
    }
}

// ============================================================================
// Circles
// ============================================================================

/// Number of vertices for a circle of radius `r` pixels.
///
/// The angular step is chosen so the chord never deviates from the arc by
/// more than 1/8 of a pixel.
pub fn circle_steps(r: f64) -> usize {
    let ra = r.abs();
    if ra <= 0.0 || !ra.is_finite() {
        return 0;
    }
    let da = (ra / (ra + 0.125)).acos() * 2.0;
    ((2.0 * PI / da).round() as usize).max(8)
}

/// Vertices of a circle, counter-clockwise in a y-up frame.
pub fn circle_points(center: Point, r: f64) -> Vec<Point> {
    let n = circle_steps(r);
    (0..n)
        .map(|i| {
            let a = 2.0 * PI * i as f64 / n as f64;
            Point::new(center.x + r * a.cos(), center.y + r * a.sin())
        })
        .collect()
}

// ============================================================================
// Strokes
// ============================================================================

fn dedup(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if !(p.x.is_finite() && p.y.is_finite()) {
            continue;
        }
        match out.last() {
            Some(&last) if last.distance(p) <= VERTEX_DIST_EPSILON => {}
            _ => out.push(p),
        }
    }
    out
}

/// Outline of a polyline drawn `width` pixels wide.
///
/// Segments become quads, interior vertices get round joins, and the two
/// open ends are finished with `cap`. A single point yields a dot for round
/// and square caps and nothing for butt caps.
pub fn stroke(points: &[Point], width: f64, cap: LineCap) -> Path {
    let mut path = Path::new();
    let hw = width * 0.5;
    if !(hw > 0.0 && hw.is_finite()) {
        return path;
    }
    let pts = dedup(points);
    match pts.len() {
        0 => return path,
        1 => {
            let c = pts[0];
            match cap {
                LineCap::Butt => {}
                LineCap::Round => path.push_contour(circle_points(c, hw)),
                LineCap::Square => path.push_contour(vec![
                    Point::new(c.x - hw, c.y - hw),
                    Point::new(c.x + hw, c.y - hw),
                    Point::new(c.x + hw, c.y + hw),
                    Point::new(c.x - hw, c.y + hw),
                ]),
            }
            return path;
        }
        _ => {}
    }

    let last = pts.len() - 1;
    for i in 0..last {
        let mut a = pts[i];
        let mut b = pts[i + 1];
        let d = b - a;
        let len = d.length();
        let dir = d * (1.0 / len);
        if cap == LineCap::Square {
            if i == 0 {
                a = a - dir * hw;
            }
            if i + 1 == last {
                b = b + dir * hw;
            }
        }
        let n = Point::new(-dir.y * hw, dir.x * hw);
        path.push_contour(vec![a - n, b - n, b + n, a + n]);
    }

    for &p in &pts[1..last] {
        path.push_contour(circle_points(p, hw));
    }
    if cap == LineCap::Round {
        path.push_contour(circle_points(pts[0], hw));
        path.push_contour(circle_points(pts[last], hw));
    }
    path
}

// ============================================================================
// Dashes
// ============================================================================

/// Split a polyline into dash pieces.
///
/// `pattern` alternates dash and gap lengths in pixels, starting with a
/// dash. An empty or all-zero pattern returns the polyline unchanged.
pub fn dash(points: &[Point], pattern: &[f64], offset: f64) -> Vec<Vec<Point>> {
    let pts = dedup(points);
    let mut dashes: Vec<f64> = pattern
        .iter()
        .take(MAX_DASHES)
        .map(|d| if d.is_finite() { d.max(0.0) } else { 0.0 })
        .collect();
    // An odd pattern repeats so dashes and gaps keep alternating.
    if dashes.len() % 2 == 1 {
        dashes.extend_from_within(..);
    }
    let total: f64 = dashes.iter().sum();
    if pts.len() < 2 || total <= 0.0 {
        return if pts.is_empty() { Vec::new() } else { vec![pts] };
    }

    // Advance to the dash that `offset` falls in.
    let mut idx = 0;
    let mut rest = dashes[0];
    let mut skip = offset.rem_euclid(total);
    while skip > 0.0 {
        if skip < rest {
            rest -= skip;
            break;
        }
        skip -= rest;
        idx = (idx + 1) % dashes.len();
        rest = dashes[idx];
    }

    let mut out = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    if idx % 2 == 0 {
        current.push(pts[0]);
    }

    for w in pts.windows(2) {
        let (a, b) = (w[0], w[1]);
        let seg_len = a.distance(b);
        let mut pos = 0.0;
        while seg_len - pos > rest {
            pos += rest;
            let p = a.lerp(b, pos / seg_len);
            if idx % 2 == 0 {
                current.push(p);
                if current.len() >= 2 {
                    out.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            } else {
                current.push(p);
            }
            idx = (idx + 1) % dashes.len();
            rest = dashes[idx];
        }
        rest -= seg_len - pos;
        if idx % 2 == 0 {
            current.push(b);
        }
    }
    if idx % 2 == 0 && current.len() >= 2 {
        out.push(current);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
