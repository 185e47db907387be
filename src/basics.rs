//! Foundation types shared by the drawing and compositing modules.
//!
//! Points, rectangles, fill rules, and the small numeric helpers used when
//! converting between normalized [0, 1] floats and 8-bit channels.

use core::ops::{Add, Mul, Sub};
use serde::{Deserialize, Serialize};

// ============================================================================
// Numeric helpers
// ============================================================================

/// Small constant that keeps the dodge/burn divisions finite.
pub const BLEND_EPSILON: f64 = 1e-10;

/// Clamp a value into the unit interval. NaN maps to 0.
#[inline]
pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Convert an 8-bit channel to [0, 1].
#[inline]
pub fn unit_from_u8(v: u8) -> f64 {
    v as f64 / 255.0
}

/// Convert a [0, 1] value to an 8-bit channel, clamping and rounding.
#[inline]
pub fn u8_from_unit(v: f64) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}

// ============================================================================
// Point
// ============================================================================

/// A 2-D point in f64 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the vector from the origin.
    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Linear interpolation towards `other` by `t`.
    #[inline]
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle given by two corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Reorder corners so that `x1 <= x2` and `y1 <= y2`.
    pub fn normalize(mut self) -> Self {
        if self.x1 > self.x2 {
            core::mem::swap(&mut self.x1, &mut self.x2);
        }
        if self.y1 > self.y2 {
            core::mem::swap(&mut self.y1, &mut self.y2);
        }
        self
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }
}

// ============================================================================
// Fill rule and line caps
// ============================================================================

/// Polygon filling rule used by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillingRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// How the open ends of a stroked polyline are finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}
