//! Anti-aliased polygon coverage rasterizer.
//!
//! Edges are accumulated as signed area into a per-row cell buffer, the same
//! cover/area idea as a classic scanline cell rasterizer but kept in floating
//! point: each edge deposits, for every pixel row it crosses, the part of its
//! height that falls left of each cell boundary. A running sum along the row
//! then yields the winding coverage of every pixel, which the filling rule
//! turns into an alpha in [0, 1].
//!
//! Edges are clipped to the canvas: the parts above or below are dropped,
//! the parts left of it are moved onto the left border (they still cover
//! every visible pixel of the row), and the parts right of it cannot affect
//! visible pixels and land in padding cells that are never read.

use crate::basics::{FillingRule, Point};

/// Extra cells per row so edges at (or clamped to) the right border stay in
/// bounds.
const ROW_PADDING: usize = 2;

/// Scanline coverage accumulator for one canvas.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    width: usize,
    height: usize,
    stride: usize,
    cells: Vec<f32>,
    filling_rule: FillingRule,
    min_y: usize,
    max_y: usize,
}

impl Rasterizer {
    /// Create an empty rasterizer for a `width` x `height` canvas.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width as usize;
        let height = height as usize;
        let stride = width + ROW_PADDING;
        Self {
            width,
            height,
            stride,
            cells: vec![0.0; stride * height],
            filling_rule: FillingRule::NonZero,
            min_y: usize::MAX,
            max_y: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn filling_rule(&mut self, rule: FillingRule) {
        self.filling_rule = rule;
    }

    /// Whether any edge has touched the canvas since the last sweep.
    pub fn is_empty(&self) -> bool {
        self.min_y > self.max_y
    }

    /// Discard all accumulated edges.
    pub fn reset(&mut self) {
        if !self.is_empty() {
            let start = self.min_y * self.stride;
            let end = (self.max_y + 1) * self.stride;
            self.cells[start..end].fill(0.0);
        }
        self.min_y = usize::MAX;
        self.max_y = 0;
    }

    /// Add a closed contour. The closing edge is implied.
    pub fn add_contour(&mut self, points: &[Point]) {
        if points.len() < 3 {
            return;
        }
        let mut prev = points[points.len() - 1];
        for &p in points {
            self.add_edge(prev, p);
            prev = p;
        }
    }

    /// Add a single directed edge.
    pub fn add_edge(&mut self, p0: Point, p1: Point) {
        if !(p0.x.is_finite() && p0.y.is_finite() && p1.x.is_finite() && p1.y.is_finite()) {
            return;
        }
        let w = self.width as f64;
        // Split at the vertical canvas borders so clamping x is exact.
        let mut cuts = [0.0, 1.0, 1.0, 1.0];
        let mut n = 1;
        let dx = p1.x - p0.x;
        if dx != 0.0 {
            for border in [0.0, w] {
                let t = (border - p0.x) / dx;
                if t > 0.0 && t < 1.0 {
                    cuts[n] = t;
                    n += 1;
                }
            }
        }
        cuts[n] = 1.0;
        cuts[..=n].sort_by(|a, b| a.total_cmp(b));

        for i in 0..n {
            let a = p0.lerp(p1, cuts[i]);
            let b = p0.lerp(p1, cuts[i + 1]);
            let a = Point::new(a.x.clamp(0.0, w), a.y);
            let b = Point::new(b.x.clamp(0.0, w), b.y);
            self.accumulate(a, b);
        }
    }

    /// Deposit signed area for an edge already clamped to `[0, width]` in x.
    fn accumulate(&mut self, p0: Point, p1: Point) {
        if p0.y == p1.y {
            return;
        }
        let (dir, p0, p1) = if p0.y < p1.y {
            (1.0_f64, p0, p1)
        } else {
            (-1.0_f64, p1, p0)
        };
        let h = self.height as f64;
        if p1.y <= 0.0 || p0.y >= h {
            return;
        }

        let dxdy = (p1.x - p0.x) / (p1.y - p0.y);
        let y_start = p0.y.max(0.0);
        let y_end = p1.y.min(h);
        let mut x = p0.x + (y_start - p0.y) * dxdy;

        let row_first = y_start.floor() as usize;
        let row_last = (y_end.ceil() as usize).min(self.height);
        self.min_y = self.min_y.min(row_first);
        self.max_y = self.max_y.max(row_last.saturating_sub(1));

        for row in row_first..row_last {
            let top = (row as f64).max(y_start);
            let bottom = ((row + 1) as f64).min(y_end);
            let dy = bottom - top;
            if dy <= 0.0 {
                continue;
            }
            let x_next = x + dxdy * dy;
            let d = (dy * dir) as f32;
            let base = row * self.stride;
            let (x0, x1) = if x < x_next { (x, x_next) } else { (x_next, x) };
            let x0_floor = x0.floor();
            let x0i = x0_floor as usize;
            let x1_ceil = x1.ceil();
            let x1i = x1_ceil as usize;

            if x1i <= x0i + 1 {
                // Edge stays within one cell column in this row.
                let mid = (0.5 * (x + x_next) - x0_floor) as f32;
                self.cells[base + x0i] += d - d * mid;
                self.cells[base + x0i + 1] += d * mid;
            } else {
                let s = (1.0 / (x1 - x0)) as f32;
                let x0f = (x0 - x0_floor) as f32;
                let a0 = 0.5 * s * (1.0 - x0f) * (1.0 - x0f);
                let x1f = (x1 - x1_ceil + 1.0) as f32;
                let am = 0.5 * s * x1f * x1f;
                self.cells[base + x0i] += d * a0;
                if x1i == x0i + 2 {
                    self.cells[base + x0i + 1] += d * (1.0 - a0 - am);
                } else {
                    let a1 = s * (1.5 - x0f);
                    self.cells[base + x0i + 1] += d * (a1 - a0);
                    for xi in x0i + 2..x1i - 1 {
                        self.cells[base + xi] += d * s;
                    }
                    let a2 = a1 + (x1i - x0i - 3) as f32 * s;
                    self.cells[base + x1i - 1] += d * (1.0 - a2 - am);
                }
                self.cells[base + x1i] += d * am;
            }
            x = x_next;
        }
    }

    /// Turn an accumulated winding value into coverage.
    #[inline]
    fn coverage(&self, winding: f32) -> f32 {
        let w = winding.abs();
        match self.filling_rule {
            FillingRule::NonZero => w.min(1.0),
            FillingRule::EvenOdd => {
                let m = w % 2.0;
                if m > 1.0 {
                    2.0 - m
                } else {
                    m
                }
            }
        }
    }

    /// Walk every covered pixel, calling `f(x, y, coverage)` with coverage in
    /// (0, 1], then reset the accumulator.
    pub fn sweep<F: FnMut(u32, u32, f32)>(&mut self, mut f: F) {
        if self.is_empty() {
            return;
        }
        for y in self.min_y..=self.max_y {
            let row = &self.cells[y * self.stride..y * self.stride + self.width];
            let mut acc = 0.0f32;
            for (x, &cell) in row.iter().enumerate() {
                acc += cell;
                let c = self.coverage(acc);
                // Skip float dust left by cancelling edges.
                if c > 1.0 / 512.0 {
                    f(x as u32, y as u32, c.min(1.0));
                }
            }
        }
        self.reset();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage_map(ras: &mut Rasterizer) -> Vec<f32> {
        let w = ras.width() as usize;
        let mut out = vec![0.0; w * ras.height() as usize];
        ras.sweep(|x, y, c| out[y as usize * w + x as usize] = c);
        out
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    #[test]
    fn test_new_is_empty() {
        let mut ras = Rasterizer::new(8, 8);
        assert!(ras.is_empty());
        let mut calls = 0;
        ras.sweep(|_, _, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_pixel_aligned_square_full_coverage() {
        let mut ras = Rasterizer::new(10, 10);
        ras.add_contour(&square(2.0, 3.0, 6.0, 7.0));
        let cov = coverage_map(&mut ras);
        for y in 0..10 {
            for x in 0..10 {
                let inside = (2..6).contains(&x) && (3..7).contains(&y);
                let c = cov[y * 10 + x];
                if inside {
                    assert!((c - 1.0).abs() < 1e-4, "({}, {}) = {}", x, y, c);
                } else {
                    assert!(c < 1e-4, "({}, {}) = {}", x, y, c);
                }
            }
        }
        assert!(ras.is_empty());
    }

    #[test]
    fn test_half_pixel_edge() {
        let mut ras = Rasterizer::new(4, 4);
        ras.add_contour(&square(0.5, 0.0, 4.0, 4.0));
        let cov = coverage_map(&mut ras);
        assert!((cov[0] - 0.5).abs() < 1e-4, "{}", cov[0]);
        assert!((cov[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_orientation_does_not_matter() {
        let mut ras = Rasterizer::new(6, 6);
        let mut pts = square(1.0, 1.0, 5.0, 5.0);
        pts.reverse();
        ras.add_contour(&pts);
        let cov = coverage_map(&mut ras);
        assert!((cov[2 * 6 + 2] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_diagonal_triangle_area() {
        let mut ras = Rasterizer::new(8, 8);
        ras.add_contour(&[Point::new(0.0, 0.0), Point::new(8.0, 0.0), Point::new(0.0, 8.0)]);
        let cov = coverage_map(&mut ras);
        let total: f32 = cov.iter().sum();
        assert!((total - 32.0).abs() < 0.05, "area {}", total);
    }

    #[test]
    fn test_clips_outside_canvas() {
        let mut ras = Rasterizer::new(4, 4);
        ras.add_contour(&square(-10.0, -10.0, 20.0, 20.0));
        let cov = coverage_map(&mut ras);
        assert!(cov.iter().all(|&c| (c - 1.0).abs() < 1e-4), "{:?}", cov);
    }

    #[test]
    fn test_shape_entirely_offscreen() {
        let mut ras = Rasterizer::new(4, 4);
        ras.add_contour(&square(10.0, 10.0, 20.0, 20.0));
        ras.add_contour(&square(-20.0, 0.0, -10.0, 4.0));
        let cov = coverage_map(&mut ras);
        assert!(cov.iter().all(|&c| c < 1e-4));
    }

    #[test]
    fn test_nonzero_overlap_saturates() {
        let mut ras = Rasterizer::new(6, 6);
        ras.add_contour(&square(0.0, 0.0, 4.0, 4.0));
        ras.add_contour(&square(2.0, 2.0, 6.0, 6.0));
        let cov = coverage_map(&mut ras);
        assert!((cov[3 * 6 + 3] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_even_odd_cuts_holes() {
        let mut ras = Rasterizer::new(10, 10);
        ras.filling_rule(FillingRule::EvenOdd);
        ras.add_contour(&square(0.0, 0.0, 10.0, 10.0));
        ras.add_contour(&square(3.0, 3.0, 7.0, 7.0));
        let cov = coverage_map(&mut ras);
        assert!((cov[1 * 10 + 1] - 1.0).abs() < 1e-4);
        assert!(cov[5 * 10 + 5] < 1e-4);
    }

    #[test]
    fn test_degenerate_input_is_ignored() {
        let mut ras = Rasterizer::new(4, 4);
        ras.add_contour(&[Point::new(0.0, 0.0), Point::new(3.0, 3.0)]);
        ras.add_edge(Point::new(f64::NAN, 0.0), Point::new(1.0, 1.0));
        assert!(ras.is_empty());
    }
}
