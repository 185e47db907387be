//! Drawing surface handed to render callbacks.
//!
//! A [`Surface`] is a transparent RGBA canvas at the compositor's size. Render
//! callbacks draw in canvas pixel coordinates (origin top-left, y down); when
//! the compositor supersamples, the surface scales every coordinate and width
//! internally and the compositor shrinks the result back to canvas size.
//!
//! All painting is straight-alpha source-over with the rasterizer's coverage
//! folded into the source alpha.

use crate::basics::{FillingRule, LineCap, Point};
use crate::blend::{blend_pixel, BlendMode};
use crate::color::Rgba8;
use crate::glyphs;
use crate::path::{self, Path};
use crate::raster::{self, Raster};
use crate::rasterizer::Rasterizer;
use crate::theme::Theme;

/// Points per inch.
const POINTS_PER_INCH: f64 = 72.0;

/// Glyph cells per em when drawing bitmap text.
const CELLS_PER_EM: f64 = glyphs::LINE_ADVANCE as f64;

pub struct Surface {
    width: u32,
    height: u32,
    scale: f64,
    dpi: f64,
    theme: Theme,
    pixels: Raster,
    ras: Rasterizer,
}

impl Surface {
    /// A transparent `width` x `height` surface drawn at `supersample`x
    /// resolution.
    pub fn new(width: u32, height: u32, dpi: f64, supersample: u32, theme: Theme) -> Self {
        let factor = supersample.max(1);
        let pw = width.saturating_mul(factor);
        let ph = height.saturating_mul(factor);
        Self {
            width,
            height,
            scale: factor as f64,
            dpi,
            theme,
            pixels: raster::transparent(pw, ph),
            ras: Rasterizer::new(pw, ph),
        }
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Supersampling factor between canvas and backing pixels.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Size of the backing pixel buffer.
    pub fn pixel_dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Convert typographic points to canvas pixels at this surface's dpi.
    pub fn points_to_pixels(&self, points: f64) -> f64 {
        points * self.dpi / POINTS_PER_INCH
    }

    /// The theme for this layer, with the layer's overrides applied.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    // ------------------------------------------------------------------------
    // Painting
    // ------------------------------------------------------------------------

    fn to_device(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|&p| p * self.scale).collect()
    }

    /// Fill a path given in device pixels.
    fn fill_device_path(&mut self, path: &Path, color: Rgba8, rule: FillingRule) {
        if color.is_transparent() || path.is_empty() {
            return;
        }
        self.ras.filling_rule(rule);
        path.rasterize(&mut self.ras);
        let pixels = &mut self.pixels;
        self.ras.sweep(|x, y, cov| {
            let alpha = (color.a as f32 * cov).round() as u8;
            if alpha == 0 {
                return;
            }
            let px = pixels.get_pixel_mut(x, y);
            px.0 = blend_pixel(px.0, [color.r, color.g, color.b, alpha], BlendMode::Normal);
        });
    }

    /// Fill a path given in canvas pixels.
    pub fn fill_path(&mut self, path: &Path, color: Rgba8, rule: FillingRule) {
        let mut device = Path::new();
        for c in path.contours() {
            device.push_contour(self.to_device(c));
        }
        self.fill_device_path(&device, color, rule);
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba8) {
        let s = self.scale;
        self.fill_device_path(&Path::rect(x * s, y * s, w * s, h * s), color, FillingRule::NonZero);
    }

    /// Fill a polygon; `holes` are cut out of the exterior.
    pub fn fill_polygon(&mut self, exterior: &[Point], holes: &[Vec<Point>], color: Rgba8) {
        let mut device = Path::new();
        device.push_contour(self.to_device(exterior));
        for hole in holes {
            device.push_contour(self.to_device(hole));
        }
        self.fill_device_path(&device, color, FillingRule::EvenOdd);
    }

    /// Stroke an open polyline `width` canvas pixels wide.
    pub fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Rgba8, cap: LineCap) {
        let outline = path::stroke(&self.to_device(points), width * self.scale, cap);
        self.fill_device_path(&outline, color, FillingRule::NonZero);
    }

    /// Stroke a polyline with a dash pattern given in canvas pixels.
    pub fn stroke_dashed(&mut self, points: &[Point], width: f64, pattern: &[f64], color: Rgba8) {
        let pattern: Vec<f64> = pattern.iter().map(|d| d * self.scale).collect();
        let mut outline = Path::new();
        for piece in path::dash(&self.to_device(points), &pattern, 0.0) {
            outline.append(path::stroke(&piece, width * self.scale, LineCap::Butt));
        }
        self.fill_device_path(&outline, color, FillingRule::NonZero);
    }

    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) {
        let circle = Path::circle(center * self.scale, radius * self.scale);
        self.fill_device_path(&circle, color, FillingRule::NonZero);
    }

    /// Stroke the outline of a circle, centered on its radius.
    pub fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Rgba8) {
        let c = center * self.scale;
        let half = width * self.scale * 0.5;
        let outer = radius * self.scale + half;
        let inner = radius * self.scale - half;
        let mut ring = Path::new();
        ring.push_contour(path::circle_points(c, outer));
        if inner > 0.0 {
            ring.push_contour(path::circle_points(c, inner));
        }
        self.fill_device_path(&ring, color, FillingRule::EvenOdd);
    }

    /// Draw text centered on (cx, cy). Lines are separated by `\n` and each
    /// line is centered on its own.
    pub fn draw_text_centered(&mut self, text: &str, cx: f64, cy: f64, size_pt: f64, color: Rgba8) {
        let cell = self.points_to_pixels(size_pt) / CELLS_PER_EM * self.scale;
        if !(cell > 0.0) {
            return;
        }
        let (w, h) = glyphs::text_extent(text);
        let x0 = cx * self.scale - w as f64 * cell * 0.5;
        let y0 = cy * self.scale - h as f64 * cell * 0.5;
        let mut cells = Path::new();
        for (col, row) in glyphs::lit_cells(text) {
            cells.append(Path::rect(
                x0 + col as f64 * cell,
                y0 + row as f64 * cell,
                cell,
                cell,
            ));
        }
        self.fill_device_path(&cells, color, FillingRule::NonZero);
    }

    /// Pixel of the backing buffer. Equal to canvas coordinates when not
    /// supersampled.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba8 {
        raster::pixel(&self.pixels, x, y)
    }

    /// The backing buffer, at `scale` times the canvas size.
    pub fn into_raster(self) -> Raster {
        self.pixels
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale", &self.scale)
            .field("dpi", &self.dpi)
            .field("theme", &self.theme.name)
            .finish_non_exhaustive()
    }
}
