//! RGBA raster helpers.
//!
//! Every layer image and composite in the crate is an [`image::RgbaImage`]:
//! tightly packed, row-major, straight (non-premultiplied) alpha.

use image::imageops::{self, FilterType};
use image::{Rgba32FImage, RgbaImage};

use crate::basics::{clamp_unit, u8_from_unit, unit_from_u8};
use crate::color::{Rgb8, Rgba8};

/// A fixed-size grid of straight-alpha RGBA pixels.
pub type Raster = RgbaImage;

/// Filter used whenever a raster has to change size.
pub const SMOOTH_FILTER: FilterType = FilterType::Lanczos3;

/// A raster filled with a single color.
pub fn solid(width: u32, height: u32, color: Rgba8) -> Raster {
    RgbaImage::from_pixel(width, height, color.into())
}

/// An opaque raster filled with the background color.
pub fn background(width: u32, height: u32, color: Rgb8) -> Raster {
    solid(width, height, color.with_alpha(255))
}

/// A fully transparent raster.
pub fn transparent(width: u32, height: u32) -> Raster {
    RgbaImage::new(width, height)
}

/// Multiply every alpha value by `opacity`, truncating toward zero.
///
/// Color channels are left alone. An opacity of 1 is a no-op.
pub fn scale_alpha(raster: &mut Raster, opacity: f64) {
    let opacity = clamp_unit(opacity);
    if opacity >= 1.0 {
        return;
    }
    for px in raster.pixels_mut() {
        px.0[3] = (px.0[3] as f64 * opacity) as u8;
    }
}

/// Resample in premultiplied alpha so transparent pixels do not bleed into
/// anti-aliased edges.
fn resample(raster: &Raster, width: u32, height: u32) -> Raster {
    let premultiplied = Rgba32FImage::from_fn(raster.width(), raster.height(), |x, y| {
        let [r, g, b, a] = raster.get_pixel(x, y).0;
        let a = unit_from_u8(a) as f32;
        image::Rgba([
            unit_from_u8(r) as f32 * a,
            unit_from_u8(g) as f32 * a,
            unit_from_u8(b) as f32 * a,
            a,
        ])
    });
    let resized = imageops::resize(&premultiplied, width, height, SMOOTH_FILTER);
    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = resized.get_pixel(x, y).0;
        let a = a as f64;
        let alpha = u8_from_unit(a);
        if alpha == 0 {
            return image::Rgba([0, 0, 0, 0]);
        }
        image::Rgba([
            u8_from_unit(r as f64 / a),
            u8_from_unit(g as f64 / a),
            u8_from_unit(b as f64 / a),
            alpha,
        ])
    })
}

/// Resize to exactly `width` x `height` with a smooth filter.
///
/// Returns the input unchanged when it already has the requested size.
pub fn resize_smooth(raster: Raster, width: u32, height: u32) -> Raster {
    if raster.dimensions() == (width, height) {
        return raster;
    }
    resample(&raster, width, height)
}

/// Shrink to fit within `max_width` x `max_height`, keeping the aspect ratio.
///
/// Never enlarges. Each output side is at least one pixel.
pub fn fit_within(raster: &Raster, max_width: u32, max_height: u32) -> Raster {
    let (w, h) = raster.dimensions();
    if w == 0 || h == 0 || (w <= max_width && h <= max_height) {
        return raster.clone();
    }
    let scale = (max_width as f64 / w as f64).min(max_height as f64 / h as f64);
    let nw = ((w as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let nh = ((h as f64 * scale).round() as u32).clamp(1, max_height.max(1));
    resample(raster, nw, nh)
}

/// Pixel at (x, y) as an [`Rgba8`].
#[inline]
pub fn pixel(raster: &Raster, x: u32, y: u32) -> Rgba8 {
    Rgba8::from(*raster.get_pixel(x, y))
}
