//! Blend modes and the alpha-aware blend algebra.
//!
//! Coverage is always combined with the Porter-Duff "over" rule; a blend mode
//! only decides the color that lands where the overlay has coverage:
//!
//! ```text
//! out_a   = oa + ba * (1 - oa)
//! Normal: out_rgb = (o * oa + b * ba * (1 - oa)) / out_a
//! other:  out_rgb = B(b, o)      where oa > 0
//! ```
//!
//! Pixels with zero overlay alpha pass the base through untouched, whatever
//! the mode. All arithmetic is done in f64 on [0, 1] channels and rounded back
//! to 8 bits at the end.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::basics::{u8_from_unit, unit_from_u8, BLEND_EPSILON};
use crate::color::{hsv_to_rgb, rgb_to_hsv, Hsv};
use crate::error::{CompositeError, ConfigError};
use crate::raster::Raster;

// ============================================================================
// BlendMode
// ============================================================================

/// How a layer's color combines with the accumulated image below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    HardLight,
    ColorDodge,
    ColorBurn,
    Darken,
    Lighten,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Every mode, in declaration order.
    pub const ALL: [BlendMode; 16] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::SoftLight,
        BlendMode::HardLight,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];

    /// The snake_case name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::SoftLight => "soft_light",
            BlendMode::HardLight => "hard_light",
            BlendMode::ColorDodge => "color_dodge",
            BlendMode::ColorBurn => "color_burn",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
        }
    }

    /// Human-readable label for layer pickers.
    pub fn label(self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply (Darken)",
            BlendMode::Screen => "Screen (Lighten)",
            BlendMode::Overlay => "Overlay (Contrast)",
            BlendMode::SoftLight => "Soft Light",
            BlendMode::HardLight => "Hard Light",
            BlendMode::ColorDodge => "Color Dodge",
            BlendMode::ColorBurn => "Color Burn",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
        }
    }

    /// Whether the mode works on the whole HSV triple instead of per channel.
    pub fn is_component(self) -> bool {
        matches!(
            self,
            BlendMode::Hue | BlendMode::Saturation | BlendMode::Color | BlendMode::Luminosity
        )
    }
}

impl FromStr for BlendMode {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        BlendMode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| ConfigError::UnknownBlendMode(s.to_owned()))
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Per-channel formulas
// ============================================================================

/// Blend one normalized channel: `a` from the base, `b` from the overlay.
///
/// Only meaningful for the separable modes; component modes and `Normal`
/// return the overlay channel.
#[inline]
pub fn blend_channel(mode: BlendMode, a: f64, b: f64) -> f64 {
    match mode {
        BlendMode::Multiply => a * b,
        BlendMode::Screen => 1.0 - (1.0 - a) * (1.0 - b),
        BlendMode::Overlay => {
            if a < 0.5 {
                2.0 * a * b
            } else {
                1.0 - 2.0 * (1.0 - a) * (1.0 - b)
            }
        }
        BlendMode::SoftLight => {
            if b < 0.5 {
                2.0 * a * b + a * a * (1.0 - 2.0 * b)
            } else {
                2.0 * a * (1.0 - b) + a.sqrt() * (2.0 * b - 1.0)
            }
        }
        BlendMode::HardLight => {
            if b < 0.5 {
                2.0 * a * b
            } else {
                1.0 - 2.0 * (1.0 - a) * (1.0 - b)
            }
        }
        BlendMode::ColorDodge => {
            if b >= 1.0 {
                1.0
            } else {
                (a / (1.0 - b + BLEND_EPSILON)).min(1.0)
            }
        }
        BlendMode::ColorBurn => {
            if b <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - a) / (b + BLEND_EPSILON)).min(1.0)
            }
        }
        BlendMode::Darken => a.min(b),
        BlendMode::Lighten => a.max(b),
        BlendMode::Difference => (a - b).abs(),
        BlendMode::Exclusion => a + b - 2.0 * a * b,
        BlendMode::Normal
        | BlendMode::Hue
        | BlendMode::Saturation
        | BlendMode::Color
        | BlendMode::Luminosity => b,
    }
}

/// Blend a whole RGB triple with a component mode (hue, saturation, color,
/// luminosity). Separable modes fall back to [`blend_channel`] per channel.
pub fn blend_rgb(mode: BlendMode, base: [f64; 3], overlay: [f64; 3]) -> [f64; 3] {
    if !mode.is_component() {
        return [
            blend_channel(mode, base[0], overlay[0]),
            blend_channel(mode, base[1], overlay[1]),
            blend_channel(mode, base[2], overlay[2]),
        ];
    }

    let bh = rgb_to_hsv(base[0], base[1], base[2]);
    let oh = rgb_to_hsv(overlay[0], overlay[1], overlay[2]);
    let mixed = match mode {
        BlendMode::Hue => Hsv { h: oh.h, ..bh },
        BlendMode::Saturation => Hsv { s: oh.s, ..bh },
        BlendMode::Color => Hsv { v: bh.v, ..oh },
        _ => Hsv { v: oh.v, ..bh },
    };
    let (r, g, b) = hsv_to_rgb(mixed);
    [r, g, b]
}

// ============================================================================
// Pixel and raster blending
// ============================================================================

/// Blend a single straight-alpha RGBA pixel pair.
#[inline]
pub fn blend_pixel(base: [u8; 4], overlay: [u8; 4], mode: BlendMode) -> [u8; 4] {
    if overlay[3] == 0 {
        return base;
    }

    let ba = unit_from_u8(base[3]);
    let oa = unit_from_u8(overlay[3]);
    let out_a = oa + ba * (1.0 - oa);

    let b = [
        unit_from_u8(base[0]),
        unit_from_u8(base[1]),
        unit_from_u8(base[2]),
    ];
    let o = [
        unit_from_u8(overlay[0]),
        unit_from_u8(overlay[1]),
        unit_from_u8(overlay[2]),
    ];

    let rgb = if mode == BlendMode::Normal {
        if out_a <= 0.0 {
            [0.0; 3]
        } else {
            let base_w = ba * (1.0 - oa);
            [
                (o[0] * oa + b[0] * base_w) / out_a,
                (o[1] * oa + b[1] * base_w) / out_a,
                (o[2] * oa + b[2] * base_w) / out_a,
            ]
        }
    } else {
        blend_rgb(mode, b, o)
    };

    [
        u8_from_unit(rgb[0]),
        u8_from_unit(rgb[1]),
        u8_from_unit(rgb[2]),
        u8_from_unit(out_a),
    ]
}

/// Blend `overlay` onto `base` into a new raster.
pub fn blend(base: &Raster, overlay: &Raster, mode: BlendMode) -> Result<Raster, CompositeError> {
    let mut out = base.clone();
    blend_into(&mut out, overlay, mode)?;
    Ok(out)
}

/// Blend `overlay` onto `base` in place.
pub fn blend_into(
    base: &mut Raster,
    overlay: &Raster,
    mode: BlendMode,
) -> Result<(), CompositeError> {
    if base.dimensions() != overlay.dimensions() {
        let (base_width, base_height) = base.dimensions();
        let (overlay_width, overlay_height) = overlay.dimensions();
        return Err(CompositeError::SizeMismatch {
            base_width,
            base_height,
            overlay_width,
            overlay_height,
        });
    }
    for (dst, src) in base.pixels_mut().zip(overlay.pixels()) {
        dst.0 = blend_pixel(dst.0, src.0, mode);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;
    use crate::raster::{solid, transparent};

    fn px(r: u8, g: u8, b: u8) -> [u8; 4] {
        [r, g, b, 255]
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("soft_light".parse::<BlendMode>().unwrap(), BlendMode::SoftLight);
        assert_eq!("Color-Dodge".parse::<BlendMode>().unwrap(), BlendMode::ColorDodge);
        assert_eq!("MULTIPLY".parse::<BlendMode>().unwrap(), BlendMode::Multiply);
        assert!(matches!(
            "glow".parse::<BlendMode>(),
            Err(ConfigError::UnknownBlendMode(name)) if name == "glow"
        ));
        for mode in BlendMode::ALL {
            assert_eq!(mode.as_str().parse::<BlendMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&BlendMode::HardLight).unwrap();
        assert_eq!(json, "\"hard_light\"");
        let mode: BlendMode = serde_json::from_str("\"luminosity\"").unwrap();
        assert_eq!(mode, BlendMode::Luminosity);
        assert!(serde_json::from_str::<BlendMode>("\"sparkle\"").is_err());
    }

    #[test]
    fn test_normal_opaque_overlay_replaces() {
        let out = blend_pixel(px(10, 200, 30), px(99, 88, 77), BlendMode::Normal);
        assert_eq!(out, px(99, 88, 77));
    }

    #[test]
    fn test_normal_half_alpha_over_opaque() {
        let out = blend_pixel(px(255, 0, 0), [0, 0, 255, 128], BlendMode::Normal);
        assert_eq!(out[3], 255);
        assert!((out[0] as i32 - 127).abs() <= 1, "r={}", out[0]);
        assert_eq!(out[1], 0);
        assert!((out[2] as i32 - 128).abs() <= 1, "b={}", out[2]);
    }

    #[test]
    fn test_normal_onto_transparent_base() {
        let out = blend_pixel([0, 0, 0, 0], [40, 50, 60, 100], BlendMode::Normal);
        assert_eq!(out, [40, 50, 60, 100]);
    }

    #[test]
    fn test_zero_alpha_passes_base_through() {
        let base = [12, 34, 56, 78];
        for mode in BlendMode::ALL {
            assert_eq!(blend_pixel(base, [255, 255, 255, 0], mode), base, "{:?}", mode);
        }
        let hidden = [9, 9, 9, 0];
        assert_eq!(blend_pixel(hidden, [1, 2, 3, 0], BlendMode::Normal), hidden);
    }

    #[test]
    fn test_non_normal_uses_blended_color_where_covered() {
        let out = blend_pixel(px(200, 100, 50), [255, 255, 255, 10], BlendMode::Multiply);
        assert_eq!(&out[..3], &[200, 100, 50]);
        assert_eq!(out[3], 255);
    }

    #[test]
    fn test_multiply_and_screen_boundaries() {
        let c = px(37, 142, 211);
        assert_eq!(blend_pixel(c, px(255, 255, 255), BlendMode::Multiply), c);
        assert_eq!(blend_pixel(c, px(0, 0, 0), BlendMode::Multiply), px(0, 0, 0));
        assert_eq!(blend_pixel(c, px(0, 0, 0), BlendMode::Screen), c);
        assert_eq!(blend_pixel(c, px(255, 255, 255), BlendMode::Screen), px(255, 255, 255));
    }

    #[test]
    fn test_channel_formulas() {
        let eps = 1e-12;
        assert!((blend_channel(BlendMode::Overlay, 0.25, 0.5) - 0.25).abs() < eps);
        assert!((blend_channel(BlendMode::Overlay, 0.75, 0.5) - 0.75).abs() < eps);
        assert!((blend_channel(BlendMode::HardLight, 0.5, 0.25) - 0.25).abs() < eps);
        assert!((blend_channel(BlendMode::HardLight, 0.5, 0.75) - 0.75).abs() < eps);
        assert!((blend_channel(BlendMode::SoftLight, 0.25, 0.5) - 0.25).abs() < eps);
        assert!((blend_channel(BlendMode::SoftLight, 0.25, 1.0) - 0.5).abs() < eps);
        assert!((blend_channel(BlendMode::Difference, 0.2, 0.7) - 0.5).abs() < eps);
        assert!((blend_channel(BlendMode::Exclusion, 0.5, 0.5) - 0.5).abs() < eps);
        assert_eq!(blend_channel(BlendMode::Darken, 0.3, 0.6), 0.3);
        assert_eq!(blend_channel(BlendMode::Lighten, 0.3, 0.6), 0.6);
    }

    #[test]
    fn test_dodge_and_burn_edges() {
        assert_eq!(blend_channel(BlendMode::ColorDodge, 0.0, 1.0), 1.0);
        assert_eq!(blend_channel(BlendMode::ColorDodge, 0.6, 0.5), 1.0);
        assert!((blend_channel(BlendMode::ColorDodge, 0.25, 0.5) - 0.5).abs() < 1e-9);
        assert_eq!(blend_channel(BlendMode::ColorBurn, 1.0, 0.0), 0.0);
        assert_eq!(blend_channel(BlendMode::ColorBurn, 0.2, 0.5), 0.0);
        assert!((blend_channel(BlendMode::ColorBurn, 0.75, 0.5) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_component_modes() {
        let base = [0.0, 0.5, 0.0];
        let overlay = [1.0, 0.0, 0.0];
        let hue = blend_rgb(BlendMode::Hue, base, overlay);
        assert!((hue[0] - 0.5).abs() < 1e-9 && hue[1].abs() < 1e-9);

        let lum = blend_rgb(BlendMode::Luminosity, base, overlay);
        assert!(lum[0].abs() < 1e-9 && (lum[1] - 1.0).abs() < 1e-9);

        let color = blend_rgb(BlendMode::Color, base, overlay);
        assert!((color[0] - 0.5).abs() < 1e-9 && color[2].abs() < 1e-9);

        let sat = blend_rgb(BlendMode::Saturation, base, [0.5, 0.5, 0.5]);
        assert!(sat.iter().all(|c| (c - 0.5).abs() < 1e-9), "{:?}", sat);
    }

    #[test]
    fn test_darken_lighten_bounds() {
        let pairs = [
            (px(10, 200, 90), px(100, 20, 90)),
            (px(0, 255, 128), px(255, 0, 127)),
        ];
        for (a, b) in pairs {
            let d = blend_pixel(a, b, BlendMode::Darken);
            let l = blend_pixel(a, b, BlendMode::Lighten);
            for c in 0..3 {
                assert!(d[c] <= a[c] && d[c] <= b[c]);
                assert!(l[c] >= a[c] && l[c] >= b[c]);
            }
        }
    }

    #[test]
    fn test_blend_raster_size_mismatch() {
        let a = transparent(4, 4);
        let b = transparent(4, 5);
        assert!(matches!(
            blend(&a, &b, BlendMode::Normal),
            Err(CompositeError::SizeMismatch { overlay_height: 5, .. })
        ));
    }

    #[test]
    fn test_blend_raster_applies_per_pixel() {
        let base = solid(3, 2, Rgba8::opaque(255, 255, 255));
        let mut overlay = transparent(3, 2);
        overlay.put_pixel(1, 1, Rgba8::opaque(10, 20, 30).into());
        let out = blend(&base, &overlay, BlendMode::Multiply).unwrap();
        assert_eq!(out.get_pixel(1, 1).0, [10, 20, 30, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }
}
