//! Writing composites to image files.
//!
//! PNG and BMP keep the alpha channel. JPEG has none, so the raster is first
//! flattened onto the compositor background with its alpha as the mask.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbImage};

use crate::color::Rgb8;
use crate::error::{CompositeError, ConfigError};
use crate::raster::Raster;

/// JPEG quality used when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
}

impl ExportFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Bmp => "bmp",
        }
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, ExportFormat::Jpeg)
    }
}

impl FromStr for ExportFormat {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "bmp" => Ok(ExportFormat::Bmp),
            _ => Err(ConfigError::UnknownFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Bmp => "BMP",
        })
    }
}

/// Composite `raster` over an opaque background, dropping alpha.
pub fn flatten(raster: &Raster, background: Rgb8) -> RgbImage {
    let bg = [background.r, background.g, background.b];
    RgbImage::from_fn(raster.width(), raster.height(), |x, y| {
        let [r, g, b, a] = raster.get_pixel(x, y).0;
        let a = a as u32;
        let mix = |fg: u8, bg: u8| ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        image::Rgb([mix(r, bg[0]), mix(g, bg[1]), mix(b, bg[2])])
    })
}

/// Encode `raster` into `writer`.
///
/// `quality` (1-100) applies to JPEG only; `background` is used when the
/// format cannot store alpha.
pub fn encode<W: Write>(
    raster: &Raster,
    writer: &mut W,
    format: ExportFormat,
    quality: u8,
    background: Rgb8,
) -> Result<(), CompositeError> {
    let (w, h) = raster.dimensions();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(writer).write_image(raster.as_raw(), w, h, ColorType::Rgba8.into())?;
        }
        ExportFormat::Bmp => {
            BmpEncoder::new(writer).write_image(raster.as_raw(), w, h, ColorType::Rgba8.into())?;
        }
        ExportFormat::Jpeg => {
            let rgb = flatten(raster, background);
            JpegEncoder::new_with_quality(writer, quality.clamp(1, 100)).write_image(
                rgb.as_raw(),
                w,
                h,
                ColorType::Rgb8.into(),
            )?;
        }
    }
    Ok(())
}

/// Write `raster` to `path`.
pub fn save(
    raster: &Raster,
    path: &Path,
    format: ExportFormat,
    quality: u8,
    background: Rgb8,
) -> Result<(), CompositeError> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode(raster, &mut writer, format, quality, background)?;
    writer.flush()?;
    log::info!(
        "exported {}x{} {} to {}",
        raster.width(),
        raster.height(),
        format,
        path.display()
    );
    Ok(())
}
