//! Error types.
//!
//! Lookups and mutations by layer name never fail; they report "not found"
//! through `bool` / `Option` returns. The enums here cover the failures that
//! callers cannot check for up front: a broken render callback, malformed
//! configuration, and image encoding or I/O problems.

use thiserror::Error;

/// Error type returned by render callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single render callback invocation.
pub type RenderResult = Result<(), BoxError>;

/// Errors raised while rasterizing, blending, or exporting a layer stack.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// A layer's render callback returned an error. The callback's own error
    /// is kept untouched as the source.
    #[error("render callback for layer `{layer}` failed")]
    Render {
        layer: String,
        #[source]
        source: BoxError,
    },

    /// Two rasters handed to the blend algebra differ in size.
    #[error(
        "raster size mismatch: base is {base_width}x{base_height}, \
         overlay is {overlay_width}x{overlay_height}"
    )]
    SizeMismatch {
        base_width: u32,
        base_height: u32,
        overlay_width: u32,
        overlay_height: u32,
    },

    /// `add_layer` was called with a name already present in the stack.
    #[error("a layer named `{0}` already exists")]
    DuplicateLayer(String),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading configuration, presets, or format names.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown blend mode `{0}`")]
    UnknownBlendMode(String),

    #[error("unknown preset `{name}`; available: {}", available.join(", "))]
    UnknownPreset {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("unknown export format `{0}`")]
    UnknownFormat(String),

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while parsing color strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid hex color `{0}`")]
    InvalidHex(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_render_error_keeps_source() {
        let inner: BoxError = "tile server unreachable".into();
        let err = CompositeError::Render {
            layer: "railways".into(),
            source: inner,
        };
        assert_eq!(err.to_string(), "render callback for layer `railways` failed");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("tile server unreachable"));
    }

    #[test]
    fn test_unknown_preset_lists_names() {
        let err = ConfigError::UnknownPreset {
            name: "mystery".into(),
            available: vec!["coastal_city", "transit_focus"],
        };
        assert_eq!(
            err.to_string(),
            "unknown preset `mystery`; available: coastal_city, transit_focus"
        );
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = CompositeError::SizeMismatch {
            base_width: 10,
            base_height: 20,
            overlay_width: 5,
            overlay_height: 5,
        };
        assert!(err.to_string().contains("10x20"));
        assert!(err.to_string().contains("5x5"));
    }
}
