// fastresize/src/core/mod.rs
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub mod pipeline;

/// The three encoded formats the pipeline understands.
///
/// This is a closed enum on purpose: decode and encode each dispatch on it
/// with an exhaustive match, so adding a format means one variant and two
/// match arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-request knobs that are not the target dimensions.
#[derive(Debug, Clone, Default)]
pub struct ResizeOptions {
    /// JPEG encode quality in 0..=100. `None` uses the encoder default.
    /// Ignored for PNG and GIF input.
    pub jpeg_quality: Option<u8>,
    /// Explicit output path. When absent the result goes to a fresh temp
    /// file whose extension matches the source format.
    pub outfile: Option<PathBuf>,
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode image: {0}")]
    DecodeFailure(String),

    #[error("target width and height cannot both be zero")]
    InvalidDimensions,

    #[error("failed to encode image: {0}")]
    EncodeFailure(String),

    #[error("failed to fetch image: {0}")]
    FetchFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ResizeError>;

/// Resolves the output dimensions for a resize.
///
/// Explicit non-zero dimensions are taken verbatim, even when they distort
/// the image. A single zero dimension is inferred proportionally from the
/// source aspect ratio with floor division; a proportional result that
/// floors to zero is clamped to one pixel so the destination raster stays
/// allocatable. Both zero is a caller error.
pub fn resolve_dimensions(
    source_width: u32,
    source_height: u32,
    requested_width: u32,
    requested_height: u32,
) -> Result<(u32, u32)> {
    match (requested_width, requested_height) {
        (0, 0) => Err(ResizeError::InvalidDimensions),
        (0, h) => {
            let w = u64::from(h) * u64::from(source_width) / u64::from(source_height);
            Ok(((w as u32).max(1), h))
        }
        (w, 0) => {
            let h = u64::from(w) * u64::from(source_height) / u64::from(source_width);
            Ok((w, (h as u32).max(1)))
        }
        (w, h) => Ok((w, h)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dimensions_win() {
        assert_eq!(resolve_dimensions(882, 470, 294, 235).unwrap(), (294, 235));
        // No aspect correction, even for distorting requests.
        assert_eq!(resolve_dimensions(100, 100, 10, 90).unwrap(), (10, 90));
    }

    #[test]
    fn zero_width_scales_proportionally() {
        // 16 * 17 / 32 = 8.5, floored.
        assert_eq!(resolve_dimensions(17, 32, 0, 16).unwrap(), (8, 16));
        assert_eq!(resolve_dimensions(30, 20, 0, 10).unwrap(), (15, 10));
    }

    #[test]
    fn zero_height_scales_proportionally() {
        assert_eq!(resolve_dimensions(30, 20, 15, 0).unwrap(), (15, 10));
        // 10 * 470 / 882 = 5.32..., floored.
        assert_eq!(resolve_dimensions(882, 470, 10, 0).unwrap(), (10, 5));
    }

    #[test]
    fn proportional_floor_never_hits_zero() {
        assert_eq!(resolve_dimensions(1, 1000, 0, 1).unwrap(), (1, 1));
        assert_eq!(resolve_dimensions(1000, 1, 1, 0).unwrap(), (1, 1));
    }

    #[test]
    fn both_zero_is_rejected() {
        assert!(matches!(
            resolve_dimensions(882, 470, 0, 0),
            Err(ResizeError::InvalidDimensions)
        ));
    }
}
