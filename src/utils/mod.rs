// fastresize/src/utils/mod.rs
use crate::core::{ImageFormat, ResizeError, Result};
use tempfile::NamedTempFile;

/// Canonical file extension per format. The only place format knowledge
/// leaks into file naming.
pub fn canonical_extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
    }
}

/// Allocate a uniquely named temp file to receive the encoded output,
/// suffixed with the format's canonical extension.
pub(crate) fn temp_output(format: ImageFormat) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("fastresize-")
        .suffix(&format!(".{}", canonical_extension(format)))
        .tempfile()
        .map_err(|e| ResizeError::EncodeFailure(format!("cannot create temp output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_extensions_prefer_jpg() {
        assert_eq!(canonical_extension(ImageFormat::Jpeg), "jpg");
        assert_eq!(canonical_extension(ImageFormat::Png), "png");
        assert_eq!(canonical_extension(ImageFormat::Gif), "gif");
    }

    #[test]
    fn temp_outputs_carry_the_format_extension() {
        let out = temp_output(ImageFormat::Gif).unwrap();
        assert_eq!(
            out.path().extension().and_then(|e| e.to_str()),
            Some("gif")
        );
    }
}
