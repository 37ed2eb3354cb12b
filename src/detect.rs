// fastresize/src/detect.rs

//! Format detection from magic bytes.
//!
//! Only the file header is examined; whether the rest of the stream is a
//! well-formed image is the decoder's problem. Formats we can name but not
//! resize (BMP, ICO, TIFF, WebP) are distinguished from arbitrary garbage
//! so callers see `UnsupportedFormat` instead of a decode error.

use crate::core::{ImageFormat, ResizeError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Format(ImageFormat),
    Unsupported(&'static str),
    Unknown,
}

pub fn sniff_bytes(header: &[u8]) -> Detection {
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Detection::Format(ImageFormat::Jpeg);
    }
    if header.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Detection::Format(ImageFormat::Png);
    }
    if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
        return Detection::Format(ImageFormat::Gif);
    }
    if header.starts_with(b"BM") {
        return Detection::Unsupported("BMP");
    }
    if header.starts_with(&[0x00, 0x00, 0x01, 0x00]) || header.starts_with(&[0x00, 0x00, 0x02, 0x00])
    {
        return Detection::Unsupported("ICO");
    }
    if header.starts_with(b"II*\0") || header.starts_with(b"MM\0*") {
        return Detection::Unsupported("TIFF");
    }
    if header.len() >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"WEBP" {
        return Detection::Unsupported("WebP");
    }
    Detection::Unknown
}

/// Sniff the format of a local file from its leading bytes.
pub fn sniff_file(path: &Path) -> Result<ImageFormat> {
    let mut header = [0u8; HEADER_LEN];
    let mut file = File::open(path)?;
    let mut read = 0;
    while read < HEADER_LEN {
        match file.read(&mut header[read..])? {
            0 => break,
            n => read += n,
        }
    }

    match sniff_bytes(&header[..read]) {
        Detection::Format(format) => Ok(format),
        Detection::Unsupported(name) => Err(ResizeError::UnsupportedFormat(name.to_string())),
        Detection::Unknown => Err(ResizeError::DecodeFailure(
            "unrecognized image data".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_supported_formats() {
        assert_eq!(
            sniff_bytes(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]),
            Detection::Format(ImageFormat::Jpeg)
        );
        assert_eq!(
            sniff_bytes(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]),
            Detection::Format(ImageFormat::Png)
        );
        assert_eq!(
            sniff_bytes(b"GIF89a\x11\x00"),
            Detection::Format(ImageFormat::Gif)
        );
        assert_eq!(
            sniff_bytes(b"GIF87a\x11\x00"),
            Detection::Format(ImageFormat::Gif)
        );
    }

    #[test]
    fn names_known_unsupported_formats() {
        assert_eq!(sniff_bytes(b"BM\x9a\x00"), Detection::Unsupported("BMP"));
        assert_eq!(
            sniff_bytes(&[0x00, 0x00, 0x01, 0x00, 0x01, 0x00]),
            Detection::Unsupported("ICO")
        );
        assert_eq!(sniff_bytes(b"II*\0\x08\0\0\0"), Detection::Unsupported("TIFF"));
        assert_eq!(
            sniff_bytes(b"RIFF\x00\x00\x00\x00WEBPVP8 "),
            Detection::Unsupported("WebP")
        );
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(sniff_bytes(b"not an image at all"), Detection::Unknown);
        assert_eq!(sniff_bytes(&[]), Detection::Unknown);
        assert_eq!(sniff_bytes(&[0xFF]), Detection::Unknown);
    }
}
