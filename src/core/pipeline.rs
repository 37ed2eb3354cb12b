// fastresize/src/core/pipeline.rs

//! The resize orchestrator: resolve input to a local file, sniff the
//! format, decode, fix up transparency, resample, and re-encode in the
//! source format.
//!
//! Decode and encode are the only two format dispatch points; everything
//! in between is sequencing. Both rasters are held in [`RasterGuard`]s so
//! they are freed on every exit path.

use crate::codec::{ImageCodec, RasterCodec, RasterGuard, RasterId};
use crate::core::{resolve_dimensions, ImageFormat, ResizeError, ResizeOptions, Result};
use crate::detect;
use crate::input::ImageSource;
use crate::utils;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// GIF output palettes are capped at 256 colors by the format.
const GIF_MAX_COLORS: usize = 256;

/// Where the resized image ended up.
#[derive(Debug)]
pub enum ResizeOutput {
    /// Written to the path the caller asked for.
    File(PathBuf),
    /// Written to a generated temp file; dropping this value deletes it.
    Temp(NamedTempFile),
}

impl ResizeOutput {
    pub fn path(&self) -> &Path {
        match self {
            ResizeOutput::File(path) => path,
            ResizeOutput::Temp(temp) => temp.path(),
        }
    }
}

/// Source pixel that proved the transparent index was actually in use.
///
/// After resampling, the destination pixel at the same coordinate is
/// re-read to pick the output's transparent index. That is the historical
/// gd heuristic: approximate, since resampling and quantization can move
/// or blend that exact pixel, but kept for behavior parity.
#[derive(Debug, Clone, Copy)]
struct TransparentPixel {
    x: u32,
    y: u32,
}

pub struct ResizePipeline<C: RasterCodec = ImageCodec> {
    codec: C,
}

impl ResizePipeline<ImageCodec> {
    pub fn new() -> Self {
        ResizePipeline {
            codec: ImageCodec::new(),
        }
    }
}

impl Default for ResizePipeline<ImageCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: RasterCodec> ResizePipeline<C> {
    pub fn with_codec(codec: C) -> Self {
        ResizePipeline { codec }
    }

    /// Resize `source` to `width` x `height`, re-encoding in the source
    /// format. A zero dimension is inferred proportionally from the other;
    /// both zero is rejected before any I/O happens.
    pub fn resize(
        &self,
        source: ImageSource,
        width: u32,
        height: u32,
        options: &ResizeOptions,
    ) -> Result<ResizeOutput> {
        if width == 0 && height == 0 {
            return Err(ResizeError::InvalidDimensions);
        }

        let local = source.into_local()?;
        let format = detect::sniff_file(local.path())?;
        log::debug!("detected {format} at {}", local.path().display());

        let src = RasterGuard::new(&self.codec, self.codec.decode(local.path(), format)?);

        // Palette transparency must be resolved on raw indices before any
        // interpolation touches the pixels.
        let transparency = match format {
            ImageFormat::Gif => self.prepare_gif_transparency(src.id()),
            ImageFormat::Jpeg | ImageFormat::Png => None,
        };

        let (source_width, source_height) = self.codec.dimensions(src.id());
        let (out_width, out_height) =
            resolve_dimensions(source_width, source_height, width, height)?;
        log::debug!("resizing {source_width}x{source_height} -> {out_width}x{out_height}");

        let dst = RasterGuard::new(&self.codec, self.codec.alloc_truecolor(out_width, out_height)?);

        if format == ImageFormat::Png {
            // Keep partially transparent pixels instead of flattening them
            // onto an opaque background.
            self.codec.set_alpha_blending(dst.id(), false);
            self.codec.set_save_alpha(dst.id(), true);
        }

        self.codec.resample(dst.id(), src.id())?;

        let output = self.write_output(dst.id(), format, transparency, options)?;
        log::info!("wrote {} output to {}", format, output.path().display());
        Ok(output)
    }

    /// Record whether the source GIF's transparent index is used by any
    /// pixel, then clear the index so the resampler treats that color as
    /// ordinary opaque paint instead of blending into undefined colors.
    fn prepare_gif_transparency(&self, src: RasterId) -> Option<TransparentPixel> {
        let index = self.codec.transparent_index(src)?;
        let (width, height) = self.codec.dimensions(src);

        let mut found = None;
        'scan: for x in 0..width {
            for y in 0..height {
                if self.codec.pixel(src, x, y) == u32::from(index) {
                    found = Some(TransparentPixel { x, y });
                    break 'scan;
                }
            }
        }

        self.codec.set_transparent_index(src, None);
        if found.is_none() {
            log::debug!("transparent index {index} declared but unused");
        }
        found
    }

    fn write_output(
        &self,
        dst: RasterId,
        format: ImageFormat,
        transparency: Option<TransparentPixel>,
        options: &ResizeOptions,
    ) -> Result<ResizeOutput> {
        match &options.outfile {
            Some(path) => {
                let file = File::create(path).map_err(|e| {
                    ResizeError::EncodeFailure(format!("cannot open {}: {e}", path.display()))
                })?;
                let mut sink = BufWriter::new(file);
                self.encode(dst, format, transparency, options.jpeg_quality, &mut sink)?;
                sink.flush()
                    .map_err(|e| ResizeError::EncodeFailure(e.to_string()))?;
                Ok(ResizeOutput::File(path.clone()))
            }
            None => {
                let mut temp = utils::temp_output(format)?;
                let mut sink = BufWriter::new(temp.as_file_mut());
                self.encode(dst, format, transparency, options.jpeg_quality, &mut sink)?;
                sink.flush()
                    .map_err(|e| ResizeError::EncodeFailure(e.to_string()))?;
                drop(sink);
                Ok(ResizeOutput::Temp(temp))
            }
        }
    }

    fn encode(
        &self,
        dst: RasterId,
        format: ImageFormat,
        transparency: Option<TransparentPixel>,
        jpeg_quality: Option<u8>,
        sink: &mut dyn Write,
    ) -> Result<()> {
        if format == ImageFormat::Gif {
            self.codec.quantize(dst, GIF_MAX_COLORS)?;
            if let Some(pixel) = transparency {
                // Whatever palette entry landed on the recorded coordinate
                // becomes the output's transparent index.
                let index = self.codec.pixel(dst, pixel.x, pixel.y);
                self.codec.set_transparent_index(dst, Some(index as u8));
            }
        }
        self.codec.encode(dst, format, sink, jpeg_quality)
    }
}
