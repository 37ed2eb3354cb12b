// fastresize/src/codec/image_codec.rs

//! Production [`RasterCodec`] backed by the `image`, `gif` and `color_quant`
//! crates.
//!
//! GIF goes through the `gif` crate directly rather than through `image`
//! because the pipeline needs the raw palette indices and the transparent
//! index, and `image`'s GIF path flattens both into RGBA at decode time.

use super::{RasterCodec, RasterId};
use crate::core::{ImageFormat, ResizeError, Result};
use color_quant::NeuQuant;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// NeuQuant sampling factor; 10 trades a little palette quality for a
/// large speedup, same as `image`'s own GIF encoder default.
const QUANTIZE_SAMPLE_FACTOR: i32 = 10;

enum Raster {
    Truecolor {
        pixels: RgbaImage,
        save_alpha: bool,
        // Tracked for gd parity; resampling always overwrites the full
        // destination, so the flag never changes pixel math here.
        #[allow(dead_code)]
        alpha_blending: bool,
    },
    Indexed {
        width: u32,
        height: u32,
        indices: Vec<u8>,
        /// Flat RGB triples.
        palette: Vec<u8>,
        transparent: Option<u8>,
    },
}

impl Raster {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            Raster::Truecolor { pixels, .. } => pixels.dimensions(),
            Raster::Indexed { width, height, .. } => (*width, *height),
        }
    }

    /// Expand to RGBA for resampling. Palette entries resolve to opaque
    /// colors; the pipeline clears the transparent index before this runs.
    fn to_rgba(&self) -> RgbaImage {
        match self {
            Raster::Truecolor { pixels, .. } => pixels.clone(),
            Raster::Indexed {
                width,
                height,
                indices,
                palette,
                ..
            } => {
                let mut out = RgbaImage::new(*width, *height);
                for (i, pixel) in out.pixels_mut().enumerate() {
                    let entry = indices.get(i).map(|&idx| idx as usize * 3).unwrap_or(0);
                    let rgb = palette.get(entry..entry + 3).unwrap_or(&[0, 0, 0]);
                    *pixel = Rgba([rgb[0], rgb[1], rgb[2], 255]);
                }
                out
            }
        }
    }
}

/// Raster store keyed by opaque ids, safe to share across threads.
pub struct ImageCodec {
    rasters: Mutex<HashMap<u64, Raster>>,
    next_id: AtomicU64,
}

impl ImageCodec {
    pub fn new() -> Self {
        ImageCodec {
            rasters: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Raster>> {
        match self.rasters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn insert(&self, raster: Raster) -> RasterId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, raster);
        RasterId::new(id)
    }

    fn with<R>(&self, id: RasterId, f: impl FnOnce(&mut Raster) -> R) -> R {
        let mut rasters = self.lock();
        let raster = rasters
            .get_mut(&id.raw())
            .unwrap_or_else(|| panic!("raster {id:?} used after release"));
        f(raster)
    }

    fn decode_gif(&self, path: &Path) -> Result<RasterId> {
        let file = File::open(path)?;
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options
            .read_info(BufReader::new(file))
            .map_err(|e| ResizeError::DecodeFailure(e.to_string()))?;
        let global_palette = decoder.global_palette().map(|p| p.to_vec());
        let frame = decoder
            .read_next_frame()
            .map_err(|e| ResizeError::DecodeFailure(e.to_string()))?
            .ok_or_else(|| ResizeError::DecodeFailure("GIF contains no image data".into()))?;

        let palette = frame
            .palette
            .clone()
            .or(global_palette)
            .ok_or_else(|| ResizeError::DecodeFailure("GIF has no color table".into()))?;

        Ok(self.insert(Raster::Indexed {
            width: u32::from(frame.width),
            height: u32::from(frame.height),
            indices: frame.buffer.to_vec(),
            palette,
            transparent: frame.transparent,
        }))
    }

    fn decode_truecolor(&self, path: &Path, format: image::ImageFormat) -> Result<RasterId> {
        let file = File::open(path)?;
        let decoded = image::load(BufReader::new(file), format)
            .map_err(|e| ResizeError::DecodeFailure(e.to_string()))?;
        Ok(self.insert(Raster::Truecolor {
            pixels: decoded.to_rgba8(),
            save_alpha: false,
            alpha_blending: true,
        }))
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterCodec for ImageCodec {
    fn decode(&self, path: &Path, format: ImageFormat) -> Result<RasterId> {
        match format {
            ImageFormat::Jpeg => self.decode_truecolor(path, image::ImageFormat::Jpeg),
            ImageFormat::Png => self.decode_truecolor(path, image::ImageFormat::Png),
            ImageFormat::Gif => self.decode_gif(path),
        }
    }

    fn alloc_truecolor(&self, width: u32, height: u32) -> Result<RasterId> {
        Ok(self.insert(Raster::Truecolor {
            pixels: RgbaImage::new(width, height),
            save_alpha: false,
            alpha_blending: true,
        }))
    }

    fn dimensions(&self, raster: RasterId) -> (u32, u32) {
        self.with(raster, |r| r.dimensions())
    }

    fn set_alpha_blending(&self, raster: RasterId, enabled: bool) {
        self.with(raster, |r| {
            if let Raster::Truecolor { alpha_blending, .. } = r {
                *alpha_blending = enabled;
            }
        });
    }

    fn set_save_alpha(&self, raster: RasterId, enabled: bool) {
        self.with(raster, |r| {
            if let Raster::Truecolor { save_alpha, .. } = r {
                *save_alpha = enabled;
            }
        });
    }

    fn transparent_index(&self, raster: RasterId) -> Option<u8> {
        self.with(raster, |r| match r {
            Raster::Indexed { transparent, .. } => *transparent,
            Raster::Truecolor { .. } => None,
        })
    }

    fn set_transparent_index(&self, raster: RasterId, index: Option<u8>) {
        self.with(raster, |r| {
            if let Raster::Indexed { transparent, .. } = r {
                *transparent = index;
            }
        });
    }

    fn pixel(&self, raster: RasterId, x: u32, y: u32) -> u32 {
        self.with(raster, |r| match r {
            Raster::Indexed {
                width,
                height,
                indices,
                ..
            } => {
                if x < *width && y < *height {
                    let offset = y as usize * *width as usize + x as usize;
                    u32::from(indices[offset])
                } else {
                    0
                }
            }
            Raster::Truecolor { pixels, .. } => {
                if x < pixels.width() && y < pixels.height() {
                    let Rgba([r, g, b, a]) = *pixels.get_pixel(x, y);
                    u32::from_be_bytes([a, r, g, b])
                } else {
                    0
                }
            }
        })
    }

    fn resample(&self, dst: RasterId, src: RasterId) -> Result<()> {
        let source = self.with(src, |r| r.to_rgba());
        let (dst_width, dst_height) = self.dimensions(dst);
        let resized = imageops::resize(&source, dst_width, dst_height, FilterType::Triangle);
        self.with(dst, |r| match r {
            Raster::Truecolor { pixels, .. } => {
                *pixels = resized;
            }
            Raster::Indexed { .. } => panic!("resample destination must be truecolor"),
        });
        Ok(())
    }

    fn quantize(&self, raster: RasterId, max_colors: usize) -> Result<()> {
        self.with(raster, |r| {
            let (width, height, indices, palette) = match r {
                Raster::Truecolor { pixels, .. } => {
                    let colors = max_colors.clamp(64, 256);
                    let quantizer =
                        NeuQuant::new(QUANTIZE_SAMPLE_FACTOR, colors, pixels.as_raw());
                    let indices: Vec<u8> = pixels
                        .pixels()
                        .map(|p| quantizer.index_of(&p.0) as u8)
                        .collect();
                    (
                        pixels.width(),
                        pixels.height(),
                        indices,
                        quantizer.color_map_rgb(),
                    )
                }
                // Already palette color; nothing to reduce.
                Raster::Indexed { .. } => return Ok(()),
            };
            *r = Raster::Indexed {
                width,
                height,
                indices,
                palette,
                transparent: None,
            };
            Ok(())
        })
    }

    fn encode(
        &self,
        raster: RasterId,
        format: ImageFormat,
        sink: &mut dyn Write,
        jpeg_quality: Option<u8>,
    ) -> Result<()> {
        self.with(raster, |r| match format {
            ImageFormat::Jpeg => {
                let pixels = match r {
                    Raster::Truecolor { pixels, .. } => pixels,
                    Raster::Indexed { .. } => {
                        return Err(ResizeError::EncodeFailure(
                            "JPEG encode requires a truecolor raster".into(),
                        ))
                    }
                };
                let rgb = image::DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
                let encoder = match jpeg_quality {
                    Some(quality) => JpegEncoder::new_with_quality(sink, quality),
                    None => JpegEncoder::new(sink),
                };
                encoder
                    .write_image(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        ExtendedColorType::Rgb8,
                    )
                    .map_err(|e| ResizeError::EncodeFailure(e.to_string()))
            }
            ImageFormat::Png => {
                let (pixels, save_alpha) = match r {
                    Raster::Truecolor {
                        pixels, save_alpha, ..
                    } => (pixels, *save_alpha),
                    Raster::Indexed { .. } => {
                        return Err(ResizeError::EncodeFailure(
                            "PNG encode requires a truecolor raster".into(),
                        ))
                    }
                };
                let encoder = PngEncoder::new(sink);
                let result = if save_alpha {
                    encoder.write_image(
                        pixels.as_raw(),
                        pixels.width(),
                        pixels.height(),
                        ExtendedColorType::Rgba8,
                    )
                } else {
                    let rgb = image::DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
                    encoder.write_image(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        ExtendedColorType::Rgb8,
                    )
                };
                result.map_err(|e| ResizeError::EncodeFailure(e.to_string()))
            }
            ImageFormat::Gif => {
                let (width, height, indices, palette, transparent) = match r {
                    Raster::Indexed {
                        width,
                        height,
                        indices,
                        palette,
                        transparent,
                    } => (*width, *height, indices, palette, *transparent),
                    Raster::Truecolor { .. } => {
                        return Err(ResizeError::EncodeFailure(
                            "GIF encode requires a quantized raster".into(),
                        ))
                    }
                };
                if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
                    return Err(ResizeError::EncodeFailure(format!(
                        "{width}x{height} exceeds the GIF size limit"
                    )));
                }
                let mut encoder = gif::Encoder::new(sink, width as u16, height as u16, palette)
                    .map_err(|e| ResizeError::EncodeFailure(e.to_string()))?;
                let frame = gif::Frame {
                    width: width as u16,
                    height: height as u16,
                    buffer: Cow::Borrowed(indices.as_slice()),
                    transparent,
                    ..gif::Frame::default()
                };
                encoder
                    .write_frame(&frame)
                    .map_err(|e| ResizeError::EncodeFailure(e.to_string()))
            }
        })
    }

    fn release(&self, raster: RasterId) {
        let removed = self.lock().remove(&raster.raw());
        if removed.is_none() {
            panic!("raster {raster:?} released twice");
        }
    }
}
