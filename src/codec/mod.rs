// fastresize/src/codec/mod.rs

//! Codec adapter seam between the resize pipeline and the actual pixel work.
//!
//! The pipeline only ever talks to a [`RasterCodec`], never to a codec crate
//! directly. Rasters are opaque handles owned by the codec; the pipeline
//! holds them through [`RasterGuard`] so every raster is released exactly
//! once on every exit path, including early returns on decode and encode
//! failures.

use crate::core::{ImageFormat, Result};
use std::io::Write;
use std::path::Path;

mod image_codec;

pub use image_codec::ImageCodec;

/// Opaque handle to a decoded raster held inside a codec.
///
/// A `RasterId` is only meaningful to the codec that issued it and only
/// until that codec releases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterId(u64);

impl RasterId {
    pub(crate) fn new(raw: u64) -> Self {
        RasterId(raw)
    }

    pub(crate) fn raw(&self) -> u64 {
        self.0
    }
}

/// Decode, resample and encode primitives over opaque raster handles.
///
/// Methods taking a `RasterId` panic if the handle was already released;
/// the pipeline's guard ownership makes that unreachable in practice.
pub trait RasterCodec {
    /// Decode the file at `path` as `format` into a new raster.
    fn decode(&self, path: &Path, format: ImageFormat) -> Result<RasterId>;

    /// Allocate an uninitialized truecolor (RGBA) raster.
    fn alloc_truecolor(&self, width: u32, height: u32) -> Result<RasterId>;

    fn dimensions(&self, raster: RasterId) -> (u32, u32);

    /// Toggle alpha blending on a truecolor raster. No-op for palette
    /// rasters.
    fn set_alpha_blending(&self, raster: RasterId, enabled: bool);

    /// Toggle whether the alpha channel survives encoding. No-op for
    /// palette rasters.
    fn set_save_alpha(&self, raster: RasterId, enabled: bool);

    /// The palette index designated as transparent, if any. Always `None`
    /// for truecolor rasters.
    fn transparent_index(&self, raster: RasterId) -> Option<u8>;

    /// Designate (or clear) the transparent palette index. No-op for
    /// truecolor rasters.
    fn set_transparent_index(&self, raster: RasterId, index: Option<u8>);

    /// Read one pixel: the palette index for indexed rasters, packed ARGB
    /// for truecolor. Out-of-range coordinates read as zero, matching gd.
    fn pixel(&self, raster: RasterId, x: u32, y: u32) -> u32;

    /// Stretch the whole of `src` into the whole of `dst` with area
    /// resampling. `dst` must be truecolor.
    fn resample(&self, dst: RasterId, src: RasterId) -> Result<()>;

    /// Convert a truecolor raster to a palette raster of at most
    /// `max_colors` colors.
    fn quantize(&self, raster: RasterId, max_colors: usize) -> Result<()>;

    /// Write the raster to `sink` in `format`. `jpeg_quality` only applies
    /// to JPEG; `None` means the encoder default.
    fn encode(
        &self,
        raster: RasterId,
        format: ImageFormat,
        sink: &mut dyn Write,
        jpeg_quality: Option<u8>,
    ) -> Result<()>;

    /// Free the raster. The handle is dead afterwards.
    fn release(&self, raster: RasterId);
}

/// Owning wrapper around a raster handle.
///
/// Dropping the guard releases the raster through the codec that issued it,
/// so `?` early-exits cannot leak a native raster.
pub struct RasterGuard<'a, C: RasterCodec + ?Sized> {
    codec: &'a C,
    id: RasterId,
}

impl<'a, C: RasterCodec + ?Sized> RasterGuard<'a, C> {
    pub fn new(codec: &'a C, id: RasterId) -> Self {
        RasterGuard { codec, id }
    }

    pub fn id(&self) -> RasterId {
        self.id
    }
}

impl<C: RasterCodec + ?Sized> Drop for RasterGuard<'_, C> {
    fn drop(&mut self) {
        self.codec.release(self.id);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Codec double that forwards all pixel work to [`ImageCodec`] while
    /// auditing raster lifetimes: every handle must be released exactly
    /// once, and never twice.
    pub struct AuditCodec {
        inner: ImageCodec,
        live: Mutex<HashSet<RasterId>>,
        allocated: AtomicUsize,
        released: AtomicUsize,
    }

    impl AuditCodec {
        pub fn new() -> Self {
            AuditCodec {
                inner: ImageCodec::new(),
                live: Mutex::new(HashSet::new()),
                allocated: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }
        }

        pub fn allocated(&self) -> usize {
            self.allocated.load(Ordering::SeqCst)
        }

        pub fn released(&self) -> usize {
            self.released.load(Ordering::SeqCst)
        }

        pub fn outstanding(&self) -> usize {
            self.live.lock().unwrap().len()
        }

        fn track(&self, id: RasterId) -> RasterId {
            self.allocated.fetch_add(1, Ordering::SeqCst);
            self.live.lock().unwrap().insert(id);
            id
        }
    }

    impl RasterCodec for AuditCodec {
        fn decode(&self, path: &Path, format: ImageFormat) -> Result<RasterId> {
            self.inner.decode(path, format).map(|id| self.track(id))
        }

        fn alloc_truecolor(&self, width: u32, height: u32) -> Result<RasterId> {
            self.inner
                .alloc_truecolor(width, height)
                .map(|id| self.track(id))
        }

        fn dimensions(&self, raster: RasterId) -> (u32, u32) {
            self.inner.dimensions(raster)
        }

        fn set_alpha_blending(&self, raster: RasterId, enabled: bool) {
            self.inner.set_alpha_blending(raster, enabled);
        }

        fn set_save_alpha(&self, raster: RasterId, enabled: bool) {
            self.inner.set_save_alpha(raster, enabled);
        }

        fn transparent_index(&self, raster: RasterId) -> Option<u8> {
            self.inner.transparent_index(raster)
        }

        fn set_transparent_index(&self, raster: RasterId, index: Option<u8>) {
            self.inner.set_transparent_index(raster, index);
        }

        fn pixel(&self, raster: RasterId, x: u32, y: u32) -> u32 {
            self.inner.pixel(raster, x, y)
        }

        fn resample(&self, dst: RasterId, src: RasterId) -> Result<()> {
            self.inner.resample(dst, src)
        }

        fn quantize(&self, raster: RasterId, max_colors: usize) -> Result<()> {
            self.inner.quantize(raster, max_colors)
        }

        fn encode(
            &self,
            raster: RasterId,
            format: ImageFormat,
            sink: &mut dyn Write,
            jpeg_quality: Option<u8>,
        ) -> Result<()> {
            self.inner.encode(raster, format, sink, jpeg_quality)
        }

        fn release(&self, raster: RasterId) {
            let removed = self.live.lock().unwrap().remove(&raster);
            assert!(removed, "raster {raster:?} released twice or never allocated");
            self.released.fetch_add(1, Ordering::SeqCst);
            self.inner.release(raster);
        }
    }

    #[test]
    fn guard_releases_on_drop() {
        let codec = AuditCodec::new();
        {
            let id = codec.alloc_truecolor(4, 4).unwrap();
            let _guard = RasterGuard::new(&codec, id);
            assert_eq!(codec.outstanding(), 1);
        }
        assert_eq!(codec.outstanding(), 0);
        assert_eq!(codec.allocated(), 1);
        assert_eq!(codec.released(), 1);
    }

    #[test]
    fn guard_releases_once_per_raster() {
        let codec = AuditCodec::new();
        let a = codec.alloc_truecolor(2, 2).unwrap();
        let b = codec.alloc_truecolor(3, 3).unwrap();
        drop(RasterGuard::new(&codec, a));
        drop(RasterGuard::new(&codec, b));
        assert_eq!(codec.released(), 2);
        assert_eq!(codec.outstanding(), 0);
    }
}
