mod cli;
mod codec;
mod core;
mod detect;
mod fetch;
mod input;
mod utils;

pub use cli::Cli;
pub use codec::{ImageCodec, RasterCodec, RasterGuard, RasterId};
pub use core::pipeline::{ResizeOutput, ResizePipeline};
pub use core::{resolve_dimensions, ImageFormat, ResizeError, ResizeOptions, Result};
pub use detect::{sniff_bytes, sniff_file, Detection};
pub use fetch::Fetcher;
pub use input::ImageSource;
pub use utils::canonical_extension;

/// Resize an image given a CLI-style input spec (local path or URL).
///
/// A zero `width` or `height` is inferred proportionally from the other
/// dimension. Without `options.outfile` the result lands in a temp file
/// whose extension matches the source format; the returned handle deletes
/// it on drop unless persisted.
pub fn resize(
    input: &str,
    width: u32,
    height: u32,
    options: ResizeOptions,
) -> Result<ResizeOutput> {
    ResizePipeline::new().resize(ImageSource::from_spec(input), width, height, &options)
}

pub mod prelude {
    pub use crate::{
        ImageFormat, ImageSource, ResizeOptions, ResizeOutput, ResizePipeline, RasterCodec,
    };
}
