// fastresize/src/cli.rs
use crate::core::ResizeOptions;
use clap::Parser;
use std::path::PathBuf;

/// Resize JPEG, PNG and GIF images, preserving the source format.
#[derive(Parser, Debug)]
#[command(name = "fastresize", version, about)]
pub struct Cli {
    /// Input image: a local path or an http(s) URL
    pub input: String,

    /// Target width in pixels; 0 scales proportionally from the height
    pub width: u32,

    /// Target height in pixels; 0 scales proportionally from the width
    pub height: u32,

    /// Output file (a temp file is created when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JPEG encode quality, 0-100; -1 uses the encoder default
    #[arg(
        long,
        default_value_t = -1,
        value_parser = clap::value_parser!(i32).range(-1..=100)
    )]
    pub jpeg_quality: i32,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn options(&self) -> ResizeOptions {
        ResizeOptions {
            jpeg_quality: u8::try_from(self.jpeg_quality).ok(),
            outfile: self.output.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_dimensions() {
        let cli = Cli::parse_from(["fastresize", "in.gif", "100", "20"]);
        assert_eq!(cli.width, 100);
        assert_eq!(cli.height, 20);
        assert_eq!(cli.jpeg_quality, -1);
        assert!(cli.options().jpeg_quality.is_none());
    }

    #[test]
    fn maps_quality_to_options() {
        let cli = Cli::parse_from(["fastresize", "in.jpg", "0", "50", "--jpeg-quality", "80"]);
        assert_eq!(cli.options().jpeg_quality, Some(80));
    }

    #[test]
    fn rejects_out_of_range_quality() {
        assert!(Cli::try_parse_from(["fastresize", "in.jpg", "10", "10", "--jpeg-quality", "101"])
            .is_err());
    }
}
