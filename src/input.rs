// fastresize/src/input.rs

//! Input resolution: paths, URLs and readers all end up as a local file
//! the decoder can open, mirroring how the pipeline treats every source as
//! fully materialized bytes.

use crate::core::Result;
use crate::fetch::Fetcher;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub enum ImageSource {
    /// A file already on disk.
    Path(PathBuf),
    /// A remote http(s) location, fetched before decoding.
    Uri(String),
    /// An open byte stream, spooled to a temp file before decoding.
    Reader(Box<dyn Read>),
}

impl ImageSource {
    /// Classify a CLI-style input string: anything with a URL scheme we
    /// know of goes through the fetcher, everything else is a local path.
    pub fn from_spec(input: &str) -> Self {
        let lowered = input.to_ascii_lowercase();
        if lowered.starts_with("http://")
            || lowered.starts_with("https://")
            || lowered.starts_with("ftp://")
        {
            ImageSource::Uri(input.to_string())
        } else {
            ImageSource::Path(PathBuf::from(input))
        }
    }

    pub fn from_reader(reader: impl Read + 'static) -> Self {
        ImageSource::Reader(Box::new(reader))
    }

    pub(crate) fn into_local(self) -> Result<LocalInput> {
        match self {
            ImageSource::Path(path) => Ok(LocalInput::Path(path)),
            ImageSource::Uri(uri) => Fetcher::new()?
                .fetch_to_temp(&uri)
                .map(LocalInput::Spooled),
            ImageSource::Reader(mut reader) => {
                let mut spool = NamedTempFile::new()?;
                let bytes = io::copy(&mut reader, spool.as_file_mut())?;
                log::debug!("spooled {bytes} bytes to {}", spool.path().display());
                Ok(LocalInput::Spooled(spool))
            }
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImageSource::Uri(uri) => f.debug_tuple("Uri").field(uri).finish(),
            ImageSource::Reader(_) => f.debug_tuple("Reader").finish(),
        }
    }
}

/// A source reduced to an openable local file. Spooled temp files live as
/// long as the value, which is exactly the lifetime of one resize.
pub(crate) enum LocalInput {
    Path(PathBuf),
    Spooled(NamedTempFile),
}

impl LocalInput {
    pub(crate) fn path(&self) -> &Path {
        match self {
            LocalInput::Path(path) => path,
            LocalInput::Spooled(spool) => spool.path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn classifies_url_specs() {
        assert!(matches!(
            ImageSource::from_spec("http://example.com/a.gif"),
            ImageSource::Uri(_)
        ));
        assert!(matches!(
            ImageSource::from_spec("HTTPS://example.com/a.png"),
            ImageSource::Uri(_)
        ));
        assert!(matches!(
            ImageSource::from_spec("photos/cat.jpg"),
            ImageSource::Path(_)
        ));
        assert!(matches!(
            ImageSource::from_spec("/tmp/ftp-mirror/a.gif"),
            ImageSource::Path(_)
        ));
    }

    #[test]
    fn spools_readers_to_disk() {
        let source = ImageSource::from_reader(Cursor::new(b"hello raster".to_vec()));
        let local = source.into_local().unwrap();
        assert_eq!(std::fs::read(local.path()).unwrap(), b"hello raster");
    }
}
