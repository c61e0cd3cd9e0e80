use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{GenericImageView, ImageFormat};

use crate::error::{BackendError, BackendResult};

const DOWNLOAD_PREFIX: &str = "compressed-";

/// Name a compressed file is offered under.
pub fn download_name(original: &str) -> String {
    format!("{}{}", DOWNLOAD_PREFIX, original)
}

/// Destination for "save these bytes as a file named ...".
pub trait Sink {
    fn save(&self, bytes: &[u8], file_name: &str) -> io::Result<()>;
}

/// Writes into a directory on disk.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSink { dir: dir.into() }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Sink for FileSink {
    fn save(&self, bytes: &[u8], file_name: &str) -> io::Result<()> {
        // Only a bare name may be written; anything else could land outside `dir`.
        if Path::new(file_name).file_name() != Some(OsStr::new(file_name)) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to save to {:?}: not a plain file name", file_name),
            ));
        }
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(file_name), bytes)
    }
}

/// What an inline preview of compressed image bytes would show.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub byte_len: usize,
}

impl PreviewInfo {
    pub fn inspect(bytes: &[u8]) -> BackendResult<Self> {
        let format = image::guess_format(bytes).map_err(|e| BackendError::Decode(e.to_string()))?;
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let (width, height) = img.dimensions();
        Ok(PreviewInfo {
            width,
            height,
            format,
            byte_len: bytes.len(),
        })
    }
}
