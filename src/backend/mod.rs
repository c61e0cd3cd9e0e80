//! Compression backends, one per media category.

pub mod image_compressor;
pub mod pdf_compressor;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::level::CompressionLevel;

pub use self::image_compressor::ImageCompressor;
pub use self::pdf_compressor::PdfCompressor;

/// The single capability every backend provides.
#[async_trait]
pub trait Compressor: Send + Sync {
    type Options: Send + Sync;

    async fn compress(&self, input: Arc<[u8]>, options: &Self::Options) -> BackendResult<Vec<u8>>;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;
}

pub type ImageBackend = dyn Compressor<Options = ImageOptions>;
pub type DocumentBackend = dyn Compressor<Options = DocumentOptions>;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOptions {
    /// Output ceiling in MB. Zero means "as small as the iteration budget allows".
    pub target_size_hint_mb: f64,
    /// Longer side is resized to at most this many pixels before re-encoding.
    pub max_dimension: Option<u32>,
}

impl ImageOptions {
    pub fn for_level(level: CompressionLevel) -> Self {
        ImageOptions {
            target_size_hint_mb: level.size_hint_mb(),
            max_dimension: None,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: Option<u32>) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        (self.target_size_hint_mb.max(0.0) * 1024.0 * 1024.0) as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Pack objects into compressed object streams. The writer only
    /// produces classic xref tables, so this must stay off.
    pub use_object_streams: bool,
    /// Flate-encode streams that are stored uncompressed.
    pub compress_streams: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions {
            use_object_streams: false,
            compress_streams: true,
        }
    }
}

/// Pair of backends the controller dispatches to.
#[derive(Clone)]
pub struct Backends {
    pub image: Arc<ImageBackend>,
    pub document: Arc<DocumentBackend>,
}

impl Backends {
    pub fn new(image: Arc<ImageBackend>, document: Arc<DocumentBackend>) -> Self {
        Backends { image, document }
    }
}

impl Default for Backends {
    fn default() -> Self {
        Backends {
            image: Arc::new(ImageCompressor),
            document: Arc::new(PdfCompressor),
        }
    }
}
