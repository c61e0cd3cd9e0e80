//! Image and PDF compression behind a small workflow controller.
//!
//! A [`Controller`] holds the selected [`SourceFile`], the [`CompressionLevel`]
//! and at most one [`CompressedOutput`]. Images go to an [`ImageCompressor`]
//! built on `image`, PDFs to a [`PdfCompressor`] built on `lopdf`; anything
//! else is left alone.

pub mod backend;
pub mod blob;
pub mod cli;
pub mod controller;
pub mod error;
pub mod level;
pub mod media;
pub mod output;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use backend::{
    Backends, Compressor, DocumentOptions, ImageCompressor, ImageOptions, PdfCompressor,
};
pub use blob::{BlobHandle, BlobStore};
pub use controller::{
    CompressOutcome, CompressedOutput, CompressionJob, Controller, ControllerConfig, FinishedJob,
    Phase, Preview, Skip,
};
pub use error::{BackendError, BackendResult};
pub use level::CompressionLevel;
pub use media::{guess_mime_type, MediaCategory, SourceFile};
pub use output::{download_name, FileSink, PreviewInfo, Sink};
