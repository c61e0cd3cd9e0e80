//! The compression workflow: one selected file, one level, at most one output.
//!
//! ```text
//! Idle --select--> Loaded --compress--> Compressing --ok--> Compressed
//!                    ^                       |                  |
//!                    |                       +--err--> Failed   |
//!                    +------------select (from any state)-------+
//! ```
//!
//! Compression is split into [`Controller::begin_compress`],
//! [`CompressionJob::run`] and [`Controller::finish`] so an event loop can
//! await the backend without keeping the controller borrowed. Every attempt
//! carries a ticket; a result whose ticket is no longer current (because a
//! new file was selected meanwhile) is dropped on the floor. Only one
//! backend call runs at a time: until the running job has been passed to
//! `finish` (or dropped), further requests are refused with
//! [`Skip::InFlight`], even after a new file has been selected.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info};

use crate::backend::{Backends, DocumentBackend, DocumentOptions, ImageBackend, ImageOptions};
use crate::blob::{BlobHandle, BlobStore};
use crate::error::{BackendError, BackendResult};
use crate::level::CompressionLevel;
use crate::media::{MediaCategory, SourceFile};
use crate::output::{download_name, Sink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loaded,
    Compressing,
    Compressed,
    Failed,
}

/// Why a compress request did not start. None of these are failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    NoFile,
    /// The file is neither an image nor a document.
    NotApplicable,
    /// An attempt is already running; the request is ignored.
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressOutcome {
    Compressed,
    Failed(BackendError),
    Skipped(Skip),
    /// The result belonged to an attempt that was invalidated before it finished.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub initial_level: CompressionLevel,
    pub max_image_dimension: Option<u32>,
    pub document: DocumentOptions,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            initial_level: CompressionLevel::default(),
            max_image_dimension: None,
            document: DocumentOptions::default(),
        }
    }
}

/// Result of a successful compression, valid until replaced.
#[derive(Debug)]
pub struct CompressedOutput {
    category: MediaCategory,
    handle: BlobHandle,
}

impl CompressedOutput {
    pub fn category(&self) -> MediaCategory {
        self.category
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }

    pub fn mime(&self) -> &str {
        self.handle.mime()
    }

    pub fn bytes(&self) -> &[u8] {
        self.handle.bytes()
    }

    pub fn len(&self) -> usize {
        self.handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_empty()
    }
}

/// Borrowed view handed to whatever renders the inline preview.
#[derive(Debug, Clone, Copy)]
pub struct Preview<'a> {
    pub url: &'a str,
    pub bytes: &'a [u8],
}

enum Request {
    Image {
        backend: Arc<ImageBackend>,
        options: ImageOptions,
    },
    Document {
        backend: Arc<DocumentBackend>,
        options: DocumentOptions,
    },
}

/// Holds the controller's busy flag up until dropped.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A started attempt. Owns everything the backend call needs.
pub struct CompressionJob {
    ticket: u64,
    input: Arc<[u8]>,
    request: Request,
    busy: BusyGuard,
}

impl CompressionJob {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub async fn run(self) -> FinishedJob {
        let (backend, result) = match &self.request {
            Request::Image { backend, options } => {
                (backend.name(), backend.compress(Arc::clone(&self.input), options).await)
            }
            Request::Document { backend, options } => {
                (backend.name(), backend.compress(Arc::clone(&self.input), options).await)
            }
        };
        FinishedJob {
            ticket: self.ticket,
            backend,
            result,
            _busy: self.busy,
        }
    }
}

/// Backend outcome waiting to be applied with [`Controller::finish`].
pub struct FinishedJob {
    ticket: u64,
    backend: &'static str,
    result: BackendResult<Vec<u8>>,
    _busy: BusyGuard,
}

pub struct Controller {
    backends: Backends,
    config: ControllerConfig,
    blobs: BlobStore,
    phase: Phase,
    source: Option<SourceFile>,
    level: CompressionLevel,
    output: Option<CompressedOutput>,
    last_error: Option<BackendError>,
    ticket: u64,
    busy: Arc<AtomicBool>,
}

impl Controller {
    pub fn new(backends: Backends) -> Self {
        Self::with_config(backends, ControllerConfig::default())
    }

    pub fn with_config(backends: Backends, config: ControllerConfig) -> Self {
        Controller {
            backends,
            level: config.initial_level,
            config,
            blobs: BlobStore::new(),
            phase: Phase::Idle,
            source: None,
            output: None,
            last_error: None,
            ticket: 0,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    pub fn output(&self) -> Option<&CompressedOutput> {
        self.output.as_ref()
    }

    pub fn last_error(&self) -> Option<&BackendError> {
        self.last_error.as_ref()
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Whether the compress control should be enabled.
    pub fn can_compress(&self) -> bool {
        self.source.is_some() && self.phase != Phase::Compressing && !self.is_busy()
    }

    /// Whether a backend call is still running, possibly for a file that
    /// has since been replaced.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn select_file(&mut self, file: SourceFile) {
        info!(
            "Selected {} ({}, {}, {} bytes)",
            file.name(),
            file.mime(),
            file.category().as_str(),
            file.len()
        );
        self.output = None;
        self.last_error = None;
        self.ticket += 1;
        self.source = Some(file);
        self.phase = Phase::Loaded;
    }

    pub fn set_level(&mut self, value: i64) -> CompressionLevel {
        self.level = CompressionLevel::new(value);
        self.level
    }

    /// Start an attempt, moving to `Compressing`.
    pub fn begin_compress(&mut self) -> Result<CompressionJob, Skip> {
        let source = self.source.as_ref().ok_or(Skip::NoFile)?;
        if self.phase == Phase::Compressing || self.is_busy() {
            debug!("Compression already in flight, ignoring request");
            return Err(Skip::InFlight);
        }

        let request = match source.category() {
            MediaCategory::Image => Request::Image {
                backend: Arc::clone(&self.backends.image),
                options: ImageOptions::for_level(self.level)
                    .with_max_dimension(self.config.max_image_dimension),
            },
            MediaCategory::Document => Request::Document {
                backend: Arc::clone(&self.backends.document),
                options: self.config.document.clone(),
            },
            MediaCategory::Unsupported => {
                debug!("{} is not an image or PDF, nothing to compress", source.name());
                return Err(Skip::NotApplicable);
            }
        };
        let input = source.shared_bytes();

        self.ticket += 1;
        self.output = None;
        self.last_error = None;
        self.phase = Phase::Compressing;
        self.busy.store(true, Ordering::Release);
        debug!("Starting attempt {} at level {}", self.ticket, self.level);

        Ok(CompressionJob {
            ticket: self.ticket,
            input,
            request,
            busy: BusyGuard(Arc::clone(&self.busy)),
        })
    }

    /// Apply a finished attempt.
    pub fn finish(&mut self, job: FinishedJob) -> CompressOutcome {
        if job.ticket != self.ticket || self.phase != Phase::Compressing {
            debug!("Discarding stale result of attempt {}", job.ticket);
            return CompressOutcome::Superseded;
        }

        let source = match self.source.as_ref() {
            Some(source) => source,
            None => return CompressOutcome::Superseded,
        };

        match job.result {
            Ok(bytes) => {
                info!(
                    "{} backend compressed {}: {} -> {} bytes",
                    job.backend,
                    source.name(),
                    source.len(),
                    bytes.len()
                );
                let handle = self.blobs.create(bytes, source.mime());
                self.output = Some(CompressedOutput {
                    category: source.category(),
                    handle,
                });
                self.phase = Phase::Compressed;
                CompressOutcome::Compressed
            }
            Err(err) => {
                error!("{} compression failed for {}: {}", job.backend, source.name(), err);
                self.last_error = Some(err.clone());
                self.phase = Phase::Failed;
                CompressOutcome::Failed(err)
            }
        }
    }

    pub async fn compress(&mut self) -> CompressOutcome {
        match self.begin_compress() {
            Ok(job) => {
                let finished = job.run().await;
                self.finish(finished)
            }
            Err(skip) => CompressOutcome::Skipped(skip),
        }
    }

    /// Bytes to show inline; only images get a preview.
    pub fn preview(&self) -> Option<Preview<'_>> {
        if self.phase != Phase::Compressed {
            return None;
        }
        self.output
            .as_ref()
            .filter(|output| output.category() == MediaCategory::Image)
            .map(|output| Preview {
                url: output.url(),
                bytes: output.bytes(),
            })
    }

    /// Save the output as `compressed-<name>`. Returns the name used, or
    /// `None` without touching the sink when there is nothing to save.
    pub fn download(&self, sink: &dyn Sink) -> io::Result<Option<String>> {
        let (source, output) = match (self.phase, self.source.as_ref(), self.output.as_ref()) {
            (Phase::Compressed, Some(source), Some(output)) => (source, output),
            _ => return Ok(None),
        };

        let name = download_name(source.name());
        sink.save(output.bytes(), &name)?;
        info!("Saved {} ({} bytes)", name, output.len());
        Ok(Some(name))
    }
}
