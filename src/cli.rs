//! Command-line front end: one file in, `compressed-<name>` out.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use crate::backend::Backends;
use crate::controller::{CompressOutcome, Controller, ControllerConfig, Skip};
use crate::media::SourceFile;
use crate::output::{FileSink, PreviewInfo};

/// Compress an image or PDF file
#[derive(Parser, Debug)]
#[command(name = "compressor", version, about, long_about = None)]
pub struct Args {
    /// Image or PDF file
    pub input: PathBuf,

    /// Compression level (10-100); higher squeezes images harder
    #[arg(long, default_value_t = 70, allow_negative_numbers = true)]
    pub level: i64,

    /// Directory the compressed file is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Media type to use instead of guessing from the extension
    #[arg(long)]
    pub mime: Option<String>,

    /// Max image dimension (longer side)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_dim: Option<u32>,

    /// Print what an inline preview of the compressed image would show
    #[arg(long)]
    pub preview: bool,
}

/// Run one compression. Returns where the output was saved, or `None` when
/// the file is neither an image nor a PDF.
pub async fn run(args: Args) -> Result<Option<PathBuf>> {
    let file = SourceFile::read(&args.input, args.mime.as_deref())
        .with_context(|| format!("Failed to read {:?}", args.input))?;
    let original_size = file.len();

    let config = ControllerConfig {
        max_image_dimension: args.max_dim,
        ..ControllerConfig::default()
    };
    let mut controller = Controller::with_config(Backends::default(), config);
    controller.select_file(file);
    let level = controller.set_level(args.level);

    println!("Compressing {:?} at level {}", args.input, level);
    let start = Instant::now();
    match controller.compress().await {
        CompressOutcome::Compressed => {}
        CompressOutcome::Skipped(Skip::NotApplicable) => {
            println!("Not an image or PDF, nothing to compress.");
            return Ok(None);
        }
        CompressOutcome::Failed(err) => return Err(anyhow!(err).context("Compression failed")),
        other => return Err(anyhow!("Compression did not run: {:?}", other)),
    }
    println!("Compressed in {:.2?}", start.elapsed());

    if args.preview {
        if let Some(preview) = controller.preview() {
            let info = PreviewInfo::inspect(preview.bytes).context("Failed to read preview")?;
            println!(
                "Preview {}: {}x{} {:?}",
                preview.url, info.width, info.height, info.format
            );
        }
    }

    let sink = FileSink::new(&args.output_dir);
    let name = controller
        .download(&sink)
        .context("Failed to save compressed file")?
        .ok_or_else(|| anyhow!("No compressed output to save"))?;
    let new_size = controller.output().map_or(0, |output| output.len());
    let saved = sink.path_for(&name);

    println!("Saved {:?}", saved);
    println!(
        "Original size: {:.2} MB",
        original_size as f64 / 1_048_576.0
    );
    println!("New size:      {:.2} MB", new_size as f64 / 1_048_576.0);

    Ok(Some(saved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::pdf_compressor::sample_pdf;
    use std::fs;
    use std::path::Path;

    fn args(input: &Path, out: &Path, extra: &[&str]) -> Args {
        let mut argv = vec![
            "compressor".to_string(),
            input.display().to_string(),
            "--output-dir".to_string(),
            out.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn text_file_is_skipped_successfully() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        fs::write(&input, b"plain text").unwrap();
        let out = dir.path().join("out");

        let saved = run(args(&input, &out, &[])).await.unwrap();
        assert!(saved.is_none());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn pdf_is_written_with_prefixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("x.pdf");
        fs::write(&input, sample_pdf()).unwrap();
        let out = dir.path().join("out");

        let saved = run(args(&input, &out, &["--level", "10"])).await.unwrap();
        let expected = out.join("compressed-x.pdf");
        assert_eq!(saved.as_deref(), Some(expected.as_path()));
        assert!(fs::read(&expected).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn undecodable_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.bin");
        fs::write(&input, b"not really a png").unwrap();
        let out = dir.path().join("out");

        let result = run(args(&input, &out, &["--mime", "image/png"])).await;
        assert!(result.is_err());
        assert!(!out.join("compressed-broken.bin").exists());
    }

    #[test]
    fn zero_max_dim_is_rejected_by_parser() {
        let parsed = Args::try_parse_from(["compressor", "a.png", "--max-dim", "0"]);
        assert!(parsed.is_err());
        let parsed = Args::try_parse_from(["compressor", "a.png", "--max-dim", "1"]).unwrap();
        assert_eq!(parsed.max_dim, Some(1));
    }

    #[test]
    fn defaults_match_slider() {
        let parsed = Args::try_parse_from(["compressor", "a.png"]).unwrap();
        assert_eq!(parsed.level, 70);
        assert_eq!(parsed.output_dir, PathBuf::from("."));
        assert!(parsed.max_dim.is_none());
    }
}
