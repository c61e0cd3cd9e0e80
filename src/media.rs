use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Which backend, if any, a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCategory {
    Image,
    Document,
    Unsupported,
}

impl MediaCategory {
    /// Classify a declared MIME type. Parameters (`; charset=...`) and case are ignored.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence.starts_with("image/") {
            MediaCategory::Image
        } else if essence == "application/pdf" {
            MediaCategory::Document
        } else {
            MediaCategory::Unsupported
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Image => "image",
            MediaCategory::Document => "document",
            MediaCategory::Unsupported => "unsupported",
        }
    }
}

/// Guess a MIME type from the file name's extension.
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// The file the user picked. Immutable; selecting another file replaces it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    mime: String,
    category: MediaCategory,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let mime = mime.into();
        SourceFile {
            name: name.into(),
            category: MediaCategory::from_mime(&mime),
            mime,
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. Without an override the MIME type is guessed
    /// from the extension.
    pub fn read(path: &Path, mime_override: Option<&str>) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
        let mime = mime_override
            .map(str::to_owned)
            .unwrap_or_else(|| guess_mime_type(&name).to_owned());
        Ok(SourceFile::new(name, mime, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn category(&self) -> MediaCategory {
        self.category
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_like_the_file_input() {
        assert_eq!(MediaCategory::from_mime("image/jpeg"), MediaCategory::Image);
        assert_eq!(MediaCategory::from_mime("image/svg+xml"), MediaCategory::Image);
        assert_eq!(MediaCategory::from_mime("IMAGE/PNG"), MediaCategory::Image);
        assert_eq!(MediaCategory::from_mime("application/pdf"), MediaCategory::Document);
        assert_eq!(
            MediaCategory::from_mime("application/pdf; name=x"),
            MediaCategory::Document
        );
        assert_eq!(MediaCategory::from_mime("application/pdfx"), MediaCategory::Unsupported);
        assert_eq!(MediaCategory::from_mime("text/plain"), MediaCategory::Unsupported);
        assert_eq!(MediaCategory::from_mime(""), MediaCategory::Unsupported);
    }

    #[test]
    fn guesses_mime_from_extension() {
        assert_eq!(guess_mime_type("holiday.JPG"), "image/jpeg");
        assert_eq!(guess_mime_type("scan.pdf"), "application/pdf");
        assert_eq!(guess_mime_type("notes.txt"), "text/plain");
        assert_eq!(guess_mime_type("no_extension"), "application/octet-stream");
    }

    #[test]
    fn reads_file_and_guesses_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"%PDF-1.4").unwrap();

        let file = SourceFile::read(&path, None).unwrap();
        assert_eq!(file.name(), "report.pdf");
        assert_eq!(file.mime(), "application/pdf");
        assert_eq!(file.category(), MediaCategory::Document);
        assert_eq!(file.bytes(), b"%PDF-1.4");

        let forced = SourceFile::read(&path, Some("text/plain")).unwrap();
        assert_eq!(forced.category(), MediaCategory::Unsupported);
    }
}
