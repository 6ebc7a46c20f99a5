use crate::models::Document;
use anyhow::{Context, Result};
use pdf_extract::extract_text;
use std::fs;
use std::path::{Path, PathBuf};

pub struct DocumentProcessor {
    upload_dir: PathBuf,
}

impl DocumentProcessor {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Directory an upload for `session_id` is written to. The default session
    /// writes straight into the upload folder.
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        if session_id == crate::session_store::DEFAULT_SESSION {
            self.upload_dir.clone()
        } else {
            self.upload_dir.join(session_id)
        }
    }

    pub fn ensure_upload_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.upload_dir).with_context(|| {
            format!("failed to create upload folder {}", self.upload_dir.display())
        })
    }

    /// Saves the upload and extracts its text. Blocking; call it from a
    /// blocking thread when inside the runtime.
    pub fn process_upload(&self, session_id: &str, filename: &str, bytes: &[u8]) -> Result<Document> {
        let path = save_upload(&self.session_dir(session_id), filename, bytes)?;
        log::info!("Processing PDF: {}", path.display());

        let content = extract_pdf_text(&path)?;
        log::info!(
            "Extracted {} characters from '{}'",
            content.chars().count(),
            filename
        );

        Ok(Document::new(filename, path, content))
    }
}

pub fn is_pdf_filename(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

/// Reduces a client-supplied filename to its last path component.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let normalized = filename.replace('\\', "/");
    let name = Path::new(&normalized).file_name()?.to_string_lossy().trim().to_string();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}

pub fn save_upload(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(filename);
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Text of every page, in page order.
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    match std::panic::catch_unwind(|| extract_text(path)) {
        Ok(result) => Ok(result?),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow::anyhow!("PDF extraction failed: {}", reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::pdf_with_lines;
    use tempfile::TempDir;

    #[test]
    fn pdf_extension_check_ignores_case() {
        assert!(is_pdf_filename("report.pdf"));
        assert!(is_pdf_filename("REPORT.PDF"));
        assert!(!is_pdf_filename("report.pdf.txt"));
        assert!(!is_pdf_filename("pdf"));
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/a.pdf").as_deref(), Some("a.pdf"));
        assert_eq!(sanitize_filename("C:\\docs\\b.pdf").as_deref(), Some("b.pdf"));
        assert_eq!(sanitize_filename("plain.pdf").as_deref(), Some("plain.pdf"));
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn named_sessions_get_their_own_folder() {
        let processor = DocumentProcessor::new("uploads");
        assert_eq!(processor.session_dir("default"), PathBuf::from("uploads"));
        assert_eq!(processor.session_dir("abc"), PathBuf::from("uploads/abc"));
    }

    #[test]
    fn upload_is_saved_verbatim_and_extracted() {
        let dir = TempDir::new().unwrap();
        let processor = DocumentProcessor::new(dir.path().join("uploads"));
        let bytes = pdf_with_lines(&["The reactor was commissioned in 1957."]);

        let doc = processor.process_upload("default", "reactor.pdf", &bytes).unwrap();

        assert_eq!(doc.filename, "reactor.pdf");
        assert_eq!(fs::read(&doc.path).unwrap(), bytes);
        assert!(doc.content.contains("commissioned in 1957"), "got {:?}", doc.content);
    }

    #[test]
    fn garbage_bytes_fail_extraction() {
        let dir = TempDir::new().unwrap();
        let path = save_upload(dir.path(), "broken.pdf", b"definitely not a pdf").unwrap();
        assert!(extract_pdf_text(&path).is_err());
    }
}
