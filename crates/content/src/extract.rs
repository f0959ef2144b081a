//! Plain-text extraction from uploaded study material.

use sb_domain::error::{Error, Result};

/// File types we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Markdown,
    Pdf,
    Unsupported,
}

impl FileKind {
    /// Classify by file extension (case-insensitive).
    pub fn from_filename(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Self::PlainText,
            "md" | "markdown" => Self::Markdown,
            "pdf" => Self::Pdf,
            _ => Self::Unsupported,
        }
    }
}

/// Extract text from file bytes. Unsupported or unreadable input yields an
/// empty string; the caller treats that as "no content".
pub fn extract_text(bytes: &[u8], kind: FileKind) -> String {
    match kind {
        FileKind::PlainText | FileKind::Markdown => String::from_utf8_lossy(bytes).into_owned(),
        FileKind::Pdf => match pdf_extract::extract_text_from_mem(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, bytes = bytes.len(), "PDF text extraction failed");
                String::new()
            }
        },
        FileKind::Unsupported => String::new(),
    }
}

/// [`extract_text`] for async callers. PDF parsing is CPU-bound and runs on
/// the blocking pool; text formats are decoded in place.
pub async fn extract_text_async(bytes: Vec<u8>, kind: FileKind) -> Result<String> {
    if kind != FileKind::Pdf {
        return Ok(extract_text(&bytes, kind));
    }
    tokio::task::spawn_blocking(move || extract_text(&bytes, kind))
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))
}
