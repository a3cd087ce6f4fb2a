//! Loading an uploaded file into a [`Document`].

use doc_chat_core::{load_text_document, Document, DocumentKind, Result};
use doc_chat_pptx::PptxParser;
use std::path::Path;

/// Uploads above this size are logged as large.
pub const LARGE_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Read and extract a file, dispatching on its extension.
///
/// The extension is checked before the file is read, so an unsupported
/// upload never touches the disk.
pub fn load_upload(path: &Path) -> Result<Document> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    let kind = DocumentKind::from_filename(filename)?;

    let bytes = std::fs::read(path)?;
    if bytes.len() as u64 > LARGE_FILE_BYTES {
        log::info!(
            "Large file: {} is {:.1} MB, extraction may take a while",
            filename,
            bytes.len() as f64 / (1024.0 * 1024.0)
        );
    }

    match kind {
        DocumentKind::Presentation => {
            log::debug!("Parsing {} as PPTX", filename);
            PptxParser::new().parse_document(&bytes, filename)
        }
        DocumentKind::Text | DocumentKind::Markdown => load_text_document(&bytes, filename, kind),
    }
}
