//! Plain text and Markdown loading.

use crate::{Document, DocumentKind, Error, Result};

/// Decode an uploaded text or Markdown file.
///
/// Markdown is not interpreted; the decoded string is returned verbatim.
pub fn load_text(bytes: &[u8], filename: &str) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| Error::Decode {
            filename: filename.to_string(),
            offset: e.valid_up_to(),
        })
}

/// Decode an uploaded text or Markdown file into a [`Document`].
pub fn load_text_document(bytes: &[u8], filename: &str, kind: DocumentKind) -> Result<Document> {
    let text = load_text(bytes, filename)?;
    log::debug!("Decoded {} ({} characters)", filename, text.chars().count());
    Ok(Document::text(filename, kind, text))
}
