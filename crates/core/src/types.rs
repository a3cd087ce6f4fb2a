//! Domain types for uploaded documents and extracted presentation content.

use crate::{render, Error, Result};
use serde::{Deserialize, Serialize};

/// An uploaded document. Replaced wholesale on the next upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Original filename (without path).
    pub filename: String,

    /// Kind detected from the filename extension.
    pub kind: DocumentKind,

    /// Decoded text or extracted slides.
    pub body: DocumentBody,
}

impl Document {
    /// Create a plain text or Markdown document.
    pub fn text(filename: impl Into<String>, kind: DocumentKind, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            kind,
            body: DocumentBody::Text(text.into()),
        }
    }

    /// Create a presentation document from an extracted deck.
    pub fn presentation(filename: impl Into<String>, deck: Deck) -> Self {
        Self {
            filename: filename.into(),
            kind: DocumentKind::Presentation,
            body: DocumentBody::Deck(deck),
        }
    }

    /// The full, untrimmed text representation of the document.
    pub fn raw_content(&self) -> String {
        match &self.body {
            DocumentBody::Text(text) => text.clone(),
            DocumentBody::Deck(deck) => render::render_deck(&deck.slides),
        }
    }

    /// The extracted deck, if this is a presentation.
    pub fn deck(&self) -> Option<&Deck> {
        match &self.body {
            DocumentBody::Deck(deck) => Some(deck),
            DocumentBody::Text(_) => None,
        }
    }
}

/// Content of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DocumentBody {
    /// Decoded plain text or Markdown, verbatim.
    Text(String),
    /// Slides extracted from a presentation.
    Deck(Deck),
}

/// The kinds of document that can be uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    /// `.txt`
    Text,
    /// `.md`, kept verbatim.
    Markdown,
    /// `.pptx` (Office Open XML).
    Presentation,
}

impl DocumentKind {
    /// Detect kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "md" => Some(Self::Markdown),
            "pptx" => Some(Self::Presentation),
            _ => None,
        }
    }

    /// Detect kind from a filename, rejecting anything unsupported.
    pub fn from_filename(filename: &str) -> Result<Self> {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .ok_or_else(|| Error::UnsupportedFileType(filename.to_string()))
    }

    /// Whether the bytes start with a ZIP local file header (PK\x03\x04),
    /// as every `.pptx` container does.
    pub fn looks_like_zip(bytes: &[u8]) -> bool {
        bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04])
    }
}

/// Slides of one presentation plus any per-slide extraction failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    /// One record per slide part, in presentation order.
    pub slides: Vec<Slide>,

    /// Slides that could not be parsed. Each still has an empty record in `slides`.
    pub failures: Vec<SlideFailure>,
}

impl Deck {
    /// Whether every slide was extracted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of slides with any extracted text.
    pub fn slides_with_content(&self) -> usize {
        self.slides.iter().filter(|s| !s.is_empty()).count()
    }

    /// Convert a partial deck into an error naming the first failed slide.
    pub fn into_complete(self) -> Result<Self> {
        match self.failures.first() {
            None => Ok(self),
            Some(failure) => Err(Error::Format(format!(
                "slide {} ({}): {}",
                failure.index, failure.part, failure.message
            ))),
        }
    }
}

/// A slide that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideFailure {
    /// 1-based slide number.
    pub index: usize,
    /// Archive path of the slide part.
    pub part: String,
    /// What went wrong.
    pub message: String,
}

/// A single extracted slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub index: usize,

    /// Text of the first title placeholder.
    pub title: Option<String>,

    /// Non-empty paragraphs of the remaining text frames, in shape then paragraph order.
    pub body_text: Vec<String>,

    /// Tables in shape order.
    pub tables: Vec<Table>,

    /// Speaker notes.
    pub notes: Option<String>,
}

impl Slide {
    /// Create an empty slide with the given number.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// All table rows on the slide, flattened across tables.
    pub fn table_rows(&self) -> Vec<&[String]> {
        self.tables
            .iter()
            .flat_map(|t| t.rows.iter().map(Vec::as_slice))
            .collect()
    }

    /// Whether nothing was extracted from this slide.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body_text.is_empty()
            && self.tables.iter().all(Table::is_empty)
            && self.notes.is_none()
    }
}

/// Cell text of one table, row by row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// True when every cell is blank.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(|c| c.trim().is_empty())
    }
}
