//! Text normalization for extracted slide text.
//!
//! Slide XML text arrives with inconsistent whitespace, vertical tabs from
//! soft line breaks and mixed Unicode compositions. The normalizer cleans
//! that up without touching the words themselves.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse runs of horizontal whitespace into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}\u{2009}\u{202f}]+").unwrap());

/// Text normalizer for slide content.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    /// Whether to keep line breaks inside a paragraph.
    preserve_line_breaks: bool,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Create a new text normalizer with default settings.
    pub fn new() -> Self {
        Self {
            preserve_line_breaks: true,
        }
    }

    /// Set whether to preserve line breaks inside a paragraph.
    pub fn with_preserve_line_breaks(mut self, preserve: bool) -> Self {
        self.preserve_line_breaks = preserve;
        self
    }

    /// Normalize a paragraph or cell of text.
    ///
    /// - Composes to Unicode NFC
    /// - Treats CR, CRLF and vertical tab as line breaks
    /// - Collapses whitespace runs to single spaces and trims each line
    /// - Drops blank lines
    pub fn normalize(&self, text: &str) -> String {
        let composed: String = text.nfc().collect();
        let unified = composed
            .replace("\r\n", "\n")
            .replace(['\r', '\u{b}'], "\n");

        let lines: Vec<String> = unified
            .lines()
            .map(|line| {
                WHITESPACE_COLLAPSE_REGEX
                    .replace_all(line, " ")
                    .trim()
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .collect();

        if self.preserve_line_breaks {
            lines.join("\n")
        } else {
            lines.join(" ")
        }
    }

    /// Normalize and return `None` for blank results.
    pub fn normalize_non_empty(&self, text: &str) -> Option<String> {
        let normalized = self.normalize(text);
        if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        }
    }
}
