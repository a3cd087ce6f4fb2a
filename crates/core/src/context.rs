//! Assembly of the document context injected into chat requests.
//!
//! Text documents pass through unchanged or are cut at the budget. For
//! presentations that do not fit, every slide first shrinks to an outline
//! entry (title, excerpt, table and notes hints) so the model keeps a map of
//! the whole deck; slides are then restored to full detail, referenced slides
//! first, while the budget allows.

use crate::render::{
    self, render_outline, render_overview, render_slide, truncate_chars, SLIDE_SEPARATOR,
};
use crate::types::{Document, DocumentBody, Slide};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Default context budget in characters (roughly 12k tokens).
pub const DEFAULT_MAX_CHARS: usize = 48_000;

/// Default excerpt length for condensed slides.
pub const DEFAULT_EXCERPT_CHARS: usize = 100;

/// Upper bound on the length of any trimming marker.
pub const MAX_MARKER_CHARS: usize = 256;

/// At most this many slides are taken from one query.
const MAX_REFERENCED_SLIDES: usize = 200;

/// Matches "slide 7", "Slides 3-5", "slide #2 to 4".
static SLIDE_REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bslides?\s*#?\s*(\d+)(?:\s*(?:-|–|to|through)\s*(\d+))?").unwrap()
});

/// Rough token estimate (one token per four characters).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Slide numbers mentioned in a chat message, in order of first mention.
pub fn slide_references(query: &str) -> Vec<usize> {
    let mut found = Vec::new();

    for caps in SLIDE_REFERENCE_REGEX.captures_iter(query) {
        let Some(start) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
            continue;
        };
        let end = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .unwrap_or(start);
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };

        for n in lo.max(1)..=hi {
            if found.len() >= MAX_REFERENCED_SLIDES {
                return found;
            }
            if !found.contains(&n) {
                found.push(n);
            }
        }
    }

    found
}

/// The serialized document context and what was trimmed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedContext {
    pub text: String,
    /// Whether anything was cut, condensed or omitted.
    pub truncated: bool,
    /// Characters of the full rendering that are not in `text`.
    pub elided_chars: usize,
    /// Slides reduced to an outline entry.
    pub condensed_slides: usize,
    /// Slides left out entirely.
    pub omitted_slides: usize,
}

impl ExtractedContext {
    fn complete(text: String) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    /// Length of the context in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Level of detail chosen for a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Detail {
    Outline,
    Full,
}

/// Builds [`ExtractedContext`] values within a character budget.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_chars: usize,
    excerpt_chars: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

impl ContextAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context budget in characters.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }

    /// Set the excerpt length used for condensed slides.
    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars.max(1);
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Build the context for a document.
    pub fn assemble(&self, document: &Document) -> ExtractedContext {
        self.assemble_focused(document, &[])
    }

    /// Build the context for a document, giving slides mentioned in `query`
    /// priority when the deck has to be condensed.
    pub fn assemble_for_query(&self, document: &Document, query: &str) -> ExtractedContext {
        self.assemble_focused(document, &slide_references(query))
    }

    fn assemble_focused(&self, document: &Document, focus: &[usize]) -> ExtractedContext {
        match &document.body {
            DocumentBody::Text(text) => self.assemble_text(text),
            DocumentBody::Deck(deck) => self.assemble_deck(&deck.slides, focus),
        }
    }

    fn assemble_text(&self, text: &str) -> ExtractedContext {
        let total = text.chars().count();
        if total <= self.max_chars {
            return ExtractedContext::complete(text.to_string());
        }

        let elided = total - self.max_chars;
        let marker = format!("\n\n[... truncated {} characters ...]", elided);
        log::debug!("Text context truncated by {} characters", elided);

        ExtractedContext {
            text: format!("{}{}", truncate_chars(text, self.max_chars), marker),
            truncated: true,
            elided_chars: elided,
            condensed_slides: 0,
            omitted_slides: 0,
        }
    }

    fn assemble_deck(&self, slides: &[Slide], focus: &[usize]) -> ExtractedContext {
        let full_text = render::render_deck(slides);
        let total = full_text.chars().count();
        if total <= self.max_chars {
            return ExtractedContext::complete(full_text);
        }

        let with_content = slides.iter().filter(|s| !s.is_empty()).count();
        let overview = render_overview(slides.len(), with_content);
        let full: Vec<String> = slides.iter().map(render_slide).collect();
        let outline: Vec<String> = slides
            .iter()
            .zip(&full)
            .map(|(slide, full)| {
                let outline = render_outline(slide, self.excerpt_chars);
                if outline.chars().count() < full.chars().count() {
                    outline
                } else {
                    full.clone()
                }
            })
            .collect();

        let full_len: Vec<usize> = full.iter().map(|s| s.chars().count()).collect();
        let outline_len: Vec<usize> = outline.iter().map(|s| s.chars().count()).collect();
        let sep_len = SLIDE_SEPARATOR.chars().count();

        let mut detail = vec![Detail::Outline; slides.len()];
        let mut kept = slides.len();
        let mut used =
            overview.chars().count() + outline_len.iter().map(|l| l + sep_len).sum::<usize>();

        if used > self.max_chars {
            // Even the outline is too long: keep leading entries only.
            used = overview.chars().count();
            kept = 0;
            for len in &outline_len {
                if used + len + sep_len > self.max_chars {
                    break;
                }
                used += len + sep_len;
                kept += 1;
            }
        } else {
            let focused = focus
                .iter()
                .filter(|&&n| n >= 1 && n <= slides.len())
                .map(|&n| n - 1);
            for i in focused.chain(0..slides.len()) {
                if detail[i] == Detail::Full {
                    continue;
                }
                let extra = full_len[i].saturating_sub(outline_len[i]);
                if used + extra <= self.max_chars {
                    detail[i] = Detail::Full;
                    used += extra;
                }
            }
        }

        let mut parts = vec![overview];
        for i in 0..kept {
            parts.push(match detail[i] {
                Detail::Full => full[i].clone(),
                Detail::Outline => outline[i].clone(),
            });
        }
        let joined = parts.join(SLIDE_SEPARATOR);
        let body = truncate_chars(&joined, self.max_chars);

        let condensed = (0..kept)
            .filter(|&i| detail[i] == Detail::Outline && outline_len[i] < full_len[i])
            .count();
        let omitted = slides.len() - kept;
        let elided = total.saturating_sub(body.chars().count());

        log::debug!(
            "Presentation context trimmed: {} condensed, {} omitted, {} characters elided",
            condensed,
            omitted,
            elided
        );

        let marker = format!(
            "\n\n[context trimmed to {} characters: {} of {} slides condensed to title and excerpt, {} omitted, {} characters elided]",
            self.max_chars,
            condensed,
            slides.len(),
            omitted,
            elided
        );

        ExtractedContext {
            text: format!("{}{}", body, marker),
            truncated: true,
            elided_chars: elided,
            condensed_slides: condensed,
            omitted_slides: omitted,
        }
    }
}
