//! Assembly of [`Slide`] records from shape trees.

use crate::normalize::TextNormalizer;
use crate::shape::{Paragraph, PlaceholderKind, Shape};
use crate::types::{Slide, Table};

/// Groups nested deeper than this are skipped.
pub const MAX_GROUP_DEPTH: usize = 32;

/// Walks shape trees and collects their text into slides.
#[derive(Debug, Clone)]
pub struct SlideExtractor {
    normalizer: TextNormalizer,
    cell_normalizer: TextNormalizer,
}

impl Default for SlideExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideExtractor {
    pub fn new() -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            cell_normalizer: TextNormalizer::new().with_preserve_line_breaks(false),
        }
    }

    /// Build the slide record for one slide.
    ///
    /// The first title placeholder with text becomes the title; every other
    /// text frame contributes its non-empty paragraphs to the body, tables are
    /// kept row by row, and groups are flattened in document order.
    pub fn build_slide(&self, index: usize, shapes: &[Shape], notes: Option<&[Shape]>) -> Slide {
        let mut slide = Slide::new(index);
        self.walk(shapes, 0, &mut slide);
        slide.notes = notes.and_then(|n| self.notes_text(n));
        slide
    }

    fn walk(&self, shapes: &[Shape], depth: usize, slide: &mut Slide) {
        for shape in shapes {
            match shape {
                Shape::TextFrame {
                    placeholder,
                    paragraphs,
                } => {
                    let kind = placeholder.unwrap_or(PlaceholderKind::Other);
                    if kind.is_chrome() {
                        continue;
                    }
                    if kind.is_title() && slide.title.is_none() {
                        slide.title = self.title_text(paragraphs);
                        if slide.title.is_some() {
                            continue;
                        }
                    }
                    for paragraph in paragraphs {
                        if let Some(line) = self.body_line(paragraph) {
                            slide.body_text.push(line);
                        }
                    }
                }
                Shape::Table { rows } => {
                    slide.tables.push(self.table(rows));
                }
                Shape::Group { children } => {
                    if depth + 1 >= MAX_GROUP_DEPTH {
                        log::warn!(
                            "Slide {}: group nesting exceeds {} levels, skipping deeper shapes",
                            slide.index,
                            MAX_GROUP_DEPTH
                        );
                        continue;
                    }
                    self.walk(children, depth + 1, slide);
                }
                Shape::Other => {}
            }
        }
    }

    fn title_text(&self, paragraphs: &[Paragraph]) -> Option<String> {
        let parts: Vec<String> = paragraphs
            .iter()
            .filter_map(|p| self.cell_normalizer.normalize_non_empty(&p.text))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    fn body_line(&self, paragraph: &Paragraph) -> Option<String> {
        let text = self.normalizer.normalize_non_empty(&paragraph.text)?;
        if paragraph.level > 0 {
            Some(format!("{}• {}", "  ".repeat(paragraph.level as usize), text))
        } else {
            Some(text)
        }
    }

    fn table(&self, rows: &[Vec<String>]) -> Table {
        Table::new(
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| self.cell_normalizer.normalize(cell))
                        .collect()
                })
                .collect(),
        )
    }

    /// Collect the speaker notes text from a notes page.
    pub fn notes_text(&self, shapes: &[Shape]) -> Option<String> {
        let mut lines = Vec::new();
        self.collect_notes(shapes, 0, &mut lines);
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    fn collect_notes(&self, shapes: &[Shape], depth: usize, lines: &mut Vec<String>) {
        for shape in shapes {
            match shape {
                Shape::TextFrame {
                    placeholder,
                    paragraphs,
                } => {
                    if placeholder.is_some_and(PlaceholderKind::is_chrome) {
                        continue;
                    }
                    lines.extend(
                        paragraphs
                            .iter()
                            .filter_map(|p| self.normalizer.normalize_non_empty(&p.text)),
                    );
                }
                Shape::Group { children } if depth + 1 < MAX_GROUP_DEPTH => {
                    self.collect_notes(children, depth + 1, lines);
                }
                Shape::Table { .. } | Shape::Group { .. } | Shape::Other => {}
            }
        }
    }
}
