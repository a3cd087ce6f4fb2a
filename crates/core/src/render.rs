//! Plain text rendering of extracted slides.
//!
//! Every slide starts with a boundary line carrying its number and title so
//! the model can attribute answers to a specific slide:
//!
//! ```text
//! === SLIDE 2: Sales ===
//! CONTENT:
//! Revenue by quarter
//! TABLE:
//! Q1 | Q2
//! 10 | 20
//! NOTES:
//! Mention the new pricing
//! ```

use crate::types::{Slide, Table};

/// Separator between rendered slides.
pub const SLIDE_SEPARATOR: &str = "\n\n";

/// Separator between table cells.
pub const CELL_SEPARATOR: &str = " | ";

/// Boundary line for a slide.
pub fn boundary(slide: &Slide) -> String {
    match &slide.title {
        Some(title) => format!("=== SLIDE {}: {} ===", slide.index, title),
        None => format!("=== SLIDE {} ===", slide.index),
    }
}

/// Header describing the whole presentation.
pub fn render_overview(total_slides: usize, slides_with_content: usize) -> String {
    format!(
        "PRESENTATION OVERVIEW:\nTotal Slides: {}\nSlides With Content: {}",
        total_slides, slides_with_content
    )
}

/// Render one slide with all of its content.
pub fn render_slide(slide: &Slide) -> String {
    let mut out = vec![boundary(slide)];

    if !slide.body_text.is_empty() {
        out.push("CONTENT:".to_string());
        out.extend(slide.body_text.iter().cloned());
    }

    for table in slide.tables.iter().filter(|t| !t.is_empty()) {
        out.push("TABLE:".to_string());
        out.extend(table.rows.iter().map(|row| render_row(row)));
    }

    if let Some(notes) = slide.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        out.push("NOTES:".to_string());
        out.push(notes.to_string());
    }

    if out.len() == 1 {
        out.push("(no text content)".to_string());
    }

    out.join("\n")
}

/// Render a condensed entry for a slide: title, a short excerpt of the first
/// body line and a note about tables and speaker notes.
pub fn render_outline(slide: &Slide, excerpt_chars: usize) -> String {
    let mut out = vec![boundary(slide)];

    if let Some(first) = slide.body_text.first() {
        let line = first.lines().next().unwrap_or_default().trim();
        let excerpt = truncate_chars(line, excerpt_chars);
        if excerpt.len() < line.len() {
            out.push(format!("SUMMARY: {}...", excerpt));
        } else {
            out.push(format!("SUMMARY: {}", excerpt));
        }
    }

    for table in slide.tables.iter().filter(|t| !t.is_empty()) {
        out.push(table_note(table));
    }

    if slide.notes.is_some() {
        out.push("[has speaker notes]".to_string());
    }

    if out.len() == 1 {
        out.push("(no text content)".to_string());
    }

    out.join("\n")
}

/// Render all slides behind an overview header.
pub fn render_deck(slides: &[Slide]) -> String {
    let with_content = slides.iter().filter(|s| !s.is_empty()).count();
    let mut parts = vec![render_overview(slides.len(), with_content)];
    parts.extend(slides.iter().map(render_slide));
    parts.join(SLIDE_SEPARATOR)
}

fn render_row(row: &[String]) -> String {
    row.join(CELL_SEPARATOR)
}

fn table_note(table: &Table) -> String {
    match table.rows.len() {
        1 => "[table: 1 row]".to_string(),
        n => format!("[table: {} rows]", n),
    }
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
