//! Reading slide and notes XML into a [`Shape`] tree.
//!
//! Each reader is entered right after the start tag of its element has been
//! consumed and returns after consuming the matching end tag.

use doc_chat_core::extract::MAX_GROUP_DEPTH;
use doc_chat_core::{Error, Paragraph, PlaceholderKind, Result, Shape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse the `p:spTree` of a slide, notes or layout part.
///
/// A part without a shape tree yields no shapes.
pub fn parse_shape_tree(xml: &str) -> Result<Vec<Shape>> {
    let mut reader = Reader::from_str(xml);

    loop {
        match next(&mut reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"spTree" => {
                return read_shapes(&mut reader, 0);
            }
            Event::Eof => return Ok(Vec::new()),
            _ => {}
        }
    }
}

/// Read the shapes of a container (`spTree`, `grpSp`, `mc:Choice`).
fn read_shapes(reader: &mut Reader<&[u8]>, depth: usize) -> Result<Vec<Shape>> {
    let mut shapes = Vec::new();

    loop {
        match next(reader)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => shapes.push(read_sp(reader)?),
                b"graphicFrame" => shapes.push(read_graphic_frame(reader)?),
                b"grpSp" | b"AlternateContent" if depth + 1 >= MAX_GROUP_DEPTH => {
                    log::warn!(
                        "Shape nesting exceeds {} levels, skipping deeper shapes",
                        MAX_GROUP_DEPTH
                    );
                    skip(reader, &e)?;
                }
                b"grpSp" => {
                    let children = read_shapes(reader, depth + 1)?;
                    shapes.push(Shape::Group { children });
                }
                b"AlternateContent" => {
                    shapes.extend(read_alternate_content(reader, depth + 1)?)
                }
                b"pic" | b"cxnSp" | b"contentPart" => {
                    skip(reader, &e)?;
                    shapes.push(Shape::Other);
                }
                // nvGrpSpPr, grpSpPr, extLst
                _ => skip(reader, &e)?,
            },
            Event::Empty(e) => {
                if matches!(e.local_name().as_ref(), b"pic" | b"cxnSp" | b"contentPart") {
                    shapes.push(Shape::Other);
                }
            }
            Event::End(_) => return Ok(shapes),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

/// Take the shapes of the first `mc:Choice`; fallbacks duplicate them.
fn read_alternate_content(reader: &mut Reader<&[u8]>, depth: usize) -> Result<Vec<Shape>> {
    let mut shapes = None;

    loop {
        match next(reader)? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"Choice" && shapes.is_none() {
                    shapes = Some(read_shapes(reader, depth)?);
                } else {
                    skip(reader, &e)?;
                }
            }
            Event::End(_) => return Ok(shapes.unwrap_or_default()),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

/// Read a `p:sp` into a text frame, or `Other` when it has no text body.
fn read_sp(reader: &mut Reader<&[u8]>) -> Result<Shape> {
    let mut placeholder = None;
    let mut paragraphs = None;
    let mut depth = 0usize;

    loop {
        match next(reader)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"txBody" => paragraphs = Some(read_text_body(reader)?),
                b"ph" => {
                    placeholder = Some(placeholder_kind(&e));
                    depth += 1;
                }
                _ => depth += 1,
            },
            Event::Empty(e) if e.local_name().as_ref() == b"ph" => {
                placeholder = Some(placeholder_kind(&e));
            }
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }

    Ok(match paragraphs {
        Some(paragraphs) => Shape::text_frame(placeholder, paragraphs),
        None => Shape::Other,
    })
}

/// Read an `a:txBody` / `p:txBody` into paragraphs.
fn read_text_body(reader: &mut Reader<&[u8]>) -> Result<Vec<Paragraph>> {
    let mut paragraphs = Vec::new();

    loop {
        match next(reader)? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"p" {
                    paragraphs.push(read_paragraph(reader)?);
                } else {
                    // bodyPr, lstStyle
                    skip(reader, &e)?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"p" => {
                paragraphs.push(Paragraph::default());
            }
            Event::End(_) => return Ok(paragraphs),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

/// Read an `a:p`: text runs, fields and line breaks, plus the outline level.
fn read_paragraph(reader: &mut Reader<&[u8]>) -> Result<Paragraph> {
    let mut paragraph = Paragraph::default();
    let mut depth = 0usize;
    let mut in_text = false;

    loop {
        match next(reader)? {
            Event::Start(e) => {
                match e.local_name().as_ref() {
                    b"t" => in_text = true,
                    b"pPr" => paragraph.level = level(&e),
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"br" => paragraph.text.push('\n'),
                b"pPr" => paragraph.level = level(&e),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(xml_error)?;
                paragraph.text.push_str(&text);
            }
            Event::End(e) => {
                if depth == 0 {
                    return Ok(paragraph);
                }
                if e.local_name().as_ref() == b"t" {
                    in_text = false;
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

/// Read a `p:graphicFrame`; only tables carry text.
fn read_graphic_frame(reader: &mut Reader<&[u8]>) -> Result<Shape> {
    let mut rows = None;
    let mut depth = 0usize;

    loop {
        match next(reader)? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"tbl" {
                    rows = Some(read_table(reader)?);
                } else {
                    depth += 1;
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }

    Ok(match rows {
        Some(rows) => Shape::Table { rows },
        None => Shape::Other,
    })
}

fn read_table(reader: &mut Reader<&[u8]>) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    loop {
        match next(reader)? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"tr" {
                    rows.push(read_row(reader)?);
                } else {
                    // tblPr, tblGrid
                    skip(reader, &e)?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"tr" => rows.push(Vec::new()),
            Event::End(_) => return Ok(rows),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

/// Read an `a:tr`. Merged cells are still present as `a:tc`, so every row
/// keeps the full column count.
fn read_row(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut cells = Vec::new();

    loop {
        match next(reader)? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"tc" {
                    cells.push(read_cell(reader)?);
                } else {
                    skip(reader, &e)?;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"tc" => cells.push(String::new()),
            Event::End(_) => return Ok(cells),
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn read_cell(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut paragraphs = Vec::new();

    loop {
        match next(reader)? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"txBody" {
                    paragraphs = read_text_body(reader)?;
                } else {
                    skip(reader, &e)?;
                }
            }
            Event::End(_) => {
                let texts: Vec<String> = paragraphs.into_iter().map(|p| p.text).collect();
                return Ok(texts.join("\n"));
            }
            Event::Eof => return Err(unexpected_eof()),
            _ => {}
        }
    }
}

fn placeholder_kind(e: &BytesStart) -> PlaceholderKind {
    let value = attribute(e, b"type");
    PlaceholderKind::from_ooxml(value.as_deref())
}

fn level(e: &BytesStart) -> u32 {
    attribute(e, b"lvl")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Value of an unprefixed attribute.
fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn next<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
    reader.read_event().map_err(xml_error)
}

fn skip(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<()> {
    reader
        .read_to_end(start.to_end().name())
        .map(|_| ())
        .map_err(xml_error)
}

fn xml_error(e: quick_xml::Error) -> Error {
    Error::Format(format!("malformed XML: {}", e))
}

fn unexpected_eof() -> Error {
    Error::Format("malformed XML: unexpected end of document".to_string())
}
