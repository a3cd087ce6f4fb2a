//! Package relationships (`_rels/*.rels`) and part path resolution.

use doc_chat_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// A relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type ends in `/{kind}`, e.g. `slide` or
    /// `notesSlide`. Works for both transitional and strict namespaces.
    pub fn is(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit_once('/')
            .is_some_and(|(_, last)| last == kind)
    }
}

/// Parse a relationships part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }

                relationships.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Format(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids of `p:sldIdLst`, in presentation order.
pub fn slide_id_list(presentation_xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(presentation_xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"sldId" =>
            {
                // `id` is the numeric slide id; the prefixed `r:id` is the relationship.
                let rel_id = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
                    .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
                if let Some(id) = rel_id {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Format(format!(
                    "Error parsing presentation part: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Path of the relationships part for a source part:
/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
///
/// Absolute targets (`/ppt/slides/slide1.xml`) are package-rooted; relative
/// ones may use `..` segments.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
pub fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
