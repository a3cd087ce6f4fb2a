//! PPTX file parser implementation.

use crate::rels::{
    extract_slide_number, parse_relationships, rels_path_for, resolve_target, slide_id_list,
};
use crate::slide_xml::parse_shape_tree;
use doc_chat_core::{
    Deck, Document, DocumentKind, Error, Result, Shape, Slide, SlideExtractor, SlideFailure,
};
use std::io::{Cursor, Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

/// Parts larger than this are rejected.
pub const MAX_PART_BYTES: u64 = 64 * 1024 * 1024;

/// Main part location when `_rels/.rels` does not name one.
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Parser for PPTX (Office Open XML) files.
#[derive(Debug, Default)]
pub struct PptxParser {
    extractor: SlideExtractor,
}

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a PPTX file from a reader.
    ///
    /// Container-level problems fail the whole extraction. A slide that
    /// cannot be read is recorded in [`Deck::failures`] and kept as an empty
    /// record, so the remaining slides stay usable and numbering is preserved.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Deck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Format(format!("{} is not a valid .pptx container: {}", filename, e)))?;

        let presentation_part = self.presentation_part(&mut archive)?;
        let slide_order = self.get_slide_order(&mut archive, &presentation_part)?;
        log::debug!("{}: {} slide parts", filename, slide_order.len());

        let mut deck = Deck::default();

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let index = idx + 1;
            match self.parse_slide(&mut archive, slide_path, index) {
                Ok(slide) => deck.slides.push(slide),
                Err(e) => {
                    log::warn!("{}: slide {} could not be read: {}", filename, index, e);
                    deck.failures.push(SlideFailure {
                        index,
                        part: slide_path.clone(),
                        message: e.to_string(),
                    });
                    deck.slides.push(Slide::new(index));
                }
            }
        }

        Ok(deck)
    }

    /// Parse an in-memory PPTX file.
    pub fn parse_bytes(&self, bytes: &[u8], filename: &str) -> Result<Deck> {
        if !DocumentKind::looks_like_zip(bytes) {
            return Err(Error::Format(format!(
                "{} is not a .pptx file (missing ZIP signature)",
                filename
            )));
        }
        self.parse(Cursor::new(bytes), filename)
    }

    /// Parse an in-memory PPTX file into a [`Document`].
    pub fn parse_document(&self, bytes: &[u8], filename: &str) -> Result<Document> {
        let deck = self.parse_bytes(bytes, filename)?;
        Ok(Document::presentation(filename, deck))
    }

    /// Locate the main presentation part through the package relationships.
    fn presentation_part<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<String> {
        let root_rels = match self.read_optional_part(archive, &rels_path_for(""))? {
            Some(xml) => parse_relationships(&xml)?,
            None => Vec::new(),
        };

        let part = root_rels
            .iter()
            .find(|r| r.is("officeDocument"))
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| DEFAULT_PRESENTATION_PART.to_string());

        if archive.by_name(&part).is_err() {
            return Err(Error::Format(format!(
                "missing presentation part '{}'",
                part
            )));
        }

        Ok(part)
    }

    /// Get the ordered list of slide paths.
    ///
    /// `p:sldIdLst` defines the order; without it, slide relationships are
    /// sorted by the number in their id or target.
    fn get_slide_order<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        presentation_part: &str,
    ) -> Result<Vec<String>> {
        let rels_content = self.read_part(archive, &rels_path_for(presentation_part))?;
        let rels = parse_relationships(&rels_content)?;

        let presentation = self.read_part(archive, presentation_part)?;
        let ids = slide_id_list(&presentation)?;

        if !ids.is_empty() {
            let mut slides = Vec::with_capacity(ids.len());
            for id in &ids {
                match rels.iter().find(|r| &r.id == id && r.is("slide")) {
                    Some(rel) => slides.push(resolve_target(presentation_part, &rel.target)),
                    None => log::warn!("Slide id list references unknown relationship {}", id),
                }
            }
            return Ok(slides);
        }

        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|r| r.is("slide") && !r.external)
            .map(|r| {
                let order_num =
                    extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
                (resolve_target(presentation_part, &r.target), order_num)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide and its speaker notes.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = self.read_part(archive, slide_path)?;
        let shapes = parse_shape_tree(&content)?;
        let notes = self.notes_shapes(archive, slide_path)?;

        Ok(self
            .extractor
            .build_slide(slide_number, &shapes, notes.as_deref()))
    }

    /// Shapes of the notes page linked from a slide, if any.
    fn notes_shapes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<Vec<Shape>>> {
        let Some(rels_content) = self.read_optional_part(archive, &rels_path_for(slide_path))?
        else {
            return Ok(None);
        };

        let rels = parse_relationships(&rels_content)?;
        let Some(notes_rel) = rels.iter().find(|r| r.is("notesSlide")) else {
            return Ok(None);
        };

        let notes_path = resolve_target(slide_path, &notes_rel.target);
        match self.read_optional_part(archive, &notes_path)? {
            Some(xml) => Ok(Some(parse_shape_tree(&xml)?)),
            None => {
                log::debug!("{} links missing notes part {}", slide_path, notes_path);
                Ok(None)
            }
        }
    }

    /// Read a part from the ZIP archive.
    fn read_part<R: Read + Seek>(&self, archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
        self.read_optional_part(archive, path)?
            .ok_or_else(|| Error::Format(format!("missing part '{}'", path)))
    }

    /// Read a part, or `None` when the archive has no such entry.
    fn read_optional_part<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Option<String>> {
        let file = match archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(Error::Format(format!("Failed to open '{}': {}", path, e)));
            }
        };

        let mut bytes = Vec::new();
        file.take(MAX_PART_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| Error::Format(format!("Failed to read '{}': {}", path, e)))?;

        if bytes.len() as u64 > MAX_PART_BYTES {
            return Err(Error::Format(format!(
                "part '{}' exceeds {} bytes",
                path, MAX_PART_BYTES
            )));
        }

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| Error::Format(format!("part '{}' is not UTF-8: {}", path, e)))
    }
}
