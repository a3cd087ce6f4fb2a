//! PPTX (Office Open XML) presentation extractor.
//!
//! Parses .pptx files, which are ZIP archives of XML parts, into slides with
//! titles, body text, tables and speaker notes.

pub mod parser;
pub mod rels;
pub mod slide_xml;

pub use parser::PptxParser;
