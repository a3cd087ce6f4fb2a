//! End-to-end extraction from in-memory .pptx archives.

use doc_chat_core::{ContextAssembler, Error};
use doc_chat_pptx::PptxParser;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006""#;

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn title(text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        text
    )
}

fn body(paragraphs: &[&str]) -> String {
    let paras: String = paragraphs
        .iter()
        .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p))
        .collect();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content 2"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/>{}</p:txBody></p:sp>"#,
        paras
    )
}

fn table(rows: &[&[&str]]) -> String {
    let rows: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|c| {
                    format!(
                        "<a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>",
                        c
                    )
                })
                .collect();
            format!(r#"<a:tr h="370840">{}</a:tr>"#, cells)
        })
        .collect();
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Table 3"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="1"/><a:tblGrid><a:gridCol w="100"/></a:tblGrid>{}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        rows
    )
}

const GROUP_OPEN: &str = r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="9" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

fn group(inner: &str) -> String {
    format!("{}{}</p:grpSp>", GROUP_OPEN, inner)
}

/// `inner` wrapped in `levels` copies of the same open/close pair.
fn nested(open: &str, close: &str, levels: usize, inner: &str) -> String {
    format!("{}{}{}", open.repeat(levels), inner, close.repeat(levels))
}

fn slide(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
        NAMESPACES, shapes
    )
}

fn notes(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:notes {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="4" name="Slide Number"/><p:cNvSpPr/><p:nvPr><p:ph type="sldNum" idx="5"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:fld id="x" type="slidenum"><a:t>1</a:t></a:fld></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:notes>"#,
        NAMESPACES, text
    )
}

/// Builds a minimal but structurally complete .pptx package.
#[derive(Default)]
struct PptxBuilder {
    slides: Vec<(String, Option<String>)>,
    order: Option<Vec<usize>>,
}

impl PptxBuilder {
    fn new() -> Self {
        Self::default()
    }

    fn slide(mut self, xml: String) -> Self {
        self.slides.push((xml, None));
        self
    }

    fn slide_with_notes(mut self, xml: String, notes_text: &str) -> Self {
        self.slides.push((xml, Some(notes(notes_text))));
        self
    }

    /// Presentation order as 1-based slide file numbers.
    fn order(mut self, order: Vec<usize>) -> Self {
        self.order = Some(order);
        self
    }

    fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, content: &str| {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        put(
            &mut zip,
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#,
        );
        put(
            &mut zip,
            "_rels/.rels",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#,
                REL_BASE
            ),
        );

        let order = self
            .order
            .clone()
            .unwrap_or_else(|| (1..=self.slides.len()).collect());
        let slide_ids: String = order
            .iter()
            .enumerate()
            .map(|(i, n)| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, n + 1))
            .collect();
        put(
            &mut zip,
            "ppt/presentation.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
                NAMESPACES, slide_ids
            ),
        );

        let mut rels = format!(
            r#"<Relationship Id="rId1" Type="{}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
            REL_BASE
        );
        for n in 1..=self.slides.len() {
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{}/slide" Target="slides/slide{}.xml"/>"#,
                n + 1,
                REL_BASE,
                n
            ));
        }
        put(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
                rels
            ),
        );

        for (i, (slide_xml, notes_xml)) in self.slides.iter().enumerate() {
            let n = i + 1;
            put(&mut zip, &format!("ppt/slides/slide{}.xml", n), slide_xml);

            if let Some(notes_xml) = notes_xml {
                put(
                    &mut zip,
                    &format!("ppt/slides/_rels/slide{}.xml.rels", n),
                    &format!(
                        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{0}/slideLayout" Target="../slideLayouts/slideLayout2.xml"/><Relationship Id="rId2" Type="{0}/notesSlide" Target="../notesSlides/notesSlide{1}.xml"/></Relationships>"#,
                        REL_BASE, n
                    ),
                );
                put(
                    &mut zip,
                    &format!("ppt/notesSlides/notesSlide{}.xml", n),
                    notes_xml,
                );
            }
        }

        zip.finish().unwrap().into_inner()
    }
}

#[test]
fn test_sales_example_deck() {
    let bytes = PptxBuilder::new()
        .slide(slide(&(title("Welcome") + &body(&["Agenda for today"]))))
        .slide(slide(&(title("Sales") + &table(&[&["Q1", "Q2"], &["10", "20"]]))))
        .slide(slide(&body(&["Thanks"])))
        .build();

    let deck = PptxParser::new().parse_bytes(&bytes, "sales.pptx").unwrap();
    assert!(deck.is_complete());
    assert_eq!(deck.slides.len(), 3);

    let sales = &deck.slides[1];
    assert_eq!(sales.index, 2);
    assert_eq!(sales.title.as_deref(), Some("Sales"));
    assert_eq!(sales.tables.len(), 1);
    assert_eq!(sales.tables[0].rows, vec![vec!["Q1", "Q2"], vec!["10", "20"]]);
    assert!(sales.body_text.is_empty());

    let doc = PptxParser::new().parse_document(&bytes, "sales.pptx").unwrap();
    let context = ContextAssembler::new().assemble(&doc);
    let boundary = context.text.find("=== SLIDE 2: Sales ===").unwrap();
    let first_row = context.text.find("Q1 | Q2").unwrap();
    let second_row = context.text.find("10 | 20").unwrap();
    assert!(boundary < first_row && first_row < second_row);
}

#[test]
fn test_slide_count_and_indices_include_empty_slides() {
    let bytes = PptxBuilder::new()
        .slide(slide(&title("One")))
        .slide(slide(""))
        .slide(slide(&body(&["", "   "])))
        .slide(slide(&title("Four")))
        .build();

    let deck = PptxParser::new().parse_bytes(&bytes, "deck.pptx").unwrap();
    let indices: Vec<usize> = deck.slides.iter().map(|s| s.index).collect();

    assert_eq!(indices, vec![1, 2, 3, 4]);
    assert!(deck.slides[1].is_empty());
    assert!(deck.slides[2].is_empty());
    assert_eq!(deck.slides_with_content(), 2);
}

#[test]
fn test_presentation_order_follows_slide_id_list() {
    let bytes = PptxBuilder::new()
        .slide(slide(&title("File one")))
        .slide(slide(&title("File two")))
        .slide(slide(&title("File three")))
        .order(vec![3, 1, 2])
        .build();

    let deck = PptxParser::new().parse_bytes(&bytes, "reordered.pptx").unwrap();
    let titles: Vec<&str> = deck
        .slides
        .iter()
        .map(|s| s.title.as_deref().unwrap_or_default())
        .collect();

    assert_eq!(titles, vec!["File three", "File one", "File two"]);
    assert_eq!(deck.slides[0].index, 1);
}

#[test]
fn test_table_dimensions_are_preserved() {
    let bytes = PptxBuilder::new()
        .slide(slide(&table(&[
            &["a", "b", "c", "d"],
            &["1", "2", "3", "4"],
            &["w", "x", "y", "z"],
        ])))
        .build();

    let deck = PptxParser::new().parse_bytes(&bytes, "grid.pptx").unwrap();
    let rows = deck.slides[0].table_rows();

    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.len() == 4));
    assert_eq!(rows[2][3], "z");
}

#[test]
fn test_group_recursion_flattens_text_and_table() {
    let nested = group(&table(&[&["inner", "cell"]]));
    let bytes = PptxBuilder::new()
        .slide(slide(&(title("Grouped") + &group(&(body(&["In the group"]) + &nested)))))
        .build();

    let deck = PptxParser::new().parse_bytes(&bytes, "groups.pptx").unwrap();
    let slide = &deck.slides[0];

    assert_eq!(slide.title.as_deref(), Some("Grouped"));
    assert_eq!(slide.body_text, vec!["In the group"]);
    assert_eq!(slide.tables[0].rows, vec![vec!["inner", "cell"]]);
}

#[test]
fn test_speaker_notes_are_extracted() {
    let bytes = PptxBuilder::new()
        .slide_with_notes(slide(&title("Roadmap")), "Mention the Q3 &amp; Q4 milestones")
        .slide(slide(&title("No notes")))
        .build();

    let deck = PptxParser::new().parse_bytes(&bytes, "notes.pptx").unwrap();

    assert_eq!(
        deck.slides[0].notes.as_deref(),
        Some("Mention the Q3 & Q4 milestones")
    );
    assert_eq!(deck.slides[1].notes, None);
}

#[test]
fn test_malformed_slide_is_reported_and_others_survive() {
    let broken = slide(&body(&["half"]));
    let broken = broken[..broken.find("half").unwrap()].to_string();

    let bytes = PptxBuilder::new()
        .slide(slide(&title("Fine")))
        .slide(broken)
        .slide(slide(&title("Also fine")))
        .build();

    let deck = PptxParser::new().parse_bytes(&bytes, "partial.pptx").unwrap();

    assert_eq!(deck.slides.len(), 3);
    assert_eq!(deck.failures.len(), 1);
    assert_eq!(deck.failures[0].index, 2);
    assert_eq!(deck.failures[0].part, "ppt/slides/slide2.xml");
    assert!(deck.slides[1].is_empty());
    assert_eq!(deck.slides[2].title.as_deref(), Some("Also fine"));

    match deck.into_complete() {
        Err(Error::Format(msg)) => assert!(msg.contains("slide 2")),
        other => panic!("expected Format error, got {other:?}"),
    }
}

#[test]
fn test_archive_without_presentation_is_format_error() {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("hello.txt", FileOptions::default()).unwrap();
    zip.write_all(b"not a presentation").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    match PptxParser::new().parse_bytes(&bytes, "renamed.pptx") {
        Err(Error::Format(msg)) => assert!(msg.contains("presentation")),
        other => panic!("expected Format error, got {other:?}"),
    }
}

#[test]
fn test_deep_nesting_is_skipped_without_failing_the_slide() {
    const LEVELS: usize = 50_000;

    let alternate = nested(
        r#"<mc:AlternateContent><mc:Choice Requires="p14">"#,
        "</mc:Choice></mc:AlternateContent>",
        LEVELS,
        &body(&["buried in alternate content"]),
    );
    let groups = nested(GROUP_OPEN, "</p:grpSp>", LEVELS, &body(&["buried in groups"]));

    let bytes = PptxBuilder::new()
        .slide(slide(&(title("Nested") + &group(&body(&["shallow group"])) + &alternate)))
        .slide(slide(&groups))
        .slide(slide(&title("After")))
        .build();

    let deck = PptxParser::new().parse_bytes(&bytes, "nested.pptx").unwrap();

    assert!(deck.is_complete());
    assert_eq!(deck.slides.len(), 3);
    assert_eq!(deck.slides[0].title.as_deref(), Some("Nested"));
    assert_eq!(deck.slides[0].body_text, vec!["shallow group"]);
    assert!(deck.slides[1].is_empty());
    assert_eq!(deck.slides[2].title.as_deref(), Some("After"));
}
