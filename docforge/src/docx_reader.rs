//! DOCX outline reader
//!
//! Reads a `.docx` buffer produced by the renderer back into a flat outline of
//! blocks. Only the constructs the renderer emits are understood: paragraph
//! styles, outline levels, numbering references, run bold flags, line breaks
//! and simple (non-nested) tables.
//!
//! An explicit outline level decides the block kind. Without one, a paragraph
//! whose style is `Title` or based on it (through `w:basedOn` in
//! `word/styles.xml`) is a title.

use crate::document_model::ListKind;
use crate::error::DocumentError;
use crate::style_sheet::{heading_level_of_style, TITLE_STYLE};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

/// Main document part inside a .docx package
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Style definitions part inside a .docx package
pub const STYLES_PART: &str = "word/styles.xml";

/// `w:outlineLvl` of body text
const BODY_TEXT_OUTLINE_LEVEL: u8 = 9;

/// Longest `w:basedOn` chain followed before giving up (guards cycles)
const MAX_BASED_ON_DEPTH: usize = 16;

/// Structural view of one rendered block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineBlock {
    /// A title (level 0) or section heading
    Heading { level: u8, text: String },

    /// A body paragraph, with all run texts concatenated
    Paragraph { text: String },

    /// A paragraph carrying a numbering reference
    ListItem {
        kind: ListKind,
        indent: u8,
        text: String,
    },

    /// A table of cell texts
    Table {
        rows: Vec<Vec<String>>,
        /// First row is flagged as a repeating header row
        header: bool,
        /// Every run of the first row is bold
        header_bold: bool,
    },
}

impl OutlineBlock {
    /// Whether this block is a heading, paragraph or list item
    pub fn is_text(&self) -> bool {
        !matches!(self, OutlineBlock::Table { .. })
    }
}

impl fmt::Display for OutlineBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlineBlock::Heading { level, text } => write!(f, "heading[{}] {}", level, text),
            OutlineBlock::Paragraph { text } => write!(f, "paragraph {}", text),
            OutlineBlock::ListItem { kind, indent, text } => {
                let marker = match kind {
                    ListKind::Bullet => "bullet",
                    ListKind::Numbered => "numbered",
                };
                write!(f, "{}[{}] {}", marker, indent, text)
            }
            OutlineBlock::Table {
                rows,
                header,
                header_bold,
            } => {
                let columns = rows.first().map_or(0, Vec::len);
                write!(f, "table {}x{}", rows.len(), columns)?;
                if *header {
                    write!(f, " (header")?;
                    if *header_bold {
                        write!(f, ", bold")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// Read the block outline of a rendered .docx buffer
///
/// # Returns
/// * `Ok(Vec<OutlineBlock>)` - Blocks in document order
/// * `Err(DocumentError::Archive)` - The buffer is not a ZIP package
/// * `Err(DocumentError::MissingPart)` - The package has no main document part
/// * `Err(DocumentError::Xml)` - The main document or styles part is malformed
pub fn read_outline(buffer: &[u8]) -> Result<Vec<OutlineBlock>, DocumentError> {
    let xml = read_part(buffer, DOCUMENT_PART)?;
    let style_bases = match read_part(buffer, STYLES_PART) {
        Ok(styles) => parse_style_bases(&styles)?,
        Err(DocumentError::MissingPart(_)) => BTreeMap::new(),
        Err(e) => return Err(e),
    };
    let blocks = parse_document_xml(&xml, &title_style_ids(&style_bases))?;
    log::debug!("Read {} outline blocks", blocks.len());
    Ok(blocks)
}

/// Read one part of a .docx package as text
pub fn read_part(buffer: &[u8], name: &str) -> Result<String, DocumentError> {
    let mut archive = ZipArchive::new(Cursor::new(buffer))?;
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Err(DocumentError::MissingPart(name.to_string())),
        Err(e) => return Err(e.into()),
    };

    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(ZipError::Io)?;
    Ok(xml)
}

/// Map each style id in `word/styles.xml` to the id it is based on
fn parse_style_bases(xml: &str) -> Result<BTreeMap<String, String>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut bases = BTreeMap::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"style" => current = attribute(e, b"styleId"),
                b"basedOn" => {
                    if let (Some(id), Some(base)) = (current.as_ref(), attribute(e, b"val")) {
                        bases.insert(id.clone(), base);
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"style" => current = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(DocumentError::Xml(format!("XML parsing error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(bases)
}

/// Ids of `Title` and every style whose `w:basedOn` chain reaches it
fn title_style_ids(bases: &BTreeMap<String, String>) -> BTreeSet<String> {
    let mut ids = BTreeSet::from([TITLE_STYLE.to_string()]);

    for id in bases.keys() {
        let mut current = id.as_str();
        for _ in 0..MAX_BASED_ON_DEPTH {
            match bases.get(current) {
                Some(base) if base == TITLE_STYLE => {
                    ids.insert(id.clone());
                    break;
                }
                Some(base) => current = base.as_str(),
                None => break,
            }
        }
    }

    ids
}

/// Parse the body of `word/document.xml` into outline blocks
fn parse_document_xml(
    xml: &str,
    title_styles: &BTreeSet<String>,
) -> Result<Vec<OutlineBlock>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut parser = OutlineParser {
        title_styles,
        blocks: Vec::new(),
        paragraph: None,
        table: None,
        nested_tables: 0,
        in_run_properties: false,
        in_text: false,
        run_bold: false,
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => parser.start(e),
            Ok(Event::Empty(ref e)) => {
                parser.start(e);
                parser.end(e.local_name().as_ref());
            }
            Ok(Event::End(ref e)) => parser.end(e.local_name().as_ref()),
            Ok(Event::Text(ref t)) => {
                let text = std::str::from_utf8(t)
                    .map_err(|e| DocumentError::Xml(format!("Invalid UTF-8 in text: {}", e)))?;
                parser.text(text);
            }
            Ok(Event::GeneralRef(ref r)) => {
                let name = std::str::from_utf8(r)
                    .map_err(|e| DocumentError::Xml(format!("Invalid UTF-8 in entity: {}", e)))?;
                let resolved = resolve_entity(name)
                    .ok_or_else(|| DocumentError::Xml(format!("Unknown entity &{};", name)))?;
                parser.text(resolved.encode_utf8(&mut [0; 4]));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DocumentError::Xml(format!("XML parsing error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.blocks)
}

/// Resolve a predefined or numeric character entity
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Value of an attribute matched by local name
fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// OOXML on/off value (`w:b` without `w:val` means on)
fn is_on(e: &BytesStart) -> bool {
    !matches!(
        attribute(e, b"val").as_deref(),
        Some("0") | Some("false") | Some("off")
    )
}

#[derive(Debug, Default)]
struct ParagraphState {
    style: Option<String>,
    outline_level: Option<u8>,
    list_level: Option<u8>,
    numbered: bool,
    text: String,
    runs: usize,
    bold_runs: usize,
}

impl ParagraphState {
    fn all_runs_bold(&self) -> bool {
        self.runs > 0 && self.runs == self.bold_runs
    }

    /// Classify the paragraph
    ///
    /// An explicit outline level is final: 0-8 is a heading, body text is a
    /// paragraph or list item. Without one the style decides.
    fn into_block(self, title_styles: &BTreeSet<String>) -> OutlineBlock {
        match self.outline_level {
            Some(level) if level < BODY_TEXT_OUTLINE_LEVEL => {
                return OutlineBlock::Heading {
                    level: level + 1,
                    text: self.text,
                };
            }
            Some(_) => return self.into_body_block(),
            None => {}
        }

        let style_level = self.style.as_deref().and_then(|style| {
            if title_styles.contains(style) {
                Some(0)
            } else {
                heading_level_of_style(style)
            }
        });
        if let Some(level) = style_level {
            return OutlineBlock::Heading {
                level,
                text: self.text,
            };
        }

        self.into_body_block()
    }

    fn into_body_block(self) -> OutlineBlock {
        if self.numbered {
            let kind = match self.style.as_deref() {
                Some("ListNumber") => ListKind::Numbered,
                _ => ListKind::Bullet,
            };
            return OutlineBlock::ListItem {
                kind,
                indent: self.list_level.unwrap_or(0),
                text: self.text,
            };
        }

        OutlineBlock::Paragraph { text: self.text }
    }
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Option<String>,
    header: bool,
    header_bold: bool,
    /// Every paragraph of the current row had only bold runs
    row_bold: bool,
}

#[derive(Debug)]
struct OutlineParser<'a> {
    /// Style ids that mark a title
    title_styles: &'a BTreeSet<String>,
    blocks: Vec<OutlineBlock>,
    paragraph: Option<ParagraphState>,
    table: Option<TableState>,
    /// Depth of tables nested inside the current table (skipped)
    nested_tables: usize,
    in_run_properties: bool,
    in_text: bool,
    run_bold: bool,
}

impl OutlineParser<'_> {
    fn start(&mut self, e: &BytesStart) {
        if self.nested_tables > 0 {
            if e.local_name().as_ref() == b"tbl" {
                self.nested_tables += 1;
            }
            return;
        }

        match e.local_name().as_ref() {
            b"tbl" => {
                if self.table.is_some() {
                    log::warn!("Skipping nested table");
                    self.nested_tables = 1;
                } else {
                    self.table = Some(TableState::default());
                }
            }
            b"tr" => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                    table.row_bold = true;
                }
            }
            b"tblHeader" => {
                if let Some(table) = self.table.as_mut() {
                    table.header |= table.rows.is_empty();
                }
            }
            b"tc" => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                }
            }
            b"p" => self.paragraph = Some(ParagraphState::default()),
            b"pStyle" => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.style = attribute(e, b"val");
                }
            }
            b"outlineLvl" => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.outline_level = attribute(e, b"val").and_then(|v| v.parse().ok());
                }
            }
            b"ilvl" => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.list_level = attribute(e, b"val").and_then(|v| v.parse().ok());
                }
            }
            b"numId" => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    // numId 0 removes numbering
                    paragraph.numbered = attribute(e, b"val").is_some_and(|v| v != "0");
                }
            }
            b"r" => {
                self.run_bold = false;
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.runs += 1;
                }
            }
            b"rPr" => self.in_run_properties = true,
            b"b" if self.in_run_properties => self.run_bold = is_on(e),
            b"t" => self.in_text = true,
            b"br" => self.push_to_paragraph("\n"),
            b"tab" if !self.in_run_properties => self.push_to_paragraph("\t"),
            _ => {}
        }
    }

    fn end(&mut self, local_name: &[u8]) {
        if self.nested_tables > 0 {
            if local_name == b"tbl" {
                self.nested_tables -= 1;
            }
            return;
        }

        match local_name {
            b"t" => self.in_text = false,
            b"rPr" => self.in_run_properties = false,
            b"r" => {
                if let (true, Some(paragraph)) = (self.run_bold, self.paragraph.as_mut()) {
                    paragraph.bold_runs += 1;
                }
            }
            b"p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.finish_paragraph(paragraph);
                }
            }
            b"tc" => {
                if let Some(table) = self.table.as_mut() {
                    let cell = table.cell.take().unwrap_or_default();
                    table.row.push(cell);
                }
            }
            b"tr" => {
                if let Some(table) = self.table.as_mut() {
                    if table.rows.is_empty() {
                        table.header_bold = table.row_bold && !table.row.is_empty();
                    }
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            b"tbl" => {
                if let Some(table) = self.table.take() {
                    self.blocks.push(OutlineBlock::Table {
                        rows: table.rows,
                        header: table.header,
                        header_bold: table.header_bold,
                    });
                }
            }
            _ => {}
        }
    }

    /// Character data; only text inside `w:t` belongs to the paragraph
    fn text(&mut self, text: &str) {
        if self.in_text {
            self.push_to_paragraph(text);
        }
    }

    fn push_to_paragraph(&mut self, text: &str) {
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.text.push_str(text);
        }
    }

    fn finish_paragraph(&mut self, paragraph: ParagraphState) {
        match self.table.as_mut() {
            Some(table) => {
                table.row_bold &= paragraph.all_runs_bold();
                if let Some(cell) = table.cell.as_mut() {
                    if !cell.is_empty() {
                        cell.push('\n');
                    }
                    cell.push_str(&paragraph.text);
                }
            }
            None => self.blocks.push(paragraph.into_block(self.title_styles)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn parse(xml: &str) -> Result<Vec<OutlineBlock>, DocumentError> {
        parse_document_xml(xml, &title_style_ids(&BTreeMap::new()))
    }

    fn body(inner: &str) -> String {
        format!(r#"<w:document {}><w:body>{}<w:sectPr/></w:body></w:document>"#, W, inner)
    }

    #[test]
    fn test_paragraph_kinds_from_styles() {
        let xml = body(concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>InvoiceFlow</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Stack</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Callout"/><w:outlineLvl w:val="0"/></w:pPr><w:r><w:t>Custom</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="ListNumber"/><w:numPr><w:ilvl w:val="2"/><w:numId w:val="4"/></w:numPr></w:pPr><w:r><w:t>Step</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Normal"/></w:pPr><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>"#,
            r#"<w:p/>"#,
        ));

        let blocks = parse(&xml).unwrap();
        assert_eq!(
            blocks,
            vec![
                OutlineBlock::Heading { level: 0, text: "InvoiceFlow".to_string() },
                OutlineBlock::Heading { level: 2, text: "Stack".to_string() },
                OutlineBlock::Heading { level: 1, text: "Custom".to_string() },
                OutlineBlock::ListItem {
                    kind: ListKind::Numbered,
                    indent: 2,
                    text: "Step".to_string(),
                },
                OutlineBlock::Paragraph { text: "Hello world".to_string() },
                OutlineBlock::Paragraph { text: String::new() },
            ]
        );
    }

    #[test]
    fn test_body_outline_level_overrides_style() {
        let xml = body(concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Title"/><w:outlineLvl w:val="9"/></w:pPr><w:r><w:t>Cover</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:outlineLvl w:val="9"/></w:pPr><w:r><w:t>Lead</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="ListNumber"/><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr><w:outlineLvl w:val="9"/></w:pPr><w:r><w:t>Mint</w:t></w:r></w:p>"#,
        ));

        assert_eq!(
            parse(&xml).unwrap(),
            vec![
                OutlineBlock::Paragraph { text: "Cover".to_string() },
                OutlineBlock::Paragraph { text: "Lead".to_string() },
                OutlineBlock::ListItem {
                    kind: ListKind::Numbered,
                    indent: 0,
                    text: "Mint".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_styles_based_on_title_mark_titles() {
        let styles = format!(
            concat!(
                r#"<w:styles {}>"#,
                r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/></w:style>"#,
                r#"<w:style w:type="paragraph" w:styleId="Banner"><w:name w:val="Banner"/><w:basedOn w:val="Title"/></w:style>"#,
                r#"<w:style w:type="paragraph" w:styleId="Hero"><w:name w:val="Hero"/><w:basedOn w:val="Banner"/></w:style>"#,
                r#"<w:style w:type="paragraph" w:styleId="Ping"><w:basedOn w:val="Pong"/></w:style>"#,
                r#"<w:style w:type="paragraph" w:styleId="Pong"><w:basedOn w:val="Ping"/></w:style>"#,
                r#"<w:style w:type="paragraph" w:styleId="Quote"><w:basedOn w:val="Normal"/></w:style>"#,
                "</w:styles>"
            ),
            W
        );
        let bases = parse_style_bases(&styles).unwrap();
        assert_eq!(bases.get("Hero").map(String::as_str), Some("Banner"));

        let titles = title_style_ids(&bases);
        assert_eq!(
            titles.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Banner", "Hero", "Title"]
        );

        let xml = body(concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Hero"/></w:pPr><w:r><w:t>InvoiceFlow</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Quote"/></w:pPr><w:r><w:t>Note</w:t></w:r></w:p>"#,
        ));
        assert_eq!(
            parse_document_xml(&xml, &titles).unwrap(),
            vec![
                OutlineBlock::Heading { level: 0, text: "InvoiceFlow".to_string() },
                OutlineBlock::Paragraph { text: "Note".to_string() },
            ]
        );
    }

    #[test]
    fn test_entities_and_breaks_in_text() {
        let xml = body(
            r#"<w:p><w:r><w:t>Draft &amp; Paid &lt;ok&gt; &#x2192;</w:t><w:br/><w:t>next</w:t></w:r></w:p>"#,
        );

        let blocks = parse(&xml).unwrap();
        assert_eq!(
            blocks,
            vec![OutlineBlock::Paragraph {
                text: "Draft & Paid <ok> \u{2192}\nnext".to_string()
            }]
        );
    }

    #[test]
    fn test_table_header_flags() {
        let xml = body(concat!(
            "<w:tbl><w:tblPr/>",
            "<w:tr><w:trPr><w:tblHeader/></w:trPr>",
            "<w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Name</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Value</w:t></w:r></w:p></w:tc>",
            "</w:tr>",
            "<w:tr>",
            "<w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:rPr><w:b w:val=\"0\"/></w:rPr><w:t>1</w:t></w:r></w:p></w:tc>",
            "</w:tr>",
            "</w:tbl>",
        ));

        let blocks = parse(&xml).unwrap();
        assert_eq!(
            blocks,
            vec![OutlineBlock::Table {
                rows: vec![
                    vec!["Name".to_string(), "Value".to_string()],
                    vec!["a".to_string(), "1".to_string()],
                ],
                header: true,
                header_bold: true,
            }]
        );
    }

    #[test]
    fn test_first_row_with_plain_run_is_not_bold() {
        let xml = body(concat!(
            "<w:tbl><w:tr>",
            "<w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:p><w:r><w:t>plain</w:t></w:r></w:p></w:tc>",
            "</w:tr></w:tbl>",
        ));

        match &parse(&xml).unwrap()[0] {
            OutlineBlock::Table {
                header, header_bold, ..
            } => {
                assert!(!header);
                assert!(!header_bold);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_xml_is_reported() {
        let xml = format!(r#"<w:document {}><w:body><w:p></w:body>"#, W);
        assert!(matches!(
            parse(&xml),
            Err(DocumentError::Xml(_))
        ));
    }

    #[test]
    fn test_non_zip_buffer_is_archive_error() {
        assert!(matches!(
            read_outline(b"not a docx"),
            Err(DocumentError::Archive(_))
        ));
    }

    #[test]
    fn test_missing_document_part() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        let buffer = zip.finish().unwrap().into_inner();

        match read_outline(&buffer) {
            Err(DocumentError::MissingPart(part)) => assert_eq!(part, DOCUMENT_PART),
            other => panic!("expected MissingPart, got {:?}", other),
        }
    }

    #[test]
    fn test_display_is_one_line_per_block() {
        let table = OutlineBlock::Table {
            rows: vec![vec!["A".to_string(), "B".to_string()]],
            header: true,
            header_bold: true,
        };
        assert_eq!(table.to_string(), "table 1x2 (header, bold)");
        assert!(!table.is_text());

        let item = OutlineBlock::ListItem {
            kind: ListKind::Bullet,
            indent: 1,
            text: "Escrow".to_string(),
        };
        assert_eq!(item.to_string(), "bullet[1] Escrow");
    }
}
