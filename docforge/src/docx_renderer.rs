//! DOCX rendering
//!
//! This module serializes a [`DocumentTree`] into an in-memory Microsoft Word
//! (.docx) package. A .docx file is a ZIP archive of XML parts; the renderer
//! generates every part as raw OOXML and zips them:
//! 1. Allocates a unique style id per style name
//! 2. Resolves the style of every block (failing fast on unknown styles)
//! 3. Infers list numbering instances from list item adjacency
//! 4. Generates `document.xml`, `styles.xml`, `numbering.xml` and docProps
//! 5. Packs the parts in a fixed order with a fixed timestamp
//!
//! Rendering never touches the filesystem, and the same tree and style sheet
//! always produce byte-identical output.
//!
//! Every paragraph states its outline level so the block kind survives a
//! read back: headings carry their level, body paragraphs carry
//! [`BODY_TEXT_OUTLINE_LEVEL`], and a title carries none. Styles used for a
//! title are based on `Title` in `styles.xml`.

use crate::document_model::{
    Alignment, ContentBlock, DocumentProperties, DocumentTree, ListKind, TextRun,
};
use crate::error::DocumentError;
use crate::style_sheet::{
    heading_level_of_style, heading_style_name, StyleAttributes, StyleSheet, TableTheme,
    TITLE_STYLE,
};
use itertools::Itertools;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Deepest list level OOXML numbering supports (levels are 0-8)
pub const MAX_LIST_LEVEL: u8 = 8;

/// `w:outlineLvl` value for body text (levels 0-8 are headings)
pub const BODY_TEXT_OUTLINE_LEVEL: u8 = 9;

/// Indentation per list level in twips (720 twips = 0.5 inch)
const LIST_INDENT_TWIPS: u32 = 720;

/// Text width of a Letter page with 1 inch margins, in twips
const TEXT_WIDTH_TWIPS: u32 = 9360;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const WORDML_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/></Relationships>"#;

const APP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>docforge</Application></Properties>"#;

/// Letter page, 1 inch margins
const SECTION_PROPERTIES_XML: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#;

const BULLET_ABSTRACT_ID: u32 = 0;
const NUMBERED_ABSTRACT_ID: u32 = 1;

/// Render a document tree to a .docx buffer
///
/// # Parameters
/// * `tree` - The document to render
/// * `styles` - The active style sheet
///
/// # Returns
/// * `Ok(Vec<u8>)` - The complete .docx package
/// * `Err(DocumentError::UnknownStyle)` - A block references an undefined style
/// * `Err(DocumentError::Archive)` - The ZIP container could not be assembled
pub fn render(tree: &DocumentTree, styles: &StyleSheet) -> Result<Vec<u8>, DocumentError> {
    log::info!(
        "Rendering DOCX: {} blocks, {} styles",
        tree.len(),
        styles.len()
    );

    let style_ids = StyleIds::allocate(styles);
    let resolved = tree
        .blocks()
        .iter()
        .map(|block| resolve_block(block, styles, &style_ids))
        .collect::<Result<Vec<_>, _>>()?;
    let numbering = ListNumbering::assign(tree.blocks());
    let title_styles = title_style_names(&resolved);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", PACKAGE_RELS_XML.to_string()),
        ("docProps/app.xml", APP_XML.to_string()),
        ("docProps/core.xml", generate_core_xml(tree.properties())),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
        (
            "word/document.xml",
            generate_document_xml(&resolved, &numbering, styles.table_theme()),
        ),
        (
            "word/styles.xml",
            generate_styles_xml(styles, &style_ids, &title_styles),
        ),
        ("word/numbering.xml", generate_numbering_xml(&numbering)),
    ];

    let buffer = package(&parts)?;
    log::info!("Rendered DOCX: {} bytes", buffer.len());
    Ok(buffer)
}

/// Unique OOXML style ids keyed by style name
///
/// Names that already are valid ids keep them. Other names are reduced to
/// ASCII alphanumerics and get a numeric suffix when the id is taken.
#[derive(Debug)]
struct StyleIds {
    ids: BTreeMap<String, String>,
}

impl StyleIds {
    fn allocate(styles: &StyleSheet) -> Self {
        let mut ids = BTreeMap::new();
        let mut taken = BTreeSet::new();

        for (name, _) in styles.iter() {
            if is_plain_style_id(name) {
                taken.insert(name.to_string());
                ids.insert(name.to_string(), name.to_string());
            }
        }

        let pending: Vec<&str> = styles
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !ids.contains_key(*name))
            .collect();
        for name in pending {
            let base = style_id(name);
            let mut id = base.clone();
            let mut suffix = 2;
            while taken.contains(&id) {
                id = format!("{}{}", base, suffix);
                suffix += 1;
            }
            log::debug!("Style '{}' gets id '{}'", name, id);
            taken.insert(id.clone());
            ids.insert(name.to_string(), id);
        }

        Self { ids }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }
}

/// A block paired with its resolved style
struct ResolvedBlock<'a> {
    block: &'a ContentBlock,
    style_name: String,
    style_id: &'a str,
    style: &'a StyleAttributes,
    /// Zero-based `w:outlineLvl`, `None` for a title
    outline_level: Option<u8>,
}

/// Resolve the style a block renders with
fn resolve_block<'a>(
    block: &'a ContentBlock,
    styles: &'a StyleSheet,
    style_ids: &'a StyleIds,
) -> Result<ResolvedBlock<'a>, DocumentError> {
    let (style_name, outline_level) = match block {
        ContentBlock::Heading {
            level,
            style: Some(name),
            ..
        } => (name.clone(), outline_level(*level)),
        ContentBlock::Heading {
            level, style: None, ..
        } => {
            let level = clamp_heading_level(*level, styles);
            (heading_style_name(level), outline_level(level))
        }
        ContentBlock::Paragraph { style, .. } | ContentBlock::Table { style, .. } => {
            (style.clone(), Some(BODY_TEXT_OUTLINE_LEVEL))
        }
        ContentBlock::ListItem { kind, .. } => (
            kind.style_name().to_string(),
            Some(BODY_TEXT_OUTLINE_LEVEL),
        ),
    };

    let style = styles.resolve(&style_name)?;
    let style_id = style_ids
        .get(&style_name)
        .ok_or_else(|| DocumentError::UnknownStyle {
            name: style_name.clone(),
        })?;
    log::debug!("{} uses style '{}'", block.kind_name(), style_name);

    Ok(ResolvedBlock {
        block,
        style_name,
        style_id,
        style,
        outline_level,
    })
}

/// Styles other than `Title` that render a title
fn title_style_names(blocks: &[ResolvedBlock]) -> BTreeSet<String> {
    blocks
        .iter()
        .filter(|resolved| {
            matches!(resolved.block, ContentBlock::Heading { .. })
                && resolved.outline_level.is_none()
                && resolved.style_name != TITLE_STYLE
        })
        .map(|resolved| resolved.style_name.clone())
        .collect()
}

/// Clamp a heading level to the deepest heading style the sheet defines
///
/// When no heading style is defined the level is returned as-is so that
/// resolution reports the missing style.
fn clamp_heading_level(level: u8, styles: &StyleSheet) -> u8 {
    let max = styles.max_heading_level();
    if level > max && max > 0 {
        log::warn!(
            "Heading level {} has no style, clamping to Heading{}",
            level,
            max
        );
        max
    } else {
        level
    }
}

/// Outline level of a heading (`None` for the title)
fn outline_level(level: u8) -> Option<u8> {
    (level > 0).then(|| (level - 1).min(MAX_LIST_LEVEL))
}

/// Numbering instances inferred from list item adjacency
///
/// Each run of consecutive same-kind list items shares one instance. A kind
/// switch or any other block starts a new one, so numbered lists restart.
#[derive(Debug)]
struct ListNumbering {
    /// `w:numId` of each block, by block index
    num_ids: Vec<Option<u32>>,
    /// Kind of each instance; instance `i` has `w:numId` `i + 1`
    instances: Vec<ListKind>,
}

impl ListNumbering {
    fn assign(blocks: &[ContentBlock]) -> Self {
        let mut num_ids = Vec::with_capacity(blocks.len());
        let mut instances = Vec::new();

        let runs = blocks.iter().chunk_by(|block| match block {
            ContentBlock::ListItem { kind, .. } => Some(*kind),
            _ => None,
        });

        for (kind, group) in &runs {
            match kind {
                Some(kind) => {
                    instances.push(kind);
                    let num_id = instances.len() as u32;
                    num_ids.extend(group.map(|_| Some(num_id)));
                }
                None => num_ids.extend(group.map(|_| None)),
            }
        }

        Self { num_ids, instances }
    }

    fn num_id(&self, index: usize) -> Option<u32> {
        self.num_ids.get(index).copied().flatten()
    }
}

/// Generate `word/document.xml`
fn generate_document_xml(
    blocks: &[ResolvedBlock],
    numbering: &ListNumbering,
    theme: &TableTheme,
) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<w:document xmlns:w="{}"><w:body>"#,
        WORDML_NAMESPACE
    ));

    for (index, resolved) in blocks.iter().enumerate() {
        xml.push_str(&generate_block_xml(resolved, numbering.num_id(index), theme));
    }

    xml.push_str(SECTION_PROPERTIES_XML);
    xml.push_str("</w:body></w:document>");
    xml
}

/// Generate OOXML for a single block
fn generate_block_xml(resolved: &ResolvedBlock, num_id: Option<u32>, theme: &TableTheme) -> String {
    let style_id = resolved.style_id;
    let style = resolved.style;

    match resolved.block {
        ContentBlock::Heading { text, .. } => {
            let mut xml = String::from("<w:p>");
            xml.push_str(&paragraph_properties_xml(
                style_id,
                None,
                style.alignment,
                resolved.outline_level,
            ));
            xml.push_str(&generate_run_xml(text, style));
            xml.push_str("</w:p>");
            xml
        }
        ContentBlock::Paragraph {
            runs, alignment, ..
        } => generate_paragraph_xml(runs, alignment.unwrap_or(style.alignment), style_id, style),
        ContentBlock::ListItem { text, indent, .. } => {
            let numbering = num_id.map(|id| (id, (*indent).min(MAX_LIST_LEVEL)));
            let mut xml = String::from("<w:p>");
            xml.push_str(&paragraph_properties_xml(
                style_id,
                numbering,
                style.alignment,
                resolved.outline_level,
            ));
            xml.push_str(&generate_run_xml(text, style));
            xml.push_str("</w:p>");
            xml
        }
        ContentBlock::Table { rows, header, .. } => generate_table_xml(
            rows,
            resolved.block.column_count().unwrap_or(0),
            *header,
            style_id,
            style,
            theme,
        ),
    }
}

/// Generate OOXML for a paragraph, layering each run's overrides on the base style
fn generate_paragraph_xml(
    runs: &[TextRun],
    alignment: Alignment,
    style_id: &str,
    base: &StyleAttributes,
) -> String {
    let mut xml = String::from("<w:p>");
    xml.push_str(&paragraph_properties_xml(
        style_id,
        None,
        alignment,
        Some(BODY_TEXT_OUTLINE_LEVEL),
    ));
    for run in runs {
        let effective = if run.has_formatting() {
            Cow::Owned(base.with_overrides(&run.overrides))
        } else {
            Cow::Borrowed(base)
        };
        xml.push_str(&generate_run_xml(&run.text, &effective));
    }
    xml.push_str("</w:p>");
    xml
}

/// Generate paragraph properties
fn paragraph_properties_xml(
    style_id: &str,
    numbering: Option<(u32, u8)>,
    alignment: Alignment,
    outline_level: Option<u8>,
) -> String {
    let mut xml = format!(r#"<w:pPr><w:pStyle w:val="{}"/>"#, style_id);
    if let Some((num_id, level)) = numbering {
        xml.push_str(&format!(
            r#"<w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr>"#,
            level, num_id
        ));
    }
    xml.push_str(&format!(r#"<w:jc w:val="{}"/>"#, alignment.as_ooxml()));
    if let Some(level) = outline_level {
        xml.push_str(&format!(r#"<w:outlineLvl w:val="{}"/>"#, level));
    }
    xml.push_str("</w:pPr>");
    xml
}

/// Generate OOXML for a text run with fully resolved formatting
///
/// Line breaks in the text (`\n`, `\r\n` or a bare `\r`) become `w:br`
/// elements.
fn generate_run_xml(text: &str, attrs: &StyleAttributes) -> String {
    let mut xml = String::from("<w:r>");
    xml.push_str(&run_properties_xml(attrs, false));

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            xml.push_str("<w:br/>");
        }
        xml.push_str(&format!(
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            escape_xml(line)
        ));
    }

    xml.push_str("</w:r>");
    xml
}

/// Generate run properties for resolved attributes
///
/// With `explicit_off`, bold and italic are switched off explicitly instead
/// of being left out, so a style does not inherit them from its base.
fn run_properties_xml(attrs: &StyleAttributes, explicit_off: bool) -> String {
    let font = escape_xml(&attrs.font_family);
    let mut xml = format!(
        r#"<w:rPr><w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#,
        font
    );
    if attrs.bold {
        xml.push_str("<w:b/><w:bCs/>");
    } else if explicit_off {
        xml.push_str(r#"<w:b w:val="0"/><w:bCs w:val="0"/>"#);
    }
    if attrs.italic {
        xml.push_str("<w:i/><w:iCs/>");
    } else if explicit_off {
        xml.push_str(r#"<w:i w:val="0"/><w:iCs w:val="0"/>"#);
    }
    xml.push_str(&format!(
        r#"<w:color w:val="{}"/><w:sz w:val="{hp}"/><w:szCs w:val="{hp}"/>"#,
        attrs.color.hex(),
        hp = attrs.half_points()
    ));
    xml.push_str("</w:rPr>");
    xml
}

/// Generate OOXML for a table with the theme's borders and header shading
///
/// Every cell holds exactly one paragraph with one run.
fn generate_table_xml(
    rows: &[Vec<String>],
    columns: usize,
    header: bool,
    style_id: &str,
    cell_style: &StyleAttributes,
    theme: &TableTheme,
) -> String {
    let column_width = TEXT_WIDTH_TWIPS / columns.max(1) as u32;
    let border = format!(
        r#"w:val="single" w:sz="{}" w:space="0" w:color="{}""#,
        theme.border_size,
        theme.border_color.hex()
    );
    let header_style = StyleAttributes {
        bold: true,
        ..cell_style.clone()
    };

    let mut xml = String::from("<w:tbl><w:tblPr>");
    xml.push_str(r#"<w:tblW w:w="0" w:type="auto"/>"#);
    xml.push_str(&format!(
        r#"<w:jc w:val="{}"/>"#,
        table_alignment(theme.alignment)
    ));
    xml.push_str("<w:tblBorders>");
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        xml.push_str(&format!("<w:{} {}/>", edge, border));
    }
    xml.push_str("</w:tblBorders></w:tblPr>");

    // Grid columns are required for valid OOXML
    xml.push_str("<w:tblGrid>");
    for _ in 0..columns {
        xml.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, column_width));
    }
    xml.push_str("</w:tblGrid>");

    for (row_idx, row) in rows.iter().enumerate() {
        let is_header = header && row_idx == 0;
        xml.push_str("<w:tr>");
        if is_header {
            xml.push_str("<w:trPr><w:tblHeader/></w:trPr>");
        }

        for cell in row {
            xml.push_str(&format!(
                r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/>"#,
                column_width
            ));
            if let (true, Some(fill)) = (is_header, theme.header_fill) {
                xml.push_str(&format!(
                    r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
                    fill.hex()
                ));
            }
            xml.push_str("</w:tcPr><w:p>");
            xml.push_str(&paragraph_properties_xml(
                style_id,
                None,
                cell_style.alignment,
                Some(BODY_TEXT_OUTLINE_LEVEL),
            ));
            let attrs = if is_header { &header_style } else { cell_style };
            xml.push_str(&generate_run_xml(cell, attrs));
            xml.push_str("</w:p></w:tc>");
        }

        xml.push_str("</w:tr>");
    }

    xml.push_str("</w:tbl>");
    xml
}

/// Value of `w:jc` inside `w:tblPr` (tables cannot be justified)
fn table_alignment(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left | Alignment::Justify => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}

/// Generate `word/styles.xml` from the style sheet
///
/// Styles in `title_styles` are based on `Title`.
fn generate_styles_xml(
    styles: &StyleSheet,
    style_ids: &StyleIds,
    title_styles: &BTreeSet<String>,
) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!(r#"<w:styles xmlns:w="{}">"#, WORDML_NAMESPACE));

    for (name, attrs) in styles.iter() {
        let default = if name == crate::document_model::DEFAULT_PARAGRAPH_STYLE {
            r#" w:default="1""#
        } else {
            ""
        };
        let id = style_ids.get(name).map_or_else(|| style_id(name), str::to_string);
        xml.push_str(&format!(
            r#"<w:style w:type="paragraph"{} w:styleId="{}"><w:name w:val="{}"/>"#,
            default,
            escape_xml(&id),
            escape_xml(&style_display_name(name))
        ));
        let based_on_title = title_styles.contains(name);
        if based_on_title {
            xml.push_str(&format!(r#"<w:basedOn w:val="{}"/>"#, TITLE_STYLE));
        }
        xml.push_str("<w:qFormat/>");
        xml.push_str(&format!(
            r#"<w:pPr><w:jc w:val="{}"/>"#,
            attrs.alignment.as_ooxml()
        ));
        if let Some(level) = heading_level_of_style(name).and_then(outline_level) {
            xml.push_str(&format!(r#"<w:outlineLvl w:val="{}"/>"#, level));
        }
        xml.push_str("</w:pPr>");
        xml.push_str(&run_properties_xml(attrs, based_on_title));
        xml.push_str("</w:style>");
    }

    xml.push_str("</w:styles>");
    xml
}

/// Word's built-in display name for well-known style ids
fn style_display_name(name: &str) -> String {
    match (name, heading_level_of_style(name)) {
        (_, Some(level)) if level > 0 => format!("heading {}", level),
        ("ListBullet", _) => "List Bullet".to_string(),
        ("ListNumber", _) => "List Number".to_string(),
        _ => name.to_string(),
    }
}

/// Whether a style name can be used as its own style id
fn is_plain_style_id(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Candidate style id for a style name (ASCII alphanumerics only)
fn style_id(name: &str) -> String {
    let id: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
    if id.is_empty() {
        "Custom".to_string()
    } else {
        id
    }
}

/// Generate `word/numbering.xml`
fn generate_numbering_xml(numbering: &ListNumbering) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!(r#"<w:numbering xmlns:w="{}">"#, WORDML_NAMESPACE));

    xml.push_str(&abstract_numbering_xml(BULLET_ABSTRACT_ID, ListKind::Bullet));
    xml.push_str(&abstract_numbering_xml(
        NUMBERED_ABSTRACT_ID,
        ListKind::Numbered,
    ));

    for (index, kind) in numbering.instances.iter().enumerate() {
        let abstract_id = match kind {
            ListKind::Bullet => BULLET_ABSTRACT_ID,
            ListKind::Numbered => NUMBERED_ABSTRACT_ID,
        };
        xml.push_str(&format!(
            r#"<w:num w:numId="{}"><w:abstractNumId w:val="{}"/>"#,
            index + 1,
            abstract_id
        ));
        // Instances sharing an abstract definition continue counting unless restarted
        if *kind == ListKind::Numbered {
            for level in 0..=MAX_LIST_LEVEL {
                xml.push_str(&format!(
                    r#"<w:lvlOverride w:ilvl="{}"><w:startOverride w:val="1"/></w:lvlOverride>"#,
                    level
                ));
            }
        }
        xml.push_str("</w:num>");
    }

    xml.push_str("</w:numbering>");
    xml
}

/// Generate the abstract numbering definition for a list kind
fn abstract_numbering_xml(abstract_id: u32, kind: ListKind) -> String {
    let mut xml = format!(
        r#"<w:abstractNum w:abstractNumId="{}"><w:multiLevelType w:val="hybridMultilevel"/>"#,
        abstract_id
    );

    for level in 0..=MAX_LIST_LEVEL {
        let (format, text) = level_format(kind, level);
        let indent = LIST_INDENT_TWIPS * (u32::from(level) + 1);
        xml.push_str(&format!(
            r#"<w:lvl w:ilvl="{}"><w:start w:val="1"/><w:numFmt w:val="{}"/><w:lvlText w:val="{}"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="{}" w:hanging="360"/></w:pPr></w:lvl>"#,
            level, format, text, indent
        ));
    }

    xml.push_str("</w:abstractNum>");
    xml
}

/// Number format and level text for one list level
fn level_format(kind: ListKind, level: u8) -> (&'static str, String) {
    let cycle = usize::from(level % 3);
    match kind {
        ListKind::Bullet => ("bullet", ["•", "◦", "▪"][cycle].to_string()),
        ListKind::Numbered => (
            ["decimal", "lowerLetter", "lowerRoman"][cycle],
            format!("%{}.", level + 1),
        ),
    }
}

/// Generate `docProps/core.xml`
///
/// No creation or modification dates are written so output stays deterministic.
fn generate_core_xml(properties: &DocumentProperties) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(r#"<cp:coreProperties "#);
    xml.push_str(
        r#"xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
    );
    xml.push_str(r#"xmlns:dc="http://purl.org/dc/elements/1.1/" "#);
    xml.push_str(r#"xmlns:dcterms="http://purl.org/dc/terms/" "#);
    xml.push_str(r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" "#);
    xml.push_str(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);

    let fields = [
        ("dc:title", &properties.title),
        ("dc:subject", &properties.subject),
        ("dc:creator", &properties.creator),
        ("cp:keywords", &properties.keywords),
        ("dc:description", &properties.description),
    ];
    for (tag, value) in fields {
        if let Some(value) = value {
            xml.push_str(&format!("<{0}>{1}</{0}>", tag, escape_xml(value)));
        }
    }

    xml.push_str("<cp:revision>1</cp:revision>");
    xml.push_str("</cp:coreProperties>");
    xml
}

/// Pack parts into a ZIP container
fn package(parts: &[(&str, String)]) -> Result<Vec<u8>, DocumentError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    // Fixed timestamp (1980-01-01) so identical input gives identical bytes
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for (name, content) in parts {
        zip.start_file(*name, options)?;
        zip.write_all(content.as_bytes())
            .map_err(zip::result::ZipError::Io)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Escape special XML characters and drop characters XML 1.0 cannot carry
///
/// A carriage return is written as a character reference, since parsers
/// turn a literal one into `\n`.
fn escape_xml(s: &str) -> String {
    s.chars()
        .filter(|c| is_xml_char(*c))
        .collect::<String>()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('\r', "&#13;")
}

/// The XML 1.0 `Char` production
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}
