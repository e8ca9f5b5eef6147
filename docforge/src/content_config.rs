//! Content configuration
//!
//! A content file is a TOML document describing what goes into a document:
//! core properties, style overrides, the table theme and an ordered list of
//! blocks. Tables may be written inline or loaded from CSV files that live
//! next to the content file.
//!
//! ```toml
//! [properties]
//! title = "InvoiceFlow"
//!
//! [styles.Title]
//! size = 28
//! color = "F0B90B"
//! align = "center"
//!
//! [[blocks]]
//! type = "heading"
//! text = "InvoiceFlow"
//! level = 0
//!
//! [[blocks]]
//! type = "table"
//! csv = "stack.csv"
//! ```

use crate::document_model::{
    Alignment, DocumentProperties, DocumentTree, ListKind, Rgb, TextRun, DEFAULT_PARAGRAPH_STYLE,
};
use crate::error::{DocumentError, InvalidColor};
use crate::style_sheet::{StyleAttributes, StyleSheet, TableTheme};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_FONT: &str = "Calibri";
const DEFAULT_SIZE_PT: f32 = 11.0;

/// Most blank paragraphs a single spacer block may add
pub const MAX_SPACER_COUNT: usize = 100;

/// Parsed content file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Core document properties
    #[serde(default)]
    pub properties: DocumentProperties,

    /// Style definitions replacing (or adding to) the default style sheet
    #[serde(default)]
    pub styles: BTreeMap<String, StyleConfig>,

    /// Table theme adjustments
    #[serde(default)]
    pub table_theme: Option<TableThemeConfig>,

    /// Blocks in document order
    #[serde(default)]
    pub blocks: Vec<BlockConfig>,
}

/// A complete style definition
///
/// Unset fields take the plain defaults (Calibri 11pt, black, left), never
/// the values of the style being replaced.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleConfig {
    #[serde(default = "default_font")]
    pub font: String,

    #[serde(default = "default_size")]
    pub size: f32,

    /// Hex color such as "365F91"
    pub color: Option<String>,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    #[serde(default)]
    pub align: Alignment,
}

/// Table theme adjustments; unset fields keep the default theme
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableThemeConfig {
    pub border_color: Option<String>,

    /// Border width in eighths of a point
    pub border_size: Option<u8>,

    /// Header cell fill, or "none" to disable shading
    pub header_fill: Option<String>,

    pub align: Option<Alignment>,
}

/// One entry of the `[[blocks]]` array
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum BlockConfig {
    /// A heading (level 0 is the document title)
    Heading {
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
        style: Option<String>,
    },

    /// A paragraph of plain `text`, formatted `runs`, or both (text first)
    Paragraph {
        text: Option<String>,
        #[serde(default)]
        runs: Vec<RunConfig>,
        align: Option<Alignment>,
        style: Option<String>,
    },

    /// Consecutive list items of one kind
    List {
        kind: ListKind,
        items: Vec<String>,
        #[serde(default)]
        indent: u8,
    },

    /// A table from inline `rows` or a `csv` file
    Table {
        #[serde(default)]
        rows: Vec<Vec<String>>,
        csv: Option<PathBuf>,
        #[serde(default = "default_true")]
        header: bool,
        style: Option<String>,
    },

    /// Blank paragraphs
    Spacer {
        #[serde(default = "default_spacer_count")]
        count: usize,
    },
}

/// A formatted text run
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub text: String,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<String>,
    pub size: Option<f32>,
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

fn default_size() -> f32 {
    DEFAULT_SIZE_PT
}

fn default_heading_level() -> u8 {
    1
}

fn default_true() -> bool {
    true
}

fn default_spacer_count() -> usize {
    1
}

/// Errors that can occur when loading or applying a content file
#[derive(Error, Debug)]
pub enum ContentConfigError {
    /// Error reading a file
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Error parsing TOML
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Error reading a CSV table
    #[error("CSV error in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    /// A color value is not a hex triple
    #[error("{context}: {source}")]
    InvalidColor {
        /// Where the color appeared (style name, run or table theme)
        context: String,
        source: InvalidColor,
    },

    /// A block entry is inconsistent
    #[error("Block {index}: {reason}")]
    InvalidBlock { index: usize, reason: String },

    /// A block was rejected by the document tree
    #[error("Block {index}: {source}")]
    Document {
        index: usize,
        source: DocumentError,
    },
}

impl ContentConfig {
    /// Load a content file
    ///
    /// # Parameters
    /// * `path` - Path to the TOML content file
    ///
    /// # Returns
    /// * `Ok(ContentConfig)` - Successfully loaded configuration
    /// * `Err(ContentConfigError)` - Error reading or parsing the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ContentConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ContentConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_str(&content)?;
        log::debug!(
            "Loaded content file {}: {} blocks, {} style overrides",
            path.display(),
            config.blocks.len(),
            config.styles.len()
        );
        Ok(config)
    }

    /// Parse a content file from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ContentConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Build the default style sheet with this file's overrides applied
    pub fn style_sheet(&self) -> Result<StyleSheet, ContentConfigError> {
        let mut sheet = StyleSheet::default();

        for (name, style) in &self.styles {
            let mut attrs = StyleAttributes::new(style.font.clone(), style.size).align(style.align);
            attrs.bold = style.bold;
            attrs.italic = style.italic;
            if let Some(color) = &style.color {
                attrs = attrs.color(parse_color(color, || format!("Style '{}'", name))?);
            }

            if sheet.define(name.clone(), attrs).is_some() {
                log::debug!("Style '{}' replaced", name);
            }
        }

        if let Some(theme) = &self.table_theme {
            sheet.set_table_theme(theme.to_theme()?);
        }

        Ok(sheet)
    }

    /// Populate a document tree from the blocks
    ///
    /// # Parameters
    /// * `base_dir` - Directory that relative CSV paths are resolved against
    ///
    /// # Returns
    /// * `Ok(DocumentTree)` - The populated tree
    /// * `Err(ContentConfigError)` - A CSV file could not be read, a color is
    ///   invalid, or a table is irregular
    pub fn build_tree(&self, base_dir: &Path) -> Result<DocumentTree, ContentConfigError> {
        let mut tree = DocumentTree::new();
        tree.set_properties(self.properties.clone());

        for (index, block) in self.blocks.iter().enumerate() {
            block.append_to(&mut tree, index, base_dir)?;
        }

        log::info!(
            "Built document: {} blocks, {} tables, {} words",
            tree.len(),
            tree.table_count(),
            tree.word_count()
        );
        Ok(tree)
    }
}

impl TableThemeConfig {
    fn to_theme(&self) -> Result<TableTheme, ContentConfigError> {
        let mut theme = TableTheme::default();
        let context = || "Table theme".to_string();

        if let Some(color) = &self.border_color {
            theme.border_color = parse_color(color, context)?;
        }
        if let Some(size) = self.border_size {
            theme.border_size = size;
        }
        match self.header_fill.as_deref() {
            Some("none") => theme.header_fill = None,
            Some(fill) => theme.header_fill = Some(parse_color(fill, context)?),
            None => {}
        }
        if let Some(align) = self.align {
            theme.alignment = align;
        }

        Ok(theme)
    }
}

impl BlockConfig {
    fn append_to(
        &self,
        tree: &mut DocumentTree,
        index: usize,
        base_dir: &Path,
    ) -> Result<(), ContentConfigError> {
        match self {
            BlockConfig::Heading { text, level, style } => {
                tree.add_heading(text.clone(), *level, style.as_deref());
            }
            BlockConfig::Paragraph {
                text,
                runs,
                align,
                style,
            } => {
                let mut text_runs = Vec::with_capacity(runs.len() + 1);
                if let Some(text) = text {
                    text_runs.push(TextRun::new(text.clone()));
                }
                for run in runs {
                    text_runs.push(run.to_text_run(index)?);
                }
                match style {
                    Some(style) => tree.add_styled_paragraph(text_runs, *align, style),
                    None => tree.add_paragraph(text_runs, *align),
                }
            }
            BlockConfig::List {
                kind,
                items,
                indent,
            } => {
                for item in items {
                    tree.add_list_item(item.clone(), *kind, Some(*indent));
                }
            }
            BlockConfig::Table {
                rows,
                csv,
                header,
                style,
            } => {
                let rows = match (csv, rows.is_empty()) {
                    (Some(_), false) => {
                        return Err(ContentConfigError::InvalidBlock {
                            index,
                            reason: "a table takes either `rows` or `csv`, not both".to_string(),
                        })
                    }
                    (Some(csv), true) => load_csv_rows(&base_dir.join(csv))?,
                    (None, _) => rows.clone(),
                };

                let style = style.as_deref().unwrap_or(DEFAULT_PARAGRAPH_STYLE);
                tree.add_styled_table(rows, *header, style)
                    .map_err(|source| ContentConfigError::Document { index, source })?;
            }
            BlockConfig::Spacer { count } => {
                if *count > MAX_SPACER_COUNT {
                    return Err(ContentConfigError::InvalidBlock {
                        index,
                        reason: format!(
                            "spacer count {} exceeds the maximum of {}",
                            count, MAX_SPACER_COUNT
                        ),
                    });
                }
                for _ in 0..*count {
                    tree.add_paragraph(Vec::new(), None);
                }
            }
        }
        Ok(())
    }
}

impl RunConfig {
    fn to_text_run(&self, index: usize) -> Result<TextRun, ContentConfigError> {
        let mut run = TextRun::new(self.text.clone());
        run.overrides.bold = self.bold;
        run.overrides.italic = self.italic;
        run.overrides.size_pt = self.size;
        if let Some(color) = &self.color {
            run.overrides.color = Some(parse_color(color, || format!("Block {} run", index))?);
        }
        Ok(run)
    }
}

fn parse_color(
    value: &str,
    context: impl FnOnce() -> String,
) -> Result<Rgb, ContentConfigError> {
    value
        .parse()
        .map_err(|source| ContentConfigError::InvalidColor {
            context: context(),
            source,
        })
}

/// Load every CSV record as a table row; the first record is the header row
///
/// Records are read flexibly so that a short or long row surfaces as an
/// irregular table rather than a CSV error.
fn load_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, ContentConfigError> {
    let csv_error = |source| ContentConfigError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    log::debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_model::ContentBlock;
    use tempfile::TempDir;

    const CONTENT: &str = r#"
[properties]
title = "InvoiceFlow"
creator = "InvoiceFlow Team"

[styles.Title]
size = 28
color = "F0B90B"
bold = true
align = "center"

[table_theme]
header_fill = "none"
align = "left"

[[blocks]]
type = "heading"
text = "InvoiceFlow"
level = 0

[[blocks]]
type = "heading"
text = "Overview"

[[blocks]]
type = "paragraph"
text = "Status: "
runs = [{ text = "Live", bold = true, color = "00AA00" }]
align = "justify"

[[blocks]]
type = "list"
kind = "numbered"
items = ["Draft", "Funded", "Paid"]

[[blocks]]
type = "spacer"
count = 2

[[blocks]]
type = "table"
header = false
rows = [["GitHub", "https://github.com"]]
"#;

    #[test]
    fn test_parse_and_build_tree() {
        let config = ContentConfig::from_str(CONTENT).unwrap();
        let tree = config.build_tree(Path::new(".")).unwrap();

        assert_eq!(tree.properties().title.as_deref(), Some("InvoiceFlow"));
        // heading, heading, paragraph, 3 list items, 2 spacers, table
        assert_eq!(tree.len(), 9);
        assert_eq!(
            tree.blocks()[1],
            ContentBlock::Heading {
                level: 1,
                text: "Overview".to_string(),
                style: None,
            }
        );

        match &tree.blocks()[2] {
            ContentBlock::Paragraph {
                runs, alignment, ..
            } => {
                assert_eq!(runs.len(), 2);
                assert_eq!(runs[0], TextRun::new("Status: "));
                assert_eq!(runs[1].overrides.bold, Some(true));
                assert_eq!(runs[1].overrides.color, Some(Rgb(0x00, 0xAA, 0x00)));
                assert_eq!(*alignment, Some(Alignment::Justify));
            }
            other => panic!("expected paragraph, got {:?}", other),
        }

        assert!(matches!(
            &tree.blocks()[8],
            ContentBlock::Table { header: false, .. }
        ));
    }

    #[test]
    fn test_style_overrides_replace_whole_style() {
        let config = ContentConfig::from_str(CONTENT).unwrap();
        let sheet = config.style_sheet().unwrap();

        let title = sheet.resolve("Title").unwrap();
        assert_eq!(title.size_pt, 28.0);
        assert_eq!(title.color, Rgb(0xF0, 0xB9, 0x0B));
        assert_eq!(title.alignment, Alignment::Center);
        assert_eq!(title.font_family, "Calibri");
        assert!(title.bold);

        assert_eq!(sheet.table_theme().header_fill, None);
        assert_eq!(sheet.table_theme().alignment, Alignment::Left);
        // Untouched defaults remain
        assert!(sheet.resolve("Heading1").unwrap().bold);
    }

    #[test]
    fn test_invalid_color_is_reported() {
        let config = ContentConfig::from_str(
            r#"
[styles.Callout]
color = "gold"
"#,
        )
        .unwrap();

        match config.style_sheet() {
            Err(ContentConfigError::InvalidColor { context, source }) => {
                assert_eq!(context, "Style 'Callout'");
                assert_eq!(source, InvalidColor("gold".to_string()));
            }
            other => panic!("expected InvalidColor, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_block_type_is_parse_error() {
        let result = ContentConfig::from_str(
            r#"
[[blocks]]
type = "image"
path = "logo.png"
"#,
        );
        assert!(matches!(result, Err(ContentConfigError::Parse(_))));
    }

    #[test]
    fn test_csv_table_relative_to_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("stack.csv"),
            "Layer,Technology\nContracts,Solidity\nAI,\"Risk, scoring\"\n",
        )
        .unwrap();

        let config = ContentConfig::from_str(
            r#"
[[blocks]]
type = "table"
csv = "stack.csv"
"#,
        )
        .unwrap();
        let tree = config.build_tree(temp_dir.path()).unwrap();

        match &tree.blocks()[0] {
            ContentBlock::Table { rows, header, .. } => {
                assert!(*header);
                assert_eq!(rows.len(), 3);
                assert_eq!(rows[0], vec!["Layer", "Technology"]);
                assert_eq!(rows[2], vec!["AI", "Risk, scoring"]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_irregular_csv_reports_block_index() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("bad.csv"), "a,b\n1\n").unwrap();

        let config = ContentConfig::from_str(
            r#"
[[blocks]]
type = "spacer"

[[blocks]]
type = "table"
csv = "bad.csv"
"#,
        )
        .unwrap();

        match config.build_tree(temp_dir.path()) {
            Err(ContentConfigError::Document {
                index,
                source: DocumentError::IrregularTable { row, .. },
            }) => {
                assert_eq!(index, 1);
                assert_eq!(row, 1);
            }
            other => panic!("expected irregular table, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_csv_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = ContentConfig::from_str(
            r#"
[[blocks]]
type = "table"
csv = "absent.csv"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.build_tree(temp_dir.path()),
            Err(ContentConfigError::Csv { .. })
        ));
    }

    #[test]
    fn test_table_with_rows_and_csv_is_rejected() {
        let config = ContentConfig::from_str(
            r#"
[[blocks]]
type = "table"
csv = "a.csv"
rows = [["x"]]
"#,
        )
        .unwrap();

        assert!(matches!(
            config.build_tree(Path::new(".")),
            Err(ContentConfigError::InvalidBlock { index: 0, .. })
        ));
    }

    #[test]
    fn test_oversized_spacer_is_rejected() {
        let config = ContentConfig::from_str(
            r#"
[[blocks]]
type = "paragraph"
text = "Before"

[[blocks]]
type = "spacer"
count = 1000000000
"#,
        )
        .unwrap();

        match config.build_tree(Path::new(".")) {
            Err(ContentConfigError::InvalidBlock { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("spacer count"));
            }
            other => panic!("expected InvalidBlock, got {:?}", other.map(|t| t.len())),
        }

        let config = ContentConfig::from_str(&format!(
            "[[blocks]]\ntype = \"spacer\"\ncount = {}\n",
            MAX_SPACER_COUNT
        ))
        .unwrap();
        assert_eq!(
            config.build_tree(Path::new(".")).unwrap().len(),
            MAX_SPACER_COUNT
        );
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("content.toml");

        match ContentConfig::load(&path) {
            Err(ContentConfigError::Io { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
