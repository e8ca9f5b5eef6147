//! Document model: an ordered, append-only tree of content blocks
//!
//! A [`DocumentTree`] is created empty by the caller, populated through the
//! `add_*` builder operations and then handed to the renderer by reference.
//! Construction order is render order; blocks are never reordered,
//! deduplicated or sorted.

mod blocks;
mod text_run;
mod types;

pub use blocks::ContentBlock;
pub use text_run::{RunOverrides, TextRun};
pub use types::{Alignment, ListKind, Rgb};

use crate::error::DocumentError;
use serde::Deserialize;

/// Name of the style used by paragraphs and table cells unless told otherwise
pub const DEFAULT_PARAGRAPH_STYLE: &str = "Normal";

/// Core document properties written to `docProps/core.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentProperties {
    /// Document title (`dc:title`)
    pub title: Option<String>,

    /// Document subject (`dc:subject`)
    pub subject: Option<String>,

    /// Author (`dc:creator`)
    pub creator: Option<String>,

    /// Free-form description (`dc:description`)
    pub description: Option<String>,

    /// Comma separated keywords (`cp:keywords`)
    pub keywords: Option<String>,
}

/// Ordered sequence of content blocks forming one document
#[derive(Debug, Clone, Default)]
pub struct DocumentTree {
    blocks: Vec<ContentBlock>,
    properties: DocumentProperties,
}

impl DocumentTree {
    /// Create a new empty document tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a heading
    ///
    /// # Parameters
    /// * `text` - Heading text
    /// * `level` - 0 for the document title, 1 and up for section headings
    /// * `style` - Explicit style name, or `None` for the level's default style
    pub fn add_heading(&mut self, text: impl Into<String>, level: u8, style: Option<&str>) {
        self.blocks.push(ContentBlock::Heading {
            level,
            text: text.into(),
            style: style.map(str::to_string),
        });
    }

    /// Append a paragraph in the default paragraph style
    ///
    /// An empty `runs` vector produces a blank spacer paragraph.
    pub fn add_paragraph(&mut self, runs: Vec<TextRun>, alignment: Option<Alignment>) {
        self.add_styled_paragraph(runs, alignment, DEFAULT_PARAGRAPH_STYLE);
    }

    /// Append a paragraph that uses a named style
    pub fn add_styled_paragraph(
        &mut self,
        runs: Vec<TextRun>,
        alignment: Option<Alignment>,
        style: &str,
    ) {
        self.blocks.push(ContentBlock::Paragraph {
            runs,
            alignment,
            style: style.to_string(),
        });
    }

    /// Append a single-run plain paragraph
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.add_paragraph(vec![TextRun::new(text)], None);
    }

    /// Append a list item
    ///
    /// # Parameters
    /// * `text` - Item text
    /// * `kind` - Bullet or numbered
    /// * `indent` - Nesting depth, `None` for the top level
    pub fn add_list_item(&mut self, text: impl Into<String>, kind: ListKind, indent: Option<u8>) {
        self.blocks.push(ContentBlock::ListItem {
            text: text.into(),
            kind,
            indent: indent.unwrap_or(0),
        });
    }

    /// Append a table whose cells use the default paragraph style
    ///
    /// # Parameters
    /// * `rows` - Rows of cell text
    /// * `header` - Whether the first row is rendered as a bold header row
    ///
    /// # Returns
    /// * `Ok(())` - The table was appended
    /// * `Err(DocumentError::IrregularTable)` - A row's cell count differs from
    ///   the first row's (or the table is empty); the tree is left unchanged
    pub fn add_table(&mut self, rows: Vec<Vec<String>>, header: bool) -> Result<(), DocumentError> {
        self.add_styled_table(rows, header, DEFAULT_PARAGRAPH_STYLE)
    }

    /// Append a table whose cells use a named style
    pub fn add_styled_table(
        &mut self,
        rows: Vec<Vec<String>>,
        header: bool,
        style: &str,
    ) -> Result<(), DocumentError> {
        check_table_shape(&rows)?;
        self.blocks.push(ContentBlock::Table {
            rows,
            header,
            style: style.to_string(),
        });
        Ok(())
    }

    /// Blocks in construction order
    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if no block has been appended
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Core document properties
    pub fn properties(&self) -> &DocumentProperties {
        &self.properties
    }

    /// Replace the core document properties
    pub fn set_properties(&mut self, properties: DocumentProperties) {
        self.properties = properties;
    }

    /// Get the total word count across all blocks
    pub fn word_count(&self) -> usize {
        self.blocks.iter().map(ContentBlock::word_count).sum()
    }

    /// Get the total number of tables
    pub fn table_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, ContentBlock::Table { .. }))
            .count()
    }
}

/// Check that a table is non-empty and every row matches the first row's width
fn check_table_shape(rows: &[Vec<String>]) -> Result<(), DocumentError> {
    let expected = rows.first().map_or(0, Vec::len);
    if expected == 0 {
        return Err(DocumentError::IrregularTable {
            row: 0,
            expected: 1,
            actual: 0,
        });
    }

    match rows.iter().position(|row| row.len() != expected) {
        Some(row) => Err(DocumentError::IrregularTable {
            row,
            expected,
            actual: rows[row].len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_construction_order_is_preserved() {
        let mut tree = DocumentTree::new();
        tree.add_heading("InvoiceFlow", 0, None);
        tree.add_paragraph(Vec::new(), None);
        tree.add_list_item("b", ListKind::Bullet, None);
        tree.add_list_item("a", ListKind::Bullet, None);
        tree.add_text("Hello");

        let kinds: Vec<&str> = tree.blocks().iter().map(ContentBlock::kind_name).collect();
        assert_eq!(
            kinds,
            vec!["Heading", "Paragraph", "ListItem", "ListItem", "Paragraph"]
        );

        // Same-text items are kept in insertion order, never sorted
        match (&tree.blocks()[2], &tree.blocks()[3]) {
            (
                ContentBlock::ListItem { text: first, .. },
                ContentBlock::ListItem { text: second, .. },
            ) => {
                assert_eq!(first, "b");
                assert_eq!(second, "a");
            }
            other => panic!("unexpected blocks: {:?}", other),
        }
    }

    #[test]
    fn test_defaults_applied_by_builder() {
        let mut tree = DocumentTree::new();
        tree.add_text("Hello");
        tree.add_list_item("step", ListKind::Numbered, None);

        assert_eq!(
            tree.blocks()[0],
            ContentBlock::Paragraph {
                runs: vec![TextRun::new("Hello")],
                alignment: None,
                style: "Normal".to_string(),
            }
        );
        assert_eq!(
            tree.blocks()[1],
            ContentBlock::ListItem {
                text: "step".to_string(),
                kind: ListKind::Numbered,
                indent: 0,
            }
        );
    }

    #[test]
    fn test_irregular_table_leaves_tree_unchanged() {
        let mut tree = DocumentTree::new();
        tree.add_text("before");

        let result = tree.add_table(vec![row(&["A", "B"]), row(&["1"])], true);

        match result {
            Err(DocumentError::IrregularTable {
                row,
                expected,
                actual,
            }) => {
                assert_eq!(row, 1);
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected IrregularTable, got {:?}", other),
        }
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.table_count(), 0);
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let mut tree = DocumentTree::new();
        assert!(matches!(
            tree.add_table(Vec::new(), true),
            Err(DocumentError::IrregularTable { .. })
        ));
        assert!(matches!(
            tree.add_table(vec![Vec::new()], false),
            Err(DocumentError::IrregularTable { .. })
        ));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_regular_table_is_appended() {
        let mut tree = DocumentTree::new();
        tree.add_table(vec![row(&["A", "B"]), row(&["1", "2"])], true)
            .unwrap();

        assert_eq!(tree.table_count(), 1);
        assert_eq!(tree.blocks()[0].column_count(), Some(2));
        assert_eq!(tree.word_count(), 4);
    }
}
