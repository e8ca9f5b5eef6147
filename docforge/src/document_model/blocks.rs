//! Block-level document elements
//!
//! This module defines the tagged variant of content blocks that make up a
//! document tree: headings, paragraphs, list items and tables.

use super::text_run::TextRun;
use super::types::{Alignment, ListKind};

/// Block-level document element
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// A heading
    Heading {
        /// Heading level (0 = document title, 1 = h1, 2 = h2, etc.)
        level: u8,
        /// Heading text
        text: String,
        /// Explicit style name; `None` uses the level's default style
        style: Option<String>,
    },

    /// A paragraph of formatted text
    ///
    /// An empty run list is a blank spacer paragraph.
    Paragraph {
        /// Text runs in rendering order
        runs: Vec<TextRun>,
        /// Alignment override; `None` uses the style's alignment
        alignment: Option<Alignment>,
        /// Paragraph style name
        style: String,
    },

    /// A single bulleted or numbered list entry
    ///
    /// Consecutive items of the same kind form one visual list; there is no
    /// grouping object.
    ListItem {
        /// Item text
        text: String,
        /// Bullet or numbered
        kind: ListKind,
        /// Nesting depth (0 = top level)
        indent: u8,
    },

    /// A table of plain-text cells
    Table {
        /// Rows of cell text; every row has the same cell count
        rows: Vec<Vec<String>>,
        /// Whether the first row is a bold header row
        header: bool,
        /// Style name used for cell text
        style: String,
    },
}

impl ContentBlock {
    /// Get a human-readable name for this block type
    pub fn kind_name(&self) -> &'static str {
        match self {
            ContentBlock::Heading { .. } => "Heading",
            ContentBlock::Paragraph { .. } => "Paragraph",
            ContentBlock::ListItem { .. } => "ListItem",
            ContentBlock::Table { .. } => "Table",
        }
    }

    /// Get the word count for this content block
    pub fn word_count(&self) -> usize {
        match self {
            ContentBlock::Heading { text, .. } | ContentBlock::ListItem { text, .. } => {
                text.split_whitespace().count()
            }
            ContentBlock::Paragraph { runs, .. } => runs
                .iter()
                .map(|run| run.text.split_whitespace().count())
                .sum(),
            ContentBlock::Table { rows, .. } => rows
                .iter()
                .flatten()
                .map(|cell| cell.split_whitespace().count())
                .sum(),
        }
    }

    /// Number of columns of a table block, `None` for other blocks
    pub fn column_count(&self) -> Option<usize> {
        match self {
            ContentBlock::Table { rows, .. } => Some(rows.first().map_or(0, Vec::len)),
            _ => None,
        }
    }
}
