//! docforge - structured document assembly
//!
//! A document is described as an ordered sequence of typed content blocks
//! (headings, paragraphs of styled runs, list items and tables) and rendered
//! to a single `.docx` file with consistent styling.
//!
//! ```no_run
//! use docforge::{render, write, DocumentTree, StyleSheet, TextRun};
//! use std::path::Path;
//!
//! let mut tree = DocumentTree::new();
//! tree.add_heading("Title", 0, None);
//! tree.add_paragraph(vec![TextRun::new("Hello")], None);
//! tree.add_table(
//!     vec![
//!         vec!["A".to_string(), "B".to_string()],
//!         vec!["1".to_string(), "2".to_string()],
//!     ],
//!     true,
//! )?;
//!
//! let buffer = render(&tree, &StyleSheet::default())?;
//! write(&buffer, Path::new("out.docx"))?;
//! # Ok::<(), docforge::DocumentError>(())
//! ```

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod content_config;
pub mod document_model;
pub mod docx_reader;
pub mod docx_renderer;
pub mod error;
pub mod style_sheet;
pub mod writer;

pub use content_config::{ContentConfig, ContentConfigError};
pub use document_model::{
    Alignment, ContentBlock, DocumentProperties, DocumentTree, ListKind, Rgb, RunOverrides,
    TextRun, DEFAULT_PARAGRAPH_STYLE,
};
pub use docx_reader::{read_outline, OutlineBlock};
pub use docx_renderer::render;
pub use error::{DocumentError, InvalidColor};
pub use style_sheet::{StyleAttributes, StyleSheet, TableTheme};
pub use writer::write;
