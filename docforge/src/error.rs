//! Error types for document assembly, rendering and output

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, rendering, writing or reading a document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// A block references a style that the active style sheet does not define
    #[error("Unknown style '{name}': it is not defined in the active style sheet")]
    UnknownStyle {
        /// The unresolved style name
        name: String,
    },

    /// A table row does not have the same number of cells as the first row
    #[error("Irregular table: row {row} has {actual} cells, expected {expected}")]
    IrregularTable {
        /// Zero-based index of the offending row
        row: usize,
        /// Cell count of the first row
        expected: usize,
        /// Cell count of the offending row
        actual: usize,
    },

    /// Filesystem failure while writing the output artifact
    #[error("IO error writing {}: {source}", path.display())]
    Io {
        /// Target path of the write
        path: PathBuf,
        /// Underlying cause
        source: std::io::Error,
    },

    /// ZIP container error while packaging or unpacking a document
    #[error("ZIP error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Malformed XML inside a document package
    #[error("XML error: {0}")]
    Xml(String),

    /// A required part is missing from a document package
    #[error("Missing package part: {0}")]
    MissingPart(String),
}

/// A color string that is not a six digit hex triple
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid color '{0}': expected six hex digits such as \"F0B90B\"")]
pub struct InvalidColor(pub String);
