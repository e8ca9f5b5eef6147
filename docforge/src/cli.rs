//! Command-line interface definitions for docforge

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the docforge application
#[derive(Parser)]
#[command(name = "docforge")]
#[command(version)]
#[command(about = "Assemble styled .docx documents from structured content", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for docforge
#[derive(Subcommand)]
pub enum Commands {
    /// Build a .docx document from a TOML content file
    Build {
        /// Content file describing the document
        #[arg(value_name = "CONTENT")]
        content: PathBuf,

        /// Output file path (defaults to the content file name with .docx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the block outline of a .docx built by docforge
    Inspect {
        /// Document to inspect
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the styles of the default style sheet
    ListStyles,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_with_output() {
        let cli = Cli::try_parse_from([
            "docforge",
            "build",
            "demos/invoiceflow.toml",
            "-o",
            "out.docx",
            "-v",
        ])
        .unwrap();

        match cli.command {
            Commands::Build {
                content,
                output,
                verbose,
            } => {
                assert_eq!(content, PathBuf::from("demos/invoiceflow.toml"));
                assert_eq!(output, Some(PathBuf::from("out.docx")));
                assert!(verbose);
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_build_requires_content() {
        assert!(Cli::try_parse_from(["docforge", "build"]).is_err());
    }
}
