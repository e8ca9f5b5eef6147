//! docforge - structured document assembly tool
//!
//! A CLI tool for building styled .docx documents from TOML content files
//! and inspecting the documents it produces.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(missing_docs))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use docforge::{ContentConfig, StyleSheet};
use std::path::{Path, PathBuf};

/// Main entry point for the docforge CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            content,
            output,
            verbose,
        } => {
            handle_build_command(content, output, verbose)?;
        }

        Commands::Inspect { path, verbose } => {
            handle_inspect_command(&path, verbose)?;
        }

        Commands::ListStyles => {
            handle_list_styles_command();
        }
    }

    Ok(())
}

/// Initialize logging at info level
fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

/// Handle the build command
fn handle_build_command(content: PathBuf, output: Option<PathBuf>, verbose: bool) -> Result<()> {
    let output = resolve_output_path(&content, output);

    if verbose {
        init_logging();
    }

    println!("Building document...");
    println!("Content: {}", content.display());
    println!("Output: {}", output.display());

    // Stage 1: Load the content file and assemble the document tree
    println!("\n[Stage 1/3] Loading content...");
    let config = ContentConfig::load(&content)
        .with_context(|| format!("Failed to load content from {}", content.display()))?;
    let base_dir = content.parent().unwrap_or_else(|| Path::new("."));
    let tree = config
        .build_tree(base_dir)
        .with_context(|| format!("Failed to assemble document from {}", content.display()))?;
    let styles = config
        .style_sheet()
        .with_context(|| "Failed to apply style overrides")?;

    println!(
        "✓ Assembled {} blocks ({} tables, {} words)",
        tree.len(),
        tree.table_count(),
        tree.word_count()
    );

    // Stage 2: Render to an in-memory package
    println!("\n[Stage 2/3] Rendering DOCX...");
    let buffer = docforge::render(&tree, &styles).with_context(|| "Failed to render document")?;
    println!("✓ Rendered {} bytes", buffer.len());

    // Stage 3: Write the output file
    println!("\n[Stage 3/3] Writing output...");
    docforge::write(&buffer, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("✓ Document written to {}", output.display());

    Ok(())
}

/// Output path for a build: the explicit path (with .docx added when it has
/// no extension) or the content file name with a .docx extension
fn resolve_output_path(content: &Path, output: Option<PathBuf>) -> PathBuf {
    match output {
        Some(mut path) => {
            if path.extension().is_none() {
                path.set_extension("docx");
            }
            path
        }
        None => content.with_extension("docx"),
    }
}

/// Handle the inspect command
fn handle_inspect_command(path: &Path, verbose: bool) -> Result<()> {
    if verbose {
        init_logging();
    }

    let buffer =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let outline = docforge::read_outline(&buffer)
        .with_context(|| format!("Failed to read outline of {}", path.display()))?;

    println!("{} ({} blocks)\n", path.display(), outline.len());
    for (index, block) in outline.iter().enumerate() {
        println!("{:>4}  {}", index, block);
    }

    Ok(())
}

/// Handle the list-styles command
fn handle_list_styles_command() {
    let sheet = StyleSheet::default();
    println!("Default styles:\n");

    for (name, attrs) in sheet.iter() {
        let mut flags = Vec::new();
        if attrs.bold {
            flags.push("bold");
        }
        if attrs.italic {
            flags.push("italic");
        }
        println!(
            "  {:<12} {} {}pt {} {:?}{}",
            name,
            attrs.font_family,
            attrs.size_pt,
            attrs.color,
            attrs.alignment,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            }
        );
    }

    let theme = sheet.table_theme();
    println!(
        "\nTable theme: borders {} ({}/8 pt), header fill {}, {:?}",
        theme.border_color,
        theme.border_size,
        theme
            .header_fill
            .map_or_else(|| "none".to_string(), |fill| fill.to_string()),
        theme.alignment
    );
    println!("\nOverride styles in a content file with [styles.<Name>] tables.");
}
