//! dbcnb - Convert Databricks DBC archives into Jupyter notebooks.
//!
//! Thin wrapper around `dbcnb-convert`: argument parsing, output directory
//! defaulting, and status reporting. All conversion logic lives in the
//! library crates.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use dbcnb_archive::list_dbc_contents;
use dbcnb_convert::{default_output_dir, ConvertOptions, DbcConverter};
use dbcnb_core::Language;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dbcnb",
    version,
    about = "Convert Databricks DBC archives into Jupyter notebooks"
)]
struct Cli {
    /// Path to the DBC archive to convert
    archive: PathBuf,

    /// Output directory (default: <archive>_ipynb next to the archive)
    output: Option<PathBuf>,

    /// List archive entries instead of converting
    #[arg(long)]
    list: bool,

    /// Language assumed when a notebook declares none
    #[arg(long, default_value = "python")]
    language: String,

    /// Suppress per-file progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        let entries = list_dbc_contents(&cli.archive)
            .with_context(|| format!("failed to read {}", cli.archive.display()))?;
        for entry in entries {
            println!("{} ({} bytes)", entry.name, entry.size);
        }
        return Ok(());
    }

    let out_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_dir(&cli.archive));
    let options =
        ConvertOptions::default().with_fallback_language(Language::normalize(&cli.language));
    let converter = DbcConverter::with_options(options);

    let report = converter
        .convert_to_dir(&cli.archive, &out_dir)
        .with_context(|| format!("failed to convert {}", cli.archive.display()))?;

    if !cli.quiet {
        for path in &report.written {
            println!("{} {}", "✓".green(), path.display());
        }
    }
    for failure in &report.failures {
        eprintln!("{} {}: {}", "✗".red(), failure.entry, failure.message);
    }
    if !cli.quiet {
        println!(
            "{} notebook(s) written to {}",
            report.written.len(),
            out_dir.display()
        );
    }

    Ok(())
}
