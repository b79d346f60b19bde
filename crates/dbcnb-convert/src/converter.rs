//! The conversion pipeline: archive in, `.ipynb` files out.
//!
//! [`DbcConverter`] strings the pieces together: iterate archive entries,
//! decode each entry's bytes, build notebook documents, write them. Only
//! archive-level problems fail a conversion; per-entry decode failures
//! degrade to raw-text notebooks and per-file write failures are collected
//! in the [`ConversionReport`] without aborting the remaining entries.

use crate::builder::{build_notebooks, ConvertedNotebook};
use crate::decode::decode_entry;
use dbcnb_archive::{extract_dbc_from_path, extract_dbc_streaming};
use dbcnb_core::{Language, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Options controlling conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    /// Language assumed when nothing in a payload indicates one
    pub fallback_language: Language,
}

impl ConvertOptions {
    /// Set the language assumed when a notebook declares none.
    #[inline]
    #[must_use = "returns options with the fallback language configured"]
    pub fn with_fallback_language(mut self, language: Language) -> Self {
        self.fallback_language = language;
        self
    }
}

/// Converts DBC archives into Jupyter notebook documents.
#[derive(Debug, Clone, Default)]
pub struct DbcConverter {
    options: ConvertOptions,
}

/// Outcome of writing an archive's notebooks to a directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionReport {
    /// Paths of the notebook files written, in conversion order
    pub written: Vec<PathBuf>,
    /// Per-entry write failures; these never abort sibling entries
    pub failures: Vec<EntryFailure>,
}

/// A single entry whose output could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryFailure {
    /// Archive entry the notebook came from
    pub entry: String,
    /// Why the write failed
    pub message: String,
}

impl DbcConverter {
    /// Create a converter with default options.
    #[must_use = "creates a converter that should be used for conversion"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with explicit options.
    #[must_use = "creates a converter that should be used for conversion"]
    pub const fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// The converter's options.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert one archive entry's bytes into notebook documents.
    ///
    /// Never fails: undecodable bytes degrade to a raw-text single-cell
    /// notebook, and blank entries produce an empty vec.
    #[must_use = "this function returns the converted notebooks that should be written"]
    pub fn convert_entry(&self, entry_name: &str, bytes: &[u8]) -> Vec<ConvertedNotebook> {
        let payload = decode_entry(bytes);
        let stem = entry_stem(entry_name);
        build_notebooks(&payload, &stem, &self.options)
    }

    /// Convert every entry of a DBC archive, without writing anything.
    ///
    /// # Errors
    ///
    /// Fails only for archive-level problems (missing file, not a valid DBC
    /// container, password-protected).
    pub fn convert_archive<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ConvertedNotebook>> {
        let entries = extract_dbc_from_path(path.as_ref())?;
        Ok(entries
            .iter()
            .flat_map(|entry| self.convert_entry(&entry.name, &entry.contents))
            .collect())
    }

    /// Convert a DBC archive and write one `.ipynb` file per notebook.
    ///
    /// The output directory is created if needed. File names come from each
    /// notebook's resolved name; collisions get `_1`, `_2`, ... suffixes.
    /// A file that cannot be written is recorded in the report's failures
    /// and processing continues with the remaining entries.
    ///
    /// # Errors
    ///
    /// Fails only for archive-level problems or if the output directory
    /// cannot be created.
    pub fn convert_to_dir<P, Q>(&self, archive: P, out_dir: Q) -> Result<ConversionReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let out_dir = out_dir.as_ref();
        fs::create_dir_all(out_dir)?;

        let mut report = ConversionReport::default();

        extract_dbc_streaming(archive.as_ref(), |entry| {
            for notebook in self.convert_entry(&entry.name, &entry.contents) {
                match write_notebook(out_dir, &notebook) {
                    Ok(path) => report.written.push(path),
                    Err(err) => {
                        log::warn!("failed to write notebook for {}: {err}", entry.name);
                        report.failures.push(EntryFailure {
                            entry: entry.name.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
            Ok(())
        })?;

        Ok(report)
    }
}

/// Default output directory for an archive: `<archive_basename>_ipynb`,
/// created beside the archive.
#[must_use = "returns the directory conversion output should be written to"]
pub fn default_output_dir(archive: &Path) -> PathBuf {
    let stem = archive
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dbc".to_string());
    archive.with_file_name(format!("{stem}_ipynb"))
}

/// Serialize one notebook and write it under the output directory.
fn write_notebook(out_dir: &Path, notebook: &ConvertedNotebook) -> Result<PathBuf> {
    let file_name = sanitize_file_name(&notebook.name);
    let path = unique_path(out_dir.join(format!("{file_name}.ipynb")));
    let json = notebook.document.to_json_string()?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Flatten a notebook name into a single file-name component.
fn sanitize_file_name(name: &str) -> String {
    let flattened = name.replace(['/', '\\'], "_");
    let trimmed = flattened.trim();
    if trimmed.is_empty() {
        "notebook".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Find a path that does not exist yet by suffixing `_1`, `_2`, ...
fn unique_path(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "notebook".to_string());
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();

    for i in 1.. {
        let file_name = if extension.is_empty() {
            format!("{stem}_{i}")
        } else {
            format!("{stem}_{i}.{extension}")
        };
        let candidate = path.with_file_name(file_name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("some suffixed path must be free")
}

/// Stem of an archive entry name, used when a payload carries no name.
fn entry_stem(entry_name: &str) -> String {
    Path::new(entry_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "notebook".to_string())
}
