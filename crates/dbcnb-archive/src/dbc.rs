//! DBC container reading
//!
//! A Databricks DBC export is an ordinary ZIP archive whose entries hold
//! notebook records. This module enumerates and extracts those entries;
//! it does not interpret their contents.

use crate::error::ArchiveError;
use crate::MAX_ENTRY_SIZE;
use log::warn;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

/// Notebook entry extracted from a DBC container
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ExtractedEntry {
    /// Entry name within the archive (sanitized)
    pub name: String,
    /// Entry path, possibly including folder structure from the workspace export
    pub path: PathBuf,
    /// Uncompressed size in bytes
    pub size: usize,
    /// Entry contents as raw bytes
    pub contents: Vec<u8>,
}

/// Metadata for an entry in a DBC container (without extracting contents)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EntryInfo {
    /// Entry name within the archive
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Compressed size in bytes
    pub compressed_size: u64,
}

/// Sanitize an entry path to prevent path traversal (e.g. ../../../etc/passwd).
///
/// Drops parent references, current-dir references, root prefixes and drive
/// letters. Returns None if nothing remains.
#[inline]
fn sanitize_path(path: &str) -> Option<PathBuf> {
    let path = Path::new(path);
    let mut sanitized = PathBuf::new();

    for component in path.components() {
        if let Component::Normal(part) = component {
            sanitized.push(part);
        }
    }

    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Whether an entry is the archive's manifest rather than a notebook record.
///
/// DBC exports carry a `manifest.mf` entry describing the bundle; it never
/// holds notebook content.
#[inline]
fn is_manifest(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with("manifest.mf")
}

/// Extract all notebook entries from a DBC container
///
/// Opens the archive and reads every entry into memory, skipping directory
/// entries, the bundle manifest, and entries above the size cap (with a
/// warning).
///
/// # Errors
///
/// Returns `ArchiveError` if:
/// - The archive cannot be opened
/// - The file is not a valid ZIP/DBC container
/// - The archive is password-protected
///
/// # Examples
///
/// ```no_run
/// use dbcnb_archive::extract_dbc_from_path;
/// use std::path::Path;
///
/// let entries = extract_dbc_from_path(Path::new("export.dbc")).unwrap();
/// for entry in entries {
///     println!("{} ({} bytes)", entry.name, entry.size);
/// }
/// ```
#[must_use = "this function returns extracted entries that should be processed"]
pub fn extract_dbc_from_path(path: &Path) -> Result<Vec<ExtractedEntry>, ArchiveError> {
    let mut entries = Vec::new();
    extract_dbc_streaming(path, |entry| {
        entries.push(entry);
        Ok(())
    })?;
    Ok(entries)
}

/// List the entries of a DBC container without extracting contents
///
/// Reads only the ZIP central directory; nothing is decompressed. Directory
/// entries and the bundle manifest are omitted.
///
/// # Errors
///
/// Returns `ArchiveError` if the archive cannot be opened or is not a valid
/// ZIP/DBC container.
#[must_use = "this function returns the archive listing that should be processed"]
pub fn list_dbc_contents(path: &Path) -> Result<Vec<EntryInfo>, ArchiveError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut archive = ZipArchive::new(reader)?;

    let mut entries = Vec::new();

    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;

        if entry.is_dir() || is_manifest(entry.name()) {
            continue;
        }

        entries.push(EntryInfo {
            name: entry.name().to_string(),
            size: entry.size(),
            compressed_size: entry.compressed_size(),
        });
    }

    Ok(entries)
}

/// Extract notebook entries one at a time
///
/// Processes each entry as it is read instead of collecting the whole
/// archive into memory first. The processor's error aborts the iteration
/// and is returned to the caller.
///
/// # Errors
///
/// Returns `ArchiveError` if archive operations fail, or whatever the
/// processor returns.
///
/// # Examples
///
/// ```no_run
/// use dbcnb_archive::extract_dbc_streaming;
/// use std::path::Path;
///
/// extract_dbc_streaming(Path::new("export.dbc"), |entry| {
///     println!("decoding {}", entry.name);
///     Ok(())
/// }).unwrap();
/// ```
#[must_use = "this function returns a Result that should be checked for errors"]
pub fn extract_dbc_streaming<F>(path: &Path, mut processor: F) -> Result<(), ArchiveError>
where
    F: FnMut(ExtractedEntry) -> Result<(), ArchiveError>,
{
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut archive = ZipArchive::new(reader)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        if entry.is_dir() {
            continue;
        }

        if entry.encrypted() {
            return Err(ArchiveError::PasswordProtected);
        }

        let raw_name = entry.name().to_string();
        let size = entry.size();

        if is_manifest(&raw_name) {
            continue;
        }

        let Some(sanitized_path) = sanitize_path(&raw_name) else {
            warn!("Skipping invalid entry path: {raw_name}");
            continue;
        };
        let name = sanitized_path.to_string_lossy().to_string();

        if size > MAX_ENTRY_SIZE {
            warn!("Skipping oversized entry: {name} ({size} bytes exceeds {MAX_ENTRY_SIZE} bytes limit)");
            continue;
        }

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;

        processor(ExtractedEntry {
            name,
            path: sanitized_path,
            size: contents.len(),
            contents,
        })?;
    }

    Ok(())
}
