//! DBC container support for dbcnb
//!
//! This crate reads Databricks DBC export archives (ZIP containers) and
//! hands each notebook entry's raw bytes to the conversion layer. It knows
//! nothing about notebook encodings; decoding lives in `dbcnb-convert`.
//!
//! # Usage
//!
//! ## Extract all entries
//!
//! ```no_run
//! use dbcnb_archive::extract_dbc_from_path;
//! use std::path::Path;
//!
//! let entries = extract_dbc_from_path(Path::new("export.dbc")).unwrap();
//! for entry in entries {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//! ```
//!
//! ## Stream entries for large archives
//!
//! ```no_run
//! use dbcnb_archive::extract_dbc_streaming;
//! use std::path::Path;
//!
//! extract_dbc_streaming(Path::new("export.dbc"), |entry| {
//!     println!("processing {}", entry.name);
//!     Ok(())
//! }).unwrap();
//! ```

pub mod dbc;
pub mod error;

/// Maximum size for a single entry within an archive (100 MB).
///
/// Entries above this limit are skipped during extraction to keep a
/// malformed or hostile archive from exhausting memory.
pub const MAX_ENTRY_SIZE: u64 = 100_000_000;

pub use dbc::{extract_dbc_from_path, extract_dbc_streaming, list_dbc_contents};
pub use dbc::{EntryInfo, ExtractedEntry};
pub use error::ArchiveError;
