//! # dbcnb-convert
//!
//! The conversion core of dbcnb: decode a DBC archive entry's bytes into
//! JSON (through whatever nesting of base64/gzip/zlib wraps it), classify
//! the payload's notebook schema, and assemble Jupyter notebook documents.
//!
//! The pieces are usable separately — [`decode_entry`] and
//! [`build_notebooks`] are plain functions — but most callers want
//! [`DbcConverter`]:
//!
//! ```no_run
//! use dbcnb_convert::{default_output_dir, DbcConverter};
//! use std::path::Path;
//!
//! let archive = Path::new("export.dbc");
//! let converter = DbcConverter::new();
//! let report = converter.convert_to_dir(archive, default_output_dir(archive))?;
//! println!("{} notebook(s) written", report.written.len());
//! # Ok::<(), dbcnb_core::DbcnbError>(())
//! ```

/// Payload schema classification and notebook assembly
pub mod builder;
/// The archive-to-directory conversion pipeline
pub mod converter;
/// Entry byte decoding (JSON / base64 / gzip / zlib chains)
pub mod decode;

pub use builder::{build_notebooks, ConvertedNotebook, COMMAND_BOUNDARY};
pub use converter::{
    default_output_dir, ConversionReport, ConvertOptions, DbcConverter, EntryFailure,
};
pub use decode::{decode_entry, try_decode_json, DecodedPayload};
