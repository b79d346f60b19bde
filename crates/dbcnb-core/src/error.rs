//! Error types for DBC conversion operations.

use thiserror::Error;

/// Error types that can occur while converting a DBC archive.
///
/// Per-entry decode and classification failures are not represented here:
/// they degrade to the raw-text fallback inside the converter. This enum
/// covers the conditions that can actually fail an operation — opening the
/// container, serializing output, and writing files.
#[derive(Error, Debug)]
pub enum DbcnbError {
    /// File I/O error while reading the archive or writing notebooks.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error while emitting a notebook document.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The DBC container could not be opened or read.
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// General conversion error.
    #[error("Conversion error: {0}")]
    ConversionError(String),
}

impl From<dbcnb_archive::ArchiveError> for DbcnbError {
    #[inline]
    fn from(err: dbcnb_archive::ArchiveError) -> Self {
        Self::ArchiveError(err.to_string())
    }
}

/// Type alias for [`Result<T, DbcnbError>`].
pub type Result<T> = std::result::Result<T, DbcnbError>;
