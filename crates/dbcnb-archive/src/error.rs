//! Error types for DBC container operations

use thiserror::Error;

/// Errors that can occur while reading a DBC container
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error while opening or reading the archive
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid ZIP/DBC container
    #[error("Invalid DBC archive: {0}")]
    InvalidDbc(#[from] zip::result::ZipError),

    /// The archive is password-protected
    #[error("Archive is password-protected")]
    PasswordProtected,
}
