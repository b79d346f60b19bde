//! # dbcnb-core
//!
//! Core types for dbcnb, the Databricks DBC → Jupyter notebook converter:
//!
//! - the ipynb (nbformat 4) output model ([`NotebookDocument`] and friends)
//! - notebook [`Language`] normalization and kernel naming
//! - the umbrella [`DbcnbError`] type
//!
//! ## Example
//!
//! ```
//! use dbcnb_core::{Language, NotebookCell, NotebookDocument};
//!
//! let document = NotebookDocument::new(
//!     vec![
//!         NotebookCell::markdown("# Report"),
//!         NotebookCell::code("print('hello')"),
//!     ],
//!     &Language::Python,
//! );
//! let json = document.to_json_string()?;
//! assert!(json.contains("\"nbformat\": 4"));
//! # Ok::<(), dbcnb_core::DbcnbError>(())
//! ```

/// Error types for conversion operations
pub mod error;
/// Notebook language identification
pub mod language;
/// Jupyter notebook output model
pub mod notebook;

pub use error::{DbcnbError, Result};
pub use language::Language;
pub use notebook::{
    CellMetadata, KernelSpec, LanguageInfo, NotebookCell, NotebookDocument, NotebookMetadata,
    NBFORMAT, NBFORMAT_MINOR,
};
