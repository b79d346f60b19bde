//! Jupyter notebook (nbformat 4) output model.
//!
//! This is the emission-side counterpart of nbformat: just enough structure
//! to write well-formed `.ipynb` files — ordered typed cells plus kernelspec
//! and language_info metadata. Cell outputs are always empty; DBC exports do
//! not carry execution results in a form worth preserving.

use crate::error::Result;
use crate::language::Language;
use serde::Serialize;

/// Notebook format major version emitted by this crate.
pub const NBFORMAT: u32 = 4;
/// Notebook format minor version emitted by this crate.
pub const NBFORMAT_MINOR: u32 = 5;

/// A complete notebook document ready to be written as `.ipynb` JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookDocument {
    /// Ordered list of cells
    pub cells: Vec<NotebookCell>,
    /// Notebook-level metadata (kernel and language)
    pub metadata: NotebookMetadata,
    /// Format major version (always [`NBFORMAT`])
    pub nbformat: u32,
    /// Format minor version (always [`NBFORMAT_MINOR`])
    pub nbformat_minor: u32,
}

impl NotebookDocument {
    /// Assemble a document from cells and the notebook-level language.
    #[must_use = "creates a document that should be serialized or inspected"]
    pub fn new(cells: Vec<NotebookCell>, language: &Language) -> Self {
        Self {
            cells,
            metadata: NotebookMetadata::for_language(language),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }

    /// Serialize to pretty-printed ipynb JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// One notebook cell, tagged by kind.
///
/// Serializes with the nbformat `cell_type` discriminator; code cells carry
/// the `execution_count` and `outputs` fields the format requires.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cell_type", rename_all = "snake_case")]
pub enum NotebookCell {
    /// Executable code cell
    Code {
        /// Cell source text
        source: String,
        /// Cell-level metadata
        metadata: CellMetadata,
        /// Execution count (always null; DBC exports carry none)
        execution_count: Option<u32>,
        /// Cell outputs (always empty)
        outputs: Vec<serde_json::Value>,
    },
    /// Markdown documentation cell
    Markdown {
        /// Cell source text
        source: String,
        /// Cell-level metadata
        metadata: CellMetadata,
    },
}

impl NotebookCell {
    /// Create a code cell in the notebook's default language.
    #[must_use]
    pub fn code(source: impl Into<String>) -> Self {
        Self::Code {
            source: source.into(),
            metadata: CellMetadata::default(),
            execution_count: None,
            outputs: Vec::new(),
        }
    }

    /// Create a code cell tagged with an explicit per-cell language.
    #[must_use]
    pub fn code_in(source: impl Into<String>, language: &Language) -> Self {
        Self::Code {
            source: source.into(),
            metadata: CellMetadata {
                language: Some(language.to_string()),
            },
            execution_count: None,
            outputs: Vec::new(),
        }
    }

    /// Create a markdown cell.
    #[must_use]
    pub fn markdown(source: impl Into<String>) -> Self {
        Self::Markdown {
            source: source.into(),
            metadata: CellMetadata::default(),
        }
    }

    /// The cell's source text.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Code { source, .. } | Self::Markdown { source, .. } => source,
        }
    }

    /// Whether this is a code cell.
    #[must_use]
    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code { .. })
    }

    /// The cell's explicit language tag, if one was set.
    #[must_use]
    pub fn language_tag(&self) -> Option<&str> {
        match self {
            Self::Code { metadata, .. } | Self::Markdown { metadata, .. } => {
                metadata.language.as_deref()
            }
        }
    }
}

/// Cell-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CellMetadata {
    /// Per-cell language override (set when a line magic retags a cell)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Notebook-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NotebookMetadata {
    /// Kernel specification derived from the notebook language
    pub kernelspec: KernelSpec,
    /// Language information
    pub language_info: LanguageInfo,
}

impl NotebookMetadata {
    /// Derive kernel and language metadata from a notebook language.
    #[must_use]
    pub fn for_language(language: &Language) -> Self {
        Self {
            kernelspec: KernelSpec {
                display_name: language.kernel_display_name().to_string(),
                language: language.name().to_string(),
                name: language.kernel_name().to_string(),
            },
            language_info: LanguageInfo {
                name: language.name().to_string(),
            },
        }
    }
}

/// Jupyter kernel specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct KernelSpec {
    /// Human-readable kernel name (e.g. "Python 3")
    pub display_name: String,
    /// Language the kernel runs (e.g. "python")
    pub language: String,
    /// Kernel identifier (e.g. "python3")
    pub name: String,
}

/// Notebook language information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LanguageInfo {
    /// Language name (e.g. "python")
    pub name: String,
}
