//! Notebook language identification.
//!
//! Databricks exports spell languages inconsistently ("python", "py",
//! "PYTHON", "rscript", ...), so everything funnels through
//! [`Language::normalize`] before it reaches kernel metadata.

use std::fmt;
use std::str::FromStr;

/// Programming language of a notebook or of an individual cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Language {
    /// Python (the Databricks default)
    #[default]
    Python,
    /// SQL
    Sql,
    /// Scala
    Scala,
    /// R
    R,
    /// Any other language, kept verbatim (lowercased)
    Other(String),
}

impl Language {
    /// Normalize a raw language string from a DBC payload.
    ///
    /// Matching is deliberately loose: any spelling containing "py" maps to
    /// Python, "sql" to SQL, "scala" to Scala; "r" and "rscript" map to R.
    /// Empty input falls back to Python.
    #[must_use = "returns the normalized language"]
    pub fn normalize(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() || lower.contains("py") {
            Self::Python
        } else if lower.contains("sql") {
            Self::Sql
        } else if lower.contains("scala") {
            Self::Scala
        } else if lower == "r" || lower == "rscript" {
            Self::R
        } else {
            Self::Other(lower)
        }
    }

    /// Map a `%magic` token to a language, if it names one.
    ///
    /// Only the language magics are mapped; workflow magics (`%run`, `%sh`,
    /// `%pip`, ...) return None.
    #[must_use = "returns the language named by the magic, if any"]
    pub fn from_magic(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "python" | "py" | "pyspark" => Some(Self::Python),
            "sql" => Some(Self::Sql),
            "scala" => Some(Self::Scala),
            "r" => Some(Self::R),
            _ => None,
        }
    }

    /// Canonical lowercase name ("python", "sql", ...).
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Python => "python",
            Self::Sql => "sql",
            Self::Scala => "scala",
            Self::R => "r",
            Self::Other(name) => name,
        }
    }

    /// Jupyter kernel name for this language.
    #[must_use]
    pub fn kernel_name(&self) -> &str {
        match self {
            Self::Python => "python3",
            other => other.name(),
        }
    }

    /// Human-readable kernel display name.
    #[must_use]
    pub fn kernel_display_name(&self) -> &str {
        match self {
            Self::Python => "Python 3",
            other => other.name(),
        }
    }
}

impl fmt::Display for Language {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}
