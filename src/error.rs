//! Error types surfaced by the analysis pipeline.
//!
//! Loader failures are reported as [`LoadError`]; everything the pipeline can
//! reject is folded into [`AnalysisError`]. Callers use
//! [`AnalysisError::is_user_error`] to tell a fixable upload apart from an
//! internal failure.

use std::fmt;

use thiserror::Error;

/// Which uploaded file an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot {
    First,
    Second,
    /// Single-file mode.
    Only,
}

impl fmt::Display for FileSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSlot::First => write!(f, "File 1"),
            FileSlot::Second => write!(f, "File 2"),
            FileSlot::Only => write!(f, "File"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to parse delimited text: {0}")]
    Delimited(String),
    #[error("Failed to read workbook: {0}")]
    Workbook(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{file} appears to be empty or unreadable.")]
    EmptyFile { file: FileSlot },
    #[error("{0}")]
    FormatMismatch(String),
    #[error("{file}: {source}")]
    Parse {
        file: FileSlot,
        #[source]
        source: LoadError,
    },
}

impl AnalysisError {
    /// True for failures the uploader can fix by supplying a different export.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyFile { .. } | AnalysisError::FormatMismatch(_)
        )
    }
}
