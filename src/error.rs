use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::xlsx::WorkbookError;

/// Convenience result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Error type returned by every stage of a merge run.
///
/// Every variant is fatal to the whole run: the first failure cancels in-flight work and is the
/// error handed back to the caller.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Invalid or missing configuration (e.g. the input directory does not exist).
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The input directory could not be listed.
    #[error("failed to list input directory {}: {source}", dir.display())]
    Discovery {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The input directory holds no `.xlsx` files.
    #[error("no .xlsx files found in {}", dir.display())]
    NoSources { dir: PathBuf },

    /// An explicit template path was given but does not exist.
    #[error("template file not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    /// The template workbook could not be opened.
    #[error("failed to open template {}: {source}", path.display())]
    TemplateOpen {
        path: PathBuf,
        #[source]
        source: WorkbookError,
    },

    /// The template workbook contains no sheets.
    #[error("template {} is empty (no sheets)", path.display())]
    EmptyTemplate { path: PathBuf },

    /// Rows of the template's first sheet could not be read.
    #[error("failed to read rows of template {}: {source}", path.display())]
    TemplateRows {
        path: PathBuf,
        #[source]
        source: WorkbookError,
    },

    /// A source workbook could not be opened or parsed.
    #[error("failed to read source {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: WorkbookError,
    },

    /// Creating, writing, or saving an output part failed.
    #[error("failed to write output part {part}: {message}")]
    Write { part: u32, message: String },

    /// A stale output part from a previous run could not be removed.
    #[error("failed to remove stale output {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Work stopped because another component already failed.
    #[error("merge cancelled after an earlier failure")]
    Cancelled,
}

impl MergeError {
    pub(crate) fn write(part: u32, err: impl fmt::Display) -> Self {
        Self::Write {
            part,
            message: err.to_string(),
        }
    }

    /// Severity used when the error is reported to observers.
    ///
    /// Failures rooted in the filesystem are `Critical`; everything else is `Error`.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Discovery { .. } | Self::Cleanup { .. } => Severity::Critical,
            Self::TemplateOpen { source, .. }
            | Self::TemplateRows { source, .. }
            | Self::SourceRead { source, .. } => {
                if source.is_io() {
                    Severity::Critical
                } else {
                    Severity::Error
                }
            }
            Self::Config { .. }
            | Self::NoSources { .. }
            | Self::TemplateNotFound { .. }
            | Self::EmptyTemplate { .. }
            | Self::Write { .. }
            | Self::Cancelled => Severity::Error,
        }
    }
}

/// Severity classification for reported failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The run failed.
    Error,
    /// The run failed because of an infrastructure (I/O) problem.
    Critical,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{MergeError, Severity};
    use crate::xlsx::WorkbookError;

    #[test]
    fn io_rooted_source_failures_are_critical() {
        let io = MergeError::SourceRead {
            path: PathBuf::from("a.xlsx"),
            source: WorkbookError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)),
        };
        let malformed = MergeError::SourceRead {
            path: PathBuf::from("a.xlsx"),
            source: WorkbookError::Malformed("bad row".to_string()),
        };
        assert_eq!(io.severity(), Severity::Critical);
        assert_eq!(malformed.severity(), Severity::Error);
        assert!(io.to_string().contains("a.xlsx"));
    }
}
