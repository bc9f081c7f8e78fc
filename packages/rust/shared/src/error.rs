//! Error types for pdfsorter.
//!
//! Library crates use [`PdfSorterError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` and maps it to a process exit code.

use std::path::PathBuf;

/// Top-level error type for all pdfsorter operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfSorterError {
    /// Configuration loading or validation error (missing folder, bad TOML, ...).
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Document text could not be extracted.
    #[error("extraction error for {path:?}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// The completion endpoint failed or returned an unusable response.
    #[error("completion error: {0}")]
    Completion(String),

    /// The locally managed model server could not be started or reached.
    #[error("model server error: {0}")]
    ModelServer(String),

    /// Writing the zip archive failed.
    #[error("archive error: {0}")]
    Archive(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfSorterError>;

impl PdfSorterError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an extraction error for the given file.
    pub fn extraction(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Whether this error came from the model side (parsing, completion, server)
    /// rather than from local I/O or configuration.
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            Self::Extraction { .. } | Self::Completion(_) | Self::ModelServer(_)
        )
    }

    /// Process exit code for this error: 2 for model collaborator failures,
    /// 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        if self.is_model_failure() { 2 } else { 1 }
    }
}
