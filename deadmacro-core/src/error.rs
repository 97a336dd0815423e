//! Typed error handling for deadmacro.
//!
//! Per-file failures (`Tokenize`, `Io` while reading a source) are isolated by
//! the orchestrator and never abort a run. `Report` failures are fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for deadmacro operations.
#[derive(Error, Debug)]
pub enum DeadmacroError {
    /// I/O error when reading sources or writing the report
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The tokenizer could not process a source file
    #[error("Tokenizer failed on {path}: {message}")]
    Tokenize {
        path: PathBuf,
        message: String,
        /// Line number (1-indexed) if available
        line: Option<usize>,
        /// Column number (1-indexed) if available
        column: Option<usize>,
    },

    /// Invalid include/exclude filename pattern
    #[error("Invalid filename pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// The report could not be rendered or written
    #[error("Report error for {target}: {message}")]
    Report { target: String, message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DeadmacroError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a tokenizer error without location.
    pub fn tokenize(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Tokenize {
            path: path.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a tokenizer error with line/column info.
    pub fn tokenize_at(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Tokenize {
            path: path.into(),
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Create a pattern error.
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a report error.
    pub fn report(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Report {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error only affects a single file (the scan can continue).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Tokenize { .. } | Self::Io { .. })
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Tokenize { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for deadmacro results.
pub type DeadmacroResult<T> = Result<T, DeadmacroError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DeadmacroResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DeadmacroResult<T> {
        self.map_err(|e| DeadmacroError::io(path, e))
    }
}
