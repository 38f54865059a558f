//! Application error type with tracing-friendly structured variants.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Standard IO error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A scan root that does not exist or cannot be read
    #[error("path does not exist: {0:?}")]
    MissingRoot(PathBuf),

    /// Filesystem metadata error
    #[error("metadata error on {path:?}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Glob pattern that does not compile after translation
    #[error("invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// Invalid command-line input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Terminal setup/teardown failure
    #[error("terminal error: {0}")]
    Terminal(String),

    /// Render-path write failure; surfaced only through TUI teardown
    #[error("render error: {0}")]
    Render(String),
}

impl AppError {
    pub fn metadata<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        AppError::Metadata {
            path: path.into(),
            source,
        }
    }

    pub fn pattern<S1: Into<String>, S2: Into<String>>(pattern: S1, reason: S2) -> Self {
        AppError::Pattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;
