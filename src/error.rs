//! Error types for streamchart operations.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in streamchart operations.
///
/// Every variant is a precondition failure detected before any state is
/// touched, so a failed call leaves its inputs exactly as they were.
#[derive(Error, Debug)]
pub enum Error {
    /// Non-positive count, bin count or duration, empty input, or a
    /// non-finite parameter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Input is well-formed but has no usable spread (e.g. every x identical).
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key with invalid value.
        key: String,
        /// Error message describing why the value is invalid.
        message: String,
    },

    /// Configuration written for a newer format.
    #[error("unsupported configuration version {0}")]
    UnsupportedVersion(u32),

    /// I/O error (writing rendered output).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The tick driver has already shut down.
    #[error("ticker has stopped")]
    TickerStopped,
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Shorthand for [`Error::DegenerateInput`].
    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateInput(message.into())
    }
}
