// src/error.rs

//! Error types for krawler
//!
//! Configuration and template errors abort seed resolution. Download and
//! parse errors are raised inside search producers, where the coordinator
//! records them next to the successful results.

use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid distro configuration (bad mirror URL, no versions, ...)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Template with no variables, malformed delimiters or an empty column
    #[error("Template error: {0}")]
    TemplateError(String),

    /// HTTP request or transfer failure
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Malformed repository index or package archive
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Some producers failed while others returned results
    #[error("{failed} of {total} searches failed")]
    PartialFailure { failed: usize, total: usize },

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Initialization error: {0}")]
    InitError(String),

    /// Misuse of the search coordinator (too many producers, dead consumer)
    #[error("Coordinator error: {0}")]
    CoordinatorError(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<crate::compression::CompressionError> for Error {
    fn from(e: crate::compression::CompressionError) -> Self {
        Error::ParseError(e.to_string())
    }
}
