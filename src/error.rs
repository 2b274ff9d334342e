//! Error types for the lazy-image engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the lazy-image engine
///
/// The observer itself degrades instead of failing (missing watcher
/// capability falls back to eager promotion, malformed markup is skipped),
/// so errors only surface at the edges: configuration and file handling.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// File I/O failure (CLI and demo programs)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
