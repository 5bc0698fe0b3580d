//! Common error types for LSR

use thiserror::Error;

/// Common result type for LSR operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the review library and service
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset or annotation file is not valid JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested item, aspect, point or situation not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Dataset item lacks structure required for expansion
    #[error("Malformed item {index}: {reason}")]
    MalformedItem { index: usize, reason: String },
}
