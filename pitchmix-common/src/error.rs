//! Common error types for PitchMix

use thiserror::Error;

/// Common result type for PitchMix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PitchMix modules
#[derive(Error, Debug)]
pub enum Error {
    /// Network failure or non-2xx response from the analytics API
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
