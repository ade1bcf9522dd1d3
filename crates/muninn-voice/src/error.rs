//! Error types for the Muninn boundary primitives.

use thiserror::Error;

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised at the capture/synthesis/generation boundary.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
