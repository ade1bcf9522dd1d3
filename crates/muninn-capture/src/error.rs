//! Error types for the capture layer.
//!
//! Control errors are immediate and mutate nothing; persistence errors leave
//! in-memory state untouched so a retry of `save` is safe and lossless.
//! Generation failures never appear here; the extraction pipeline downgrades
//! them to sentinel markers per field.

use thiserror::Error;

/// Invalid session state transition. Surfaced immediately to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    #[error("session is already recording")]
    AlreadyRecording,

    #[error("session is not recording")]
    NotRecording,

    #[error("session has already stopped")]
    SessionStopped,
}

/// Failure while loading or saving the persisted state file.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
