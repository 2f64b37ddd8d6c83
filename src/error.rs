//! Error types for the thumbnail worker
//!
//! Each pipeline step has its own error kind so a failed invocation log shows
//! exactly where a job died.

use thiserror::Error;

/// Result type alias for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Worker error types
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Inbound message was not a valid event envelope
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Source object could not be fetched
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Fetched bytes could not be decoded or re-encoded as an image
    #[error("transform failed: {0}")]
    Transform(String),

    /// Derivative could not be written to the output bucket
    #[error("store failed: {0}")]
    Store(String),

    /// Required configuration missing or invalid (fatal, pre-batch)
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::MalformedEnvelope(err.to_string())
    }
}
