//! Queue-triggered image thumbnailing worker
//!
//! Receives batches of S3 event notifications delivered through SQS, fetches
//! each referenced object, derives a fixed-width thumbnail, and writes the
//! derivative to the output bucket under a `thumbnails/` prefix with the
//! source object's content type.

pub mod batch;
pub mod config;
pub mod error;
pub mod notification;
pub mod pipeline;
pub mod processor;
pub mod store;

// Public re-exports
pub use batch::{BatchProcessor, BatchReport};
pub use config::WorkerConfig;
pub use error::{Result, WorkerError};
