//! Configuration for the thumbnail worker
//!
//! Loads configuration from environment variables. The output bucket has no
//! default; starting without one would leave thumbnails with no destination.

use crate::error::{Result, WorkerError};

/// Default thumbnail target width in pixels
pub const DEFAULT_TARGET_WIDTH: u32 = 200;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Destination bucket for generated thumbnails
    pub output_bucket: String,
    /// Target thumbnail width in pixels
    pub target_width: u32,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// `OUTPUT_BUCKET` is required and checked before any batch is processed.
    pub fn from_env() -> Result<Self> {
        let output_bucket = std::env::var("OUTPUT_BUCKET")
            .map_err(|_| WorkerError::Configuration("OUTPUT_BUCKET not set".to_string()))?;

        let target_width = std::env::var("THUMBNAIL_WIDTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TARGET_WIDTH);

        Ok(Self {
            output_bucket,
            target_width,
        })
    }
}
