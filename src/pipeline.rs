//! Thumbnail pipeline - drives fetch, transform, and store for one job

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::notification::ObjectRef;
use crate::processor::ThumbnailProcessor;
use crate::store::ObjectStore;

/// Key prefix for generated thumbnails in the output bucket
pub const THUMBNAIL_PREFIX: &str = "thumbnails/";

/// One unit of work: fetch, transform, and store a single image.
///
/// Owned by exactly one pipeline invocation and discarded after it.
#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    pub source_bucket: String,
    pub source_key: String,
    pub destination_bucket: String,
    pub destination_key: String,
}

impl ThumbnailJob {
    pub fn new(source: ObjectRef, destination_bucket: &str) -> Self {
        let destination_key = format!("{THUMBNAIL_PREFIX}{}", source.key);
        Self {
            source_bucket: source.bucket,
            source_key: source.key,
            destination_bucket: destination_bucket.to_string(),
            destination_key,
        }
    }
}

/// Fetch-transform-store orchestrator.
///
/// Jobs are fully independent; the shared store client and processor are both
/// safe for concurrent use, so callers may run any number of jobs at once.
pub struct ThumbnailPipeline<S> {
    store: Arc<S>,
    processor: Arc<ThumbnailProcessor>,
}

impl<S: ObjectStore> ThumbnailPipeline<S> {
    pub fn new(store: Arc<S>, processor: Arc<ThumbnailProcessor>) -> Self {
        Self { store, processor }
    }

    /// Process one job.
    ///
    /// A failure aborts this job only; the batch processor decides what a
    /// failed sibling means for the invocation. No retry here, redelivery is
    /// the transport's responsibility.
    pub async fn process(&self, job: &ThumbnailJob) -> Result<()> {
        info!(
            bucket = %job.source_bucket,
            key = %job.source_key,
            "Processing image"
        );

        let payload = self
            .store
            .fetch(&job.source_bucket, &job.source_key)
            .await?;
        debug!(
            size = payload.bytes.len(),
            content_type = %payload.content_type,
            "Fetched source object"
        );

        let thumbnail = self.processor.clone().generate_async(payload.bytes).await?;

        // The derivative carries the source content type unchanged.
        self.store
            .store(
                &job.destination_bucket,
                &job.destination_key,
                thumbnail,
                &payload.content_type,
            )
            .await?;

        info!(
            bucket = %job.destination_bucket,
            key = %job.destination_key,
            "Thumbnail saved"
        );

        Ok(())
    }
}
