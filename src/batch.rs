//! Batch processor - decodes an inbound batch and fans thumbnail jobs out
//!
//! Every message is decoded first, then the independent jobs run concurrently
//! and are joined into one per-item report. The caller decides redelivery
//! granularity from that report.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, warn};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::notification::decode_notification;
use crate::pipeline::{ThumbnailJob, ThumbnailPipeline};
use crate::processor::{ResizeConfig, ThumbnailProcessor};
use crate::store::ObjectStore;

/// One failed decode or job, tagged with its origin
#[derive(Debug)]
pub struct BatchFailure {
    /// `bucket/key` of the failed job, or `<envelope>` for an undecodable
    /// message
    pub source: String,
    pub error: WorkerError,
}

/// Per-item outcomes of one invocation
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Success means no item failed; a zero-work batch counts as success.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Batch processor over an injected object store
pub struct BatchProcessor<S> {
    pipeline: ThumbnailPipeline<S>,
    destination_bucket: String,
}

impl<S: ObjectStore> BatchProcessor<S> {
    pub fn new(store: Arc<S>, config: &WorkerConfig) -> Self {
        let processor = Arc::new(ThumbnailProcessor::new(ResizeConfig {
            target_width: config.target_width,
        }));

        Self {
            pipeline: ThumbnailPipeline::new(store, processor),
            destination_bucket: config.output_bucket.clone(),
        }
    }

    /// Process one inbound batch of raw message bodies.
    ///
    /// A decode failure is recorded without discarding the remaining jobs;
    /// under at-least-once redelivery with idempotent stores, finishing the
    /// rest of the batch costs nothing on retry.
    pub async fn handle_batch(&self, bodies: &[String]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut jobs: Vec<ThumbnailJob> = Vec::new();

        for body in bodies {
            match decode_notification(body) {
                Ok(records) => {
                    for record in records {
                        jobs.push(ThumbnailJob::new(record, &self.destination_bucket));
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to decode message");
                    report.failures.push(BatchFailure {
                        source: "<envelope>".to_string(),
                        error: e,
                    });
                }
            }
        }

        let results = join_all(jobs.iter().map(|job| self.pipeline.process(job))).await;

        for (job, result) in jobs.iter().zip(results) {
            match result {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    error!(
                        bucket = %job.source_bucket,
                        key = %job.source_key,
                        error = %e,
                        "Failed to generate thumbnail"
                    );
                    report.failures.push(BatchFailure {
                        source: format!("{}/{}", job.source_bucket, job.source_key),
                        error: e,
                    });
                }
            }
        }

        report
    }
}
