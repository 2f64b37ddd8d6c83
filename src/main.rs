//! Thumbnail Worker - Lambda entrypoint for queue-triggered thumbnailing
//!
//! Triggered by SQS batches of S3 event notifications. Generates a fixed-width
//! thumbnail for every referenced object and writes it to the output bucket.
//!
//! Environment variables:
//! - OUTPUT_BUCKET: destination bucket for thumbnails (required)
//! - THUMBNAIL_WIDTH: target thumbnail width in pixels (default: 200)

use std::sync::Arc;

use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Serialize;
use tracing::{debug, error, info};

use thumbnail_worker::batch::BatchProcessor;
use thumbnail_worker::config::WorkerConfig;
use thumbnail_worker::store::{ObjectStore, S3ObjectStore};

/// Invocation result reported back to the Lambda runtime
#[derive(Debug, Serialize)]
struct InvocationResponse {
    #[serde(rename = "statusCode")]
    status_code: u16,
    body: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("thumbnail_worker=info".parse().expect("valid directive")),
        )
        // CloudWatch adds the ingestion time
        .without_time()
        .init();

    info!("Starting thumbnail worker");

    // Refuse to serve invocations without a destination bucket
    let config = WorkerConfig::from_env()?;
    info!(
        output_bucket = %config.output_bucket,
        target_width = config.target_width,
        "Configuration loaded"
    );

    // One client for the process lifetime, shared across invocations
    let store = Arc::new(S3ObjectStore::from_env().await);
    let processor = Arc::new(BatchProcessor::new(store, &config));

    run(service_fn(move |event: LambdaEvent<SqsEvent>| {
        let processor = processor.clone();
        async move { handle(event, &processor).await }
    }))
    .await
}

/// Handle one SQS batch invocation.
///
/// Any per-item failure surfaces as an invocation error so SQS redelivers the
/// whole batch; stores are idempotent overwrites, so reprocessing completed
/// items is safe.
async fn handle<S: ObjectStore>(
    event: LambdaEvent<SqsEvent>,
    processor: &BatchProcessor<S>,
) -> Result<InvocationResponse, Error> {
    let mut bodies = Vec::with_capacity(event.payload.records.len());
    for record in event.payload.records {
        match record.body {
            Some(body) => bodies.push(body),
            None => debug!(message_id = ?record.message_id, "Empty message body, skipping"),
        }
    }

    let report = processor.handle_batch(&bodies).await;

    if report.is_success() {
        info!(processed = report.succeeded, "Batch completed");
        Ok(InvocationResponse {
            status_code: 200,
            body: "Processing completed".to_string(),
        })
    } else {
        error!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            "Batch failed, requesting redelivery"
        );
        Err(format!(
            "{} of {} items failed",
            report.failures.len(),
            report.succeeded + report.failures.len()
        )
        .into())
    }
}
