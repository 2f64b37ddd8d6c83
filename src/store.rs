//! Object store seam
//!
//! The pipeline talks to storage through the `ObjectStore` trait so tests can
//! substitute a fake; `S3ObjectStore` is the production implementation.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::error::{Result, WorkerError};

/// Fallback content type when the source object carries none
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw object bytes plus content-type metadata
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Storage contract for the thumbnail pipeline.
///
/// `store` must be safe to call repeatedly with identical arguments; batch
/// redelivery relies on idempotent overwrite.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<ImagePayload>;

    async fn store(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<()>;
}

/// S3-backed object store
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a store using ambient AWS configuration (credential chain,
    /// region, endpoint overrides).
    pub async fn from_env() -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        Self::new(Client::new(&aws_config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<ImagePayload> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| WorkerError::Fetch(format!("failed to get {bucket}/{key}: {e}")))?;

        let content_type = response
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let body = response.body.collect().await.map_err(|e| {
            WorkerError::Fetch(format!("failed to read body of {bucket}/{key}: {e}"))
        })?;

        Ok(ImagePayload {
            bytes: body.into_bytes(),
            content_type,
        })
    }

    async fn store(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| WorkerError::Store(format!("failed to put {bucket}/{key}: {e}")))?;

        Ok(())
    }
}
