//! Attachment locations: the public object URL stored on each item and the
//! presigned URL a client uses to upload the object.

pub mod s3;

use async_trait::async_trait;
use thiserror::Error;

pub use s3::{S3AttachmentConfig, S3AttachmentStore};

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Invalid presign expiry of {0} seconds")]
    InvalidExpiry(u64),

    #[error("Invalid object store endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Presigning failed: {0}")]
    Presign(String),
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Public URL of the object keyed by `todo_id`. The object may not exist yet.
    fn public_url(&self, todo_id: &str) -> String;

    /// Time-limited PUT URL for the object keyed by `todo_id`.
    async fn presigned_upload_url(&self, todo_id: &str, expiry_secs: u64) -> Result<String, AttachmentError>;
}

/// Virtual-hosted S3 URL: `https://{bucket}.s3.amazonaws.com/{key}`
pub fn public_object_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

/// Unsigned, deterministic URLs. Used by tests and in-memory local runs.
#[derive(Debug, Clone)]
pub struct StaticAttachmentStore {
    bucket: String,
}

impl StaticAttachmentStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self { bucket: bucket.into() }
    }
}

#[async_trait]
impl AttachmentStore for StaticAttachmentStore {
    fn public_url(&self, todo_id: &str) -> String {
        public_object_url(&self.bucket, todo_id)
    }

    async fn presigned_upload_url(&self, todo_id: &str, expiry_secs: u64) -> Result<String, AttachmentError> {
        if expiry_secs == 0 {
            return Err(AttachmentError::InvalidExpiry(expiry_secs));
        }
        Ok(format!("{}?X-Amz-Expires={}", self.public_url(todo_id), expiry_secs))
    }
}
