use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use url::Url;

use super::{public_object_url, AttachmentError, AttachmentStore};

/// S3 caps presigned URLs at one week
const MAX_PRESIGN_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct S3AttachmentConfig {
    pub bucket: String,
    pub region: Option<String>,
    /// Optional endpoint override (LocalStack/MinIO); switches to path-style URLs
    pub endpoint: Option<String>,
}

#[derive(Clone)]
pub struct S3AttachmentStore {
    client: Client,
    bucket: String,
    endpoint: Option<Url>,
}

impl std::fmt::Debug for S3AttachmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3AttachmentStore")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint.as_ref().map(Url::as_str))
            .finish()
    }
}

impl S3AttachmentStore {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: S3AttachmentConfig) -> Result<Self, AttachmentError> {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);

        if let Some(region) = config.region {
            builder = builder.region(aws_sdk_s3::config::Region::new(region));
        }

        let endpoint = match config.endpoint {
            Some(raw) => {
                let url = Url::parse(&raw).map_err(|e| AttachmentError::InvalidEndpoint(format!("{}: {}", raw, e)))?;
                builder = builder.endpoint_url(raw).force_path_style(true);
                Some(url)
            }
            None => None,
        };

        Ok(Self::from_client(Client::from_conf(builder.build()), config.bucket, endpoint))
    }

    /// Create from a pre-built client
    pub fn from_client(client: Client, bucket: String, endpoint: Option<Url>) -> Self {
        Self {
            client,
            bucket,
            endpoint,
        }
    }
}

#[async_trait]
impl AttachmentStore for S3AttachmentStore {
    fn public_url(&self, todo_id: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => {
                let mut url = endpoint.clone();
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push(&self.bucket).push(todo_id);
                }
                url.to_string()
            }
            None => public_object_url(&self.bucket, todo_id),
        }
    }

    async fn presigned_upload_url(&self, todo_id: &str, expiry_secs: u64) -> Result<String, AttachmentError> {
        if expiry_secs == 0 || expiry_secs > MAX_PRESIGN_SECS {
            return Err(AttachmentError::InvalidExpiry(expiry_secs));
        }

        let presigning = PresigningConfig::expires_in(Duration::from_secs(expiry_secs))
            .map_err(|e| AttachmentError::Presign(e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(todo_id)
            .presigned(presigning)
            .await
            .map_err(|e| AttachmentError::Presign(DisplayErrorContext(e).to_string()))?;

        Ok(request.uri().to_string())
    }
}
