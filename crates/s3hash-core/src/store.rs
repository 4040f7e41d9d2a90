//! S3 access: the fetch capability the worker pool calls.
//!
//! Credentials and region resolve from the ambient environment (env vars,
//! shared profile, instance metadata), like any AWS tool.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use thiserror::Error;

/// Error from the object store. Fetch failures are per-key and never fatal
/// to a run; workers log them and move on to the next key.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("get object failed: {0}")]
    Get(String),

    #[error("reading object body failed: {0}")]
    Body(String),
}

/// The fetch capability: bytes of a remote object by key.
#[async_trait]
pub trait ObjectFetch: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError>;
}

/// S3 client bound to one bucket.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Build a client against `bucket` using the default credential chain.
    pub async fn connect(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket: bucket.into(),
        }
    }

    /// List the buckets visible to the current credentials. Useful as a
    /// connectivity probe before starting a long run.
    pub async fn list_buckets(&self) -> Result<Vec<String>, FetchError> {
        let resp = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| FetchError::Get(DisplayErrorContext(&err).to_string()))?;

        Ok(resp
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }
}

#[async_trait]
impl ObjectFetch for S3Store {
    /// GET the object and collect its body in memory.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| FetchError::Get(DisplayErrorContext(&err).to_string()))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|err| FetchError::Body(err.to_string()))?;

        Ok(data.into_bytes().to_vec())
    }
}
