//! Amazon S3 artifact store
//!
//! Thin [`ArtifactSink`] adapter over the AWS SDK:
//!
//! - automatic credential resolution (AWS defaults or explicit keys)
//! - custom endpoint with path-style addressing for S3-compatible services
//! - optional key prefix under the bucket
//!
//! Retries, if wanted, belong to the SDK's retry configuration; the archiver
//! core treats every storage failure as fatal for the run.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use binvault::{ArchiveError, ArtifactSink, Result, SensitiveString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

/// Configuration for the S3 artifact store
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct S3StoreConfig {
    /// S3 bucket name
    #[validate(length(min = 3, max = 63))]
    pub bucket: String,

    /// Optional key prefix (e.g., "cdc/orders-db/")
    #[serde(default)]
    pub prefix: String,

    /// AWS region (default: us-east-1)
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3 endpoint URL (for S3-compatible services like MinIO)
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// AWS access key ID (uses environment/instance role if not provided)
    #[serde(default)]
    pub access_key_id: Option<SensitiveString>,

    /// AWS secret access key
    #[serde(default)]
    pub secret_access_key: Option<SensitiveString>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for S3StoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefix: String::new(),
            region: default_region(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

/// S3-backed artifact sink.
pub struct S3ArtifactStore {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3ArtifactStore {
    /// Validate the config and build the S3 client.
    pub async fn connect(config: S3StoreConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ArchiveError::config(format!("invalid S3 config: {}", e)))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        // Use explicit credentials if provided
        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let creds = aws_sdk_s3::config::Credentials::new(
                access_key.expose_secret(),
                secret_key.expose_secret(),
                None,
                None,
                "binvault-s3",
            );
            loader = loader.credentials_provider(creds);
        }

        let aws_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);

        // Custom endpoint for S3-compatible services
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(bucket = %config.bucket, region = %config.region, "connected S3 artifact store");
        Ok(Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.bucket,
            prefix: config.prefix,
        })
    }

    /// Verify bucket access with a HEAD request.
    pub async fn check(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                warn!(bucket = %self.bucket, "bucket access check failed");
                ArchiveError::config(format!(
                    "cannot access S3 bucket '{}': {}",
                    self.bucket, e
                ))
            })?;
        Ok(())
    }

    fn object_key(&self, key: &str) -> String {
        join_prefix(&self.prefix, key)
    }
}

fn join_prefix(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else if prefix.ends_with('/') {
        format!("{}{}", prefix, key)
    } else {
        format!("{}/{}", prefix, key)
    }
}

#[async_trait]
impl ArtifactSink for S3ArtifactStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let object_key = self.object_key(key);
        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(output) => {
                let body = output.body.collect().await.map_err(|e| {
                    ArchiveError::checkpoint(format!(
                        "reading s3://{}/{} failed: {}",
                        self.bucket, object_key, e
                    ))
                })?;
                debug!(key = %object_key, "fetched object");
                Ok(Some(body.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    return Ok(None);
                }
                Err(ArchiveError::checkpoint(format!(
                    "fetching s3://{}/{} failed: {}",
                    self.bucket, object_key, service_err
                )))
            }
        }
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let object_key = self.object_key(key);
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                ArchiveError::sink_write(format!(
                    "uploading s3://{}/{} failed: {}",
                    self.bucket, object_key, e
                ))
            })?;
        debug!(key = %object_key, bytes = size, "uploaded artifact");
        Ok(())
    }
}
