//! Cloudflare R2 backend over the S3-compatible API.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use stylist_core::storage::normalize_key;

use crate::config::R2Config;
use crate::{StorageBackend, StorageError};

/// R2 region name; R2 ignores regions but the SDK requires one.
const R2_REGION: &str = "auto";

/// Uploads objects to an R2 bucket.
#[derive(Debug, Clone)]
pub struct R2Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl R2Storage {
    /// Build an S3 client pointed at the account's R2 endpoint.
    pub async fn connect(config: &R2Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2-static",
        );
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(R2_REGION))
            .endpoint_url(config.endpoint())
            .credentials_provider(credentials)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.public_url)
    }
}

#[async_trait]
impl StorageBackend for R2Storage {
    async fn save_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = normalize_key(key)?;
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(format!("{key}: {e}")))?;
        tracing::debug!(bucket = %self.bucket, key = %key, size, "Uploaded object to R2");
        Ok(self.public_url_for(&key))
    }

    fn backend_name(&self) -> &'static str {
        "r2"
    }
}
