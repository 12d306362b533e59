//! S3-compatible blob store (AWS S3, MinIO, LocalStack)

use super::{check_name, BlobReader, BlobStore, StorageError};
use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::{debug, info, instrument, warn};

pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
}

fn backend_err(context: &str, err: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(format!("{}: {}", context, err))
}

impl S3BlobStore {
    /// Create the client and make sure the bucket exists
    pub async fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(ref region) = config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let aws_config = loader.load().await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        // Force path-style access for MinIO compatibility
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());
        let store = Self {
            client,
            bucket: config.bucket.clone(),
        };
        store.ensure_bucket().await?;

        info!(
            bucket = %store.bucket,
            endpoint = config.endpoint_url.as_deref().unwrap_or("aws"),
            "S3 blob store initialized"
        );

        Ok(store)
    }

    async fn ensure_bucket(&self) -> Result<(), StorageError> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }

        warn!(bucket = %self.bucket, "Bucket missing, creating it");
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| backend_err("Failed to create bucket", e))?;

        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn backend(&self) -> &'static str {
        "s3"
    }

    #[instrument(skip(self, data), fields(bucket = %self.bucket))]
    async fn put(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        check_name(name)?;
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| backend_err("Failed to upload object", e))?;

        debug!(key = %name, size, "Object uploaded");
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let body = self.get(name).await?;
        let bytes = body
            .collect()
            .await
            .map_err(|e| backend_err("Failed to read object body", e))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn open(&self, name: &str) -> Result<BlobReader, StorageError> {
        let body = self.get(name).await?;
        Ok(Box::pin(body.into_async_read()))
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        check_name(name)?;

        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    Ok(false)
                } else {
                    Err(backend_err("Failed to check object existence", e))
                }
            }
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        check_name(name)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| backend_err("Failed to delete object", e))?;

        debug!(key = %name, "Object deleted");
        Ok(())
    }
}

impl S3BlobStore {
    async fn get(&self, name: &str) -> Result<ByteStream, StorageError> {
        check_name(name)?;

        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(output) => Ok(output.body),
            Err(e) => {
                if e.as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                {
                    Err(StorageError::NotFound(name.to_string()))
                } else {
                    Err(backend_err("Failed to fetch object", e))
                }
            }
        }
    }
}
