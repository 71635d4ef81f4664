use crate::domain::model::{ObjectMetadata, StoredObject};
use crate::domain::ports::ObjectStore;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use std::env;

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub destination_bucket: String,
    /// Used only when a direct invocation omits `source_bucket`.
    pub source_bucket: Option<String>,
    pub s3_region: String,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            destination_bucket: env::var("DESTINATION_BUCKET").map_err(|_| {
                EtlError::MissingConfigError {
                    field: "DESTINATION_BUCKET".to_string(),
                }
            })?,
            source_bucket: env::var("SOURCE_BUCKET").ok(),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "eu-north-1".to_string()),
        })
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_bucket_name("DESTINATION_BUCKET", &self.destination_bucket)?;
        if let Some(source_bucket) = &self.source_bucket {
            validation::validate_bucket_name("SOURCE_BUCKET", source_bucket)?;
        }
        validate_aws_region("S3_REGION", &self.s3_region)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

fn storage_error(bucket: &str, key: &str, error: impl std::fmt::Display) -> EtlError {
    EtlError::StorageError {
        bucket: bucket.to_string(),
        key: key.to_string(),
        message: error.to_string(),
    }
}

fn not_found(bucket: &str, key: &str) -> EtlError {
    EtlError::ObjectNotFound {
        bucket: bucket.to_string(),
        key: key.to_string(),
    }
}

impl ObjectStore for S3Storage {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                GetObjectError::NoSuchKey(_) => not_found(bucket, key),
                err => storage_error(bucket, key, err),
            })?;

        let content_type = resp.content_type().map(str::to_string);
        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| storage_error(bucket, key, format!("Failed to collect S3 data: {}", e)))?;

        Ok(StoredObject {
            data: data.into_bytes().to_vec(),
            content_type,
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| storage_error(bucket, key, e.into_service_error()))?;

        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        let resp = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                HeadObjectError::NotFound(_) => not_found(bucket, key),
                err => storage_error(bucket, key, err),
            })?;

        Ok(ObjectMetadata {
            content_length: resp.content_length().unwrap_or(0).max(0) as u64,
            content_type: resp.content_type().map(str::to_string),
            last_modified: resp
                .last_modified()
                .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
        })
    }
}
