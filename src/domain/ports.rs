use crate::domain::model::{ObjectMetadata, StoredObject};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Bucket/key addressed blob storage.
///
/// Implementations must report a missing object as
/// [`EtlError::ObjectNotFound`](crate::utils::error::EtlError::ObjectNotFound)
/// so callers can tell "not there yet" apart from real failures.
pub trait ObjectStore: Send + Sync {
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<StoredObject>> + Send;

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<ObjectMetadata>> + Send;
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value>;
}
