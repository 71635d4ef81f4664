use crate::domain::model::{ObjectMetadata, StoredObject};
use crate::domain::ports::ObjectStore;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Filesystem-backed object store: `<base_path>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(key);
        // bucket/key 不可跳出 base_path
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || bucket.is_empty() || key.is_empty() {
            return Err(EtlError::StorageError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "invalid bucket or key for local storage".to_string(),
            });
        }
        Ok(self.base_path.join(relative))
    }

    fn map_io_error(bucket: &str, key: &str, error: std::io::Error) -> EtlError {
        if error.kind() == ErrorKind::NotFound {
            EtlError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        } else {
            EtlError::StorageError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Local files carry no content type, so it is inferred from the key.
pub fn content_type_for(key: &str) -> Option<&'static str> {
    let extension = Path::new(key).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "json" => Some("application/json"),
        "csv" => Some("text/csv"),
        "tsv" => Some("text/tab-separated-values"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

impl ObjectStore for LocalStorage {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let path = self.object_path(bucket, key)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| Self::map_io_error(bucket, key, e))?;

        Ok(StoredObject {
            data,
            content_type: content_type_for(key).map(str::to_string),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<()> {
        let path = self.object_path(bucket, key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::map_io_error(bucket, key, e))?;
        }

        // 先寫暫存檔再 rename，watcher 不會看到寫到一半的檔案
        let mut staging = path.clone().into_os_string();
        staging.push(".partial");
        tokio::fs::write(&staging, data)
            .await
            .map_err(|e| Self::map_io_error(bucket, key, e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| Self::map_io_error(bucket, key, e))?;

        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        let path = self.object_path(bucket, key)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Self::map_io_error(bucket, key, e))?;

        if !metadata.is_file() {
            return Err(EtlError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        Ok(ObjectMetadata {
            content_length: metadata.len(),
            content_type: content_type_for(key).map(str::to_string),
            last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}
