use crate::domain::model::ObjectMetadata;
use crate::domain::ports::{Fetcher, ObjectStore};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;

pub const RAW_PREFIX: &str = "raw/";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_ENDPOINT: &str =
    "https://restcountries.com/v3.1/all?fields=name,region,population,area,capital";
pub const DEFAULT_FILE_NAME: &str = "countries_data.json";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const ERROR_BODY_PREVIEW: usize = 500;

/// reqwest-backed [`Fetcher`]. Single attempt, no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, JSON_CONTENT_TYPE)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::HttpStatusError {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub key: String,
    pub record_count: usize,
    pub bytes_written: usize,
}

/// Fetches a JSON document and drops it into the raw zone as-is.
pub struct IngestStage<F: Fetcher, S: ObjectStore> {
    fetcher: F,
    store: S,
}

impl<F: Fetcher, S: ObjectStore> IngestStage<F, S> {
    pub fn new(fetcher: F, store: S) -> Self {
        Self { fetcher, store }
    }

    pub async fn run(&self, url: &str, bucket: &str, file_name: &str) -> Result<IngestOutcome> {
        tracing::info!("🚀 Fetching raw data from: {}", url);
        let document = self.fetcher.fetch_json(url).await?;

        let record_count = match &document {
            serde_json::Value::Array(items) => items.len(),
            _ => {
                tracing::warn!("⚠️ Source returned a single document, not a list");
                1
            }
        };

        let key = format!("{}{}", RAW_PREFIX, file_name);
        let body = serde_json::to_vec(&document)?;
        let bytes_written = body.len();

        self.store
            .put_object(bucket, &key, body, JSON_CONTENT_TYPE)
            .await?;

        tracing::info!(
            "✅ Uploaded {} - {} records to {}/{} ({:.2} KB)",
            file_name,
            record_count,
            bucket,
            key,
            bytes_written as f64 / 1024.0
        );

        Ok(IngestOutcome {
            key,
            record_count,
            bytes_written,
        })
    }
}

/// `posts_data` at 2025-01-31 08:05:09 gives `posts_data_20250131_080509.json`.
pub fn timestamped_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.json", prefix, at.format("%Y%m%d_%H%M%S"))
}

/// Copies an object between buckets, keeping its content type, and confirms
/// the copy with a `head` on the destination.
pub async fn copy_object<S: ObjectStore>(
    store: &S,
    source_bucket: &str,
    source_key: &str,
    destination_bucket: &str,
    destination_key: &str,
) -> Result<ObjectMetadata> {
    tracing::info!("📋 Copying file between buckets...");
    tracing::info!("   From: {}/{}", source_bucket, source_key);
    tracing::info!("   To:   {}/{}", destination_bucket, destination_key);

    let object = store
        .get_object(source_bucket, source_key)
        .await
        .map_err(|e| match e {
            EtlError::ObjectNotFound { bucket, key } => EtlError::SourceNotFound { bucket, key },
            other => other,
        })?;

    let content_type = object
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    store
        .put_object(destination_bucket, destination_key, object.data, &content_type)
        .await
        .map_err(|e| EtlError::StorageWriteFailed {
            bucket: destination_bucket.to_string(),
            key: destination_key.to_string(),
            message: e.to_string(),
        })?;

    let metadata = store.head_object(destination_bucket, destination_key).await?;
    tracing::info!(
        "✅ File copied successfully! ({:.2} KB)",
        metadata.content_length as f64 / 1024.0
    );

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use httpmock::prelude::*;

    #[test]
    fn test_timestamped_file_name() {
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 8, 5, 9).unwrap();
        assert_eq!(
            timestamped_file_name("posts_data", at),
            "posts_data_20250131_080509.json"
        );
    }

    #[tokio::test]
    async fn test_fetch_json_returns_document() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/v3.1/all");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([{"name": {"common": "Wakanda"}}]));
        });

        let fetcher = HttpFetcher::default();
        let document = fetcher.fetch_json(&server.url("/v3.1/all")).await.unwrap();

        api_mock.assert();
        assert_eq!(document.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_json_reports_http_errors() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/broken");
            then.status(503).body("x".repeat(2000));
        });

        let fetcher = HttpFetcher::default();
        let err = fetcher
            .fetch_json(&server.url("/broken"))
            .await
            .unwrap_err();

        api_mock.assert();
        match err {
            EtlError::HttpStatusError { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body.len(), 500);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
