use crate::domain::model::WatchResult;
use crate::domain::ports::ObjectStore;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_positive_duration, Validate};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherConfig {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(300),
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl Validate for WatcherConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_duration("watcher.poll_interval", self.poll_interval)
    }
}

/// Waits for the cleaning stage's output object to show up.
///
/// Elapsed time is the number of completed polls times `poll_interval`, not
/// wall-clock time, so `max_wait = 300s, poll_interval = 10s` means at most 30
/// `head` calls.
pub struct CompletionWatcher<S: ObjectStore> {
    store: S,
}

impl<S: ObjectStore> CompletionWatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn watch(&self, bucket: &str, key: &str, config: &WatcherConfig) -> Result<WatchResult> {
        self.await_completion(bucket, key, config.max_wait, config.poll_interval)
            .await
    }

    pub async fn await_completion(
        &self,
        bucket: &str,
        key: &str,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Result<WatchResult> {
        validate_positive_duration("poll_interval", poll_interval)?;

        tracing::info!("⏳ Waiting for cleaned output {}/{}...", bucket, key);
        let mut elapsed = Duration::ZERO;

        while elapsed < max_wait {
            match self.store.head_object(bucket, key).await {
                Ok(metadata) => {
                    tracing::info!(
                        "✅ Processing complete! Found {}/{} ({} bytes)",
                        bucket,
                        key,
                        metadata.content_length
                    );
                    return Ok(WatchResult::Completed(key.to_string()));
                }
                Err(EtlError::ObjectNotFound { .. }) => {
                    tracing::info!("⏳ Still waiting... ({}s elapsed)", elapsed.as_secs());
                    tokio::time::sleep(poll_interval).await;
                    elapsed += poll_interval;
                }
                Err(e) => {
                    tracing::error!("❌ Error checking output {}/{}: {}", bucket, key, e);
                    return Err(e);
                }
            }
        }

        tracing::error!(
            "❌ Timeout: {}/{} did not appear within {}s",
            bucket,
            key,
            max_wait.as_secs()
        );
        Ok(WatchResult::TimedOut { elapsed, max_wait })
    }

    /// Like [`watch`](Self::watch) but turns a timeout into [`EtlError::WatchTimeout`].
    pub async fn require_completion(
        &self,
        bucket: &str,
        key: &str,
        config: &WatcherConfig,
    ) -> Result<String> {
        match self.watch(bucket, key, config).await? {
            WatchResult::Completed(key) => Ok(key),
            WatchResult::TimedOut { elapsed, max_wait } => Err(EtlError::WatchTimeout {
                bucket: bucket.to_string(),
                key: key.to_string(),
                elapsed,
                max_wait,
            }),
        }
    }
}
