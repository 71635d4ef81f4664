use crate::core::cleaning::CleaningStage;
use crate::core::ingest::{IngestOutcome, IngestStage};
use crate::core::watcher::{CompletionWatcher, WatcherConfig};
use crate::core::{Fetcher, ObjectStore, TransformOutcome};
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub endpoint: String,
    pub file_name: String,
    pub source_bucket: String,
    pub destination_bucket: String,
    pub watcher: WatcherConfig,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub ingest: IngestOutcome,
    pub cleaning: TransformOutcome,
    pub completed_key: String,
}

/// Runs ingest, cleaning and the completion check back to back against one
/// store. This is the local stand-in for the event-driven deployment, where
/// the object-created notification is what starts the cleaning stage.
pub struct EtlEngine<F: Fetcher, S: ObjectStore + Clone> {
    ingest: IngestStage<F, S>,
    cleaning: CleaningStage<S>,
    watcher: CompletionWatcher<S>,
}

impl<F: Fetcher, S: ObjectStore + Clone> EtlEngine<F, S> {
    pub fn new(fetcher: F, store: S) -> Self {
        Self {
            ingest: IngestStage::new(fetcher, store.clone()),
            cleaning: CleaningStage::new(store.clone()),
            watcher: CompletionWatcher::new(store),
        }
    }

    pub async fn run(&self, settings: &RunSettings) -> Result<RunReport> {
        tracing::info!("Starting ETL process...");

        tracing::info!("Extracting data...");
        let ingest = self
            .ingest
            .run(&settings.endpoint, &settings.source_bucket, &settings.file_name)
            .await?;

        tracing::info!("Transforming data...");
        let cleaning = self
            .cleaning
            .run(
                &settings.source_bucket,
                &ingest.key,
                &settings.destination_bucket,
            )
            .await?;

        tracing::info!("Confirming output...");
        let completed_key = self
            .watcher
            .require_completion(
                &settings.destination_bucket,
                &cleaning.destination_key,
                &settings.watcher,
            )
            .await?;

        Ok(RunReport {
            ingest,
            cleaning,
            completed_key,
        })
    }
}
