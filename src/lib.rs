pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::toml_config::TomlConfig;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use core::{
    cleaning::{derive_destination_key, CleaningResponse, CleaningStage},
    etl::{EtlEngine, RunSettings},
    ingest::{HttpFetcher, IngestStage},
    trigger::{CleaningTrigger, TriggerEvent},
    watcher::{CompletionWatcher, WatcherConfig},
};
pub use domain::model::{CleanedRecord, SkipReason, TransformOutcome, WatchResult};
pub use domain::ports::{Fetcher, ObjectStore};
pub use utils::error::{EtlError, Result};
