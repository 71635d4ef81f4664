use clap::Parser;
use countries_etl::config::clean_source_key;
use countries_etl::core::ingest::{copy_object, timestamped_file_name};
use countries_etl::utils::error::EtlError;
use countries_etl::utils::logger;
use countries_etl::{
    CleaningStage, CliConfig, Command, CompletionWatcher, EtlEngine, HttpFetcher, IngestStage,
    LocalStorage, RunSettings, TomlConfig, WatchResult,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting countries-etl CLI");
    tracing::debug!("CLI config: {:?}", cli);

    // 載入並驗證配置
    let settings = match cli.load_settings() {
        Ok(settings) => settings,
        Err(e) => exit_with(e),
    };

    if let Err(e) = execute(&cli.command, &settings).await {
        exit_with(e);
    }
}

async fn execute(command: &Command, settings: &TomlConfig) -> countries_etl::Result<()> {
    let storage = LocalStorage::new(settings.storage.root.clone());

    match command {
        Command::Ingest { .. } => {
            let stage = IngestStage::new(HttpFetcher::new(settings.ingest_timeout()), storage);
            let outcome = stage
                .run(
                    &settings.ingest.endpoint,
                    &settings.storage.source_bucket,
                    &ingest_file_name(settings),
                )
                .await?;
            println!(
                "✅ Uploaded {} records to {}/{}",
                outcome.record_count, settings.storage.source_bucket, outcome.key
            );
        }
        Command::Clean { key, encoded, .. } => {
            let key = clean_source_key(key, *encoded)?;
            let stage = CleaningStage::new(storage);
            let outcome = stage
                .run(
                    &settings.storage.source_bucket,
                    &key,
                    &settings.storage.destination_bucket,
                )
                .await?;
            println!(
                "✅ Cleaned {} records ({} skipped) into {}/{}",
                outcome.cleaned_count,
                outcome.skipped_count,
                settings.storage.destination_bucket,
                outcome.destination_key
            );
        }
        Command::Watch { key, .. } => {
            let watcher = CompletionWatcher::new(storage);
            let result = watcher
                .watch(
                    &settings.storage.destination_bucket,
                    key,
                    &settings.watcher_config(),
                )
                .await?;
            match result {
                WatchResult::Completed(key) => println!("✅ {} is ready", key),
                WatchResult::TimedOut { elapsed, max_wait } => {
                    return Err(EtlError::WatchTimeout {
                        bucket: settings.storage.destination_bucket.clone(),
                        key: key.clone(),
                        elapsed,
                        max_wait,
                    })
                }
            }
        }
        Command::Copy {
            source_key,
            dest_key,
            ..
        } => {
            let metadata = copy_object(
                &storage,
                &settings.storage.source_bucket,
                source_key,
                &settings.storage.destination_bucket,
                dest_key,
            )
            .await?;
            println!(
                "✅ Copied {} bytes to {}/{}",
                metadata.content_length, settings.storage.destination_bucket, dest_key
            );
        }
        Command::Run => {
            let engine = EtlEngine::new(HttpFetcher::new(settings.ingest_timeout()), storage);
            let report = engine
                .run(&RunSettings {
                    endpoint: settings.ingest.endpoint.clone(),
                    file_name: ingest_file_name(settings),
                    source_bucket: settings.storage.source_bucket.clone(),
                    destination_bucket: settings.storage.destination_bucket.clone(),
                    watcher: settings.watcher_config(),
                })
                .await?;
            tracing::info!("✅ ETL process completed successfully!");
            println!(
                "✅ {} fetched, {} cleaned, {} skipped",
                report.ingest.record_count,
                report.cleaning.cleaned_count,
                report.cleaning.skipped_count
            );
            println!("📁 Output saved to: {}", report.completed_key);
        }
    }

    Ok(())
}

fn ingest_file_name(settings: &TomlConfig) -> String {
    if settings.ingest.timestamped {
        let prefix = settings
            .ingest
            .file_name
            .trim_end_matches(".json")
            .to_string();
        timestamped_file_name(&prefix, chrono::Utc::now())
    } else {
        settings.ingest.file_name.clone()
    }
}

fn exit_with(e: EtlError) -> ! {
    tracing::error!(
        "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    std::process::exit(e.severity().exit_code());
}
