use anyhow::Result;
use countries_etl::core::ingest::copy_object;
use countries_etl::{
    CleaningResponse, CleaningStage, CompletionWatcher, EtlEngine, EtlError, HttpFetcher,
    IngestStage, LocalStorage, ObjectStore, RunSettings, TriggerEvent, WatchResult, WatcherConfig,
};
use httpmock::prelude::*;
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

const SOURCE_BUCKET: &str = "aws-learning-source-bucket";
const DEST_BUCKET: &str = "aws-learning-destination-bucket";

fn countries_payload() -> serde_json::Value {
    serde_json::json!([
        {
            "name": {"common": "Finland", "official": "Republic of Finland"},
            "capital": ["Helsinki"],
            "region": "Europe",
            "area": 338424,
            "population": 5530719
        },
        {
            "name": {"common": "Heard Island and McDonald Islands"},
            "capital": [],
            "region": "Antarctic",
            "area": 412,
            "population": 0
        },
        {
            "name": {"common": "côte d'ivoire"},
            "capital": ["Yamoussoukro"],
            "region": "africa",
            "area": 322463,
            "population": 26378275
        },
        {
            "name": {"common": "Broken"},
            "population": "abc"
        }
    ])
}

fn read_csv(temp_dir: &TempDir, key: &str) -> String {
    std::fs::read_to_string(temp_dir.path().join(DEST_BUCKET).join(key)).unwrap()
}

#[tokio::test]
async fn test_end_to_end_etl_with_real_http() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path());

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/v3.1/all");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(countries_payload());
    });

    let engine = EtlEngine::new(HttpFetcher::default(), storage.clone());
    let report = engine
        .run(&RunSettings {
            endpoint: server.url("/v3.1/all"),
            file_name: "countries_data.json".to_string(),
            source_bucket: SOURCE_BUCKET.to_string(),
            destination_bucket: DEST_BUCKET.to_string(),
            watcher: WatcherConfig {
                max_wait: Duration::from_secs(1),
                poll_interval: Duration::from_millis(100),
            },
        })
        .await?;

    api_mock.assert();
    assert_eq!(report.ingest.key, "raw/countries_data.json");
    assert_eq!(report.ingest.record_count, 4);
    assert_eq!(report.cleaning.cleaned_count, 2);
    assert_eq!(report.cleaning.skipped_count, 2);
    assert_eq!(report.completed_key, "cleaned/countries_data.csv");

    // raw zone 保存的是合法 JSON
    let raw = storage.get_object(SOURCE_BUCKET, "raw/countries_data.json").await?;
    let raw_json: serde_json::Value = serde_json::from_slice(&raw.data)?;
    assert_eq!(raw_json, countries_payload());

    assert_eq!(
        read_csv(&temp_dir, "cleaned/countries_data.csv"),
        "Country,Capital,Population,Area,Region\n\
         Finland,Helsinki,5530719,338424,Europe\n\
         Côte D'Ivoire,Yamoussoukro,26378275,322463,Africa\n"
    );

    Ok(())
}

#[tokio::test]
async fn test_ingest_failure_writes_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path());

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/failed");
        then.status(500).body("upstream exploded");
    });

    let stage = IngestStage::new(HttpFetcher::default(), storage.clone());
    let err = assert_err!(
        stage
            .run(&server.url("/failed"), SOURCE_BUCKET, "countries_data.json")
            .await
    );

    api_mock.assert();
    assert!(matches!(err, EtlError::HttpStatusError { status: 500, .. }));
    assert!(matches!(
        storage.head_object(SOURCE_BUCKET, "raw/countries_data.json").await,
        Err(EtlError::ObjectNotFound { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_s3_event_with_encoded_key() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path());
    storage
        .put_object(
            SOURCE_BUCKET,
            "raw/my countries (v2).json",
            countries_payload().to_string().into_bytes(),
            "application/json",
        )
        .await?;

    let event = serde_json::json!({
        "Records": [{
            "eventName": "ObjectCreated:Put",
            "s3": {
                "bucket": {"name": SOURCE_BUCKET},
                "object": {"key": "raw/my+countries+%28v2%29.json", "size": 512}
            }
        }]
    });
    let trigger = TriggerEvent::from_json(event)?.into_trigger(None)?;
    assert_eq!(trigger.source_key, "raw/my countries (v2).json");

    let stage = CleaningStage::new(storage);
    let result = stage.run_trigger(&trigger, DEST_BUCKET).await;
    let response = CleaningResponse::from_result(&trigger, DEST_BUCKET, &result);

    let outcome = assert_ok!(result);
    assert_eq!(outcome.destination_key, "cleaned/my countries (v2).csv");
    assert_eq!(response.status_code(), 200);
    assert!(read_csv(&temp_dir, "cleaned/my countries (v2).csv").starts_with("Country,"));

    Ok(())
}

#[tokio::test]
async fn test_invalid_payload_leaves_destination_empty() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path());
    storage
        .put_object(
            SOURCE_BUCKET,
            "raw/countries_data.json",
            br#"{"countries": []}"#.to_vec(),
            "application/json",
        )
        .await?;

    let stage = CleaningStage::new(storage.clone());
    let err = assert_err!(
        stage
            .run(SOURCE_BUCKET, "raw/countries_data.json", DEST_BUCKET)
            .await
    );

    assert!(matches!(err, EtlError::InvalidPayload { .. }));
    assert!(!temp_dir.path().join(DEST_BUCKET).exists());

    let response = CleaningResponse::failure(&err);
    assert_eq!(response.status_code(), 400);

    Ok(())
}

#[tokio::test]
async fn test_watch_after_cleaning_is_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path());
    storage
        .put_object(
            SOURCE_BUCKET,
            "raw/countries_data.json",
            countries_payload().to_string().into_bytes(),
            "application/json",
        )
        .await?;

    let outcome = CleaningStage::new(storage.clone())
        .run(SOURCE_BUCKET, "raw/countries_data.json", DEST_BUCKET)
        .await?;

    let watcher = CompletionWatcher::new(storage);
    let config = WatcherConfig::default();
    for _ in 0..2 {
        let result = watcher
            .watch(DEST_BUCKET, &outcome.destination_key, &config)
            .await?;
        assert_eq!(result, WatchResult::Completed(outcome.destination_key.clone()));
    }

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_watch_times_out_on_local_storage() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let watcher = CompletionWatcher::new(LocalStorage::new(temp_dir.path()));

    let result = watcher
        .await_completion(
            DEST_BUCKET,
            "cleaned/never.csv",
            Duration::from_secs(30),
            Duration::from_secs(10),
        )
        .await?;

    assert_eq!(
        result,
        WatchResult::TimedOut {
            elapsed: Duration::from_secs(30),
            max_wait: Duration::from_secs(30),
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_copy_object_between_buckets() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path());
    storage
        .put_object(
            SOURCE_BUCKET,
            "raw/candidates/cand1.csv",
            b"id,name\n1,Ada\n".to_vec(),
            "text/csv",
        )
        .await?;

    let metadata = copy_object(
        &storage,
        SOURCE_BUCKET,
        "raw/candidates/cand1.csv",
        DEST_BUCKET,
        "cleaned/cand1.csv",
    )
    .await?;

    assert_eq!(metadata.content_length, 14);
    assert_eq!(read_csv(&temp_dir, "cleaned/cand1.csv"), "id,name\n1,Ada\n");

    let err = assert_err!(
        copy_object(
            &storage,
            SOURCE_BUCKET,
            "raw/candidates/missing.csv",
            DEST_BUCKET,
            "cleaned/missing.csv",
        )
        .await
    );
    assert!(matches!(err, EtlError::SourceNotFound { .. }));

    Ok(())
}
