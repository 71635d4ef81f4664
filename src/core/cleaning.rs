use crate::core::transformer::transform;
use crate::core::trigger::CleaningTrigger;
use crate::domain::model::{RawRecord, TransformOutcome};
use crate::domain::ports::ObjectStore;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;

pub const CLEANED_PREFIX: &str = "cleaned/";
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// `raw/a/b/countries.json` becomes `cleaned/countries.csv`.
pub fn derive_destination_key(source_key: &str) -> String {
    let file_name = source_key.rsplit('/').next().unwrap_or(source_key);
    let base = match file_name.rfind('.') {
        // 開頭的點（例如 ".hidden"）不是副檔名
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };
    format!("{}{}.csv", CLEANED_PREFIX, base)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    Idle,
    Reading,
    Transforming,
    Writing,
    Succeeded,
    Failed,
}

/// Reads one raw JSON object, cleans it and writes the CSV to the cleaned zone.
///
/// Runs at most once per trigger. Failures are terminal; redelivery is up to
/// whatever invoked the stage.
pub struct CleaningStage<S: ObjectStore> {
    store: S,
}

impl<S: ObjectStore> CleaningStage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn run(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
    ) -> Result<TransformOutcome> {
        let mut phase = StagePhase::Idle;

        tracing::info!(
            "🧹 Cleaning and converting {} from {} to CSV...",
            source_key,
            source_bucket
        );

        let result = self
            .execute(source_bucket, source_key, destination_bucket, &mut phase)
            .await;

        match result {
            Ok(outcome) => {
                phase = StagePhase::Succeeded;
                tracing::debug!(?phase, "Cleaning stage finished");
                tracing::info!(
                    "✅ Cleaned CSV uploaded to {}/{} ({} records, {} skipped)",
                    destination_bucket,
                    outcome.destination_key,
                    outcome.cleaned_count,
                    outcome.skipped_count
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(
                    failed_during = ?phase,
                    kind = e.kind(),
                    "❌ Cleaning {}/{} failed: {}",
                    source_bucket,
                    source_key,
                    e
                );
                phase = StagePhase::Failed;
                tracing::debug!(?phase, "Cleaning stage finished");
                Err(e)
            }
        }
    }

    pub async fn run_trigger(
        &self,
        trigger: &CleaningTrigger,
        destination_bucket: &str,
    ) -> Result<TransformOutcome> {
        self.run(&trigger.source_bucket, &trigger.source_key, destination_bucket)
            .await
    }

    async fn execute(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        phase: &mut StagePhase,
    ) -> Result<TransformOutcome> {
        let destination_key = derive_destination_key(source_key);

        *phase = StagePhase::Reading;
        let object = self
            .store
            .get_object(source_bucket, source_key)
            .await
            .map_err(|e| match e {
                EtlError::ObjectNotFound { bucket, key } => EtlError::SourceNotFound { bucket, key },
                other => other,
            })?;
        let records = decode_records(&object.data)?;
        tracing::debug!("Read {} raw records ({} bytes)", records.len(), object.data.len());

        *phase = StagePhase::Transforming;
        let result = transform(&records)?;

        *phase = StagePhase::Writing;
        self.store
            .put_object(
                destination_bucket,
                &destination_key,
                result.csv_output,
                CSV_CONTENT_TYPE,
            )
            .await
            .map_err(|e| EtlError::StorageWriteFailed {
                bucket: destination_bucket.to_string(),
                key: destination_key.clone(),
                message: e.to_string(),
            })?;

        Ok(TransformOutcome {
            cleaned_count: result.cleaned_records.len(),
            skipped_count: result.skipped_count,
            destination_key,
        })
    }
}

fn decode_records(data: &[u8]) -> Result<Vec<RawRecord>> {
    let payload: serde_json::Value =
        serde_json::from_slice(data).map_err(|e| EtlError::InvalidPayload {
            message: format!("not valid UTF-8 JSON: {}", e),
        })?;

    match payload {
        serde_json::Value::Array(records) => Ok(records),
        other => Err(EtlError::InvalidPayload {
            message: format!(
                "expected a JSON array of records, got {}",
                match other {
                    serde_json::Value::Object(_) => "an object",
                    serde_json::Value::String(_) => "a string",
                    serde_json::Value::Number(_) => "a number",
                    serde_json::Value::Bool(_) => "a boolean",
                    _ => "null",
                }
            ),
        }),
    }
}

/// Outcome payload handed back to whoever triggered the stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CleaningResponse {
    Success {
        #[serde(rename = "statusCode")]
        status_code: u16,
        message: String,
        source: String,
        destination: String,
        records_processed: usize,
        records_skipped: usize,
    },
    Failure {
        #[serde(rename = "statusCode")]
        status_code: u16,
        error: String,
        kind: String,
    },
}

impl CleaningResponse {
    pub fn from_result(
        trigger: &CleaningTrigger,
        destination_bucket: &str,
        result: &Result<TransformOutcome>,
    ) -> Self {
        match result {
            Ok(outcome) => CleaningResponse::Success {
                status_code: 200,
                message: format!("File cleaned and saved as {}", outcome.destination_key),
                source: format!("{}/{}", trigger.source_bucket, trigger.source_key),
                destination: format!("{}/{}", destination_bucket, outcome.destination_key),
                records_processed: outcome.cleaned_count,
                records_skipped: outcome.skipped_count,
            },
            Err(e) => Self::failure(e),
        }
    }

    pub fn failure(error: &EtlError) -> Self {
        CleaningResponse::Failure {
            status_code: error.status_code(),
            error: error.user_friendly_message(),
            kind: error.kind().to_string(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            CleaningResponse::Success { status_code, .. }
            | CleaningResponse::Failure { status_code, .. } => *status_code,
        }
    }
}
