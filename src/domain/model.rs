use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Sentinel written for optional columns that have no usable value.
pub const NOT_AVAILABLE: &str = "N/A";

/// An unvalidated record exactly as the upstream feed returned it.
pub type RawRecord = serde_json::Value;

/// One row of the cleaned zone. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Capital", serialize_with = "or_not_available")]
    pub capital: Option<String>,
    #[serde(rename = "Population")]
    pub population: u64,
    #[serde(rename = "Area", serialize_with = "or_not_available")]
    pub area: Option<serde_json::Number>,
    #[serde(rename = "Region")]
    pub region: String,
}

fn or_not_available<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_str(NOT_AVAILABLE),
    }
}

/// Why a raw record did not make it into the cleaned output.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    EmptyName,
    NonPositivePopulation,
    MalformedRecord(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyName => write!(f, "name is empty"),
            SkipReason::NonPositivePopulation => write!(f, "population is not positive"),
            SkipReason::MalformedRecord(detail) => write!(f, "malformed record: {}", detail),
        }
    }
}

/// Result of one cleaning pass over a batch.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub cleaned_records: Vec<CleanedRecord>,
    pub skipped_count: usize,
    pub csv_output: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformOutcome {
    pub cleaned_count: usize,
    pub skipped_count: usize,
    pub destination_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchResult {
    Completed(String),
    TimedOut { elapsed: Duration, max_wait: Duration },
}

impl WatchResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, WatchResult::Completed(_))
    }
}

/// Object body plus the content type it was stored with.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_length: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}
