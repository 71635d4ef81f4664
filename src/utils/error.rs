use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Source object not found: {bucket}/{key}")]
    SourceNotFound { bucket: String, key: String },

    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    #[error("Invalid trigger: {message}")]
    InvalidTrigger { message: String },

    #[error("Storage error on {bucket}/{key}: {message}")]
    StorageError {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Failed to write {bucket}/{key}: {message}")]
    StorageWriteFailed {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Timed out waiting for {bucket}/{key} after {elapsed:?} (max wait {max_wait:?})")]
    WatchTimeout {
        bucket: String,
        key: String,
        elapsed: Duration,
        max_wait: Duration,
    },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    HttpStatusError { status: u16, body: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Storage,
    Data,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code used by the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::SourceNotFound { .. }
            | EtlError::ObjectNotFound { .. }
            | EtlError::StorageError { .. }
            | EtlError::StorageWriteFailed { .. }
            | EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::InvalidPayload { .. }
            | EtlError::InvalidTrigger { .. }
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::WatchTimeout { .. } => ErrorCategory::Timeout,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Timeout | ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Storage => match self {
                EtlError::SourceNotFound { .. } | EtlError::ObjectNotFound { .. } => {
                    ErrorSeverity::High
                }
                _ => ErrorSeverity::Critical,
            },
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Stable machine-readable name, used in structured outcome payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::SourceNotFound { .. } => "SourceNotFound",
            EtlError::ObjectNotFound { .. } => "ObjectNotFound",
            EtlError::InvalidPayload { .. } => "InvalidPayload",
            EtlError::InvalidTrigger { .. } => "InvalidTrigger",
            EtlError::StorageError { .. } => "StorageError",
            EtlError::StorageWriteFailed { .. } => "StorageWriteFailed",
            EtlError::WatchTimeout { .. } => "WatchTimeout",
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => "ApiError",
            EtlError::CsvError(_) => "CsvError",
            EtlError::IoError(_) => "IoError",
            EtlError::SerializationError(_) => "SerializationError",
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "ConfigError",
        }
    }

    /// HTTP-style status for outcome payloads returned to an orchestrator.
    pub fn status_code(&self) -> u16 {
        match self {
            EtlError::SourceNotFound { .. } | EtlError::ObjectNotFound { .. } => 404,
            EtlError::InvalidPayload { .. } | EtlError::InvalidTrigger { .. } => 400,
            EtlError::WatchTimeout { .. } => 504,
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => 502,
            _ => 500,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::SourceNotFound { bucket, key } => {
                format!("Source file not found: {}/{}", bucket, key)
            }
            EtlError::InvalidPayload { message } => {
                format!("The raw payload could not be cleaned: {}", message)
            }
            EtlError::StorageWriteFailed { bucket, key, .. } => {
                format!("Could not write cleaned output to {}/{}", bucket, key)
            }
            EtlError::WatchTimeout {
                bucket,
                key,
                max_wait,
                ..
            } => format!(
                "Cleaning did not complete within {}s ({}/{} never appeared)",
                max_wait.as_secs(),
                bucket,
                key
            ),
            EtlError::HttpStatusError { status, .. } => {
                format!("The data source responded with HTTP {}", status)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::SourceNotFound { .. } | EtlError::ObjectNotFound { .. } => {
                "Upload the raw file first, or check the bucket and key"
            }
            EtlError::InvalidPayload { .. } => "The raw file must contain a JSON array of records",
            EtlError::InvalidTrigger { .. } => {
                "Send either an S3 object-created event or {source_bucket, source_key}"
            }
            EtlError::StorageError { .. } | EtlError::StorageWriteFailed { .. } => {
                "Check storage permissions and that the destination bucket exists"
            }
            EtlError::WatchTimeout { .. } => {
                "Check the cleaning stage logs, or raise the maximum wait time"
            }
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => {
                "Check network connectivity and the ingest endpoint"
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Inspect the raw payload for unexpected data"
            }
            EtlError::IoError(_) => "Check file paths and permissions",
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Review the configuration file and flags",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
