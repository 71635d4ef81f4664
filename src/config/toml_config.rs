use crate::core::ingest::{DEFAULT_ENDPOINT, DEFAULT_FILE_NAME};
use crate::core::watcher::WatcherConfig;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
    pub watcher: WatcherSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for the local object store.
    pub root: String,
    pub source_bucket: String,
    pub destination_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "./data".to_string(),
            source_bucket: "aws-learning-source-bucket".to_string(),
            destination_bucket: "aws-learning-destination-bucket".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub endpoint: String,
    pub file_name: String,
    pub timeout_seconds: u64,
    /// Append `_YYYYmmdd_HHMMSS` to the file name on every fetch.
    pub timestamped: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            timeout_seconds: 30,
            timestamped: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSection {
    pub max_wait_seconds: u64,
    pub poll_interval_seconds: u64,
}

impl Default for WatcherSection {
    fn default() -> Self {
        let defaults = WatcherConfig::default();
        Self {
            max_wait_seconds: defaults.max_wait.as_secs(),
            poll_interval_seconds: defaults.poll_interval.as_secs(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SOURCE_BUCKET})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            max_wait: Duration::from_secs(self.watcher.max_wait_seconds),
            poll_interval: Duration::from_secs(self.watcher.poll_interval_seconds),
        }
    }

    pub fn ingest_timeout(&self) -> Duration {
        Duration::from_secs(self.ingest.timeout_seconds)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("storage.root", &self.storage.root)?;
        validation::validate_bucket_name("storage.source_bucket", &self.storage.source_bucket)?;
        validation::validate_bucket_name(
            "storage.destination_bucket",
            &self.storage.destination_bucket,
        )?;

        validation::validate_url("ingest.endpoint", &self.ingest.endpoint)?;
        validation::validate_file_extension("ingest.file_name", &self.ingest.file_name, &["json"])?;
        validation::validate_range("ingest.timeout_seconds", self.ingest.timeout_seconds, 1, 600)?;

        self.watcher_config().validate()?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[storage]
root = "./lake"
source_bucket = "raw-zone"
destination_bucket = "clean-zone"

[ingest]
endpoint = "https://api.example.com/countries"
file_name = "snapshot.json"
timeout_seconds = 10
timestamped = true

[watcher]
max_wait_seconds = 60
poll_interval_seconds = 5
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.storage.root, "./lake");
        assert_eq!(config.storage.destination_bucket, "clean-zone");
        assert_eq!(config.ingest.file_name, "snapshot.json");
        assert!(config.ingest.timestamped);
        assert_eq!(
            config.watcher_config(),
            WatcherConfig {
                max_wait: Duration::from_secs(60),
                poll_interval: Duration::from_secs(5),
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = TomlConfig::from_toml_str("[storage]\nroot = \"/tmp/etl\"\n").unwrap();

        assert_eq!(config.storage.root, "/tmp/etl");
        assert_eq!(config.storage.source_bucket, "aws-learning-source-bucket");
        assert_eq!(config.ingest.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.watcher_config(), WatcherConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("COUNTRIES_ETL_TEST_DEST", "substituted-bucket");

        let config = TomlConfig::from_toml_str(
            "[storage]\ndestination_bucket = \"${COUNTRIES_ETL_TEST_DEST}\"\n",
        )
        .unwrap();
        assert_eq!(config.storage.destination_bucket, "substituted-bucket");

        std::env::remove_var("COUNTRIES_ETL_TEST_DEST");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            "[watcher]\npoll_interval_seconds = 0\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[ingest]\nendpoint = \"invalid-url\"\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[storage]\nsource_bucket = \"Bad_Bucket\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[ingest]\nfile_name = \"file_test.json\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.ingest.file_name, "file_test.json");
    }
}
