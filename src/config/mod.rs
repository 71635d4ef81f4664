pub mod cli;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_args::{clean_source_key, CliConfig, Command};

#[cfg(feature = "cli")]
mod cli_args {
    use crate::config::toml_config::TomlConfig;
    use crate::core::trigger::decode_object_key;
    use crate::utils::error::Result;
    use crate::utils::validation::Validate;
    use clap::{Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "countries-etl")]
    #[command(about = "Fetch, clean and confirm country data in a local object store")]
    pub struct CliConfig {
        /// Path to a TOML configuration file
        #[arg(short, long, global = true)]
        pub config: Option<String>,

        /// Root directory of the local object store (overrides [storage].root)
        #[arg(long, global = true)]
        pub storage_root: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Fetch raw JSON into the raw zone
        Ingest {
            #[arg(long)]
            endpoint: Option<String>,
            #[arg(long)]
            bucket: Option<String>,
            #[arg(long)]
            file_name: Option<String>,
        },
        /// Clean one raw object into the cleaned zone
        Clean {
            /// Source key, taken literally unless `--encoded` is given
            #[arg(long)]
            key: String,
            /// Decode the key as S3 event notifications encode it (`+`, `%XX`)
            #[arg(long)]
            encoded: bool,
            #[arg(long)]
            source_bucket: Option<String>,
            #[arg(long)]
            dest_bucket: Option<String>,
        },
        /// Wait for a cleaned object to appear
        Watch {
            #[arg(long)]
            key: String,
            #[arg(long)]
            bucket: Option<String>,
            #[arg(long)]
            max_wait: Option<u64>,
            #[arg(long)]
            poll_interval: Option<u64>,
        },
        /// Copy an object between buckets and verify the copy
        Copy {
            #[arg(long)]
            source_bucket: Option<String>,
            #[arg(long)]
            source_key: String,
            #[arg(long)]
            dest_bucket: Option<String>,
            #[arg(long)]
            dest_key: String,
        },
        /// Ingest, clean and confirm in one go
        Run,
    }

    /// Resolves the `clean` source key. Keys typed at the prompt are taken
    /// literally; `--encoded` decodes them like an S3 notification key.
    pub fn clean_source_key(key: &str, encoded: bool) -> Result<String> {
        if encoded {
            decode_object_key(key)
        } else {
            Ok(key.to_string())
        }
    }

    impl CliConfig {
        /// Loads the file config (or defaults) and applies the global overrides.
        pub fn load_settings(&self) -> Result<TomlConfig> {
            let mut settings = match &self.config {
                Some(path) => TomlConfig::from_file(path)?,
                None => TomlConfig::default(),
            };

            if let Some(root) = &self.storage_root {
                settings.storage.root = root.clone();
            }

            match &self.command {
                Command::Ingest {
                    endpoint,
                    bucket,
                    file_name,
                } => {
                    if let Some(endpoint) = endpoint {
                        settings.ingest.endpoint = endpoint.clone();
                    }
                    if let Some(bucket) = bucket {
                        settings.storage.source_bucket = bucket.clone();
                    }
                    if let Some(file_name) = file_name {
                        settings.ingest.file_name = file_name.clone();
                    }
                }
                Command::Clean {
                    source_bucket,
                    dest_bucket,
                    ..
                }
                | Command::Copy {
                    source_bucket,
                    dest_bucket,
                    ..
                } => {
                    if let Some(bucket) = source_bucket {
                        settings.storage.source_bucket = bucket.clone();
                    }
                    if let Some(bucket) = dest_bucket {
                        settings.storage.destination_bucket = bucket.clone();
                    }
                }
                Command::Watch {
                    bucket,
                    max_wait,
                    poll_interval,
                    ..
                } => {
                    if let Some(bucket) = bucket {
                        settings.storage.destination_bucket = bucket.clone();
                    }
                    if let Some(max_wait) = max_wait {
                        settings.watcher.max_wait_seconds = *max_wait;
                    }
                    if let Some(poll_interval) = poll_interval {
                        settings.watcher.poll_interval_seconds = *poll_interval;
                    }
                }
                Command::Run => {}
            }

            settings.validate()?;
            Ok(settings)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_watch_overrides() {
            let cli = CliConfig::parse_from([
                "countries-etl",
                "--storage-root",
                "/tmp/lake",
                "watch",
                "--key",
                "cleaned/countries_data.csv",
                "--bucket",
                "clean-zone",
                "--max-wait",
                "60",
                "--poll-interval",
                "5",
            ]);

            let settings = cli.load_settings().unwrap();

            assert_eq!(settings.storage.root, "/tmp/lake");
            assert_eq!(settings.storage.destination_bucket, "clean-zone");
            assert_eq!(settings.watcher.max_wait_seconds, 60);
            assert_eq!(settings.watcher.poll_interval_seconds, 5);
        }

        #[test]
        fn test_clean_key_is_literal_unless_encoded() {
            let cli = CliConfig::parse_from(["countries-etl", "clean", "--key", "raw/c++.json"]);
            let Command::Clean { key, encoded, .. } = &cli.command else {
                panic!("expected clean");
            };
            assert!(!encoded);
            assert_eq!(clean_source_key(key, *encoded).unwrap(), "raw/c++.json");

            let cli = CliConfig::parse_from([
                "countries-etl",
                "clean",
                "--key",
                "raw/my+countries%2B.json",
                "--encoded",
            ]);
            let Command::Clean { key, encoded, .. } = &cli.command else {
                panic!("expected clean");
            };
            assert_eq!(
                clean_source_key(key, *encoded).unwrap(),
                "raw/my countries+.json"
            );
        }

        #[test]
        fn test_invalid_override_is_rejected() {
            let cli = CliConfig::parse_from([
                "countries-etl",
                "clean",
                "--key",
                "raw/countries_data.json",
                "--dest-bucket",
                "Not_A_Bucket",
            ]);

            assert!(cli.load_settings().is_err());
        }
    }
}
