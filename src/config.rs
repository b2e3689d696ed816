//! Configuration types for chaos-collector

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Retry behavior for index and dataset fetches
///
/// The budget counts *total attempts*, so `max_attempts: 3` means one
/// initial try plus up to two retries. Backoff between attempts grows
/// multiplicatively and is capped at `max_delay`; it is never constant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total fetch attempts per item before recording a permanent failure (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Cap on the delay between attempts (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each failed attempt (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for [`ChaosCollector`](crate::ChaosCollector)
///
/// Every field has a serde default, so a partial JSON/TOML document (or
/// `Config::default()`) yields a working configuration. The embedding
/// application owns loading/saving this structure; the crate only
/// validates and consumes it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory for output files and the resume ledger (default: "./chaos_data")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the aggregated record list inside `output_dir`
    /// (default: "aggregated_domains.txt")
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// URL of the dataset index manifest
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Maximum concurrent dataset downloads (default: 5)
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Per-fetch timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Drop lines that do not look like domain names (default: true)
    #[serde(default = "default_true")]
    pub validate_records: bool,

    /// Collapse duplicate records into a set (default: true)
    ///
    /// When disabled the output is still sorted for determinism, but
    /// duplicates are retained and `duplicates_removed` is reported as 0.
    #[serde(default = "default_true")]
    pub deduplicate: bool,

    /// Skip descriptors already recorded in the resume ledger (default: false)
    #[serde(default)]
    pub resume: bool,

    /// Report would-be downloads without any network or file I/O (default: false)
    #[serde(default)]
    pub dry_run: bool,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Keep the scratch directory (downloads + extracted trees) after a
    /// successful run (default: false)
    #[serde(default)]
    pub keep_scratch: bool,

    /// Retry behavior for fetches
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            output_file: default_output_file(),
            index_url: default_index_url(),
            parallelism: default_parallelism(),
            timeout_secs: default_timeout_secs(),
            validate_records: true,
            deduplicate: true,
            resume: false,
            dry_run: false,
            user_agent: default_user_agent(),
            keep_scratch: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Per-fetch timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::Config {
                message: "parallelism must be at least 1".to_string(),
                key: Some("parallelism".to_string()),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "retry budget must allow at least one attempt".to_string(),
                key: Some("retry.max_attempts".to_string()),
            });
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config {
                message: "timeout_secs must be at least 1".to_string(),
                key: Some("timeout_secs".to_string()),
            });
        }
        if self.index_url.trim().is_empty() {
            return Err(Error::Config {
                message: "index_url must not be empty".to_string(),
                key: Some("index_url".to_string()),
            });
        }
        if self.retry.backoff_multiplier <= 1.0 {
            return Err(Error::Config {
                message: "backoff_multiplier must be greater than 1.0 so the delay grows"
                    .to_string(),
                key: Some("retry.backoff_multiplier".to_string()),
            });
        }
        Ok(())
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./chaos_data")
}

fn default_output_file() -> String {
    "aggregated_domains.txt".to_string()
}

fn default_index_url() -> String {
    "https://chaos-data.projectdiscovery.io/index.json".to_string()
}

fn default_parallelism() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "chaos-collector/0.1".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
