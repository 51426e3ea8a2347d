use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Default filter directive; RUST_LOG takes precedence when set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            level: default_log_level(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("log")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_db_dir")]
    pub db_dir: PathBuf,
    #[serde(default = "default_db_file")]
    pub db_file: String,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(default)]
    pub stamp_policy: StampPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            db_dir: default_db_dir(),
            db_file: default_db_file(),
            request_timeout: default_request_timeout(),
            stamp_policy: StampPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join(&self.db_file)
    }
}

fn default_db_dir() -> PathBuf {
    PathBuf::from("db")
}

fn default_db_file() -> String {
    "loremipsum.duckdb".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// When the batch stamp attached to stored rows is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StampPolicy {
    /// One stamp, taken before fan-out, shared by every row of the run
    #[default]
    PerRun,
    /// A fresh stamp taken when each task's rows are inserted
    PerTask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_max_paragraphs")]
    pub max_paragraphs: u32,
    #[serde(default = "default_max_words")]
    pub max_words: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_paragraphs: default_max_paragraphs(),
            max_words: default_max_words(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_max_paragraphs() -> u32 {
    1_000
}

fn default_max_words() -> u32 {
    10_000
}
