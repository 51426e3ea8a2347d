use crate::client::{ClientError, GeneratorClient, Orchestrator, RunParams, RunReport};
use crate::config::{ensure_dir, load_or_default, validate_config, Config, ConfigError, StampPolicy};
use crate::logging::{self, LoggingError};
use crate::storage::duckdb::DuckDbStorage;
use crate::storage::StorageError;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;
use tracing::instrument::WithSubscriber;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "lorem-client")]
#[command(about = "Lorem ipsum client", long_about = None)]
pub struct ClientArgs {
    /// Generator host
    #[arg(long)]
    pub host: String,

    /// Generator port
    #[arg(long)]
    pub port: u16,

    /// Number of texts to generate
    #[arg(short = 't', long, default_value_t = 100)]
    pub texts: usize,

    /// Number of words per paragraph
    #[arg(short = 'w', long, default_value_t = 100)]
    pub words: u32,

    /// Number of paragraphs per text
    #[arg(short = 'p', long, default_value_t = 10)]
    pub paragraphs: u32,

    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the database file
    #[arg(long)]
    pub db_dir: Option<PathBuf>,

    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub stamp_policy: Option<StampPolicy>,
}

impl ClientArgs {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.db_dir {
            config.client.db_dir = dir.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.logging.dir = dir.clone();
        }
        if let Some(policy) = self.stamp_policy {
            config.client.stamp_policy = policy;
        }
    }

    /// Load the config, apply the flags on top and validate the result
    pub fn prepare_config(&self) -> Result<Config, ConfigError> {
        let mut config = load_or_default(self.config.as_deref())?;
        self.apply(&mut config);
        validate_config(&config)?;
        Ok(config)
    }

    pub fn params(&self, config: &Config) -> RunParams {
        RunParams {
            texts: self.texts,
            paragraphs: self.paragraphs,
            words: self.words,
            stamp_policy: config.client.stamp_policy,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("database directory '{path}' could not be created: {source}")]
    DbDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Load config, set up logging, then run the client under that logging handle.
pub async fn run(args: ClientArgs) -> Result<RunReport, RunError> {
    let config = args.prepare_config()?;

    let logging = logging::init("client", &config.logging.dir, &config.logging.level)?;

    run_client(&args, &config)
        .with_subscriber(logging.dispatch().clone())
        .await
}

/// Run one client pass against an already prepared config, logging any fatal error.
pub async fn run_client(args: &ClientArgs, config: &Config) -> Result<RunReport, RunError> {
    let result = execute(args, config).await;
    if let Err(e) = &result {
        error!(error = %e, "Client run aborted");
    }
    result
}

async fn execute(args: &ClientArgs, config: &Config) -> Result<RunReport, RunError> {
    ensure_dir(&config.client.db_dir).map_err(|source| RunError::DbDirectory {
        path: config.client.db_dir.clone(),
        source,
    })?;
    let db_path = config.client.db_path();

    let client = GeneratorClient::new(
        GeneratorClient::endpoint_for(&args.host, args.port),
        config.client.request_timeout,
    )?;

    info!(path = %db_path.display(), "Opening database");
    let storage = DuckDbStorage::new(&db_path)?;

    let outcome = {
        let orchestrator = Orchestrator::new(client, &storage);
        match orchestrator.run(args.params(config)).await {
            Ok(report) => {
                if let Err(e) = orchestrator.read_back().await {
                    warn!(error = %e, "Readback failed");
                }
                Ok(report)
            }
            Err(e) => Err(e),
        }
    };

    // Closed on every path, before any run error is reported
    let closed = storage.close();
    if let Err(e) = &closed {
        error!(error = %e, "Failed to close database");
    }

    let report = outcome?;
    closed?;
    Ok(report)
}
