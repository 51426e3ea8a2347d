use crate::config::{load_or_default, validate_config, Config, ConfigError};
use crate::generator::{run_server, GeneratorState, LoremWords};
use crate::logging::{self, LoggingError};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "lorem-server")]
#[command(about = "Lorem ipsum API", long_about = None)]
pub struct ServerArgs {
    /// Address to bind; overrides server.listen
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl ServerArgs {
    pub fn apply(&self, config: &mut Config) {
        if self.host.is_some() || self.port.is_some() {
            let (default_host, default_port) = config
                .server
                .listen
                .rsplit_once(':')
                .map(|(h, p)| (h.to_string(), p.to_string()))
                .unwrap_or_else(|| ("127.0.0.1".to_string(), "8000".to_string()));

            let host = match &self.host {
                Some(h) => bracket_ipv6(h),
                None => default_host,
            };
            let port = self.port.map(|p| p.to_string()).unwrap_or(default_port);
            config.server.listen = format!("{}:{}", host, port);
        }
        if let Some(dir) = &self.log_dir {
            config.logging.dir = dir.clone();
        }
    }

    /// Load the config, apply the flags on top and validate the result
    pub fn prepare_config(&self) -> Result<Config, ConfigError> {
        let mut config = load_or_default(self.config.as_deref())?;
        self.apply(&mut config);
        validate_config(&config)?;
        Ok(config)
    }
}

/// Wrap a bare IPv6 literal in brackets so it can be joined with a port
fn bracket_ipv6(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn run(args: ServerArgs) -> Result<(), ServeError> {
    let config = args.prepare_config()?;

    let logging = logging::init("server", &config.logging.dir, &config.logging.level)?;
    logging.install_global()?;

    let state = Arc::new(GeneratorState {
        words: Arc::new(LoremWords),
        max_paragraphs: config.server.max_paragraphs,
        max_words: config.server.max_words,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    run_server(&config.server.listen, state, shutdown_rx)
        .await
        .map_err(|e| {
            error!(listen = %config.server.listen, error = %e, "Generator server failed");
            ServeError::from(e)
        })
}
