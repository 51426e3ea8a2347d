//! Dual-sink log setup: a terse console layer plus one timestamped file per run.
//!
//! [`init`] hands back a [`Logging`] handle instead of installing a process-wide
//! subscriber. Callers decide the scope: the client runs its whole future under
//! the handle, the server installs it globally because axum spawns connection
//! tasks of its own.

use crate::config::ensure_dir;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::Dispatch;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log directory '{path}' could not be created: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log file '{path}' could not be created: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("a global subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::dispatcher::SetGlobalDefaultError),
}

/// Handle to a configured subscriber and the file it writes to
#[derive(Clone)]
pub struct Logging {
    dispatch: Dispatch,
    file_path: PathBuf,
}

impl Logging {
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Make this subscriber the process-wide default.
    pub fn install_global(&self) -> Result<(), LoggingError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())?;
        Ok(())
    }
}

/// Build the console + file subscriber for `name`, writing `<name>_<YYYYmmddHHMMSS>.log`
/// under `dir`. `level` is used unless RUST_LOG is set.
pub fn init(name: &str, dir: &Path, level: &str) -> Result<Logging, LoggingError> {
    let dir = ensure_dir(dir).map_err(|source| LoggingError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let file_path = dir.join(log_file_name(name, chrono::Local::now()));
    let file = File::create(&file_path).map_err(|source| LoggingError::File {
        path: file_path.clone(),
        source,
    })?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().without_time().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        );

    Ok(Logging {
        dispatch: Dispatch::new(subscriber),
        file_path,
    })
}

fn log_file_name<Tz: chrono::TimeZone>(name: &str, now: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.log", name, now.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_log_file_name_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(log_file_name("client", now), "client_20240309070501.log");
    }

    #[test]
    fn test_init_writes_events_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("log");

        let logging = init("client", &log_dir, "info").unwrap();
        assert!(logging.file_path().starts_with(&log_dir));

        tracing::dispatcher::with_default(logging.dispatch(), || {
            tracing::info!(task_index = 7, "hello from test");
        });

        let contents = std::fs::read_to_string(logging.file_path()).unwrap();
        assert!(contents.contains("hello from test"));
        assert!(contents.contains("task_index=7"));
    }

    #[test]
    fn test_init_fails_when_dir_is_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = init("client", file.path(), "info");
        assert!(matches!(result, Err(LoggingError::Directory { .. })));
    }
}
