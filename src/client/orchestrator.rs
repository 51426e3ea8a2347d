//! Fan-out/fan-in driver for one client run.
//!
//! Every request runs as its own task in a `JoinSet`, so requests keep making
//! progress while the fan-in loop is busy persisting an earlier result.
//! Finished tasks are handled in completion order. Each successful task is
//! written and committed on its own; a failed task is logged and skipped. A
//! storage error ends the run and aborts whatever is still in flight.

use super::generator_client::{ClientError, GenerationResult, GeneratorClient};
use crate::config::StampPolicy;
use crate::generator::api::GenerationRequest;
use crate::storage::{StampGroup, Storage, StorageError};
use std::collections::HashMap;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::instrument::WithSubscriber;
use tracing::{error, info};

/// A task that produced no result
#[derive(Debug, Error)]
#[error("task {task_index} failed: {error}")]
pub struct TaskFailure {
    pub task_index: usize,
    #[source]
    pub error: ClientError,
}

pub type TaskOutcome = Result<GenerationResult, TaskFailure>;

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub texts: usize,
    pub paragraphs: u32,
    pub words: u32,
    pub stamp_policy: StampPolicy,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Stamp shared by the whole run; `None` under `StampPolicy::PerTask`
    pub run_stamp: Option<i64>,
    /// Task indices in the order they were committed
    pub succeeded: Vec<usize>,
    pub failures: Vec<TaskFailure>,
    pub rows_written: usize,
}

impl RunReport {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.task_index).collect()
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

async fn request_task(
    client: GeneratorClient,
    task_index: usize,
    request: GenerationRequest,
) -> TaskOutcome {
    match client.generate(task_index, request).await {
        Ok(result) => {
            info!(
                task_index,
                paragraphs = request.paragraphs,
                words = request.words,
                "Text received"
            );
            Ok(result)
        }
        Err(error) => Err(TaskFailure { task_index, error }),
    }
}

pub struct Orchestrator<'a, S: Storage + ?Sized> {
    client: GeneratorClient,
    storage: &'a S,
}

impl<'a, S: Storage + ?Sized> Orchestrator<'a, S> {
    pub fn new(client: GeneratorClient, storage: &'a S) -> Self {
        Self { client, storage }
    }

    /// Launch `params.texts` requests and persist each result as it arrives.
    pub async fn run(&self, params: RunParams) -> Result<RunReport, StorageError> {
        self.storage.init_schema().await?;

        let request = GenerationRequest {
            paragraphs: params.paragraphs,
            words: params.words,
        };

        let mut report = RunReport {
            run_stamp: match params.stamp_policy {
                StampPolicy::PerRun => Some(now_millis()),
                StampPolicy::PerTask => None,
            },
            ..RunReport::default()
        };

        info!(
            endpoint = %self.client.endpoint(),
            texts = params.texts,
            paragraphs = params.paragraphs,
            words = params.words,
            stamp_policy = ?params.stamp_policy,
            "Launching requests"
        );

        let mut pending = JoinSet::new();
        let mut task_ids = HashMap::with_capacity(params.texts);
        for task_index in 0..params.texts {
            // Spawned tasks report to the same subscriber as the run itself
            let task = request_task(self.client.clone(), task_index, request)
                .with_current_subscriber();
            let handle = pending.spawn(task);
            task_ids.insert(handle.id(), task_index);
        }

        while let Some(joined) = pending.join_next_with_id().await {
            let outcome = match joined {
                Ok((_, outcome)) => outcome,
                Err(e) => Err(TaskFailure {
                    task_index: task_ids.get(&e.id()).copied().unwrap_or(usize::MAX),
                    error: ClientError::Aborted(e.to_string()),
                }),
            };

            match outcome {
                Ok(result) => {
                    let task_index = result.task_index;
                    let stamp = report.run_stamp.unwrap_or_else(now_millis);
                    let rows = result.into_rows(stamp);

                    let written = self.storage.insert_rows(&rows).await.map_err(|e| {
                        error!(task_index, error = %e, "Failed to store text");
                        e
                    })?;

                    info!(task_index, rows = written, stamp, "Text stored");
                    report.rows_written += written;
                    report.succeeded.push(task_index);
                }
                Err(failure) => {
                    error!(
                        task_index = failure.task_index,
                        paragraphs = params.paragraphs,
                        words = params.words,
                        error = %failure.error,
                        "Request failed"
                    );
                    report.failures.push(failure);
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failures.len(),
            rows = report.rows_written,
            "All requests finished"
        );

        Ok(report)
    }

    /// Read every stored text back, logging it grouped by batch stamp.
    pub async fn read_back(&self) -> Result<Vec<StampGroup>, StorageError> {
        let groups = self.storage.read_grouped().await?;

        for group in &groups {
            info!(stamp = group.batch_stamp, rows = group.rows.len(), "Stored batch");
            for row in &group.rows {
                info!("{}:{} {}", row.task_index, row.paragraph_index, row.text);
            }
        }

        Ok(groups)
    }
}
