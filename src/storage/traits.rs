use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One paragraph of one generated text, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    /// Surrogate key, assigned by the store on insert
    pub id: Option<i64>,
    pub task_index: i64,
    /// 1-based position of the paragraph within its task
    pub paragraph_index: i64,
    pub text: String,
    /// Milliseconds since the Unix epoch
    pub batch_stamp: i64,
}

impl StoredRow {
    pub fn new(task_index: i64, paragraph_index: i64, text: String, batch_stamp: i64) -> Self {
        Self {
            id: None,
            task_index,
            paragraph_index,
            text,
            batch_stamp,
        }
    }
}

/// All rows sharing one batch stamp, ordered by (task_index, paragraph_index)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampGroup {
    pub batch_stamp: i64,
    pub rows: Vec<StoredRow>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Create the table and its id sequence if they do not exist yet.
    async fn init_schema(&self) -> Result<(), StorageError>;

    /// Insert all rows in a single transaction and commit it.
    async fn insert_rows(&self, rows: &[StoredRow]) -> Result<usize, StorageError>;

    /// Read every stored row grouped by batch stamp (ascending).
    async fn read_grouped(&self) -> Result<Vec<StampGroup>, StorageError>;

    async fn count_rows(&self) -> Result<u64, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection lock poisoned")]
    LockPoisoned,

    #[error("Connection is still shared and cannot be closed")]
    StillShared,
}

impl From<duckdb::Error> for StorageError {
    fn from(e: duckdb::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}
