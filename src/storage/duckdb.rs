use super::traits::{StampGroup, Storage, StorageError, StoredRow};
use async_trait::async_trait;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// DuckDB implementation of the Storage trait.
///
/// A single connection is shared behind a mutex, so concurrent callers are
/// serialized onto one physical writer. Each call runs on the blocking pool.
pub struct DuckDbStorage {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbStorage {
    /// Open (or create) the database file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            StorageError::Database(format!("failed to open '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory DuckDB storage instance (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Close the underlying connection, surfacing any error DuckDB reports.
    pub fn close(self) -> Result<(), StorageError> {
        let mutex = Arc::try_unwrap(self.conn).map_err(|_| StorageError::StillShared)?;
        let conn = mutex.into_inner().map_err(|_| StorageError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| StorageError::from(e))
    }
}

#[async_trait]
impl Storage for DuckDbStorage {
    async fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StorageError::LockPoisoned)?;

            conn.execute("CREATE SEQUENCE IF NOT EXISTS loremipsum_id_seq", [])?;

            conn.execute(
                "CREATE TABLE IF NOT EXISTS loremipsum (
                    id BIGINT PRIMARY KEY DEFAULT nextval('loremipsum_id_seq'),
                    task_num BIGINT NOT NULL,
                    paragraph_num BIGINT NOT NULL,
                    text VARCHAR NOT NULL,
                    stamp BIGINT NOT NULL,
                    UNIQUE (stamp, task_num, paragraph_num)
                )",
                [],
            )?;

            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_loremipsum_stamp ON loremipsum(stamp)",
                [],
            )?;

            Ok::<(), StorageError>(())
        })
        .await
        .map_err(|e| StorageError::Database(format!("Task join error: {}", e)))?
    }

    async fn insert_rows(&self, rows: &[StoredRow]) -> Result<usize, StorageError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.clone();
        let rows = rows.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO loremipsum (task_num, paragraph_num, text, stamp)
                     VALUES (?, ?, ?, ?)",
                )?;

                for row in &rows {
                    stmt.execute(duckdb::params![
                        row.task_index,
                        row.paragraph_index,
                        row.text,
                        row.batch_stamp,
                    ])?;
                }
            }
            tx.commit()?;

            Ok::<usize, StorageError>(rows.len())
        })
        .await
        .map_err(|e| StorageError::Database(format!("Task join error: {}", e)))?
    }

    async fn read_grouped(&self) -> Result<Vec<StampGroup>, StorageError> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            let mut stmt = conn.prepare(
                "SELECT id, task_num, paragraph_num, text, stamp
                 FROM loremipsum
                 ORDER BY stamp, task_num, paragraph_num",
            )?;

            let rows = stmt.query_map([], |row| {
                Ok(StoredRow {
                    id: Some(row.get(0)?),
                    task_index: row.get(1)?,
                    paragraph_index: row.get(2)?,
                    text: row.get(3)?,
                    batch_stamp: row.get(4)?,
                })
            })?;

            let mut groups: Vec<StampGroup> = Vec::new();
            for row in rows {
                let row = row?;
                match groups.last_mut() {
                    Some(group) if group.batch_stamp == row.batch_stamp => group.rows.push(row),
                    _ => groups.push(StampGroup {
                        batch_stamp: row.batch_stamp,
                        rows: vec![row],
                    }),
                }
            }
            Ok(groups)
        })
        .await
        .map_err(|e| StorageError::Database(format!("Task join error: {}", e)))?
    }

    async fn count_rows(&self) -> Result<u64, StorageError> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM loremipsum", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
        .map_err(|e| StorageError::Database(format!("Task join error: {}", e)))?
    }
}
