pub mod traits;
pub mod duckdb;

pub use traits::{StampGroup, Storage, StorageError, StoredRow};
