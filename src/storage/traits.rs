//! Storage traits and error types
//!
//! This module defines the durable key-value interface the frontier is built
//! on, and its error type.

use crate::dedup::SimHash;
use crate::storage::UrlRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable key-value mapping `hashKey -> URL record`
///
/// Implementations must make every `put` visible to a later `get` and must
/// make it survive a crash once `sync` returns. The frontier serializes all
/// calls behind its own lock, so implementations need only be `Send`.
pub trait Store: Send {
    /// Point lookup by hash key
    fn get(&self, key: &str) -> StorageResult<Option<UrlRecord>>;

    /// Point upsert keyed by `record.hash_key`
    fn put(&mut self, record: &UrlRecord) -> StorageResult<()>;

    /// Makes every prior write durable
    fn sync(&mut self) -> StorageResult<()>;

    /// Full iteration over all records (restart recovery scan)
    fn records(&self) -> StorageResult<Vec<UrlRecord>>;

    /// Number of records
    fn len(&self) -> StorageResult<u64>;

    /// Discards every record and fingerprint
    fn clear(&mut self) -> StorageResult<()>;

    /// Records a content fingerprint for a URL; a second call for the same key
    /// leaves the first fingerprint in place
    fn put_fingerprint(&mut self, key: &str, fingerprint: SimHash) -> StorageResult<()>;

    /// Loads all recorded fingerprints
    fn fingerprints(&self) -> StorageResult<Vec<(String, SimHash)>>;

    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
