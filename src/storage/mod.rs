//! Storage module for the durable frontier
//!
//! This module persists the crawler's knowledge of URLs across restarts:
//! - One record per canonical URL, keyed by its hash key
//! - A completion flag that only ever moves from pending to completed
//! - Content fingerprints of extracted pages

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, Store};

use std::path::Path;

/// Opens the SQLite store at `path`
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Store ready for use, schema created if needed
/// * `Err(StorageError)` - The file could not be opened or initialized
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::open(path)
}

/// One durable frontier entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub canonical_url: String,
    pub hash_key: String,
    pub completed: bool,
}

impl UrlRecord {
    /// Creates a pending record for an already-canonical URL
    pub fn new(canonical_url: impl Into<String>) -> Self {
        let canonical_url = canonical_url.into();
        Self {
            hash_key: crate::url::hash_key(&canonical_url),
            canonical_url,
            completed: false,
        }
    }

    /// Creates a completed record for an already-canonical URL
    pub fn completed(canonical_url: impl Into<String>) -> Self {
        Self {
            completed: true,
            ..Self::new(canonical_url)
        }
    }
}
