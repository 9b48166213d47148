//! In-memory storage implementation
//!
//! Not durable; used where the frontier needs a store but persistence is not
//! under test.

use crate::dedup::SimHash;
use crate::storage::traits::{Store, StorageResult};
use crate::storage::UrlRecord;
use std::collections::HashMap;

/// HashMap-backed store that keeps records in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    order: Vec<String>,
    records: HashMap<String, UrlRecord>,
    fingerprints: HashMap<String, SimHash>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `records`
    pub fn with_records<I: IntoIterator<Item = UrlRecord>>(records: I) -> Self {
        let mut store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    fn insert(&mut self, record: UrlRecord) {
        match self.records.get_mut(&record.hash_key) {
            Some(existing) => {
                existing.canonical_url = record.canonical_url;
                existing.completed |= record.completed;
            }
            None => {
                self.order.push(record.hash_key.clone());
                self.records.insert(record.hash_key.clone(), record);
            }
        }
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<UrlRecord>> {
        Ok(self.records.get(key).cloned())
    }

    fn put(&mut self, record: &UrlRecord) -> StorageResult<()> {
        self.insert(record.clone());
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn records(&self) -> StorageResult<Vec<UrlRecord>> {
        Ok(self
            .order
            .iter()
            .filter_map(|key| self.records.get(key).cloned())
            .collect())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.records.len() as u64)
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.order.clear();
        self.records.clear();
        self.fingerprints.clear();
        Ok(())
    }

    fn put_fingerprint(&mut self, key: &str, fingerprint: SimHash) -> StorageResult<()> {
        self.fingerprints
            .entry(key.to_string())
            .or_insert(fingerprint);
        Ok(())
    }

    fn fingerprints(&self) -> StorageResult<Vec<(String, SimHash)>> {
        Ok(self
            .fingerprints
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect())
    }
}
