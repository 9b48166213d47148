//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::dedup::SimHash;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StorageResult};
use crate::storage::UrlRecord;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens the database at `path`, creating it, its parent directory and its
    /// schema if needed
    ///
    /// The connection runs in WAL mode with `synchronous = FULL`, so every
    /// committed statement is durable before it returns.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<UrlRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT hash_key, url, completed FROM urls WHERE hash_key = ?1",
                params![key],
                |row| {
                    Ok(UrlRecord {
                        hash_key: row.get(0)?,
                        canonical_url: row.get(1)?,
                        completed: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    fn put(&mut self, record: &UrlRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let completed_at = record.completed.then(|| now.clone());

        // `completed` only ever moves false -> true
        self.conn.execute(
            "INSERT INTO urls (hash_key, url, completed, discovered_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(hash_key) DO UPDATE SET
                 url = excluded.url,
                 completed = MAX(urls.completed, excluded.completed),
                 completed_at = COALESCE(urls.completed_at, excluded.completed_at)",
            params![
                record.hash_key,
                record.canonical_url,
                record.completed,
                now,
                completed_at
            ],
        )?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }

    fn records(&self) -> StorageResult<Vec<UrlRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash_key, url, completed FROM urls ORDER BY rowid")?;

        let records = stmt
            .query_map([], |row| {
                Ok(UrlRecord {
                    hash_key: row.get(0)?,
                    canonical_url: row.get(1)?,
                    completed: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn len(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn clear(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DELETE FROM urls; DELETE FROM fingerprints;")?;
        tx.commit()?;
        Ok(())
    }

    fn put_fingerprint(&mut self, key: &str, fingerprint: SimHash) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO fingerprints (hash_key, simhash) VALUES (?1, ?2)",
            params![key, fingerprint.to_i64()],
        )?;
        Ok(())
    }

    fn fingerprints(&self) -> StorageResult<Vec<(String, SimHash)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT hash_key, simhash FROM fingerprints")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, SimHash::from_i64(row.get(1)?)))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_and_get() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let record = UrlRecord::new("https://www.ics.uci.edu/");

        store.put(&record).unwrap();

        assert_eq!(store.get(&record.hash_key).unwrap(), Some(record));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert_eq!(store.get("missing").unwrap(), None);
        assert!(!store.contains("missing").unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_put_is_upsert() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let mut record = UrlRecord::new("https://www.ics.uci.edu/");

        store.put(&record).unwrap();
        record.completed = true;
        store.put(&record).unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert!(store.get(&record.hash_key).unwrap().unwrap().completed);
    }

    #[test]
    fn test_completed_never_reverts() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let mut record = UrlRecord::new("https://www.ics.uci.edu/");
        record.completed = true;
        store.put(&record).unwrap();

        record.completed = false;
        store.put(&record).unwrap();

        assert!(store.get(&record.hash_key).unwrap().unwrap().completed);
    }

    #[test]
    fn test_records_in_insertion_order() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let urls = [
            "https://www.ics.uci.edu/c",
            "https://www.ics.uci.edu/a",
            "https://www.ics.uci.edu/b",
        ];
        for url in urls {
            store.put(&UrlRecord::new(url)).unwrap();
        }

        let loaded: Vec<String> = store
            .records()
            .unwrap()
            .into_iter()
            .map(|r| r.canonical_url)
            .collect();
        assert_eq!(loaded, urls);
    }

    #[test]
    fn test_fingerprint_recorded_once() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store.put_fingerprint("k", SimHash(1)).unwrap();
        store.put_fingerprint("k", SimHash(2)).unwrap();
        store.put_fingerprint("j", SimHash(u64::MAX)).unwrap();

        let mut fingerprints = store.fingerprints().unwrap();
        fingerprints.sort();
        assert_eq!(
            fingerprints,
            vec![
                ("j".to_string(), SimHash(u64::MAX)),
                ("k".to_string(), SimHash(1))
            ]
        );
    }

    #[test]
    fn test_clear() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.put(&UrlRecord::new("https://www.ics.uci.edu/")).unwrap();
        store.put_fingerprint("k", SimHash(1)).unwrap();

        store.clear().unwrap();

        assert!(store.is_empty().unwrap());
        assert!(store.fingerprints().unwrap().is_empty());
    }

    #[test]
    fn test_failed_clear_keeps_every_record() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.put(&UrlRecord::new("https://www.ics.uci.edu/")).unwrap();
        store.conn.execute_batch("DROP TABLE fingerprints;").unwrap();

        assert!(store.clear().is_err());

        assert_eq!(store.len().unwrap(), 1);
        assert!(store.conn.is_autocommit());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("frontier.db");

        let mut store = SqliteStore::open(&path).unwrap();
        store.put(&UrlRecord::new("https://www.ics.uci.edu/")).unwrap();
        store.sync().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frontier.db");
        let mut record = UrlRecord::new("https://www.ics.uci.edu/");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.put(&record).unwrap();
            record.completed = true;
            store.put(&record).unwrap();
            store.put_fingerprint(&record.hash_key, SimHash(42)).unwrap();
            store.sync().unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(&record.hash_key).unwrap(), Some(record.clone()));
        assert_eq!(
            store.fingerprints().unwrap(),
            vec![(record.hash_key, SimHash(42))]
        );
    }
}
