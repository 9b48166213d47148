//! Database schema definitions
//!
//! This module contains the SQL schema for the frontier's durable store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per canonical URL ever seen
CREATE TABLE IF NOT EXISTS urls (
    hash_key TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    discovered_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_urls_completed ON urls(completed);

-- Content fingerprints of successfully extracted pages
CREATE TABLE IF NOT EXISTS fingerprints (
    hash_key TEXT PRIMARY KEY,
    simhash INTEGER NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
