//! Database schema definitions
//!
//! This module contains the SQL schema for the Sumi-Scout database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track discovery runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    pages_succeeded INTEGER NOT NULL DEFAULT 0,
    pages_failed INTEGER NOT NULL DEFAULT 0,
    schemas_detected INTEGER NOT NULL DEFAULT 0,
    stop_reason TEXT
);

-- Detected extraction schemas, stored whole as JSON
CREATE TABLE IF NOT EXISTS schemas (
    schema_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    domain TEXT NOT NULL,
    confidence REAL NOT NULL,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_schemas_domain ON schemas(domain);

-- Trained model blobs by key
CREATE TABLE IF NOT EXISTS models (
    key TEXT PRIMARY KEY,
    blob TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

INSERT OR IGNORE INTO schema_version (version) VALUES (1);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
