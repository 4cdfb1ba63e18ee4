//! Database schema definitions

use rusqlite::Connection;
use tracing::info;

use crate::error::LostFoundError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<(), LostFoundError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!("Migrating schema from v{} to v{}", current_version, SCHEMA_VERSION);
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, LostFoundError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .map_err(|e| {
        LostFoundError::Internal(format!("Failed to create schema_version table: {}", e))
    })?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), LostFoundError> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| LostFoundError::Internal(format!("Failed to clear schema_version: {}", e)))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])
        .map_err(|e| LostFoundError::Internal(format!("Failed to set schema_version: {}", e)))?;
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<(), LostFoundError> {
    conn.execute_batch(USERS_SCHEMA)
        .map_err(|e| LostFoundError::Internal(format!("Failed to create users table: {}", e)))?;

    conn.execute_batch(CATALOG_SCHEMA)
        .map_err(|e| LostFoundError::Internal(format!("Failed to create item tables: {}", e)))?;

    conn.execute_batch(CLAIMS_SCHEMA)
        .map_err(|e| LostFoundError::Internal(format!("Failed to create claim tables: {}", e)))?;

    conn.execute_batch(INDEXES_SCHEMA)
        .map_err(|e| LostFoundError::Internal(format!("Failed to create indexes: {}", e)))?;

    Ok(())
}

/// Users known through the gateway (display data only, no credentials)
const USERS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY NOT NULL,
    display_name TEXT,
    email TEXT,
    first_seen_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL
);
"#;

/// Item catalog: items, their lost/found specialization and image references
const CATALOG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL CHECK (status IN ('lost', 'found')),
    category TEXT,
    created_at TEXT NOT NULL
);

-- lost/found is fixed at report time
CREATE TRIGGER IF NOT EXISTS items_status_immutable
BEFORE UPDATE OF status ON items
WHEN NEW.status <> OLD.status
BEGIN
    SELECT RAISE(ABORT, 'item status is immutable');
END;

CREATE TABLE IF NOT EXISTS lost_items (
    lost_id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL UNIQUE,
    reporter_user_id INTEGER NOT NULL,
    lost_date TEXT NOT NULL,
    possible_location TEXT,

    FOREIGN KEY (item_id) REFERENCES items(item_id)
);

CREATE TABLE IF NOT EXISTS found_items (
    found_id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL UNIQUE,
    reporter_user_id INTEGER NOT NULL,
    reported_date TEXT NOT NULL,
    location TEXT,
    return_status TEXT NOT NULL DEFAULT 'Available'
        CHECK (return_status IN ('Available', 'Returned')),

    FOREIGN KEY (item_id) REFERENCES items(item_id)
);

-- Available -> Returned happens once
CREATE TRIGGER IF NOT EXISTS found_items_return_is_final
BEFORE UPDATE OF return_status ON found_items
WHEN OLD.return_status = 'Returned' AND NEW.return_status <> 'Returned'
BEGIN
    SELECT RAISE(ABORT, 'returned items cannot become available again');
END;

CREATE TABLE IF NOT EXISTS images (
    image_id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL,
    found_id INTEGER,
    url TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (item_id) REFERENCES items(item_id),
    FOREIGN KEY (found_id) REFERENCES found_items(found_id)
);
"#;

/// Claim ledger and history archive
const CLAIMS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS claims (
    claim_id INTEGER PRIMARY KEY AUTOINCREMENT,
    found_id INTEGER NOT NULL,
    claimant_user_id INTEGER NOT NULL,
    message TEXT,
    status TEXT NOT NULL DEFAULT 'Pending'
        CHECK (status IN ('Pending', 'Approved', 'Rejected')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    FOREIGN KEY (found_id) REFERENCES found_items(found_id)
);

-- At most one approved claim per found item
CREATE UNIQUE INDEX IF NOT EXISTS idx_claims_one_approved
    ON claims(found_id) WHERE status = 'Approved';

CREATE TABLE IF NOT EXISTS history_records (
    history_id INTEGER PRIMARY KEY AUTOINCREMENT,
    claim_id INTEGER NOT NULL UNIQUE,
    found_id INTEGER NOT NULL UNIQUE,
    user_id INTEGER NOT NULL,
    return_date TEXT NOT NULL,

    FOREIGN KEY (claim_id) REFERENCES claims(claim_id),
    FOREIGN KEY (found_id) REFERENCES found_items(found_id)
);

CREATE TRIGGER IF NOT EXISTS history_records_no_update
BEFORE UPDATE ON history_records
BEGIN
    SELECT RAISE(ABORT, 'history records are append-only');
END;

CREATE TRIGGER IF NOT EXISTS history_records_no_delete
BEFORE DELETE ON history_records
BEGIN
    SELECT RAISE(ABORT, 'history records are append-only');
END;
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_items_status ON items(status);
CREATE INDEX IF NOT EXISTS idx_items_category ON items(category);
CREATE INDEX IF NOT EXISTS idx_found_items_return_status ON found_items(return_status);
CREATE INDEX IF NOT EXISTS idx_claims_found ON claims(found_id);
CREATE INDEX IF NOT EXISTS idx_claims_status ON claims(status);
CREATE INDEX IF NOT EXISTS idx_images_item ON images(item_id);
CREATE INDEX IF NOT EXISTS idx_images_found ON images(found_id);
"#;
