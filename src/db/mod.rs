//! SQLite database module for the lost-and-found store
//!
//! ## Tables
//!
//! - `users` - Display names/emails of callers seen through the gateway
//! - `items` - Abstract item records (`lost` or `found`, fixed at creation)
//! - `lost_items` / `found_items` - 1:1 specializations of `items`
//! - `claims` - Ownership claims against found items
//! - `history_records` - Append-only archive of completed returns
//! - `images` - Image references keyed by item and, for found items, found id

pub mod schema;
pub mod users;
pub mod items;
pub mod claims;
pub mod history;

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::LostFoundError;

/// How long a connection waits on another connection's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the lost-and-found database
pub struct LostFoundDb {
    conn: Mutex<Connection>,
}

impl LostFoundDb {
    /// Open or create the database file at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, LostFoundError> {
        info!("Opening SQLite database at {:?}", db_path);

        let conn = Connection::open(db_path)
            .map_err(|e| LostFoundError::Internal(format!("Failed to open SQLite: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| LostFoundError::Internal(format!("Failed to set PRAGMA: {}", e)))?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, LostFoundError> {
        debug!("Opening in-memory SQLite database");

        let conn = Connection::open_in_memory().map_err(|e| {
            LostFoundError::Internal(format!("Failed to open in-memory SQLite: {}", e))
        })?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, LostFoundError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| LostFoundError::Internal(format!("Failed to enable foreign keys: {}", e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| LostFoundError::Internal(format!("Failed to set busy timeout: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), LostFoundError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LostFoundError::Internal(format!("Lock poisoned: {}", e)))?;

        schema::init_schema(&conn)
    }

    /// Run a read against the connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, LostFoundError>
    where
        F: FnOnce(&Connection) -> Result<T, LostFoundError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LostFoundError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Execute a write operation with exclusive access (for transactions)
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, LostFoundError>
    where
        F: FnOnce(&mut Connection) -> Result<T, LostFoundError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| LostFoundError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, LostFoundError> {
        self.with_conn(|conn| {
            let count = |sql: &str| -> Result<u64, LostFoundError> {
                conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                    .map(|n| n as u64)
                    .map_err(|e| LostFoundError::Internal(format!("Query failed: {}", e)))
            };

            Ok(DbStats {
                item_count: count("SELECT COUNT(*) FROM items")?,
                claim_count: count("SELECT COUNT(*) FROM claims")?,
                return_count: count("SELECT COUNT(*) FROM history_records")?,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub item_count: u64,
    pub claim_count: u64,
    pub return_count: u64,
}

/// Current time as stored in timestamp columns
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

// Re-exports
pub use claims::{ClaimListRow, ClaimQuery, ClaimRow, ClaimStatus};
pub use history::{HistoryListRow, HistoryRecordRow};
pub use items::{
    AdminItemRow, FoundItemRow, ImageRow, ItemKind, ItemQuery, ItemRow, ItemSummaryRow,
    LostItemRow, ReportDetails, ReportItemInput, ReportedItem, ReturnStatus,
};
pub use users::UserRow;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_has_empty_stats() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.item_count, 0);
        assert_eq!(stats.claim_count, 0);
        assert_eq!(stats.return_count, 0);
    }

    #[test]
    fn test_reopen_file_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lostfound.db");

        {
            let db = LostFoundDb::open(&path).unwrap();
            db.with_conn(|conn| users::upsert_user(conn, 1, Some("Ada"), None)).unwrap();
        }

        let db = LostFoundDb::open(&path).unwrap();
        let user = db.with_conn(|conn| users::get_user(conn, 1)).unwrap();
        assert_eq!(user.unwrap().display_name.as_deref(), Some("Ada"));
    }
}
