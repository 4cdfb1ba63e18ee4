//! History archive
//!
//! Append-only record of completed returns. Only inserts and reads live here;
//! the schema rejects updates and deletes with triggers.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::LostFoundError;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecordRow {
    pub history_id: i64,
    pub claim_id: i64,
    pub found_id: i64,
    pub user_id: i64,
    pub return_date: String,
}

/// History record joined with claimant and item names
#[derive(Debug, Clone, Serialize)]
pub struct HistoryListRow {
    pub record: HistoryRecordRow,
    pub claimant_name: Option<String>,
    pub item_id: i64,
    pub item_name: String,
}

/// Append a return to the archive
pub fn record_return(
    conn: &Connection,
    claim_id: i64,
    found_id: i64,
    user_id: i64,
    return_date: &str,
) -> Result<i64, LostFoundError> {
    conn.execute(
        "INSERT INTO history_records (claim_id, found_id, user_id, return_date)
         VALUES (?, ?, ?, ?)",
        params![claim_id, found_id, user_id, return_date],
    )
    .map_err(|e| LostFoundError::Internal(format!("Failed to record return: {}", e)))?;

    Ok(conn.last_insert_rowid())
}

/// History record written for a claim, if any
pub fn get_for_claim(conn: &Connection, claim_id: i64) -> Result<Option<HistoryRecordRow>, LostFoundError> {
    query_one(conn, "claim_id", claim_id)
}

/// History record for a found item, if it has been returned
pub fn get_for_found(conn: &Connection, found_id: i64) -> Result<Option<HistoryRecordRow>, LostFoundError> {
    query_one(conn, "found_id", found_id)
}

fn query_one(
    conn: &Connection,
    key_column: &str,
    key: i64,
) -> Result<Option<HistoryRecordRow>, LostFoundError> {
    let sql = format!(
        "SELECT history_id, claim_id, found_id, user_id, return_date
         FROM history_records WHERE {} = ?",
        key_column
    );

    conn.query_row(&sql, params![key], map_record)
        .optional()
        .map_err(|e| LostFoundError::Internal(format!("Failed to get history record: {}", e)))
}

/// Whole archive, newest first
pub fn list_history(conn: &Connection) -> Result<Vec<HistoryListRow>, LostFoundError> {
    let mut stmt = conn
        .prepare(
            "SELECT h.history_id, h.claim_id, h.found_id, h.user_id, h.return_date,
                    u.display_name, i.item_id, i.name
             FROM history_records h
             JOIN found_items f ON f.found_id = h.found_id
             JOIN items i ON i.item_id = f.item_id
             LEFT JOIN users u ON u.user_id = h.user_id
             ORDER BY h.history_id DESC",
        )
        .map_err(|e| LostFoundError::Internal(format!("Failed to prepare statement: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(HistoryListRow {
                record: map_record(row)?,
                claimant_name: row.get(5)?,
                item_id: row.get(6)?,
                item_name: row.get(7)?,
            })
        })
        .map_err(|e| LostFoundError::Internal(format!("Failed to query history: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| LostFoundError::Internal(format!("Failed to read row: {}", e)))
}

pub fn count_history(conn: &Connection) -> Result<u64, LostFoundError> {
    conn.query_row("SELECT COUNT(*) FROM history_records", [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(|e| LostFoundError::Internal(format!("Failed to count history: {}", e)))
}

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryRecordRow> {
    Ok(HistoryRecordRow {
        history_id: row.get(0)?,
        claim_id: row.get(1)?,
        found_id: row.get(2)?,
        user_id: row.get(3)?,
        return_date: row.get(4)?,
    })
}
