//! User directory
//!
//! Display data for callers the gateway has authenticated. Listings join
//! against this table for reporter and claimant names.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::now_timestamp;
use crate::error::LostFoundError;

/// User row from database
#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub user_id: i64,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub first_seen_at: String,
    pub last_seen_at: String,
}

/// Record a caller, keeping previously known name/email when new values are absent
pub fn upsert_user(
    conn: &Connection,
    user_id: i64,
    display_name: Option<&str>,
    email: Option<&str>,
) -> Result<(), LostFoundError> {
    let now = now_timestamp();

    conn.execute(
        "INSERT INTO users (user_id, display_name, email, first_seen_at, last_seen_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
             display_name = COALESCE(excluded.display_name, users.display_name),
             email = COALESCE(excluded.email, users.email),
             last_seen_at = excluded.last_seen_at",
        params![user_id, display_name, email, now],
    )
    .map_err(|e| LostFoundError::Internal(format!("Failed to upsert user: {}", e)))?;

    Ok(())
}

/// Get a user by ID
pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<UserRow>, LostFoundError> {
    conn.query_row(
        "SELECT user_id, display_name, email, first_seen_at, last_seen_at
         FROM users WHERE user_id = ?",
        params![user_id],
        map_user,
    )
    .optional()
    .map_err(|e| LostFoundError::Internal(format!("Failed to get user: {}", e)))
}

/// List users, most recently registered first
pub fn list_users(conn: &Connection) -> Result<Vec<UserRow>, LostFoundError> {
    let mut stmt = conn
        .prepare(
            "SELECT user_id, display_name, email, first_seen_at, last_seen_at
             FROM users ORDER BY first_seen_at DESC, user_id DESC",
        )
        .map_err(|e| LostFoundError::Internal(format!("Failed to prepare statement: {}", e)))?;

    let rows = stmt
        .query_map([], map_user)
        .map_err(|e| LostFoundError::Internal(format!("Failed to query users: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| LostFoundError::Internal(format!("Failed to read row: {}", e)))
}

pub fn count_users(conn: &Connection) -> Result<u64, LostFoundError> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(|e| LostFoundError::Internal(format!("Failed to count users: {}", e)))
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        user_id: row.get(0)?,
        display_name: row.get(1)?,
        email: row.get(2)?,
        first_seen_at: row.get(3)?,
        last_seen_at: row.get(4)?,
    })
}
