//! Claim ledger CRUD operations
//!
//! Claims are created `Pending` and leave that state exactly once.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::items::sql_text_enum;
use super::now_timestamp;
use crate::error::LostFoundError;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
        }
    }

    /// Approved and Rejected have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ClaimStatus::Pending)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = LostFoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ClaimStatus::Pending),
            "Approved" => Ok(ClaimStatus::Approved),
            "Rejected" => Ok(ClaimStatus::Rejected),
            other => Err(LostFoundError::InvalidInput(format!(
                "claim status must be Pending, Approved or Rejected, got '{}'",
                other
            ))),
        }
    }
}

sql_text_enum!(ClaimStatus);

/// Claim row from database
#[derive(Debug, Clone, Serialize)]
pub struct ClaimRow {
    pub claim_id: i64,
    pub found_id: i64,
    pub claimant_user_id: i64,
    pub message: Option<String>,
    pub status: ClaimStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Claim joined with claimant and item names
#[derive(Debug, Clone, Serialize)]
pub struct ClaimListRow {
    pub claim: ClaimRow,
    pub claimant_name: Option<String>,
    pub claimant_email: Option<String>,
    pub item_id: i64,
    pub item_name: String,
}

/// Query parameters for listing claims
#[derive(Debug, Clone, Default)]
pub struct ClaimQuery {
    pub status: Option<ClaimStatus>,
    pub found_id: Option<i64>,
}

impl ClaimQuery {
    pub fn pending() -> Self {
        Self {
            status: Some(ClaimStatus::Pending),
            ..Default::default()
        }
    }
}

// =============================================================================
// CRUD Operations
// =============================================================================

/// Insert a new `Pending` claim
pub fn insert_claim(
    conn: &Connection,
    found_id: i64,
    claimant_user_id: i64,
    message: Option<&str>,
) -> Result<ClaimRow, LostFoundError> {
    let now = now_timestamp();

    conn.execute(
        "INSERT INTO claims (found_id, claimant_user_id, message, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'Pending', ?4, ?4)",
        params![found_id, claimant_user_id, message, now],
    )
    .map_err(|e| LostFoundError::Internal(format!("Failed to create claim: {}", e)))?;

    let claim_id = conn.last_insert_rowid();
    get_claim(conn, claim_id)?
        .ok_or_else(|| LostFoundError::Internal("Claim not found after insert".to_string()))
}

/// Get a claim by ID
pub fn get_claim(conn: &Connection, claim_id: i64) -> Result<Option<ClaimRow>, LostFoundError> {
    conn.query_row(
        "SELECT claim_id, found_id, claimant_user_id, message, status, created_at, updated_at
         FROM claims WHERE claim_id = ?",
        params![claim_id],
        map_claim,
    )
    .optional()
    .map_err(|e| LostFoundError::Internal(format!("Failed to get claim: {}", e)))
}

/// Move a `Pending` claim to `status`.
///
/// Returns `false` if the claim was no longer pending.
pub fn resolve_claim(
    conn: &Connection,
    claim_id: i64,
    status: ClaimStatus,
) -> Result<bool, LostFoundError> {
    let rows = conn
        .execute(
            "UPDATE claims SET status = ?, updated_at = ?
             WHERE claim_id = ? AND status = 'Pending'",
            params![status, now_timestamp(), claim_id],
        )
        .map_err(|e| LostFoundError::Internal(format!("Failed to update claim: {}", e)))?;

    Ok(rows == 1)
}

/// List claims joined with claimant and item, newest first
pub fn list_claims(conn: &Connection, query: &ClaimQuery) -> Result<Vec<ClaimListRow>, LostFoundError> {
    let mut sql = String::from(
        "SELECT c.claim_id, c.found_id, c.claimant_user_id, c.message, c.status,
                c.created_at, c.updated_at,
                u.display_name, u.email, i.item_id, i.name
         FROM claims c
         JOIN found_items f ON f.found_id = c.found_id
         JOIN items i ON i.item_id = f.item_id
         LEFT JOIN users u ON u.user_id = c.claimant_user_id
         WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = query.status {
        sql.push_str(" AND c.status = ?");
        params_vec.push(Box::new(status));
    }

    if let Some(found_id) = query.found_id {
        sql.push_str(" AND c.found_id = ?");
        params_vec.push(Box::new(found_id));
    }

    sql.push_str(" ORDER BY c.claim_id DESC");

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| LostFoundError::Internal(format!("Failed to prepare statement: {}", e)))?;

    let rows = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok(ClaimListRow {
                claim: map_claim(row)?,
                claimant_name: row.get(7)?,
                claimant_email: row.get(8)?,
                item_id: row.get(9)?,
                item_name: row.get(10)?,
            })
        })
        .map_err(|e| LostFoundError::Internal(format!("Failed to query claims: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| LostFoundError::Internal(format!("Failed to read row: {}", e)))
}

/// Count claims, optionally restricted to one status
pub fn count_claims(conn: &Connection, status: Option<ClaimStatus>) -> Result<u64, LostFoundError> {
    let result = match status {
        Some(status) => conn.query_row(
            "SELECT COUNT(*) FROM claims WHERE status = ?",
            params![status],
            |row| row.get::<_, i64>(0),
        ),
        None => conn.query_row("SELECT COUNT(*) FROM claims", [], |row| row.get::<_, i64>(0)),
    };

    result
        .map(|n| n as u64)
        .map_err(|e| LostFoundError::Internal(format!("Failed to count claims: {}", e)))
}

fn map_claim(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClaimRow> {
    Ok(ClaimRow {
        claim_id: row.get(0)?,
        found_id: row.get(1)?,
        claimant_user_id: row.get(2)?,
        message: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::items::{create_item, ReportDetails, ReportItemInput, ReportedItem};
    use crate::db::{users, LostFoundDb};

    fn seed_found(db: &LostFoundDb, name: &str) -> i64 {
        let input = ReportItemInput {
            name: name.into(),
            description: String::new(),
            category: None,
            details: ReportDetails::Found {
                reported_date: None,
                location: None,
            },
            image_urls: vec![],
        };
        match db.with_conn_mut(|conn| create_item(conn, 1, &input)).unwrap() {
            ReportedItem::Found { found_id, .. } => found_id,
            other => panic!("expected found item, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_starts_pending() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let found_id = seed_found(&db, "Calculator");

        let claim = db
            .with_conn(|conn| insert_claim(conn, found_id, 4, Some("initials on the back")))
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.message.as_deref(), Some("initials on the back"));
        assert_eq!(claim.created_at, claim.updated_at);
    }

    #[test]
    fn test_insert_requires_existing_found_item() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let result = db.with_conn(|conn| insert_claim(conn, 999, 4, None));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_only_from_pending() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let found_id = seed_found(&db, "Hoodie");
        let claim = db.with_conn(|conn| insert_claim(conn, found_id, 4, None)).unwrap();

        assert!(db
            .with_conn(|conn| resolve_claim(conn, claim.claim_id, ClaimStatus::Rejected))
            .unwrap());
        assert!(!db
            .with_conn(|conn| resolve_claim(conn, claim.claim_id, ClaimStatus::Approved))
            .unwrap());

        let stored = db.with_conn(|conn| get_claim(conn, claim.claim_id)).unwrap().unwrap();
        assert_eq!(stored.status, ClaimStatus::Rejected);
    }

    #[test]
    fn test_second_approval_blocked_by_index() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let found_id = seed_found(&db, "Laptop charger");
        let a = db.with_conn(|conn| insert_claim(conn, found_id, 4, None)).unwrap();
        let b = db.with_conn(|conn| insert_claim(conn, found_id, 5, None)).unwrap();

        db.with_conn(|conn| resolve_claim(conn, a.claim_id, ClaimStatus::Approved))
            .unwrap();
        let second = db.with_conn(|conn| resolve_claim(conn, b.claim_id, ClaimStatus::Approved));
        assert!(second.is_err());
    }

    #[test]
    fn test_list_joins_names_and_filters() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let found_id = seed_found(&db, "Blue Bottle");
        db.with_conn(|conn| users::upsert_user(conn, 4, Some("Sam"), None)).unwrap();

        let first = db.with_conn(|conn| insert_claim(conn, found_id, 4, None)).unwrap();
        let second = db.with_conn(|conn| insert_claim(conn, found_id, 8, None)).unwrap();
        db.with_conn(|conn| resolve_claim(conn, first.claim_id, ClaimStatus::Rejected))
            .unwrap();

        let all = db.with_conn(|conn| list_claims(conn, &ClaimQuery::default())).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].claim.claim_id, second.claim_id);
        assert_eq!(all[1].claimant_name.as_deref(), Some("Sam"));
        assert_eq!(all[1].item_name, "Blue Bottle");

        let pending = db.with_conn(|conn| list_claims(conn, &ClaimQuery::pending())).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].claim.claim_id, second.claim_id);
        assert_eq!(pending[0].claimant_name, None);

        assert_eq!(db.with_conn(|conn| count_claims(conn, None)).unwrap(), 2);
        assert_eq!(
            db.with_conn(|conn| count_claims(conn, Some(ClaimStatus::Rejected)))
                .unwrap(),
            1
        );
    }
}
