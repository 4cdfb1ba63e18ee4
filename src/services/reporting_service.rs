//! Admin read surface: analytics and cross-entity listings
//!
//! Pure projections. Counts are taken one query at a time, so a total may
//! trail a write that lands mid-aggregation.

use std::sync::Arc;

use serde::Serialize;

use crate::db::{
    claims, history, items, users, AdminItemRow, ClaimListRow, ClaimQuery, ClaimStatus,
    HistoryListRow, LostFoundDb, UserRow,
};
use crate::error::LostFoundError;
use crate::identity::CallerIdentity;

/// Dashboard counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analytics {
    pub lost_items: u64,
    pub found_items: u64,
    pub total_users: u64,
    pub total_claims: u64,
    pub pending_claims: u64,
    pub approved_claims: u64,
    pub rejected_claims: u64,
    /// Number of history records
    pub returned_items: u64,
}

pub struct ReportingService {
    db: Arc<LostFoundDb>,
}

impl ReportingService {
    pub fn new(db: Arc<LostFoundDb>) -> Self {
        Self { db }
    }

    pub fn analytics(&self, caller: &CallerIdentity) -> Result<Analytics, LostFoundError> {
        caller.require_admin()?;

        self.db.with_conn(|conn| {
            Ok(Analytics {
                lost_items: items::count_lost_items(conn)?,
                found_items: items::count_found_items(conn)?,
                total_users: users::count_users(conn)?,
                total_claims: claims::count_claims(conn, None)?,
                pending_claims: claims::count_claims(conn, Some(ClaimStatus::Pending))?,
                approved_claims: claims::count_claims(conn, Some(ClaimStatus::Approved))?,
                rejected_claims: claims::count_claims(conn, Some(ClaimStatus::Rejected))?,
                returned_items: history::count_history(conn)?,
            })
        })
    }

    pub fn pending_claims(&self, caller: &CallerIdentity) -> Result<Vec<ClaimListRow>, LostFoundError> {
        caller.require_admin()?;
        self.db.with_conn(|conn| claims::list_claims(conn, &ClaimQuery::pending()))
    }

    /// Every claim, newest first
    pub fn all_claims(&self, caller: &CallerIdentity) -> Result<Vec<ClaimListRow>, LostFoundError> {
        caller.require_admin()?;
        self.db.with_conn(|conn| claims::list_claims(conn, &ClaimQuery::default()))
    }

    pub fn list_users(&self, caller: &CallerIdentity) -> Result<Vec<UserRow>, LostFoundError> {
        caller.require_admin()?;
        self.db.with_conn(users::list_users)
    }

    pub fn list_all_items(&self, caller: &CallerIdentity) -> Result<Vec<AdminItemRow>, LostFoundError> {
        caller.require_admin()?;
        self.db.with_conn(items::list_all_items)
    }

    pub fn list_history(&self, caller: &CallerIdentity) -> Result<Vec<HistoryListRow>, LostFoundError> {
        caller.require_admin()?;
        self.db.with_conn(history::list_history)
    }
}
