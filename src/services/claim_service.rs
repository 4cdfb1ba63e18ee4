//! Claim resolution engine
//!
//! Owns the claim state machine:
//!
//! ```text
//!            approve            (history written, found item -> Returned)
//! Pending ───────────▶ Approved
//!    │
//!    └──────────────▶ Rejected
//!            reject             (status only)
//! ```
//!
//! Both outcomes are terminal. Repeating the decision a claim already carries
//! is a no-op; asking for the other one is a `Conflict`.
//!
//! Every decision runs in one IMMEDIATE transaction, so the return-status
//! check, the claim update, the history insert and the found-item update
//! either all land or none do. The write lock is taken before the check,
//! which serializes two admins approving different claims on one item.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rusqlite::TransactionBehavior;
use serde::Serialize;
use tracing::warn;

use crate::db::{
    self, claims, history, items, ClaimListRow, ClaimQuery, ClaimRow, ClaimStatus, LostFoundDb,
    ReturnStatus,
};
use crate::error::LostFoundError;
use crate::identity::CallerIdentity;

use super::events::{EventBus, LostFoundEvent};

const MAX_MESSAGE_LEN: usize = 2000;

/// Admin verdict on a pending claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Claim status this decision leads to
    pub fn target_status(&self) -> ClaimStatus {
        match self {
            Decision::Approve => ClaimStatus::Approved,
            Decision::Reject => ClaimStatus::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approve => write!(f, "approve"),
            Decision::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for Decision {
    type Err = LostFoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Decision::Approve),
            "reject" => Ok(Decision::Reject),
            other => Err(LostFoundError::InvalidInput(format!(
                "decision must be 'approve' or 'reject', got '{}'",
                other
            ))),
        }
    }
}

/// What a decision did
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub claim_id: i64,
    pub found_id: i64,
    pub claimant_user_id: i64,
    pub status: ClaimStatus,
    /// History record for an approved claim
    pub history_id: Option<i64>,
    /// False when the claim already carried this decision
    pub changed: bool,
}

pub struct ClaimService {
    db: Arc<LostFoundDb>,
    events: Arc<EventBus>,
}

impl ClaimService {
    pub fn new(db: Arc<LostFoundDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Get a claim by ID
    pub fn get(&self, claim_id: i64) -> Result<Option<ClaimRow>, LostFoundError> {
        self.db.with_conn(|conn| claims::get_claim(conn, claim_id))
    }

    /// Claims joined with claimant and item names, newest first
    pub fn list_claims(&self, query: &ClaimQuery) -> Result<Vec<ClaimListRow>, LostFoundError> {
        self.db.with_conn(|conn| claims::list_claims(conn, query))
    }

    /// File a `Pending` claim against a found item.
    ///
    /// Fails with `NotFound` for an unknown found item and `Conflict` when the
    /// item has already been returned; neither case writes a row.
    pub fn submit_claim(
        &self,
        claimant: &CallerIdentity,
        found_id: i64,
        message: Option<String>,
    ) -> Result<ClaimRow, LostFoundError> {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if let Some(m) = &message {
            if m.chars().count() > MAX_MESSAGE_LEN {
                return Err(LostFoundError::InvalidInput(format!(
                    "message must be <= {} characters",
                    MAX_MESSAGE_LEN
                )));
            }
        }

        let claim = self.db.with_conn_mut(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| LostFoundError::Internal(format!("Transaction failed: {}", e)))?;

            let found = items::get_found(&tx, found_id)?.ok_or_else(|| {
                LostFoundError::NotFound(format!("Found item {} not found", found_id))
            })?;
            if found.return_status == ReturnStatus::Returned {
                return Err(LostFoundError::Conflict(format!(
                    "Found item {} has already been returned",
                    found_id
                )));
            }

            let claim = claims::insert_claim(&tx, found_id, claimant.user_id, message.as_deref())?;

            tx.commit()
                .map_err(|e| LostFoundError::Internal(format!("Commit failed: {}", e)))?;
            Ok(claim)
        })?;

        self.events.emit(LostFoundEvent::ClaimSubmitted {
            claim_id: claim.claim_id,
            found_id,
            claimant_user_id: claimant.user_id,
        });

        Ok(claim)
    }

    /// Approve or reject a claim (admin only)
    pub fn decide_claim(
        &self,
        admin: &CallerIdentity,
        claim_id: i64,
        decision: Decision,
    ) -> Result<DecisionOutcome, LostFoundError> {
        admin.require_admin()?;

        let outcome = self
            .db
            .with_conn_mut(|conn| apply_decision(conn, claim_id, decision))
            .inspect_err(|e| {
                if !e.is_client_error() {
                    warn!(claim_id, decision = %decision, error = %e, "Claim decision rolled back");
                }
            })?;

        if outcome.changed {
            self.events.emit(LostFoundEvent::ClaimDecided {
                claim_id,
                status: outcome.status,
                admin_user_id: admin.user_id,
            });

            if let Some(history_id) = outcome.history_id {
                self.events.emit(LostFoundEvent::ItemReturned {
                    history_id,
                    claim_id,
                    found_id: outcome.found_id,
                    user_id: outcome.claimant_user_id,
                });
            }
        }

        Ok(outcome)
    }
}

/// The state machine proper, inside one IMMEDIATE transaction
fn apply_decision(
    conn: &mut rusqlite::Connection,
    claim_id: i64,
    decision: Decision,
) -> Result<DecisionOutcome, LostFoundError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| LostFoundError::Internal(format!("Transaction failed: {}", e)))?;

    let claim = claims::get_claim(&tx, claim_id)?
        .ok_or_else(|| LostFoundError::NotFound(format!("Claim {} not found", claim_id)))?;

    let target = decision.target_status();

    if claim.status.is_terminal() {
        if claim.status == target {
            // Same decision again: report current state, write nothing
            let history_id = history::get_for_claim(&tx, claim_id)?.map(|h| h.history_id);
            return Ok(DecisionOutcome {
                claim_id,
                found_id: claim.found_id,
                claimant_user_id: claim.claimant_user_id,
                status: claim.status,
                history_id,
                changed: false,
            });
        }
        return Err(LostFoundError::Conflict(format!(
            "Claim {} is already {} and cannot be {}d",
            claim_id, claim.status, decision
        )));
    }

    let history_id = match decision {
        Decision::Reject => {
            if !claims::resolve_claim(&tx, claim_id, ClaimStatus::Rejected)? {
                return Err(LostFoundError::Conflict(format!(
                    "Claim {} is no longer pending",
                    claim_id
                )));
            }
            None
        }
        Decision::Approve => {
            let found = items::get_found(&tx, claim.found_id)?.ok_or_else(|| {
                LostFoundError::Internal(format!(
                    "Claim {} references missing found item {}",
                    claim_id, claim.found_id
                ))
            })?;
            if found.return_status == ReturnStatus::Returned {
                return Err(LostFoundError::Conflict(format!(
                    "Found item {} has already been returned to another claimant",
                    claim.found_id
                )));
            }

            if !claims::resolve_claim(&tx, claim_id, ClaimStatus::Approved)? {
                return Err(LostFoundError::Conflict(format!(
                    "Claim {} is no longer pending",
                    claim_id
                )));
            }

            let history_id = history::record_return(
                &tx,
                claim_id,
                claim.found_id,
                claim.claimant_user_id,
                &db::now_timestamp(),
            )?;

            if !items::mark_returned(&tx, claim.found_id)? {
                return Err(LostFoundError::Conflict(format!(
                    "Found item {} has already been returned to another claimant",
                    claim.found_id
                )));
            }

            Some(history_id)
        }
    };

    tx.commit()
        .map_err(|e| LostFoundError::Internal(format!("Commit failed: {}", e)))?;

    Ok(DecisionOutcome {
        claim_id,
        found_id: claim.found_id,
        claimant_user_id: claim.claimant_user_id,
        status: target,
        history_id,
        changed: true,
    })
}
