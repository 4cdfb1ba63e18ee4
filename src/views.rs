//! View types for the HTTP API boundary
//!
//! These types use camelCase serialization for the TypeScript SPA.
//! Row types in `db/` keep snake_case field names.
//!
//! Pattern:
//! - Services return row types (`ItemSummaryRow`, `ClaimListRow`, ...)
//! - The HTTP layer converts them to view types (`ItemSummaryView`, ...)
//! - ts-rs generates the matching TypeScript from the view types
//!
//! InputView types (suffix InputView) accept camelCase JSON and convert into
//! the service-layer inputs. Report bodies also accept the legacy
//! `Item_name` / `Item_status` style field names.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::db::{
    AdminItemRow, ClaimListRow, ClaimRow, ClaimStatus, FoundItemRow, HistoryListRow, ImageRow,
    ItemKind, ItemQuery, ItemRow, ItemSummaryRow, LostItemRow, ReportDetails, ReportItemInput,
    ReportedItem, UserRow,
};
use crate::error::LostFoundError;
use crate::services::{Analytics, Decision, DecisionOutcome, ItemDetail, ItemSpecialization};

// ============================================================================
// Item Views
// ============================================================================

/// One entry on the item board
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemSummaryView {
    pub item_id: i64,
    pub name: String,
    pub description: String,
    /// `lost` or `found`
    pub status: String,
    pub category: Option<String>,
    pub created_at: String,
    pub lost_id: Option<i64>,
    pub lost_date: Option<String>,
    pub possible_location: Option<String>,
    pub found_id: Option<i64>,
    pub reported_date: Option<String>,
    pub location: Option<String>,
    pub return_status: Option<String>,
    pub thumb_url: Option<String>,
    pub poster_name: Option<String>,
    pub poster_email: Option<String>,
}

impl From<ItemSummaryRow> for ItemSummaryView {
    fn from(r: ItemSummaryRow) -> Self {
        Self {
            item_id: r.item_id,
            name: r.name,
            description: r.description,
            status: r.status.to_string(),
            category: r.category,
            created_at: r.created_at,
            lost_id: r.lost_id,
            lost_date: r.lost_date,
            possible_location: r.possible_location,
            found_id: r.found_id,
            reported_date: r.reported_date,
            location: r.location,
            return_status: r.return_status.map(|s| s.as_str().to_string()),
            thumb_url: r.thumb_url,
            poster_name: r.poster_name,
            poster_email: r.poster_email,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemView {
    pub item_id: i64,
    pub name: String,
    pub description: String,
    pub status: String,
    pub category: Option<String>,
    pub created_at: String,
}

impl From<ItemRow> for ItemView {
    fn from(r: ItemRow) -> Self {
        Self {
            item_id: r.item_id,
            name: r.name,
            description: r.description,
            status: r.status.to_string(),
            category: r.category,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LostItemView {
    pub lost_id: i64,
    pub reporter_user_id: i64,
    pub lost_date: String,
    pub possible_location: Option<String>,
}

impl From<LostItemRow> for LostItemView {
    fn from(r: LostItemRow) -> Self {
        Self {
            lost_id: r.lost_id,
            reporter_user_id: r.reporter_user_id,
            lost_date: r.lost_date,
            possible_location: r.possible_location,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FoundItemView {
    pub found_id: i64,
    pub reporter_user_id: i64,
    pub reported_date: String,
    pub location: Option<String>,
    /// `Available` or `Returned`
    pub return_status: String,
}

impl From<FoundItemRow> for FoundItemView {
    fn from(r: FoundItemRow) -> Self {
        Self {
            found_id: r.found_id,
            reporter_user_id: r.reporter_user_id,
            reported_date: r.reported_date,
            location: r.location,
            return_status: r.return_status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImageView {
    pub image_id: i64,
    pub url: String,
    pub found_id: Option<i64>,
}

impl From<ImageRow> for ImageView {
    fn from(r: ImageRow) -> Self {
        Self {
            image_id: r.image_id,
            url: r.url,
            found_id: r.found_id,
        }
    }
}

/// Item detail; exactly one of `lost` / `found` is set
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemDetailView {
    pub item: ItemView,
    pub lost: Option<LostItemView>,
    pub found: Option<FoundItemView>,
    pub images: Vec<ImageView>,
    pub claims: Vec<ClaimView>,
}

impl From<ItemDetail> for ItemDetailView {
    fn from(d: ItemDetail) -> Self {
        let (lost, found) = match d.specialization {
            ItemSpecialization::Lost(l) => (Some(l.into()), None),
            ItemSpecialization::Found(f) => (None, Some(f.into())),
        };
        Self {
            item: d.item.into(),
            lost,
            found,
            images: d.images.into_iter().map(Into::into).collect(),
            claims: d.claims.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportedItemView {
    pub item_id: i64,
    pub lost_id: Option<i64>,
    pub found_id: Option<i64>,
}

impl From<ReportedItem> for ReportedItemView {
    fn from(r: ReportedItem) -> Self {
        match r {
            ReportedItem::Lost { item_id, lost_id } => Self {
                item_id,
                lost_id: Some(lost_id),
                found_id: None,
            },
            ReportedItem::Found { item_id, found_id } => Self {
                item_id,
                lost_id: None,
                found_id: Some(found_id),
            },
        }
    }
}

/// Admin overview row
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminItemView {
    pub item_id: i64,
    pub name: String,
    pub kind: String,
    pub found_id: Option<i64>,
    pub return_status: Option<String>,
    pub latest_claim_status: Option<String>,
    pub reporter_name: Option<String>,
    pub created_at: String,
}

impl From<AdminItemRow> for AdminItemView {
    fn from(r: AdminItemRow) -> Self {
        Self {
            item_id: r.item_id,
            name: r.name,
            kind: r.kind.to_string(),
            found_id: r.found_id,
            return_status: r.return_status.map(|s| s.as_str().to_string()),
            latest_claim_status: r.latest_claim_status.map(|s| s.to_string()),
            reporter_name: r.reporter_name,
            created_at: r.created_at,
        }
    }
}

// ============================================================================
// Claim Views
// ============================================================================

/// Claim joined with claimant and item names
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClaimView {
    pub claim_id: i64,
    pub found_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub claimant_user_id: i64,
    pub claimant_name: Option<String>,
    pub claimant_email: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ClaimListRow> for ClaimView {
    fn from(r: ClaimListRow) -> Self {
        Self {
            claim_id: r.claim.claim_id,
            found_id: r.claim.found_id,
            item_id: r.item_id,
            item_name: r.item_name,
            claimant_user_id: r.claim.claimant_user_id,
            claimant_name: r.claimant_name,
            claimant_email: r.claimant_email,
            message: r.claim.message,
            status: r.claim.status.to_string(),
            created_at: r.claim.created_at,
            updated_at: r.claim.updated_at,
        }
    }
}

/// A freshly submitted claim
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SubmittedClaimView {
    pub claim_id: i64,
    pub found_id: i64,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<ClaimRow> for SubmittedClaimView {
    fn from(r: ClaimRow) -> Self {
        Self {
            claim_id: r.claim_id,
            found_id: r.found_id,
            message: r.message,
            status: r.status.to_string(),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DecisionView {
    pub claim_id: i64,
    pub status: String,
    pub history_id: Option<i64>,
    /// False when the claim already carried this decision
    pub changed: bool,
}

impl From<DecisionOutcome> for DecisionView {
    fn from(o: DecisionOutcome) -> Self {
        Self {
            claim_id: o.claim_id,
            status: o.status.to_string(),
            history_id: o.history_id,
            changed: o.changed,
        }
    }
}

// ============================================================================
// Admin Views
// ============================================================================

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AnalyticsView {
    pub lost_items: u64,
    pub found_items: u64,
    pub total_users: u64,
    pub total_claims: u64,
    pub pending_claims: u64,
    pub approved_claims: u64,
    pub rejected_claims: u64,
    pub returned_items: u64,
}

impl From<Analytics> for AnalyticsView {
    fn from(a: Analytics) -> Self {
        Self {
            lost_items: a.lost_items,
            found_items: a.found_items,
            total_users: a.total_users,
            total_claims: a.total_claims,
            pending_claims: a.pending_claims,
            approved_claims: a.approved_claims,
            rejected_claims: a.rejected_claims,
            returned_items: a.returned_items,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HistoryRecordView {
    pub history_id: i64,
    pub claim_id: i64,
    pub found_id: i64,
    pub user_id: i64,
    pub return_date: String,
    pub claimant_name: Option<String>,
    pub item_id: i64,
    pub item_name: String,
}

impl From<HistoryListRow> for HistoryRecordView {
    fn from(r: HistoryListRow) -> Self {
        Self {
            history_id: r.record.history_id,
            claim_id: r.record.claim_id,
            found_id: r.record.found_id,
            user_id: r.record.user_id,
            return_date: r.record.return_date,
            claimant_name: r.claimant_name,
            item_id: r.item_id,
            item_name: r.item_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserView {
    pub user_id: i64,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub first_seen_at: String,
}

impl From<UserRow> for UserView {
    fn from(r: UserRow) -> Self {
        Self {
            user_id: r.user_id,
            display_name: r.display_name,
            email: r.email,
            first_seen_at: r.first_seen_at,
        }
    }
}

// ============================================================================
// Input Views
// ============================================================================

/// Body of `POST /api/items`
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportItemInputView {
    /// `lost` or `found`
    #[serde(alias = "Item_status")]
    pub status: String,
    #[serde(default, alias = "Item_name")]
    pub name: String,
    #[serde(default, alias = "Item_description")]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "Lost_Date")]
    pub lost_date: Option<String>,
    #[serde(default, alias = "PossibleLocation")]
    pub possible_location: Option<String>,
    #[serde(default, alias = "Reported_Date")]
    pub reported_date: Option<String>,
    #[serde(default, alias = "Location")]
    pub location: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl TryFrom<ReportItemInputView> for ReportItemInput {
    type Error = LostFoundError;

    fn try_from(v: ReportItemInputView) -> Result<Self, Self::Error> {
        let kind: ItemKind = v.status.parse()?;
        let details = match kind {
            ItemKind::Lost => ReportDetails::Lost {
                lost_date: non_blank(v.lost_date),
                possible_location: non_blank(v.possible_location),
            },
            ItemKind::Found => ReportDetails::Found {
                reported_date: non_blank(v.reported_date),
                location: non_blank(v.location),
            },
        };

        Ok(Self {
            name: v.name,
            description: v.description.unwrap_or_default(),
            category: v.category,
            details,
            image_urls: v.image_urls,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Body of `POST /api/claims/{foundId}`
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SubmitClaimInputView {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/claims/{claimId}/action`
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DecideClaimInputView {
    /// `approve` or `reject`
    #[serde(alias = "action")]
    pub decision: String,
}

impl TryFrom<DecideClaimInputView> for Decision {
    type Error = LostFoundError;

    fn try_from(v: DecideClaimInputView) -> Result<Self, Self::Error> {
        v.decision.parse()
    }
}

/// Body of `PUT /api/admin/claims/{claimId}/status`
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatusUpdateInputView {
    /// `Approved` or `Rejected`
    pub status: String,
}

impl TryFrom<StatusUpdateInputView> for Decision {
    type Error = LostFoundError;

    fn try_from(v: StatusUpdateInputView) -> Result<Self, Self::Error> {
        match v.status.trim().parse::<ClaimStatus>()? {
            ClaimStatus::Approved => Ok(Decision::Approve),
            ClaimStatus::Rejected => Ok(Decision::Reject),
            ClaimStatus::Pending => Err(LostFoundError::InvalidInput(
                "a decided claim cannot move back to Pending".into(),
            )),
        }
    }
}

/// Query string of `GET /api/items` and `GET /api/items/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemQueryParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl ItemQueryParams {
    pub fn parse(query: Option<&str>) -> Result<Self, LostFoundError> {
        match query {
            None | Some("") => Ok(Self::default()),
            Some(q) => serde_urlencoded::from_str(q)
                .map_err(|e| LostFoundError::InvalidInput(format!("Invalid query string: {}", e))),
        }
    }

    /// Convert into a board query with `limit` already resolved
    pub fn into_query(self, limit: u32) -> Result<ItemQuery, LostFoundError> {
        let status = self
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_ascii_lowercase().parse::<ItemKind>())
            .transpose()?;

        Ok(ItemQuery {
            search: self.q.filter(|s| !s.trim().is_empty()),
            status,
            category: self.category.filter(|s| !s.trim().is_empty()),
            limit,
            offset: self.offset.unwrap_or(0),
        })
    }
}
