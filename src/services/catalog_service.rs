//! Catalog service - reporting items and reading the item board

use std::sync::Arc;

use tracing::debug;

use crate::db::{
    self, claims, items, ClaimListRow, FoundItemRow, ImageRow, ItemKind, ItemQuery, ItemRow,
    ItemSummaryRow, LostFoundDb, LostItemRow, ReportItemInput, ReportedItem,
};
use crate::error::LostFoundError;
use crate::identity::CallerIdentity;

use super::events::{EventBus, LostFoundEvent};

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 4000;

/// The lost or found half of an item
#[derive(Debug, Clone)]
pub enum ItemSpecialization {
    Lost(LostItemRow),
    Found(FoundItemRow),
}

/// Full item record for the detail view
#[derive(Debug, Clone)]
pub struct ItemDetail {
    pub item: ItemRow,
    pub specialization: ItemSpecialization,
    pub images: Vec<ImageRow>,
    /// Claims against the item; always empty for lost items
    pub claims: Vec<ClaimListRow>,
}

/// Paging limits applied to board queries
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            max_page_size: 500,
        }
    }
}

pub struct CatalogService {
    db: Arc<LostFoundDb>,
    events: Arc<EventBus>,
    max_images: usize,
    limits: PageLimits,
}

impl CatalogService {
    pub fn new(db: Arc<LostFoundDb>, events: Arc<EventBus>, max_images: usize, limits: PageLimits) -> Self {
        Self {
            db,
            events,
            max_images,
            limits,
        }
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Report a lost or found item on behalf of `reporter`
    pub fn report_item(
        &self,
        reporter: &CallerIdentity,
        mut input: ReportItemInput,
    ) -> Result<ReportedItem, LostFoundError> {
        self.validate_report(&mut input)?;

        let reported = self
            .db
            .with_conn_mut(|conn| items::create_item(conn, reporter.user_id, &input))?;

        debug!(item_id = reported.item_id(), kind = %input.details.kind(), "Item stored");
        self.events.emit(LostFoundEvent::ItemReported {
            item_id: reported.item_id(),
            kind: input.details.kind(),
            reporter_user_id: reporter.user_id,
        });

        Ok(reported)
    }

    fn validate_report(&self, input: &mut ReportItemInput) -> Result<(), LostFoundError> {
        input.name = input.name.trim().to_string();
        if input.name.is_empty() {
            return Err(LostFoundError::InvalidInput("name is required".into()));
        }
        if input.name.chars().count() > MAX_NAME_LEN {
            return Err(LostFoundError::InvalidInput(format!(
                "name must be <= {} characters",
                MAX_NAME_LEN
            )));
        }
        if input.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(LostFoundError::InvalidInput(format!(
                "description must be <= {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }

        input.category = input
            .category
            .take()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if input.image_urls.len() > self.max_images {
            return Err(LostFoundError::InvalidInput(format!(
                "at most {} images per item",
                self.max_images
            )));
        }
        if input.image_urls.iter().any(|url| url.trim().is_empty()) {
            return Err(LostFoundError::InvalidInput("image url must not be empty".into()));
        }

        Ok(())
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Active board: newest first, returned items excluded
    pub fn list_items(&self, mut query: ItemQuery) -> Result<Vec<ItemSummaryRow>, LostFoundError> {
        query.limit = query.limit.clamp(1, self.limits.max_page_size);
        self.db.with_conn(|conn| items::list_items(conn, &query))
    }

    /// Page size for a request that may or may not name one
    pub fn page_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.limits.default_page_size)
            .clamp(1, self.limits.max_page_size)
    }

    /// Item with its specialization, images and claims
    pub fn get_item_detail(&self, item_id: i64) -> Result<ItemDetail, LostFoundError> {
        self.db.with_conn(|conn| {
            let item = items::get_item(conn, item_id)?
                .ok_or_else(|| LostFoundError::NotFound(format!("Item {} not found", item_id)))?;

            let (specialization, claims) = match item.status {
                ItemKind::Lost => {
                    let lost = items::get_lost_for_item(conn, item_id)?.ok_or_else(|| {
                        LostFoundError::Internal(format!("Item {} has no lost record", item_id))
                    })?;
                    (ItemSpecialization::Lost(lost), Vec::new())
                }
                ItemKind::Found => {
                    let found = items::get_found_for_item(conn, item_id)?.ok_or_else(|| {
                        LostFoundError::Internal(format!("Item {} has no found record", item_id))
                    })?;
                    let claims = claims::list_claims(conn, &db::ClaimQuery {
                        found_id: Some(found.found_id),
                        ..Default::default()
                    })?;
                    (ItemSpecialization::Found(found), claims)
                }
            };

            let images = items::list_images_for_item(conn, item_id)?;

            Ok(ItemDetail {
                item,
                specialization,
                images,
                claims,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ReportDetails, ReturnStatus};

    fn service() -> CatalogService {
        let db = Arc::new(LostFoundDb::open_in_memory().unwrap());
        CatalogService::new(db, Arc::new(EventBus::new()), 5, PageLimits::default())
    }

    fn input(name: &str, details: ReportDetails) -> ReportItemInput {
        ReportItemInput {
            name: name.into(),
            description: String::new(),
            category: None,
            details,
            image_urls: vec![],
        }
    }

    fn found(location: &str) -> ReportDetails {
        ReportDetails::Found {
            reported_date: None,
            location: Some(location.into()),
        }
    }

    #[test]
    fn test_blank_name_rejected() {
        let svc = service();
        let result = svc.report_item(&CallerIdentity::user(1), input("   ", found("Turing")));
        assert!(matches!(result, Err(LostFoundError::InvalidInput(_))));
        assert!(svc.list_items(ItemQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_too_many_images_rejected() {
        let svc = service();
        let mut report = input("Scarf", found("Gym"));
        report.image_urls = (0..6).map(|i| format!("/uploads/{}.jpg", i)).collect();

        let result = svc.report_item(&CallerIdentity::user(1), report);
        assert!(matches!(result, Err(LostFoundError::InvalidInput(_))));
    }

    #[test]
    fn test_name_is_trimmed() {
        let svc = service();
        let reported = svc
            .report_item(&CallerIdentity::user(1), input("  Blue Bottle ", found("Turing")))
            .unwrap();
        let detail = svc.get_item_detail(reported.item_id()).unwrap();
        assert_eq!(detail.item.name, "Blue Bottle");
    }

    #[test]
    fn test_detail_for_found_item() {
        let svc = service();
        let mut report = input("Blue Bottle", found("Turing"));
        report.image_urls = vec!["/uploads/bottle.jpg".into()];
        let reported = svc.report_item(&CallerIdentity::user(1), report).unwrap();

        let detail = svc.get_item_detail(reported.item_id()).unwrap();
        match detail.specialization {
            ItemSpecialization::Found(found) => {
                assert_eq!(found.return_status, ReturnStatus::Available);
                assert_eq!(found.location.as_deref(), Some("Turing"));
            }
            ItemSpecialization::Lost(_) => panic!("expected found specialization"),
        }
        assert_eq!(detail.images.len(), 1);
        assert!(detail.claims.is_empty());
    }

    #[test]
    fn test_detail_for_lost_item() {
        let svc = service();
        let reported = svc
            .report_item(
                &CallerIdentity::user(2),
                input(
                    "Wallet",
                    ReportDetails::Lost {
                        lost_date: None,
                        possible_location: None,
                    },
                ),
            )
            .unwrap();

        let detail = svc.get_item_detail(reported.item_id()).unwrap();
        assert!(matches!(detail.specialization, ItemSpecialization::Lost(ref l) if l.reporter_user_id == 2));
    }

    #[test]
    fn test_detail_missing_item() {
        let svc = service();
        assert!(matches!(svc.get_item_detail(42), Err(LostFoundError::NotFound(_))));
    }

    #[test]
    fn test_page_limit_clamped() {
        let svc = service();
        assert_eq!(svc.page_limit(None), 100);
        assert_eq!(svc.page_limit(Some(0)), 1);
        assert_eq!(svc.page_limit(Some(10_000)), 500);
    }
}
