//! Service layer for the lost-and-found backend
//!
//! Services sit between the HTTP handlers and the repository functions in
//! `db/`. Each one owns:
//! - Input validation
//! - Authorization (admin-only operations)
//! - Transaction boundaries
//! - Event emission after committed writes
//!
//! ```text
//! HTTP Handlers (thin)
//!     ↓
//! Services (catalog, claims, reporting)
//!     ↓
//! Repository functions (db/*.rs)
//!     ↓
//! SQLite
//! ```

pub mod response;
pub mod events;
pub mod catalog_service;
pub mod claim_service;
pub mod reporting_service;

pub use catalog_service::{CatalogService, ItemDetail, ItemSpecialization, PageLimits};
pub use claim_service::{ClaimService, Decision, DecisionOutcome};
pub use events::{spawn_logging_listener, EventBus, EventListener, LostFoundEvent};
pub use reporting_service::{Analytics, ReportingService};

use std::sync::Arc;

use crate::config::Config;
use crate::db::{users, LostFoundDb};
use crate::error::LostFoundError;
use crate::identity::CallerIdentity;

/// Service container handed to the HTTP server
pub struct Services {
    pub catalog: Arc<CatalogService>,
    pub claims: Arc<ClaimService>,
    pub reporting: Arc<ReportingService>,
    pub events: Arc<EventBus>,
    db: Arc<LostFoundDb>,
}

impl Services {
    pub fn new(db: Arc<LostFoundDb>, config: &Config) -> Self {
        let events = Arc::new(EventBus::new());
        let limits = PageLimits {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        };

        Self {
            catalog: Arc::new(CatalogService::new(
                db.clone(),
                events.clone(),
                config.max_images_per_item,
                limits,
            )),
            claims: Arc::new(ClaimService::new(db.clone(), events.clone())),
            reporting: Arc::new(ReportingService::new(db.clone())),
            events,
            db,
        }
    }

    /// Remember the caller's display data for name joins
    pub fn record_caller(&self, caller: &CallerIdentity) -> Result<(), LostFoundError> {
        self.db.with_conn(|conn| {
            users::upsert_user(
                conn,
                caller.user_id,
                caller.display_name.as_deref(),
                caller.email.as_deref(),
            )
        })
    }

    pub fn db(&self) -> &Arc<LostFoundDb> {
        &self.db
    }
}
