//! Campus Lost & Found - backend for a campus lost-and-found board
//!
//! Students report items they lost or found, claim found items they believe
//! are theirs, and administrators approve or reject those claims. An approved
//! claim marks the found item `Returned` and appends a record to the return
//! history, all in one transaction.
//!
//! ## Architecture
//!
//! ```text
//! http.rs            REST routes, identity headers, CORS
//!     ↓
//! services/          catalog, claim resolution, admin reporting, events
//!     ↓
//! db/                rusqlite repository functions + schema
//!     ↓
//! SQLite             lostfound.db
//! ```
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/campus-lostfound/
//! ├── lostfound.db           # SQLite database (WAL mode)
//! └── config.toml            # Configuration
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod identity;
pub mod services;
pub mod views;

// Re-exports
pub use config::{Config, IdentityConfig};
pub use db::LostFoundDb;
pub use error::LostFoundError;
pub use http::{HttpServer, Route};
pub use identity::{CallerIdentity, HeaderIdentityProvider, IdentityProvider, Role};
pub use services::{Decision, DecisionOutcome, Services};
