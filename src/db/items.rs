//! Item catalog CRUD operations
//!
//! Items are reported once as either lost or found and are never deleted.
//! The only post-creation mutation in the catalog is a found item's
//! `return_status` moving from `Available` to `Returned`.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::claims::ClaimStatus;
use super::now_timestamp;
use crate::error::LostFoundError;

// =============================================================================
// Types
// =============================================================================

/// Whether an item was reported lost or found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Lost,
    Found,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Lost => "lost",
            ItemKind::Found => "found",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = LostFoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lost" => Ok(ItemKind::Lost),
            "found" => Ok(ItemKind::Found),
            other => Err(LostFoundError::InvalidInput(format!(
                "status must be 'lost' or 'found', got '{}'",
                other
            ))),
        }
    }
}

/// Availability of a found item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum ReturnStatus {
    #[default]
    Available,
    Returned,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Available => "Available",
            ReturnStatus::Returned => "Returned",
        }
    }
}

impl FromStr for ReturnStatus {
    type Err = LostFoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(ReturnStatus::Available),
            "Returned" => Ok(ReturnStatus::Returned),
            other => Err(LostFoundError::InvalidInput(format!(
                "unknown return status '{}'",
                other
            ))),
        }
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse()
                    .map_err(|e: LostFoundError| FromSqlError::Other(e.to_string().into()))
            }
        }
    };
}

pub(crate) use sql_text_enum;

sql_text_enum!(ItemKind);
sql_text_enum!(ReturnStatus);

/// Specialization fields supplied at report time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDetails {
    Lost {
        lost_date: Option<String>,
        possible_location: Option<String>,
    },
    Found {
        reported_date: Option<String>,
        location: Option<String>,
    },
}

impl ReportDetails {
    pub fn kind(&self) -> ItemKind {
        match self {
            ReportDetails::Lost { .. } => ItemKind::Lost,
            ReportDetails::Found { .. } => ItemKind::Found,
        }
    }
}

/// Input for reporting an item
#[derive(Debug, Clone)]
pub struct ReportItemInput {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub details: ReportDetails,
    pub image_urls: Vec<String>,
}

/// Ids assigned to a newly reported item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportedItem {
    Lost { item_id: i64, lost_id: i64 },
    Found { item_id: i64, found_id: i64 },
}

impl ReportedItem {
    pub fn item_id(&self) -> i64 {
        match self {
            ReportedItem::Lost { item_id, .. } | ReportedItem::Found { item_id, .. } => *item_id,
        }
    }
}

/// Item row from database
#[derive(Debug, Clone, Serialize)]
pub struct ItemRow {
    pub item_id: i64,
    pub name: String,
    pub description: String,
    pub status: ItemKind,
    pub category: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LostItemRow {
    pub lost_id: i64,
    pub item_id: i64,
    pub reporter_user_id: i64,
    pub lost_date: String,
    pub possible_location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoundItemRow {
    pub found_id: i64,
    pub item_id: i64,
    pub reporter_user_id: i64,
    pub reported_date: String,
    pub location: Option<String>,
    pub return_status: ReturnStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageRow {
    pub image_id: i64,
    pub item_id: i64,
    pub found_id: Option<i64>,
    pub url: String,
    pub created_at: String,
}

/// Board entry: item joined with its specialization and reporter
#[derive(Debug, Clone, Serialize)]
pub struct ItemSummaryRow {
    pub item_id: i64,
    pub name: String,
    pub description: String,
    pub status: ItemKind,
    pub category: Option<String>,
    pub created_at: String,
    pub lost_id: Option<i64>,
    pub lost_date: Option<String>,
    pub possible_location: Option<String>,
    pub found_id: Option<i64>,
    pub reported_date: Option<String>,
    pub location: Option<String>,
    pub return_status: Option<ReturnStatus>,
    pub thumb_url: Option<String>,
    pub poster_name: Option<String>,
    pub poster_email: Option<String>,
}

/// Admin overview entry, includes returned items
#[derive(Debug, Clone, Serialize)]
pub struct AdminItemRow {
    pub item_id: i64,
    pub name: String,
    pub kind: ItemKind,
    pub found_id: Option<i64>,
    pub return_status: Option<ReturnStatus>,
    pub latest_claim_status: Option<ClaimStatus>,
    pub reporter_name: Option<String>,
    pub created_at: String,
}

/// Query parameters for the item board
#[derive(Debug, Clone)]
pub struct ItemQuery {
    /// Case-insensitive substring match on the item name
    pub search: Option<String>,
    pub status: Option<ItemKind>,
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            category: None,
            limit: 100,
            offset: 0,
        }
    }
}

// =============================================================================
// CRUD Operations
// =============================================================================

/// Create an item together with its lost/found row and image references.
///
/// Runs in one transaction; a failed specialization insert leaves no item row.
pub fn create_item(
    conn: &mut Connection,
    reporter_user_id: i64,
    input: &ReportItemInput,
) -> Result<ReportedItem, LostFoundError> {
    let now = now_timestamp();
    let tx = conn
        .transaction()
        .map_err(|e| LostFoundError::Internal(format!("Transaction failed: {}", e)))?;

    tx.execute(
        "INSERT INTO items (name, description, status, category, created_at)
         VALUES (?, ?, ?, ?, ?)",
        params![
            input.name,
            input.description,
            input.details.kind(),
            input.category,
            now,
        ],
    )
    .map_err(|e| LostFoundError::Internal(format!("Item insert failed: {}", e)))?;
    let item_id = tx.last_insert_rowid();

    let reported = match &input.details {
        ReportDetails::Lost {
            lost_date,
            possible_location,
        } => {
            tx.execute(
                "INSERT INTO lost_items (item_id, reporter_user_id, lost_date, possible_location)
                 VALUES (?, ?, ?, ?)",
                params![
                    item_id,
                    reporter_user_id,
                    lost_date.as_deref().unwrap_or(now.as_str()),
                    possible_location,
                ],
            )
            .map_err(|e| LostFoundError::Internal(format!("Lost item insert failed: {}", e)))?;

            ReportedItem::Lost {
                item_id,
                lost_id: tx.last_insert_rowid(),
            }
        }
        ReportDetails::Found {
            reported_date,
            location,
        } => {
            tx.execute(
                "INSERT INTO found_items (item_id, reporter_user_id, reported_date, location)
                 VALUES (?, ?, ?, ?)",
                params![
                    item_id,
                    reporter_user_id,
                    reported_date.as_deref().unwrap_or(now.as_str()),
                    location,
                ],
            )
            .map_err(|e| LostFoundError::Internal(format!("Found item insert failed: {}", e)))?;

            ReportedItem::Found {
                item_id,
                found_id: tx.last_insert_rowid(),
            }
        }
    };

    let found_id = match reported {
        ReportedItem::Found { found_id, .. } => Some(found_id),
        ReportedItem::Lost { .. } => None,
    };
    for url in &input.image_urls {
        tx.execute(
            "INSERT INTO images (item_id, found_id, url, created_at) VALUES (?, ?, ?, ?)",
            params![item_id, found_id, url, now],
        )
        .map_err(|e| LostFoundError::Internal(format!("Image insert failed: {}", e)))?;
    }

    tx.commit()
        .map_err(|e| LostFoundError::Internal(format!("Commit failed: {}", e)))?;

    Ok(reported)
}

/// Get an item by ID
pub fn get_item(conn: &Connection, item_id: i64) -> Result<Option<ItemRow>, LostFoundError> {
    conn.query_row(
        "SELECT item_id, name, description, status, category, created_at
         FROM items WHERE item_id = ?",
        params![item_id],
        |row| {
            Ok(ItemRow {
                item_id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                status: row.get(3)?,
                category: row.get(4)?,
                created_at: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(|e| LostFoundError::Internal(format!("Failed to get item: {}", e)))
}

/// Get the lost-item row belonging to an item
pub fn get_lost_for_item(
    conn: &Connection,
    item_id: i64,
) -> Result<Option<LostItemRow>, LostFoundError> {
    conn.query_row(
        "SELECT lost_id, item_id, reporter_user_id, lost_date, possible_location
         FROM lost_items WHERE item_id = ?",
        params![item_id],
        |row| {
            Ok(LostItemRow {
                lost_id: row.get(0)?,
                item_id: row.get(1)?,
                reporter_user_id: row.get(2)?,
                lost_date: row.get(3)?,
                possible_location: row.get(4)?,
            })
        },
    )
    .optional()
    .map_err(|e| LostFoundError::Internal(format!("Failed to get lost item: {}", e)))
}

/// Get the found-item row belonging to an item
pub fn get_found_for_item(
    conn: &Connection,
    item_id: i64,
) -> Result<Option<FoundItemRow>, LostFoundError> {
    query_found(conn, "item_id", item_id)
}

/// Get a found item by its found ID
pub fn get_found(conn: &Connection, found_id: i64) -> Result<Option<FoundItemRow>, LostFoundError> {
    query_found(conn, "found_id", found_id)
}

fn query_found(
    conn: &Connection,
    key_column: &str,
    key: i64,
) -> Result<Option<FoundItemRow>, LostFoundError> {
    let sql = format!(
        "SELECT found_id, item_id, reporter_user_id, reported_date, location, return_status
         FROM found_items WHERE {} = ?",
        key_column
    );

    conn.query_row(&sql, params![key], |row| {
        Ok(FoundItemRow {
            found_id: row.get(0)?,
            item_id: row.get(1)?,
            reporter_user_id: row.get(2)?,
            reported_date: row.get(3)?,
            location: row.get(4)?,
            return_status: row.get(5)?,
        })
    })
    .optional()
    .map_err(|e| LostFoundError::Internal(format!("Failed to get found item: {}", e)))
}

/// Flip a found item from `Available` to `Returned`.
///
/// Compare-and-set: returns `false` when the item was already returned (or
/// does not exist), so two approvals racing on one found item cannot both win.
pub fn mark_returned(conn: &Connection, found_id: i64) -> Result<bool, LostFoundError> {
    let rows = conn
        .execute(
            "UPDATE found_items SET return_status = 'Returned'
             WHERE found_id = ? AND return_status = 'Available'",
            params![found_id],
        )
        .map_err(|e| LostFoundError::Internal(format!("Failed to mark item returned: {}", e)))?;

    Ok(rows == 1)
}

/// Images attached to an item, keyed by item id or by its found id
pub fn list_images_for_item(conn: &Connection, item_id: i64) -> Result<Vec<ImageRow>, LostFoundError> {
    let mut stmt = conn
        .prepare(
            "SELECT image_id, item_id, found_id, url, created_at FROM images
             WHERE item_id = ?1
                OR found_id IN (SELECT found_id FROM found_items WHERE item_id = ?1)
             ORDER BY image_id",
        )
        .map_err(|e| LostFoundError::Internal(format!("Failed to prepare statement: {}", e)))?;

    let rows = stmt
        .query_map(params![item_id], |row| {
            Ok(ImageRow {
                image_id: row.get(0)?,
                item_id: row.get(1)?,
                found_id: row.get(2)?,
                url: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .map_err(|e| LostFoundError::Internal(format!("Failed to query images: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| LostFoundError::Internal(format!("Failed to read row: {}", e)))
}

/// List the active board: newest first, returned found items excluded
pub fn list_items(conn: &Connection, query: &ItemQuery) -> Result<Vec<ItemSummaryRow>, LostFoundError> {
    let mut sql = String::from(
        "SELECT i.item_id, i.name, i.description, i.status, i.category, i.created_at,
                l.lost_id, l.lost_date, l.possible_location,
                f.found_id, f.reported_date, f.location, f.return_status,
                (SELECT im.url FROM images im WHERE im.item_id = i.item_id
                 ORDER BY im.image_id LIMIT 1) AS thumb_url,
                u.display_name, u.email
         FROM items i
         LEFT JOIN lost_items l ON l.item_id = i.item_id
         LEFT JOIN found_items f ON f.item_id = i.item_id
         LEFT JOIN users u ON u.user_id = COALESCE(l.reporter_user_id, f.reporter_user_id)
         WHERE (f.found_id IS NULL OR f.return_status <> 'Returned')
           AND NOT EXISTS (
               SELECT 1 FROM claims c
               WHERE c.found_id = f.found_id AND c.status = 'Approved'
           )",
    );
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        sql.push_str(" AND i.name LIKE ? ESCAPE '\\'");
        params_vec.push(Box::new(like_pattern(search.trim())));
    }

    if let Some(status) = query.status {
        sql.push_str(" AND i.status = ?");
        params_vec.push(Box::new(status));
    }

    if let Some(category) = &query.category {
        sql.push_str(" AND i.category = ?");
        params_vec.push(Box::new(category.clone()));
    }

    sql.push_str(" ORDER BY i.item_id DESC LIMIT ? OFFSET ?");
    params_vec.push(Box::new(query.limit));
    params_vec.push(Box::new(query.offset));

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| LostFoundError::Internal(format!("Failed to prepare statement: {}", e)))?;

    let rows = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok(ItemSummaryRow {
                item_id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                status: row.get(3)?,
                category: row.get(4)?,
                created_at: row.get(5)?,
                lost_id: row.get(6)?,
                lost_date: row.get(7)?,
                possible_location: row.get(8)?,
                found_id: row.get(9)?,
                reported_date: row.get(10)?,
                location: row.get(11)?,
                return_status: row.get(12)?,
                thumb_url: row.get(13)?,
                poster_name: row.get(14)?,
                poster_email: row.get(15)?,
            })
        })
        .map_err(|e| LostFoundError::Internal(format!("Failed to query items: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| LostFoundError::Internal(format!("Failed to read row: {}", e)))
}

/// Every item, including returned ones, for the admin overview
pub fn list_all_items(conn: &Connection) -> Result<Vec<AdminItemRow>, LostFoundError> {
    let mut stmt = conn
        .prepare(
            "SELECT i.item_id, i.name, i.status, f.found_id, f.return_status,
                    (SELECT c.status FROM claims c WHERE c.found_id = f.found_id
                     ORDER BY c.claim_id DESC LIMIT 1),
                    u.display_name, i.created_at
             FROM items i
             LEFT JOIN lost_items l ON l.item_id = i.item_id
             LEFT JOIN found_items f ON f.item_id = i.item_id
             LEFT JOIN users u ON u.user_id = COALESCE(l.reporter_user_id, f.reporter_user_id)
             ORDER BY i.item_id DESC",
        )
        .map_err(|e| LostFoundError::Internal(format!("Failed to prepare statement: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(AdminItemRow {
                item_id: row.get(0)?,
                name: row.get(1)?,
                kind: row.get(2)?,
                found_id: row.get(3)?,
                return_status: row.get(4)?,
                latest_claim_status: row.get(5)?,
                reporter_name: row.get(6)?,
                created_at: row.get(7)?,
            })
        })
        .map_err(|e| LostFoundError::Internal(format!("Failed to query items: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| LostFoundError::Internal(format!("Failed to read row: {}", e)))
}

pub fn count_lost_items(conn: &Connection) -> Result<u64, LostFoundError> {
    count(conn, "SELECT COUNT(*) FROM lost_items")
}

pub fn count_found_items(conn: &Connection) -> Result<u64, LostFoundError> {
    count(conn, "SELECT COUNT(*) FROM found_items")
}

fn count(conn: &Connection, sql: &str) -> Result<u64, LostFoundError> {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(|e| LostFoundError::Internal(format!("Count failed: {}", e)))
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LostFoundDb;

    fn found_input(name: &str, location: &str) -> ReportItemInput {
        ReportItemInput {
            name: name.into(),
            description: String::new(),
            category: None,
            details: ReportDetails::Found {
                reported_date: None,
                location: Some(location.into()),
            },
            image_urls: vec![],
        }
    }

    fn lost_input(name: &str) -> ReportItemInput {
        ReportItemInput {
            name: name.into(),
            description: "black leather".into(),
            category: Some("accessories".into()),
            details: ReportDetails::Lost {
                lost_date: Some("2024-03-01".into()),
                possible_location: Some("Library".into()),
            },
            image_urls: vec!["/uploads/wallet.jpg".into()],
        }
    }

    #[test]
    fn test_create_found_item() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let reported = db
            .with_conn_mut(|conn| create_item(conn, 1, &found_input("Blue Bottle", "Turing")))
            .unwrap();

        let (item_id, found_id) = match reported {
            ReportedItem::Found { item_id, found_id } => (item_id, found_id),
            other => panic!("expected found item, got {:?}", other),
        };

        let item = db.with_conn(|conn| get_item(conn, item_id)).unwrap().unwrap();
        assert_eq!(item.status, ItemKind::Found);

        let found = db.with_conn(|conn| get_found(conn, found_id)).unwrap().unwrap();
        assert_eq!(found.item_id, item_id);
        assert_eq!(found.location.as_deref(), Some("Turing"));
        assert_eq!(found.return_status, ReturnStatus::Available);
        assert!(db.with_conn(|conn| get_lost_for_item(conn, item_id)).unwrap().is_none());
    }

    #[test]
    fn test_create_lost_item_with_image() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let reported = db.with_conn_mut(|conn| create_item(conn, 2, &lost_input("Wallet"))).unwrap();

        let lost = db
            .with_conn(|conn| get_lost_for_item(conn, reported.item_id()))
            .unwrap()
            .unwrap();
        assert_eq!(lost.reporter_user_id, 2);
        assert_eq!(lost.lost_date, "2024-03-01");

        let images = db
            .with_conn(|conn| list_images_for_item(conn, reported.item_id()))
            .unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].found_id, None);
    }

    #[test]
    fn test_failed_specialization_leaves_no_item() {
        let db = LostFoundDb::open_in_memory().unwrap();
        // Break the specialization table so the second insert fails
        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE lost_items;")
                .map_err(|e| LostFoundError::Internal(e.to_string()))
        })
        .unwrap();

        let result = db.with_conn_mut(|conn| create_item(conn, 1, &lost_input("Wallet")));
        assert!(result.is_err());

        let remaining: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
                    .map_err(|e| LostFoundError::Internal(e.to_string()))
            })
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_mark_returned_is_compare_and_set() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let reported = db
            .with_conn_mut(|conn| create_item(conn, 1, &found_input("Keys", "Gym")))
            .unwrap();
        let ReportedItem::Found { found_id, .. } = reported else {
            panic!("expected found item");
        };

        assert!(db.with_conn(|conn| mark_returned(conn, found_id)).unwrap());
        assert!(!db.with_conn(|conn| mark_returned(conn, found_id)).unwrap());
        let found = db.with_conn(|conn| get_found(conn, found_id)).unwrap().unwrap();
        assert_eq!(found.return_status, ReturnStatus::Returned);
    }

    #[test]
    fn test_list_items_newest_first_and_hides_returned() {
        let db = LostFoundDb::open_in_memory().unwrap();
        let first = db
            .with_conn_mut(|conn| create_item(conn, 1, &found_input("Umbrella", "Atrium")))
            .unwrap();
        let second = db.with_conn_mut(|conn| create_item(conn, 1, &lost_input("Wallet"))).unwrap();

        let listed = db.with_conn(|conn| list_items(conn, &ItemQuery::default())).unwrap();
        let ids: Vec<i64> = listed.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![second.item_id(), first.item_id()]);

        let ReportedItem::Found { found_id, .. } = first else {
            panic!("expected found item");
        };
        db.with_conn(|conn| mark_returned(conn, found_id)).unwrap();

        let listed = db.with_conn(|conn| list_items(conn, &ItemQuery::default())).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].item_id, second.item_id());
        assert_eq!(listed[0].thumb_url.as_deref(), Some("/uploads/wallet.jpg"));

        // The admin overview still sees both
        assert_eq!(db.with_conn(list_all_items).unwrap().len(), 2);
    }

    #[test]
    fn test_list_items_filters() {
        let db = LostFoundDb::open_in_memory().unwrap();
        db.with_conn_mut(|conn| create_item(conn, 1, &found_input("Blue Bottle", "Turing")))
            .unwrap();
        db.with_conn_mut(|conn| create_item(conn, 1, &lost_input("Brown Wallet"))).unwrap();
        db.with_conn_mut(|conn| create_item(conn, 1, &found_input("100%_cotton scarf", "Gym")))
            .unwrap();

        let by_name = db
            .with_conn(|conn| {
                list_items(conn, &ItemQuery {
                    search: Some("bottle".into()),
                    ..Default::default()
                })
            })
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Blue Bottle");

        let lost_only = db
            .with_conn(|conn| {
                list_items(conn, &ItemQuery {
                    status: Some(ItemKind::Lost),
                    ..Default::default()
                })
            })
            .unwrap();
        assert_eq!(lost_only.len(), 1);
        assert_eq!(lost_only[0].category.as_deref(), Some("accessories"));

        let wildcard = db
            .with_conn(|conn| {
                list_items(conn, &ItemQuery {
                    search: Some("%_".into()),
                    ..Default::default()
                })
            })
            .unwrap();
        assert_eq!(wildcard.len(), 1);

        let paged = db
            .with_conn(|conn| {
                list_items(conn, &ItemQuery {
                    limit: 2,
                    offset: 2,
                    ..Default::default()
                })
            })
            .unwrap();
        assert_eq!(paged.len(), 1);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("lost".parse::<ItemKind>().unwrap(), ItemKind::Lost);
        assert!("Lost".parse::<ItemKind>().is_err());
        assert!(matches!(
            "stolen".parse::<ItemKind>(),
            Err(LostFoundError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("a%b_c"), "%a\\%b\\_c%");
    }
}
