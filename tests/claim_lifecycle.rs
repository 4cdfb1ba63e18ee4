//! Integration tests for the claim lifecycle
//!
//! Drives the service layer end to end: report, claim, decide, and the
//! return history that an approval leaves behind.

use std::sync::{Arc, Barrier};
use std::thread;

use campus_lostfound::db::{
    history, ClaimQuery, ClaimStatus, ItemQuery, ReportDetails, ReportItemInput, ReportedItem,
    ReturnStatus,
};
use campus_lostfound::services::ItemSpecialization;
use campus_lostfound::{CallerIdentity, Config, Decision, LostFoundDb, LostFoundError, Services};
use tempfile::TempDir;

fn services() -> Services {
    let db = Arc::new(LostFoundDb::open_in_memory().unwrap());
    Services::new(db, &Config::default())
}

fn found_report(name: &str, location: &str) -> ReportItemInput {
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

fn report_found(services: &Services, name: &str) -> (i64, i64) {
    let finder = CallerIdentity::user(1);
    match services
        .catalog
        .report_item(&finder, found_report(name, "Turing"))
        .unwrap()
    {
        ReportedItem::Found { item_id, found_id } => (item_id, found_id),
        other => panic!("expected found item, got {:?}", other),
    }
}

/// Every found item has a history record iff it is Returned, and at most
/// one approved claim.
fn assert_store_invariants(db: &LostFoundDb) {
    db.with_conn(|conn| {
        let mismatched: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM found_items f
                 WHERE (f.return_status = 'Returned')
                    <> ((SELECT COUNT(*) FROM history_records h WHERE h.found_id = f.found_id) = 1)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(mismatched, 0, "history/return status out of step");

        let doubly_approved: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM (
                     SELECT found_id FROM claims WHERE status = 'Approved'
                     GROUP BY found_id HAVING COUNT(*) > 1
                 )",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(doubly_approved, 0, "found item with two approved claims");
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_approval_returns_item() {
    let services = services();
    let admin = CallerIdentity::admin(100);
    let (item_id, found_id) = report_found(&services, "Blue Bottle");

    let board = services.catalog.list_items(ItemQuery::default()).unwrap();
    let listed = board.iter().find(|i| i.item_id == item_id).unwrap();
    assert_eq!(listed.return_status, Some(ReturnStatus::Available));
    assert_eq!(listed.location.as_deref(), Some("Turing"));

    let claim = services
        .claims
        .submit_claim(&CallerIdentity::user(2), found_id, Some("has my sticker".into()))
        .unwrap();

    let pending = services.reporting.pending_claims(&admin).unwrap();
    assert!(pending
        .iter()
        .any(|c| c.claim.claim_id == claim.claim_id && c.claim.status == ClaimStatus::Pending));

    let before = services.reporting.analytics(&admin).unwrap();
    let outcome = services
        .claims
        .decide_claim(&admin, claim.claim_id, Decision::Approve)
        .unwrap();
    assert_eq!(outcome.status, ClaimStatus::Approved);

    let after = services.reporting.analytics(&admin).unwrap();
    assert_eq!(after.returned_items, before.returned_items + 1);
    assert_eq!(after.approved_claims, before.approved_claims + 1);

    let detail = services.catalog.get_item_detail(item_id).unwrap();
    match detail.specialization {
        ItemSpecialization::Found(found) => assert_eq!(found.return_status, ReturnStatus::Returned),
        ItemSpecialization::Lost(_) => panic!("expected found specialization"),
    }

    let board = services.catalog.list_items(ItemQuery::default()).unwrap();
    assert!(board.iter().all(|i| i.item_id != item_id));

    let history = services.reporting.list_history(&admin).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].record.user_id, 2);
    assert_eq!(history[0].item_name, "Blue Bottle");

    assert_store_invariants(services.db());
}

#[test]
fn test_rejection_keeps_item_listed() {
    let services = services();
    let admin = CallerIdentity::admin(100);
    let (item_id, found_id) = report_found(&services, "Umbrella");

    let claim = services
        .claims
        .submit_claim(&CallerIdentity::user(2), found_id, None)
        .unwrap();

    let before = services.reporting.analytics(&admin).unwrap();
    services
        .claims
        .decide_claim(&admin, claim.claim_id, Decision::Reject)
        .unwrap();
    let after = services.reporting.analytics(&admin).unwrap();

    assert_eq!(after.rejected_claims, before.rejected_claims + 1);
    assert_eq!(after.returned_items, before.returned_items);
    assert!(services
        .db()
        .with_conn(|conn| history::get_for_found(conn, found_id))
        .unwrap()
        .is_none());

    let board = services.catalog.list_items(ItemQuery::default()).unwrap();
    let listed = board.iter().find(|i| i.item_id == item_id).unwrap();
    assert_eq!(listed.return_status, Some(ReturnStatus::Available));

    assert_store_invariants(services.db());
}

#[test]
fn test_claim_on_missing_found_item() {
    let services = services();

    let result = services
        .claims
        .submit_claim(&CallerIdentity::user(2), 4242, Some("mine".into()));
    assert!(matches!(result, Err(LostFoundError::NotFound(_))));
    assert!(services
        .claims
        .list_claims(&ClaimQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_claim_on_returned_item_conflicts() {
    let services = services();
    let admin = CallerIdentity::admin(100);
    let (_, found_id) = report_found(&services, "Laptop");

    let claim = services
        .claims
        .submit_claim(&CallerIdentity::user(2), found_id, None)
        .unwrap();
    services
        .claims
        .decide_claim(&admin, claim.claim_id, Decision::Approve)
        .unwrap();

    let late = services
        .claims
        .submit_claim(&CallerIdentity::user(3), found_id, Some("actually mine".into()));
    assert!(matches!(late, Err(LostFoundError::Conflict(_))));

    let claims = services
        .claims
        .list_claims(&ClaimQuery {
            found_id: Some(found_id),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(claims.len(), 1);
}

#[test]
fn test_repeated_decisions() {
    let services = services();
    let admin = CallerIdentity::admin(100);
    let (_, found_id) = report_found(&services, "Calculator");

    let claim = services
        .claims
        .submit_claim(&CallerIdentity::user(2), found_id, None)
        .unwrap();

    let first = services
        .claims
        .decide_claim(&admin, claim.claim_id, Decision::Approve)
        .unwrap();
    let again = services
        .claims
        .decide_claim(&admin, claim.claim_id, Decision::Approve)
        .unwrap();
    assert!(first.changed);
    assert!(!again.changed);
    assert_eq!(again.status, ClaimStatus::Approved);

    let flip = services
        .claims
        .decide_claim(&admin, claim.claim_id, Decision::Reject);
    assert!(matches!(flip, Err(LostFoundError::Conflict(_))));

    let analytics = services.reporting.analytics(&admin).unwrap();
    assert_eq!(analytics.returned_items, 1);
    assert_eq!(analytics.approved_claims, 1);
    assert_eq!(analytics.rejected_claims, 0);

    assert_store_invariants(services.db());
}

#[test]
fn test_competing_claims_single_winner() {
    let services = services();
    let admin = CallerIdentity::admin(100);
    let (_, found_id) = report_found(&services, "Jacket");

    let claimants: Vec<i64> = (2..=4)
        .map(|user| {
            services
                .claims
                .submit_claim(&CallerIdentity::user(user), found_id, None)
                .unwrap()
                .claim_id
        })
        .collect();

    services
        .claims
        .decide_claim(&admin, claimants[1], Decision::Approve)
        .unwrap();

    for &other in [claimants[0], claimants[2]].iter() {
        let result = services.claims.decide_claim(&admin, other, Decision::Approve);
        assert!(matches!(result, Err(LostFoundError::Conflict(_))));
        services
            .claims
            .decide_claim(&admin, other, Decision::Reject)
            .unwrap();
    }

    assert_store_invariants(services.db());
}

#[test]
fn test_concurrent_approvals_across_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lostfound.db");
    let config = Config::default();

    let first = Services::new(Arc::new(LostFoundDb::open(&path).unwrap()), &config);
    let (_, found_id) = report_found(&first, "Blue Bottle");
    let claim_a = first
        .claims
        .submit_claim(&CallerIdentity::user(2), found_id, None)
        .unwrap();
    let claim_b = first
        .claims
        .submit_claim(&CallerIdentity::user(3), found_id, None)
        .unwrap();

    let second = Services::new(Arc::new(LostFoundDb::open(&path).unwrap()), &config);

    let barrier = Arc::new(Barrier::new(2));
    let contenders = [
        (first.claims.clone(), claim_a.claim_id),
        (second.claims.clone(), claim_b.claim_id),
    ];
    let handles: Vec<_> = contenders
        .into_iter()
        .map(|(claims, claim_id)| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                claims.decide_claim(&CallerIdentity::admin(100), claim_id, Decision::Approve)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(LostFoundError::Conflict(_))))
        .count();
    assert_eq!(winners, 1, "results: {:?}", results);
    assert_eq!(conflicts, 1, "results: {:?}", results);

    assert_eq!(first.db().with_conn(history::count_history).unwrap(), 1);
    assert_store_invariants(first.db());
}
