use chrono::{Local, TimeZone, Utc};

use crate::api::{ApiError, Client, ClientOptions, UserRecord};
use crate::mutation::{DeleteOutcome, MutationCoordinator, MutationError};
use crate::store::{LoadStatus, RecordStore};
use crate::view::{project, SortField, SortOrder, ViewParams};

fn record(id: i64, name: &str, email: &str, created_at: &str) -> UserRecord {
    UserRecord {
        id,
        name: name.to_string(),
        email: email.to_string(),
        created_at: crate::api::parse_created_at(created_at).unwrap(),
    }
}

fn loaded_store(records: Vec<UserRecord>) -> RecordStore {
    let mut store = RecordStore::new();
    store.begin_load();
    store.finish_load(Ok(records));
    store
}

/// Client pointed at a port nothing listens on; every request fails at the
/// transport layer.
fn unreachable_client() -> Client {
    Client::new(&ClientOptions {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
        proxy: None,
    })
    .unwrap()
}

#[test]
fn two_records_sorted_by_id_descending() {
    let store = loaded_store(vec![
        record(1, "Ana", "ana@x.com", "2024-01-01"),
        record(2, "Bruno", "bruno@x.com", "2024-01-03"),
    ]);
    let params = ViewParams {
        sort_field: SortField::Id,
        sort_order: SortOrder::Descending,
        ..Default::default()
    };
    let projection = project(store.records(), &params);
    let ids: Vec<i64> = projection.visible.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(projection.total_pages, 1);
}

#[test]
fn search_narrows_to_matching_record() {
    let store = loaded_store(vec![
        record(1, "Ana", "ana@x.com", "2024-01-01"),
        record(2, "Bruno", "bruno@x.com", "2024-01-03"),
    ]);
    let mut params = ViewParams::default();
    params.set_search("bru");
    let projection = project(store.records(), &params);
    assert_eq!(projection.total_filtered, 1);
    assert_eq!(projection.visible[0].id, 2);
}

#[test]
fn twenty_five_records_page_three_shows_the_tail() {
    let records: Vec<UserRecord> = (1..=25)
        .map(|i| record(i, &format!("User {i}"), &format!("u{i}@x.com"), "2024-01-01"))
        .collect();
    let store = loaded_store(records);
    let params = ViewParams {
        sort_field: SortField::Id,
        sort_order: SortOrder::Ascending,
        page: 3,
        ..Default::default()
    };
    let projection = project(store.records(), &params);
    assert_eq!(projection.visible.len(), 5);
    assert_eq!(projection.total_pages, 3);
}

#[test]
fn empty_directory_metrics_are_all_zero() {
    let store = loaded_store(vec![]);
    let now = Local.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
    let snapshot = crate::metrics::derive(store.records(), now);
    assert_eq!(snapshot.growth_rate, 0.0);
    assert_eq!(snapshot.daily_histogram.len(), 7);
    assert!(snapshot.daily_histogram.iter().all(|b| b.new_records == 0));
}

#[test]
fn delete_then_retry_is_a_noop() {
    let mut store = loaded_store(vec![
        record(1, "Ana", "ana@x.com", "2024-01-01"),
        record(2, "Bruno", "bruno@x.com", "2024-01-03"),
    ]);

    assert!(store.remove(2));
    assert!(store.records().iter().all(|r| r.id != 2));

    assert!(!store.remove(2));
    assert_eq!(store.records().len(), 1);
}

#[test]
fn page_clamps_after_a_shrink() {
    let records: Vec<UserRecord> = (1..=21)
        .map(|i| record(i, "User", "u@x.com", "2024-01-01"))
        .collect();
    let mut store = loaded_store(records);
    let mut params = ViewParams {
        sort_field: SortField::Id,
        sort_order: SortOrder::Ascending,
        page: 3,
        ..Default::default()
    };

    let projection = project(store.records(), &params);
    assert_eq!(projection.total_pages, 3);
    assert_eq!(projection.visible.len(), 1);

    // Deleting the only record on page 3 leaves the page out of range; the
    // caller clamps and re-projects.
    store.remove(21);
    let projection = project(store.records(), &params);
    assert_eq!(projection.total_pages, 2);
    assert!(projection.visible.is_empty());

    params.clamp_page(projection.total_pages);
    assert_eq!(params.page, 2);
    let projection = project(store.records(), &params);
    assert_eq!(projection.visible.len(), 10);
}

#[test]
fn failed_reload_keeps_the_stale_view() {
    let mut store = loaded_store(vec![record(1, "Ana", "ana@x.com", "2024-01-01")]);

    store.begin_load();
    store.finish_load(Err(ApiError::Status { status: 502 }));

    assert!(matches!(store.status(), LoadStatus::Failed(_)));
    let params = ViewParams::default();
    let projection = project(store.records(), &params);
    assert_eq!(projection.total_filtered, 1);
}

#[tokio::test]
async fn backend_failure_leaves_store_untouched() {
    let client = unreachable_client();
    let mut store = loaded_store(vec![
        record(1, "Ana", "ana@x.com", "2024-01-01"),
        record(2, "Bruno", "bruno@x.com", "2024-01-03"),
    ]);
    let mut coordinator = MutationCoordinator::new();

    let result = coordinator
        .delete_record(&client, &mut store, 2, |_| true)
        .await;

    assert!(matches!(result, Err(MutationError::Failed { .. })));
    assert!(store.records().iter().any(|r| r.id == 2));
    // The failed attempt released the id; a retry may begin.
    assert!(!coordinator.is_in_flight(2));
}

#[tokio::test]
async fn declined_confirmation_never_reaches_the_backend() {
    let client = unreachable_client();
    let mut store = loaded_store(vec![record(2, "Bruno", "bruno@x.com", "2024-01-03")]);
    let mut coordinator = MutationCoordinator::new();

    let result = coordinator
        .delete_record(&client, &mut store, 2, |_| false)
        .await;

    // An unreachable backend would have failed the call; cancelling first
    // means no request was issued at all.
    assert!(matches!(result, Ok(DeleteOutcome::Cancelled)));
    assert_eq!(store.records().len(), 1);
    assert!(!coordinator.is_in_flight(2));
}

#[tokio::test]
async fn mid_flight_conflict_is_rejected_without_a_second_request() {
    let client = unreachable_client();
    let mut store = loaded_store(vec![record(2, "Bruno", "bruno@x.com", "2024-01-03")]);
    let mut coordinator = MutationCoordinator::new();

    // Simulate the first request still being outstanding.
    coordinator.begin(2).unwrap();

    let result = coordinator
        .delete_record(&client, &mut store, 2, |_| true)
        .await;
    assert!(matches!(result, Err(MutationError::Conflict { id: 2 })));
    assert_eq!(store.records().len(), 1);

    // Still held by the outstanding request, not cleared by the rejection.
    assert!(coordinator.is_in_flight(2));
}

#[test]
fn wire_payload_flows_through_store_view_and_metrics() {
    let raw = r#"[
        {"id": 2, "name": "Bruno", "email": "bruno@x.com", "created_at": "2024-01-03T09:00:00Z"},
        {"id": 1, "name": "Ana", "email": "ana@x.com", "created_at": "2024-01-01"}
    ]"#;
    let records: Vec<UserRecord> = serde_json::from_str(raw).unwrap();
    let store = loaded_store(records);

    let params = ViewParams {
        sort_field: SortField::CreatedAt,
        sort_order: SortOrder::Ascending,
        ..Default::default()
    };
    let projection = project(store.records(), &params);
    let ids: Vec<i64> = projection.visible.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2]);

    let now = Utc
        .with_ymd_and_hms(2024, 1, 5, 12, 0, 0)
        .unwrap()
        .with_timezone(&Local);
    let snapshot = crate::metrics::derive(store.records(), now);
    assert_eq!(snapshot.total_count, 2);
    assert_eq!(snapshot.recent_count, 2);
    assert_eq!(snapshot.growth_rate, 100.0);
}
