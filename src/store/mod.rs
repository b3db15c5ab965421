use std::collections::HashSet;

use crate::api::{ApiError, Client, UserRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Single source of truth for the fetched directory and its load status.
/// Only `load`/`finish_load`/`remove` mutate it; views and metrics read
/// snapshots.
#[derive(Clone, Debug)]
pub struct RecordStore {
    records: Vec<UserRecord>,
    status: LoadStatus,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            status: LoadStatus::Idle,
        }
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// Marks a load as outstanding. Returns false (refusing the request)
    /// when one already is, so a slower response can never overwrite a
    /// newer one.
    pub fn begin_load(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.status = LoadStatus::Loading;
        true
    }

    /// Applies a fetch outcome. A failure records the reason but keeps
    /// whatever was loaded before, so the view can stay populated.
    pub fn finish_load(&mut self, outcome: Result<Vec<UserRecord>, ApiError>) {
        match outcome {
            Ok(records) => {
                self.records = dedupe_by_id(records);
                self.status = LoadStatus::Loaded;
            }
            Err(e) => {
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    /// One fetch per trigger. Returns false when a load was already
    /// outstanding and this request was refused.
    pub async fn load(&mut self, client: &Client) -> bool {
        if !self.begin_load() {
            return false;
        }
        let outcome = client.fetch_users().await;
        self.finish_load(outcome);
        true
    }

    /// Removes the record with the given id. Absent ids are a silent no-op
    /// so a retry after a successful delete cannot corrupt state.
    pub fn remove(&mut self, id: i64) -> bool {
        match self.records.iter().position(|r| r.id == id) {
            Some(index) => {
                self.records.remove(index);
                true
            }
            None => false,
        }
    }
}

/// The backend owns id assignment, but the store's invariant is that ids
/// stay unique within it; keep the first occurrence of any duplicate.
fn dedupe_by_id(records: Vec<UserRecord>) -> Vec<UserRecord> {
    let mut seen: HashSet<i64> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: i64) -> UserRecord {
        UserRecord {
            id,
            name: format!("User {id}"),
            email: format!("u{id}@x.com"),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn starts_idle_and_empty() {
        let store = RecordStore::new();
        assert_eq!(*store.status(), LoadStatus::Idle);
        assert!(store.records().is_empty());
    }

    #[test]
    fn successful_load_replaces_records() {
        let mut store = RecordStore::new();
        assert!(store.begin_load());
        assert_eq!(*store.status(), LoadStatus::Loading);

        store.finish_load(Ok(vec![record(1), record(2)]));
        assert_eq!(*store.status(), LoadStatus::Loaded);
        assert_eq!(store.records().len(), 2);
    }

    #[test]
    fn failed_load_keeps_previous_records() {
        let mut store = RecordStore::new();
        store.begin_load();
        store.finish_load(Ok(vec![record(1), record(2)]));

        store.begin_load();
        store.finish_load(Err(ApiError::Status { status: 503 }));

        assert_eq!(*store.status(), LoadStatus::Failed("server error 503".to_string()));
        assert_eq!(store.records().len(), 2);
    }

    #[test]
    fn reload_while_loading_is_refused() {
        let mut store = RecordStore::new();
        assert!(store.begin_load());
        assert!(!store.begin_load());

        store.finish_load(Ok(vec![record(1)]));
        assert!(store.begin_load());
    }

    #[test]
    fn remove_deletes_exactly_one_record() {
        let mut store = RecordStore::new();
        store.begin_load();
        store.finish_load(Ok(vec![record(1), record(2), record(3)]));

        assert!(store.remove(2));
        let ids: Vec<i64> = store.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn remove_of_absent_id_is_a_noop() {
        let mut store = RecordStore::new();
        store.begin_load();
        store.finish_load(Ok(vec![record(1)]));

        assert!(!store.remove(99));
        assert_eq!(store.records().len(), 1);

        // Retrying a delete that already landed behaves the same way.
        assert!(store.remove(1));
        assert!(!store.remove(1));
        assert!(store.records().is_empty());
    }

    #[test]
    fn duplicate_ids_from_the_wire_keep_first_occurrence() {
        let mut store = RecordStore::new();
        let mut duped = record(5);
        duped.name = "Shadow".to_string();
        store.begin_load();
        store.finish_load(Ok(vec![record(5), duped, record(6)]));

        let ids: Vec<i64> = store.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 6]);
        assert_eq!(store.records()[0].name, "User 5");
    }
}
