//! Query store: the cache map behind the coordinator.
//!
//! Owns every `QueryEntry` under a single `RwLock`, so multi-field state
//! transitions (status flips, staleness marks) commit atomically and the
//! notification for a transition is sent under the same lock that wrote
//! it. Entries are never evicted on their own; unused stale entries
//! accumulate until `clear` (a known growth gap, kept deliberately).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::debug;

use crate::client::ClientError;

use super::entry::{QueryEntry, QuerySnapshot, QueryStatus, StaleAfter};
use super::key::QueryKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "query::store";

/// Outcome of asking the store whether a read needs a fetch.
pub(crate) enum BeginFetch {
    /// The entry is fresh; no fetch needed.
    Fresh(QuerySnapshot),
    /// Another caller's fetch is in flight; attach to its channel.
    InFlight(watch::Receiver<QuerySnapshot>),
    /// This caller now owns the one in-flight fetch for the key.
    Started,
}

pub(crate) struct QueryStore {
    entries: RwLock<HashMap<QueryKey, QueryEntry>>,
    /// Advanced by `clear` under the entries lock; completions carry the
    /// generation their fetch began under and commit only on a match.
    generation: AtomicU64,
}

impl QueryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Current store generation, captured when a fetch begins.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Snapshot of the entry for `key`, if one exists.
    pub fn lookup(&self, key: &QueryKey, now: OffsetDateTime) -> Option<QuerySnapshot> {
        rw_read(&self.entries, SOURCE, "lookup")
            .get(key)
            .map(|entry| entry.snapshot(now))
    }

    /// Attach to the notification channel for `key`, creating an idle
    /// entry if none exists. Subscribing never triggers a fetch.
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<QuerySnapshot> {
        let mut entries = rw_write(&self.entries, SOURCE, "subscribe");
        entries
            .entry(key.clone())
            .or_insert_with(|| QueryEntry::new(key.clone(), StaleAfter::Never))
            .tx
            .subscribe()
    }

    /// Decide whether a read for `key` must fetch.
    ///
    /// Transitions the entry to `Pending` (retaining previous data) when a
    /// fetch is needed and nothing is in flight, so at most one caller
    /// ever gets `Started` per fetch cycle.
    pub fn try_begin_fetch(
        &self,
        key: &QueryKey,
        stale_after: StaleAfter,
        now: OffsetDateTime,
    ) -> BeginFetch {
        let mut entries = rw_write(&self.entries, SOURCE, "try_begin_fetch");
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| QueryEntry::new(key.clone(), stale_after));
        entry.stale_after = stale_after;

        if entry.status == QueryStatus::Pending {
            return BeginFetch::InFlight(entry.tx.subscribe());
        }
        if entry.status == QueryStatus::Success && !entry.is_stale(now) {
            return BeginFetch::Fresh(entry.snapshot(now));
        }

        entry.status = QueryStatus::Pending;
        entry.publish(now);
        BeginFetch::Started
    }

    /// Commit a finished fetch and notify subscribers.
    ///
    /// Success stores the data and clears any staleness mark; failure
    /// records the error while retaining the previous data. If the store
    /// was cleared while the fetch ran (`generation` no longer matches,
    /// checked under the write lock so a concurrent clear-plus-new-read
    /// cannot slip in between), the result is not stored and a detached
    /// snapshot is returned to the caller that ran the fetch.
    pub fn complete_fetch(
        &self,
        key: &QueryKey,
        result: Result<Value, Arc<ClientError>>,
        generation: u64,
        now: OffsetDateTime,
    ) -> QuerySnapshot {
        let mut entries = rw_write(&self.entries, SOURCE, "complete_fetch");
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(key = %key, "Fetch result discarded: store generation advanced");
            return detached_snapshot(key.clone(), result, now);
        }
        let Some(entry) = entries.get_mut(key) else {
            return detached_snapshot(key.clone(), result, now);
        };

        match result {
            Ok(data) => {
                entry.data = Some(Arc::new(data));
                entry.error = None;
                entry.status = QueryStatus::Success;
                entry.last_updated = Some(now);
                entry.invalidated = false;
            }
            Err(error) => {
                entry.error = Some(error);
                entry.status = QueryStatus::Error;
                entry.last_updated = Some(now);
            }
        }
        entry.publish(now);
        entry.snapshot(now)
    }

    /// Mark every entry whose key extends `prefix` as stale.
    ///
    /// Entries are kept, not deleted, so their data stays readable until
    /// the next successful refetch. Returns the number of entries marked.
    pub fn invalidate_prefix(&self, prefix: &QueryKey, now: OffsetDateTime) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_prefix");
        let mut marked = 0;
        for entry in entries.values_mut() {
            if !entry.key.starts_with(prefix) || entry.invalidated {
                continue;
            }
            entry.invalidated = true;
            entry.publish(now);
            marked += 1;
        }
        debug!(prefix = %prefix, marked, "Query entries marked stale");
        marked
    }

    /// Revert a `Pending` entry whose fetch was dropped before completing.
    ///
    /// The entry falls back to the state its retained fields describe and
    /// is marked stale, so the next read starts a fresh fetch instead of
    /// waiting on one that no longer runs. Returns whether an entry was
    /// reverted.
    pub fn abort_fetch(&self, key: &QueryKey, now: OffsetDateTime) -> bool {
        let mut entries = rw_write(&self.entries, SOURCE, "abort_fetch");
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        if entry.status != QueryStatus::Pending {
            return false;
        }
        entry.status = if entry.data.is_some() {
            QueryStatus::Success
        } else if entry.error.is_some() {
            QueryStatus::Error
        } else {
            QueryStatus::Idle
        };
        entry.invalidated = true;
        entry.publish(now);
        true
    }

    /// Drop every entry and advance the store generation so in-flight
    /// fetches cannot commit. Subscribers observe their channels closing.
    pub fn clear(&self) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "clear");
        self.generation.fetch_add(1, Ordering::SeqCst);
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Snapshot for a fetch whose entry no longer exists in the store.
pub(crate) fn detached_snapshot(
    key: QueryKey,
    result: Result<Value, Arc<ClientError>>,
    now: OffsetDateTime,
) -> QuerySnapshot {
    match result {
        Ok(data) => QuerySnapshot {
            key,
            status: QueryStatus::Success,
            data: Some(Arc::new(data)),
            error: None,
            last_updated: Some(now),
            is_stale: false,
        },
        Err(error) => QuerySnapshot {
            key,
            status: QueryStatus::Error,
            data: None,
            error: Some(error),
            last_updated: Some(now),
            is_stale: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn begin(store: &QueryStore, key: &QueryKey) -> BeginFetch {
        store.try_begin_fetch(key, StaleAfter::Never, now())
    }

    fn complete(
        store: &QueryStore,
        key: &QueryKey,
        result: Result<Value, Arc<ClientError>>,
    ) -> QuerySnapshot {
        store.complete_fetch(key, result, store.generation(), now())
    }

    #[test]
    fn lookup_of_unknown_key_is_none() {
        let store = QueryStore::new();
        assert!(store.lookup(&QueryKey::root("users"), now()).is_none());
    }

    #[test]
    fn first_read_starts_a_fetch() {
        let store = QueryStore::new();
        let key = QueryKey::root("users");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));

        let snapshot = store.lookup(&key, now()).expect("entry created");
        assert_eq!(snapshot.status, QueryStatus::Pending);
    }

    #[test]
    fn second_read_attaches_to_in_flight_fetch() {
        let store = QueryStore::new();
        let key = QueryKey::root("users");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        assert!(matches!(begin(&store, &key), BeginFetch::InFlight(_)));
    }

    #[test]
    fn completed_fetch_is_fresh_on_next_read() {
        let store = QueryStore::new();
        let key = QueryKey::root("users");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        let snapshot = complete(&store, &key, Ok(json!([{"name": "ada"}])));
        assert_eq!(snapshot.status, QueryStatus::Success);

        match begin(&store, &key) {
            BeginFetch::Fresh(fresh) => {
                assert_eq!(fresh.data, snapshot.data);
            }
            _ => panic!("expected fresh entry"),
        }
    }

    #[test]
    fn failed_fetch_retains_previous_data() {
        let store = QueryStore::new();
        let key = QueryKey::root("users");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        complete(&store, &key, Ok(json!(["ada"])));

        // Force a refetch, then fail it.
        store.invalidate_prefix(&key, now());
        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        let snapshot = complete(
            &store,
            &key,
            Err(Arc::new(ClientError::InvalidInput("boom".to_string()))),
        );

        assert_eq!(snapshot.status, QueryStatus::Error);
        assert!(snapshot.error.is_some());
        assert_eq!(snapshot.data.as_deref(), Some(&json!(["ada"])));
    }

    #[test]
    fn invalidation_marks_prefix_matches_only() {
        let store = QueryStore::new();
        let mine = QueryKey::root("orders").push("mine");
        let all = QueryKey::root("orders").push("all");
        let detail = QueryKey::root("order").push("42");

        for key in [&mine, &all, &detail] {
            assert!(matches!(begin(&store, key), BeginFetch::Started));
            complete(&store, key, Ok(json!({})));
        }

        let marked = store.invalidate_prefix(&QueryKey::root("orders"), now());
        assert_eq!(marked, 2);

        assert!(store.lookup(&mine, now()).unwrap().is_stale);
        assert!(store.lookup(&all, now()).unwrap().is_stale);
        assert!(!store.lookup(&detail, now()).unwrap().is_stale);
    }

    #[test]
    fn stale_entry_keeps_data_readable_and_refetches() {
        let store = QueryStore::new();
        let key = QueryKey::root("order").push("42");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        complete(&store, &key, Ok(json!({"isPaid": false})));
        store.invalidate_prefix(&key, now());

        let stale = store.lookup(&key, now()).unwrap();
        assert!(stale.is_stale);
        assert_eq!(stale.status, QueryStatus::Success);
        assert_eq!(stale.data.as_deref(), Some(&json!({"isPaid": false})));

        // Next read starts a refetch with the old data still attached.
        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        let pending = store.lookup(&key, now()).unwrap();
        assert_eq!(pending.status, QueryStatus::Pending);
        assert_eq!(pending.data.as_deref(), Some(&json!({"isPaid": false})));
    }

    #[test]
    fn successful_refetch_clears_staleness() {
        let store = QueryStore::new();
        let key = QueryKey::root("order").push("42");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        complete(&store, &key, Ok(json!({"isPaid": false})));
        store.invalidate_prefix(&key, now());

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        let snapshot = complete(&store, &key, Ok(json!({"isPaid": true})));
        assert!(!snapshot.is_stale);
        assert_eq!(snapshot.data.as_deref(), Some(&json!({"isPaid": true})));
    }

    #[test]
    fn clear_drops_every_entry() {
        let store = QueryStore::new();
        for key in [QueryKey::root("users"), QueryKey::root("orders")] {
            assert!(matches!(begin(&store, &key), BeginFetch::Started));
            complete(&store, &key, Ok(json!({})));
        }

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert!(store.lookup(&QueryKey::root("users"), now()).is_none());
    }

    #[test]
    fn complete_after_clear_is_not_stored() {
        let store = QueryStore::new();
        let key = QueryKey::root("users");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        let generation = store.generation();
        store.clear();

        let snapshot = store.complete_fetch(&key, Ok(json!(["ada"])), generation, now());
        // Caller still sees its result,
        assert_eq!(snapshot.status, QueryStatus::Success);
        // but the store stays empty.
        assert!(store.is_empty());
    }

    #[test]
    fn pre_clear_result_never_commits_over_a_new_fetch() {
        let store = QueryStore::new();
        let key = QueryKey::root("users");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        let generation = store.generation();
        store.clear();
        // A new read for the same key begins before the old fetch lands.
        assert!(matches!(begin(&store, &key), BeginFetch::Started));

        let snapshot = store.complete_fetch(&key, Ok(json!(["old"])), generation, now());
        assert_eq!(snapshot.status, QueryStatus::Success);

        // The new entry is still waiting on its own fetch, untouched.
        let pending = store.lookup(&key, now()).expect("new entry kept");
        assert_eq!(pending.status, QueryStatus::Pending);
        assert!(pending.data.is_none());
    }

    #[test]
    fn aborted_fetch_reverts_pending_and_marks_stale() {
        let store = QueryStore::new();
        let key = QueryKey::root("orders").push("mine");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        complete(&store, &key, Ok(json!(["o1"])));
        store.invalidate_prefix(&key, now());
        assert!(matches!(begin(&store, &key), BeginFetch::Started));

        assert!(store.abort_fetch(&key, now()));

        // Data survives, the entry is stale, and the next read refetches.
        let snapshot = store.lookup(&key, now()).expect("entry kept");
        assert_eq!(snapshot.status, QueryStatus::Success);
        assert!(snapshot.is_stale);
        assert_eq!(snapshot.data.as_deref(), Some(&json!(["o1"])));

        // No-op on entries that are not pending.
        assert!(!store.abort_fetch(&key, now()));
        assert!(matches!(begin(&store, &key), BeginFetch::Started));
    }

    #[test]
    fn aborted_first_fetch_reverts_to_idle() {
        let store = QueryStore::new();
        let key = QueryKey::root("users");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        assert!(store.abort_fetch(&key, now()));

        let snapshot = store.lookup(&key, now()).expect("entry kept");
        assert_eq!(snapshot.status, QueryStatus::Idle);
        assert!(matches!(begin(&store, &key), BeginFetch::Started));
    }

    #[test]
    fn late_subscriber_starts_from_the_committed_state() {
        let store = QueryStore::new();
        let key = QueryKey::root("users");

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        complete(&store, &key, Ok(json!(["ada"])));

        // Nobody held a receiver while the fetch ran; the channel must
        // still carry the committed state for whoever attaches now.
        let rx = store.subscribe(&key);
        assert_eq!(rx.borrow().status, QueryStatus::Success);
        assert_eq!(rx.borrow().data.as_deref(), Some(&json!(["ada"])));
    }

    #[test]
    fn subscribers_are_notified_under_the_committing_lock() {
        let store = QueryStore::new();
        let key = QueryKey::root("users");

        let rx = store.subscribe(&key);
        assert_eq!(rx.borrow().status, QueryStatus::Idle);

        assert!(matches!(begin(&store, &key), BeginFetch::Started));
        assert_eq!(rx.borrow().status, QueryStatus::Pending);

        complete(&store, &key, Ok(json!(["ada"])));
        assert_eq!(rx.borrow().status, QueryStatus::Success);
    }
}
