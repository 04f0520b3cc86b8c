//! Cache entry state.
//!
//! Each key owns one `QueryEntry` inside the store; consumers only ever
//! see read-only `QuerySnapshot` clones. An entry moves through
//! `Idle → Pending → {Success, Error}`, returns to `Pending` on refetch,
//! and leaves the store only through `clear_all`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::client::ClientError;

use super::key::QueryKey;

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No fetch has been issued for this key yet.
    Idle,
    /// A fetch is in flight; `data` still holds the previous value, if any.
    Pending,
    Success,
    /// The last fetch failed; `data` still holds the previous value, if any.
    Error,
}

/// Time-based freshness policy for a cache entry.
///
/// `Never` means the entry stays fresh until explicitly invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleAfter {
    Never,
    After(Duration),
}

/// Read-only view of one cache entry at a point in time.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub key: QueryKey,
    pub status: QueryStatus,
    /// Opaque server response. Retained across refetches and failures so
    /// consumers never lose the last good value.
    pub data: Option<Arc<Value>>,
    /// The failure behind an `Error` status.
    pub error: Option<Arc<ClientError>>,
    pub last_updated: Option<OffsetDateTime>,
    /// Whether the entry was due for refetch when this snapshot was taken.
    pub is_stale: bool,
}

impl QuerySnapshot {
    /// Snapshot for a key with no entry (never fetched, or cleared).
    pub fn absent(key: QueryKey) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            last_updated: None,
            is_stale: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Deserialize the cached payload, if any.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.data
            .as_deref()
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }
}

/// Mutable cache record, owned exclusively by the store.
pub(crate) struct QueryEntry {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub data: Option<Arc<Value>>,
    pub error: Option<Arc<ClientError>>,
    pub last_updated: Option<OffsetDateTime>,
    pub stale_after: StaleAfter,
    /// Set by prefix invalidation; reset by the next successful fetch.
    pub invalidated: bool,
    /// Shared notification channel; one per key, all subscribers attach here.
    pub tx: watch::Sender<QuerySnapshot>,
}

impl QueryEntry {
    pub fn new(key: QueryKey, stale_after: StaleAfter) -> Self {
        let (tx, _rx) = watch::channel(QuerySnapshot::absent(key.clone()));
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            last_updated: None,
            stale_after,
            invalidated: false,
            tx,
        }
    }

    /// An entry is stale once invalidated, or once its freshness window
    /// has elapsed. Idle and error entries are always due for fetch.
    pub fn is_stale(&self, now: OffsetDateTime) -> bool {
        match self.status {
            QueryStatus::Idle | QueryStatus::Error => true,
            QueryStatus::Pending => false,
            QueryStatus::Success => {
                if self.invalidated {
                    return true;
                }
                match (self.stale_after, self.last_updated) {
                    (StaleAfter::After(window), Some(updated)) => updated + window <= now,
                    _ => false,
                }
            }
        }
    }

    pub fn snapshot(&self, now: OffsetDateTime) -> QuerySnapshot {
        QuerySnapshot {
            key: self.key.clone(),
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            last_updated: self.last_updated,
            is_stale: self.status == QueryStatus::Success && self.is_stale(now),
        }
    }

    /// Push the current state into the entry's channel. `send_replace`
    /// stores the value even while no receiver is attached, so a reader or
    /// subscriber attaching later starts from the committed state instead
    /// of a lagging one.
    pub fn publish(&self, now: OffsetDateTime) {
        self.tx.send_replace(self.snapshot(now));
    }
}
