//! Query cache coordinator.
//!
//! Owns the query store and exposes the three operations everything else
//! is built on: `read` (fetch-if-missing-or-stale with in-flight
//! deduplication), `mutate` (server write, then prefix invalidation), and
//! `clear_all` (session teardown). Fetches for distinct keys run as
//! independent tasks; per key, the store serializes writes by admitting
//! at most one in-flight fetch.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::ClientError;

use super::config::QueryConfig;
use super::entry::{QuerySnapshot, QueryStatus, StaleAfter};
use super::key::QueryKey;
use super::mutation::MutationDescriptor;
use super::store::{BeginFetch, QueryStore, detached_snapshot};
use super::subscription::Subscription;

const METRIC_QUERY_FETCH_MS: &str = "vetrina_query_fetch_ms";
const METRIC_QUERY_FETCH_TOTAL: &str = "vetrina_query_fetch_total";
const METRIC_QUERY_CACHE_HIT_TOTAL: &str = "vetrina_query_cache_hit_total";
const METRIC_MUTATION_TOTAL: &str = "vetrina_mutation_total";

/// Per-read options.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// When false, no fetch is issued and the entry stays absent.
    pub enabled: bool,
    /// Freshness override for this key; defaults to the coordinator's
    /// configured policy.
    pub stale_after: Option<StaleAfter>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_after: None,
        }
    }
}

impl ReadOptions {
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn stale_after(mut self, policy: StaleAfter) -> Self {
        self.stale_after = Some(policy);
        self
    }
}

/// Shared query cache for one application session.
///
/// Pass an instance explicitly wherever queries run; its lifecycle is the
/// session's lifecycle, ended by [`QueryCoordinator::clear_all`].
pub struct QueryCoordinator {
    config: QueryConfig,
    store: QueryStore,
}

impl QueryCoordinator {
    pub fn new(config: QueryConfig) -> Self {
        Self {
            config,
            store: QueryStore::new(),
        }
    }

    /// Read the cached value for `key`, fetching if it is missing or stale.
    ///
    /// Concurrent reads for the same key while a fetch is in flight attach
    /// to that fetch instead of issuing duplicates. Fetch failure surfaces
    /// as an `Error` snapshot that retains the previous data.
    pub async fn read<F, Fut>(&self, key: QueryKey, fetcher: F, options: ReadOptions) -> QuerySnapshot
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>>,
    {
        let now = OffsetDateTime::now_utc();
        if !options.enabled {
            debug!(key = %key, "Query read skipped: disabled");
            return self
                .store
                .lookup(&key, now)
                .unwrap_or_else(|| QuerySnapshot::absent(key));
        }

        let stale_after = options
            .stale_after
            .unwrap_or_else(|| self.config.default_stale_after());

        match self.store.try_begin_fetch(&key, stale_after, now) {
            BeginFetch::Fresh(snapshot) => {
                counter!(METRIC_QUERY_CACHE_HIT_TOTAL).increment(1);
                debug!(key = %key, "Query served from cache");
                snapshot
            }
            BeginFetch::InFlight(mut rx) => {
                debug!(key = %key, "Query attached to in-flight fetch");
                loop {
                    let snapshot = rx.borrow_and_update().clone();
                    if snapshot.status != QueryStatus::Pending {
                        return snapshot;
                    }
                    if rx.changed().await.is_err() {
                        // Store cleared while waiting; the entry is gone.
                        return QuerySnapshot::absent(key);
                    }
                }
            }
            BeginFetch::Started => self.run_fetch(key, fetcher).await,
        }
    }

    async fn run_fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> QuerySnapshot
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>>,
    {
        let fetch_id = Uuid::new_v4();
        let generation = self.store.generation();
        if self.config.log_fetches {
            info!(fetch_id = %fetch_id, key = %key, "Query fetch starting");
        }

        // This future owns the key's one in-flight fetch; if the caller
        // drops us mid-fetch the entry must not stay `Pending`.
        let mut guard = FetchGuard {
            store: &self.store,
            key: Some(key.clone()),
        };

        let started_at = Instant::now();
        let result = fetcher().await;
        guard.disarm();
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        let outcome = if result.is_ok() { "success" } else { "error" };
        histogram!(METRIC_QUERY_FETCH_MS).record(elapsed_ms);
        counter!(METRIC_QUERY_FETCH_TOTAL, "outcome" => outcome).increment(1);

        if let Err(error) = &result {
            warn!(fetch_id = %fetch_id, key = %key, error = %error, "Query fetch failed");
        } else if self.config.log_fetches {
            info!(fetch_id = %fetch_id, key = %key, elapsed_ms, "Query fetch complete");
        }

        let now = OffsetDateTime::now_utc();
        let result = result.map_err(Arc::new);
        if self.store.generation() != generation {
            info!(
                fetch_id = %fetch_id,
                key = %key,
                "Discarding fetch result: store was cleared while in flight"
            );
            return detached_snapshot(key, result, now);
        }
        // complete_fetch re-checks the generation under the write lock; a
        // clear racing past the check above is still caught there.
        self.store.complete_fetch(&key, result, generation, now)
    }

    /// Execute a mutation: run the request, then mark every cached entry
    /// under the descriptor's invalidation prefixes as stale.
    ///
    /// A failed request propagates without touching the cache. Invalidated
    /// entries are not refetched eagerly; the next `read` does that.
    pub async fn mutate<I: Clone>(
        &self,
        descriptor: &MutationDescriptor<I>,
        input: I,
    ) -> Result<Value, ClientError> {
        let started_at = Instant::now();
        match descriptor.request(input.clone()).await {
            Ok(data) => {
                descriptor.notify_result(&data, &input);

                let now = OffsetDateTime::now_utc();
                let prefixes = descriptor.keys_for(&data, &input);
                let mut marked = 0;
                for prefix in &prefixes {
                    marked += self.store.invalidate_prefix(prefix, now);
                }

                counter!(METRIC_MUTATION_TOTAL, "outcome" => "success").increment(1);
                info!(
                    mutation = descriptor.name(),
                    prefixes = prefixes.len(),
                    marked,
                    elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0,
                    "Mutation complete"
                );
                Ok(data)
            }
            Err(error) => {
                counter!(METRIC_MUTATION_TOTAL, "outcome" => "error").increment(1);
                warn!(
                    mutation = descriptor.name(),
                    error = %error,
                    "Mutation failed; cache untouched"
                );
                Err(error)
            }
        }
    }

    /// Subscribe to `key` without fetching. The handle shares the key's
    /// entry with every other subscriber and observer.
    pub fn subscribe(&self, key: QueryKey) -> Subscription {
        Subscription::new(key.clone(), self.store.subscribe(&key))
    }

    /// Current snapshot for `key`, if any entry exists.
    pub fn peek(&self, key: &QueryKey) -> Option<QuerySnapshot> {
        self.store.lookup(key, OffsetDateTime::now_utc())
    }

    /// Drop every cached entry and detach in-flight fetches from the
    /// store. Used on session termination so no data leaks across users.
    pub fn clear_all(&self) {
        let removed = self.store.clear();
        info!(removed, "Query store cleared");
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for QueryCoordinator {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

/// Reverts the entry out of `Pending` when the fetch that owned it is
/// dropped before completing, so the key never waits on a fetch that no
/// longer runs.
struct FetchGuard<'a> {
    store: &'a QueryStore,
    key: Option<QueryKey>,
}

impl FetchGuard<'_> {
    fn disarm(&mut self) {
        self.key = None;
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take()
            && self.store.abort_fetch(&key, OffsetDateTime::now_utc())
        {
            warn!(key = %key, "Query fetch dropped before completion");
        }
    }
}
