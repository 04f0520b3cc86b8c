//! Subscriptions: live bindings between one observer and one query key.
//!
//! All subscriptions to a key share that key's single cache entry and
//! notification channel. Dropping the handle ends the subscription.

use thiserror::Error;
use tokio::sync::watch;

use super::entry::QuerySnapshot;
use super::key::QueryKey;

/// The subscribed entry was removed by `clear_all`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("query store entry was cleared")]
pub struct SubscriptionClosed;

pub struct Subscription {
    key: QueryKey,
    rx: watch::Receiver<QuerySnapshot>,
}

impl Subscription {
    pub(crate) fn new(key: QueryKey, rx: watch::Receiver<QuerySnapshot>) -> Self {
        Self { key, rx }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current state of the entry, without waiting.
    pub fn snapshot(&self) -> QuerySnapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next committed transition and return it.
    ///
    /// Resolves immediately if a transition was published since the last
    /// call, so completions are never missed between polls.
    pub async fn changed(&mut self) -> Result<QuerySnapshot, SubscriptionClosed> {
        self.rx.changed().await.map_err(|_| SubscriptionClosed)?;
        Ok(self.rx.borrow_and_update().clone())
    }
}
