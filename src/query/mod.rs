//! Vetrina query cache.
//!
//! A client-side query store in the shape frontend query caches take:
//! reads subscribe to a cache key and fetch if the entry is missing or
//! stale; mutations run a server write and mark key prefixes stale on
//! success. One coordinator instance carries one application session.
//!
//! ## Configuration
//!
//! Behavior is controlled via [`QueryConfig`], loadable from `vetrina.toml`:
//!
//! ```toml
//! [query]
//! # default_stale_after_ms = 30000
//! log_fetches = true
//! ```

mod config;
mod coordinator;
mod entry;
mod key;
mod lock;
mod mutation;
mod store;
mod subscription;

pub use config::QueryConfig;
pub use coordinator::{QueryCoordinator, ReadOptions};
pub use entry::{QuerySnapshot, QueryStatus, StaleAfter};
pub use key::{KeySegment, QueryKey};
pub use mutation::MutationDescriptor;
pub use subscription::{Subscription, SubscriptionClosed};
