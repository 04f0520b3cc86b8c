//! Endpoint catalog for the storefront backend.
//!
//! Each entity module is a flat list of thin bindings over the query
//! coordinator: queries pair a cache key with a fetcher; mutations are
//! [`crate::query::MutationDescriptor`] values naming the key prefixes
//! they invalidate. Run a mutation with
//! [`crate::query::QueryCoordinator::mutate`]:
//!
//! ```ignore
//! let paid = queries
//!     .mutate(&orders::pay_order(&client), PayOrderInput { order_id, details })
//!     .await?;
//! ```

pub mod keys;
pub mod orders;
pub mod products;
pub mod users;
