//! Vetrina: a query-caching client for headless storefront backends.
//!
//! The crate has one component with real invariants — the
//! [`query::QueryCoordinator`], a client-side query store with prefix
//! invalidation and in-flight fetch deduplication — and a flat endpoint
//! catalog ([`api`]) that layers the storefront's orders, products, and
//! users operations on top of it via the [`client::ApiClient`] transport.
//!
//! ```ignore
//! let client = ApiClient::from_settings(&settings.api)?;
//! let queries = QueryCoordinator::new(QueryConfig::from(&settings.query));
//!
//! let page = api::products::products(&client, &queries, "shoes", 1).await;
//! let listing: Option<PaginatedProducts> = page.data_as()?;
//!
//! queries.mutate(&api::users::login(&client), credentials).await?;
//! ```
//!
//! One coordinator instance carries one application session; call
//! [`query::QueryCoordinator::clear_all`] (or [`api::users::logout`]) at
//! session end so no cached data crosses sessions.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod query;

pub use error::Error;
pub use vetrina_api_types as types;
