//! Shared request and response types for the vetrina storefront API.
//!
//! These mirror the backend's JSON wire format exactly: camelCase field
//! names, string object ids, RFC 3339 timestamps. Request types serialize
//! into bodies the backend accepts; response types deserialize what it
//! returns.

mod orders;
mod products;
mod users;

pub use orders::{
    Order, OrderCreateRequest, OrderItem, PayPalConfig, PaymentDetails, PaymentResult,
    ShippingAddress,
};
pub use products::{
    PaginatedProducts, Product, ProductCreateRequest, ProductUpdateRequest, Review,
    ReviewCreateRequest, UploadResponse,
};
pub use users::{
    LoginRequest, ProfileUpdateRequest, RegisterRequest, User, UserUpdateRequest,
};
