use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub rating: u8,
    pub comment: String,
    pub user: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339::option", default)]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub name: String,
    pub image: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub rating: f64,
    #[serde(rename = "numReviews")]
    pub num_reviews: u32,
    pub price: f64,
    #[serde(rename = "countInStock")]
    pub count_in_stock: u32,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339::option", default)]
    pub created_at: Option<OffsetDateTime>,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339::option", default)]
    pub updated_at: Option<OffsetDateTime>,
}

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedProducts {
    pub products: Vec<Product>,
    pub page: u32,
    pub pages: u32,
}

/// Body for creating a product. The backend fills sample values for any
/// field left at its default, so this mirrors the server-side defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreateRequest {
    pub name: String,
    pub price: f64,
    pub image: String,
    pub brand: String,
    pub category: String,
    #[serde(rename = "countInStock")]
    pub count_in_stock: u32,
    pub description: String,
}

impl Default for ProductCreateRequest {
    fn default() -> Self {
        Self {
            name: "Sample name".to_string(),
            price: 0.0,
            image: "/images/sample.jpg".to_string(),
            brand: "Sample brand".to_string(),
            category: "Sample category".to_string(),
            count_in_stock: 0,
            description: "Sample description".to_string(),
        }
    }
}

/// Partial update; `None` fields are omitted from the body and left
/// untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "countInStock", skip_serializing_if = "Option::is_none")]
    pub count_in_stock: Option<u32>,
}

/// Body for posting a product review. Rating range 1..=5 is enforced
/// server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCreateRequest {
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    /// Path of the stored image, relative to the backend's static root.
    pub image: String,
}
