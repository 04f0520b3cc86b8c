//! Product endpoints: queries and mutations over `/api/products`.

use bytes::Bytes;
use futures::FutureExt;
use vetrina_api_types::{ProductCreateRequest, ProductUpdateRequest, ReviewCreateRequest};

use crate::client::ApiClient;
use crate::query::{MutationDescriptor, QueryCoordinator, QuerySnapshot, ReadOptions};

use super::keys;

const PRODUCTS_URL: &str = "/api/products";
const UPLOAD_URL: &str = "/api/upload";

/// One page of the product catalog, optionally filtered by keyword.
///
/// The key always carries both the keyword (possibly empty) and the page
/// number, so list variants all live under the `["products"]` prefix.
pub async fn products(
    client: &ApiClient,
    queries: &QueryCoordinator,
    keyword: &str,
    page_number: u32,
) -> QuerySnapshot {
    let api = client.clone();
    let mut query: Vec<(&str, String)> = Vec::new();
    if !keyword.is_empty() {
        query.push(("keyword", keyword.to_string()));
    }
    if page_number > 0 {
        query.push(("pageNumber", page_number.to_string()));
    }
    queries
        .read(
            keys::product_page(keyword, page_number),
            move || async move { api.get_with_query(PRODUCTS_URL, &query).await },
            ReadOptions::default(),
        )
        .await
}

/// Fetch one product by id. No fetch is issued while `product_id` is
/// absent.
pub async fn product_details(
    client: &ApiClient,
    queries: &QueryCoordinator,
    product_id: Option<&str>,
) -> QuerySnapshot {
    let id = product_id.unwrap_or_default();
    let api = client.clone();
    let path = format!("{PRODUCTS_URL}/{id}");
    queries
        .read(
            keys::product(id),
            move || async move { api.get(&path).await },
            ReadOptions::default().enabled(!id.is_empty()),
        )
        .await
}

/// The highest-rated products for the carousel.
pub async fn top_products(client: &ApiClient, queries: &QueryCoordinator) -> QuerySnapshot {
    let api = client.clone();
    queries
        .read(
            keys::top_products(),
            move || async move { api.get(&format!("{PRODUCTS_URL}/top")).await },
            ReadOptions::default(),
        )
        .await
}

/// Input for [`create_review`].
#[derive(Debug, Clone)]
pub struct CreateReviewInput {
    pub product_id: String,
    pub review: ReviewCreateRequest,
}

/// Post a review. Invalidates the reviewed product and every product
/// list (ratings feed into list ordering).
pub fn create_review(client: &ApiClient) -> MutationDescriptor<CreateReviewInput> {
    let api = client.clone();
    MutationDescriptor::new("create_review", move |input: CreateReviewInput| {
        let api = api.clone();
        async move {
            api.post(
                &format!("{PRODUCTS_URL}/{}/reviews", input.product_id),
                &input.review,
            )
            .await
        }
        .boxed()
    })
    .invalidates(|_, input| vec![keys::product(&input.product_id), keys::products()])
}

/// Create a product (admin). Invalidates every product list.
pub fn create_product(client: &ApiClient) -> MutationDescriptor<ProductCreateRequest> {
    let api = client.clone();
    MutationDescriptor::new("create_product", move |product: ProductCreateRequest| {
        let api = api.clone();
        async move { api.post(PRODUCTS_URL, &product).await }.boxed()
    })
    .invalidates(|_, _| vec![keys::products()])
}

/// Input for [`update_product`].
#[derive(Debug, Clone)]
pub struct UpdateProductInput {
    pub product_id: String,
    pub update: ProductUpdateRequest,
}

/// Update a product (admin). Invalidates it and every product list.
pub fn update_product(client: &ApiClient) -> MutationDescriptor<UpdateProductInput> {
    let api = client.clone();
    MutationDescriptor::new("update_product", move |input: UpdateProductInput| {
        let api = api.clone();
        async move {
            api.put(&format!("{PRODUCTS_URL}/{}", input.product_id), &input.update)
                .await
        }
        .boxed()
    })
    .invalidates(|_, input| vec![keys::product(&input.product_id), keys::products()])
}

/// Delete a product (admin). Takes the product id; invalidates every
/// product list.
pub fn delete_product(client: &ApiClient) -> MutationDescriptor<String> {
    let api = client.clone();
    MutationDescriptor::new("delete_product", move |product_id: String| {
        let api = api.clone();
        async move { api.delete(&format!("{PRODUCTS_URL}/{product_id}")).await }.boxed()
    })
    .invalidates(|_, _| vec![keys::products()])
}

/// Input for [`upload_product_image`].
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Upload a product image. Touches no cached query; the caller feeds the
/// returned path into a later product create or update.
pub fn upload_product_image(client: &ApiClient) -> MutationDescriptor<ImageUpload> {
    let api = client.clone();
    MutationDescriptor::new("upload_product_image", move |upload: ImageUpload| {
        let api = api.clone();
        async move {
            api.post_multipart(UPLOAD_URL, &upload.filename, upload.bytes)
                .await
        }
        .boxed()
    })
}
