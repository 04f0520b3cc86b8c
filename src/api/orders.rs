//! Order endpoints: queries and mutations over `/api/orders`.

use futures::FutureExt;
use vetrina_api_types::{OrderCreateRequest, PaymentDetails};

use crate::client::ApiClient;
use crate::query::{
    MutationDescriptor, QueryCoordinator, QuerySnapshot, ReadOptions, StaleAfter,
};

use super::keys;

const ORDERS_URL: &str = "/api/orders";
const PAYPAL_URL: &str = "/api/config/paypal";

/// Create a new order. Invalidates every order list.
pub fn create_order(client: &ApiClient) -> MutationDescriptor<OrderCreateRequest> {
    let api = client.clone();
    MutationDescriptor::new("create_order", move |order: OrderCreateRequest| {
        let api = api.clone();
        async move { api.post(ORDERS_URL, &order).await }.boxed()
    })
    .invalidates(|_, _| vec![keys::orders()])
}

/// Fetch one order by id. No fetch is issued while `order_id` is absent.
pub async fn order_details(
    client: &ApiClient,
    queries: &QueryCoordinator,
    order_id: Option<&str>,
) -> QuerySnapshot {
    let id = order_id.unwrap_or_default();
    let api = client.clone();
    let path = format!("{ORDERS_URL}/{id}");
    queries
        .read(
            keys::order(id),
            move || async move { api.get(&path).await },
            ReadOptions::default().enabled(!id.is_empty()),
        )
        .await
}

/// Input for [`pay_order`].
#[derive(Debug, Clone)]
pub struct PayOrderInput {
    pub order_id: String,
    pub details: PaymentDetails,
}

/// Record a payment capture. Invalidates the paid order and every order
/// list.
pub fn pay_order(client: &ApiClient) -> MutationDescriptor<PayOrderInput> {
    let api = client.clone();
    MutationDescriptor::new("pay_order", move |input: PayOrderInput| {
        let api = api.clone();
        async move {
            api.put(&format!("{ORDERS_URL}/{}/pay", input.order_id), &input.details)
                .await
        }
        .boxed()
    })
    .invalidates(|_, input| vec![keys::order(&input.order_id), keys::orders()])
}

/// PayPal client id for the checkout button. Pinned fresh forever: the id
/// never changes within a session.
pub async fn paypal_client_id(client: &ApiClient, queries: &QueryCoordinator) -> QuerySnapshot {
    let api = client.clone();
    queries
        .read(
            keys::paypal_client_id(),
            move || async move { api.get(PAYPAL_URL).await },
            ReadOptions::default().stale_after(StaleAfter::Never),
        )
        .await
}

/// Orders placed by the authenticated user.
pub async fn my_orders(client: &ApiClient, queries: &QueryCoordinator) -> QuerySnapshot {
    let api = client.clone();
    queries
        .read(
            keys::my_orders(),
            move || async move { api.get(&format!("{ORDERS_URL}/mine")).await },
            ReadOptions::default(),
        )
        .await
}

/// Every order (admin).
pub async fn all_orders(client: &ApiClient, queries: &QueryCoordinator) -> QuerySnapshot {
    let api = client.clone();
    queries
        .read(
            keys::all_orders(),
            move || async move { api.get(ORDERS_URL).await },
            ReadOptions::default(),
        )
        .await
}

/// Mark an order as delivered (admin). Takes the order id; invalidates
/// that order and every order list.
pub fn deliver_order(client: &ApiClient) -> MutationDescriptor<String> {
    let api = client.clone();
    MutationDescriptor::new("deliver_order", move |order_id: String| {
        let api = api.clone();
        async move {
            api.put(&format!("{ORDERS_URL}/{order_id}/deliver"), &serde_json::json!({}))
                .await
        }
        .boxed()
    })
    .invalidates(|_, order_id| vec![keys::order(order_id), keys::orders()])
}
