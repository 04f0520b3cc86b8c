use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One line item within an order, priced server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub qty: u32,
    pub image: String,
    pub price: f64,
    /// Id of the product this item refers to.
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    #[serde(rename = "postalCode")]
    pub postal_code: String,
    pub country: String,
}

/// Payment confirmation as recorded by the backend after capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub id: Option<String>,
    pub status: Option<String>,
    pub update_time: Option<String>,
    pub email_address: Option<String>,
}

/// Full order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    #[serde(rename = "orderItems")]
    pub order_items: Vec<OrderItem>,
    #[serde(rename = "shippingAddress")]
    pub shipping_address: ShippingAddress,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(rename = "paymentResult")]
    pub payment_result: Option<PaymentResult>,
    #[serde(rename = "itemsPrice")]
    pub items_price: f64,
    #[serde(rename = "taxPrice")]
    pub tax_price: f64,
    #[serde(rename = "shippingPrice")]
    pub shipping_price: f64,
    #[serde(rename = "totalPrice")]
    pub total_price: f64,
    #[serde(rename = "isPaid")]
    pub is_paid: bool,
    #[serde(rename = "paidAt", with = "time::serde::rfc3339::option", default)]
    pub paid_at: Option<OffsetDateTime>,
    #[serde(rename = "isDelivered")]
    pub is_delivered: bool,
    #[serde(
        rename = "deliveredAt",
        with = "time::serde::rfc3339::option",
        default
    )]
    pub delivered_at: Option<OffsetDateTime>,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339::option", default)]
    pub created_at: Option<OffsetDateTime>,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339::option", default)]
    pub updated_at: Option<OffsetDateTime>,
}

/// Body for creating an order. Item prices are recomputed server-side;
/// the ones sent here are advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreateRequest {
    #[serde(rename = "orderItems")]
    pub order_items: Vec<OrderItem>,
    #[serde(rename = "shippingAddress")]
    pub shipping_address: ShippingAddress,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
}

/// Payment capture details forwarded to the pay endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub id: String,
    pub status: String,
    pub update_time: String,
    #[serde(rename = "payer")]
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayPalConfig {
    #[serde(rename = "clientId")]
    pub client_id: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn order_deserializes_backend_field_names() {
        let order: Order = serde_json::from_value(json!({
            "_id": "o1",
            "user": "u1",
            "orderItems": [],
            "shippingAddress": {
                "address": "1 Main St",
                "city": "Springfield",
                "postalCode": "12345",
                "country": "US"
            },
            "paymentMethod": "PayPal",
            "paymentResult": null,
            "itemsPrice": 10.0,
            "taxPrice": 1.5,
            "shippingPrice": 0.0,
            "totalPrice": 11.5,
            "isPaid": true,
            "paidAt": "2024-01-02T03:04:05Z",
            "isDelivered": false
        }))
        .expect("order json");

        assert_eq!(order.id, "o1");
        assert_eq!(order.shipping_address.postal_code, "12345");
        assert!(order.is_paid);
        assert!(order.paid_at.is_some());
        // Absent timestamps fall back to None rather than failing.
        assert!(order.delivered_at.is_none());
    }

    #[test]
    fn payment_details_serialize_payer_under_its_wire_name() {
        let details = PaymentDetails {
            id: "PAYID".to_string(),
            status: "COMPLETED".to_string(),
            update_time: "2024-01-01T00:00:00Z".to_string(),
            email_address: "buyer@example.com".to_string(),
        };
        let value = serde_json::to_value(&details).expect("serializable");
        assert_eq!(value["payer"], "buyer@example.com");
        assert!(value.get("email_address").is_none());
    }
}
