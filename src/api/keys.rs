//! Query key catalog.
//!
//! One constructor per logical query, so key shapes live in exactly one
//! place and mutations can name the prefixes they invalidate.

use crate::query::QueryKey;

/// Prefix covering every order list (`["orders", …]`).
pub fn orders() -> QueryKey {
    QueryKey::root("orders")
}

pub fn my_orders() -> QueryKey {
    QueryKey::root("orders").push("mine")
}

pub fn all_orders() -> QueryKey {
    QueryKey::root("orders").push("all")
}

pub fn order(order_id: &str) -> QueryKey {
    QueryKey::root("order").push(order_id)
}

pub fn paypal_client_id() -> QueryKey {
    QueryKey::root("paypal").push("clientId")
}

/// Prefix covering every product list, paginated and top (`["products", …]`).
pub fn products() -> QueryKey {
    QueryKey::root("products")
}

pub fn product_page(keyword: &str, page: u32) -> QueryKey {
    QueryKey::root("products").push(keyword).push(page)
}

pub fn top_products() -> QueryKey {
    QueryKey::root("products").push("top")
}

pub fn product(product_id: &str) -> QueryKey {
    QueryKey::root("product").push(product_id)
}

pub fn users() -> QueryKey {
    QueryKey::root("users")
}

pub fn user(user_id: &str) -> QueryKey {
    QueryKey::root("user").push(user_id)
}

pub fn user_profile() -> QueryKey {
    QueryKey::root("user").push("profile")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_lists_share_the_orders_prefix() {
        assert!(my_orders().starts_with(&orders()));
        assert!(all_orders().starts_with(&orders()));
        // Order details live under a separate root.
        assert!(!order("42").starts_with(&orders()));
    }

    #[test]
    fn product_lists_share_the_products_prefix() {
        assert!(product_page("shoes", 2).starts_with(&products()));
        assert!(product_page("", 1).starts_with(&products()));
        assert!(top_products().starts_with(&products()));
        assert!(!product("p1").starts_with(&products()));
    }

    #[test]
    fn user_profile_is_a_user_detail_key() {
        assert!(user_profile().starts_with(&QueryKey::root("user")));
        assert!(!user_profile().starts_with(&users()));
    }
}
