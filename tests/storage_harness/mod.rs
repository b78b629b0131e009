//! Shared test harness for order store backends
//!
//! Provides builders for store inputs and REST bodies, plus the
//! `order_store_tests!` and `rest_integration_tests!` macros that run the
//! same contract suite against every backend.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//!
//! order_store_tests!(InMemoryOrderStore::new());
//! rest_integration_tests!(InMemoryOrderStore::new());
//! ```

#![allow(dead_code)]



use chrono::{DateTime, TimeZone, Utc};
use orders::core::order::{ItemDraft, NewOrder, Order, OrderFields, OrderId};
use serde_json::{Value, json};

/// Fixed `ordered_at` used by the store-level builders
pub fn fixed_ordered_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
}

pub fn order_fields(customer: &str) -> OrderFields {
    OrderFields {
        customer_name: customer.to_string(),
        ordered_at: fixed_ordered_at(),
    }
}

pub fn item_draft(id: Option<OrderId>, code: &str, quantity: i32) -> ItemDraft {
    ItemDraft {
        id,
        item_code: code.to_string(),
        description: format!("{} description", code),
        quantity,
    }
}

/// A new order with one fresh item per `(item_code, quantity)` pair
pub fn new_order(customer: &str, items: &[(&str, i32)]) -> NewOrder {
    NewOrder {
        fields: order_fields(customer),
        items: items
            .iter()
            .map(|(code, quantity)| item_draft(None, code, *quantity))
            .collect(),
    }
}

/// JSON body for `POST /orders` or `PUT /orders/{id}`
pub fn order_body(customer: &str, ordered_at: &str, items: Value) -> Value {
    json!({
        "ordered_at": ordered_at,
        "customer_name": customer,
        "items": items,
    })
}

/// JSON item entry without an id
pub fn item_body(code: &str, quantity: i32) -> Value {
    json!({
        "item_code": code,
        "description": format!("{} description", code),
        "quantity": quantity,
    })
}

/// Assert every item of `order` is owned by it and ids are strictly increasing
pub fn assert_items_owned(order: &Order) {
    for item in &order.items {
        assert_eq!(
            item.order_id, order.id,
            "item {} is owned by order {}, expected {}",
            item.id, item.order_id, order.id
        );
    }
    for pair in order.items.windows(2) {
        assert!(
            pair[0].id < pair[1].id,
            "items not sorted by id: {} then {}",
            pair[0].id,
            pair[1].id
        );
    }
}

/// Assert that a list contains exactly `n` entries.
pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} items, got {}",
        expected,
        list.len()
    );
}
