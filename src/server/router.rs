//! Router builder for order routes

use super::handlers::{
    OrderAppState, create_order, delete_order, get_order, list_orders, update_order,
};
use axum::{Router, routing::get};

/// Build the order routes
///
/// - GET /orders - List orders with their items
/// - POST /orders - Create an order with its items
/// - GET /orders/{id} - Get one order with its items
/// - PUT /orders/{id} - Replace an order's fields and item set
/// - DELETE /orders/{id} - Delete an order and its items
pub fn build_order_routes(state: OrderAppState) -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .with_state(state)
}
