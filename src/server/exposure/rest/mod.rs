//! REST API exposure for the order service
//!
//! Consumes an [`OrderService`] and produces an Axum `Router` with the
//! health and order routes plus any custom routes.

use crate::core::service::OrderService;
use crate::server::handlers::OrderAppState;
use crate::server::router::build_order_routes;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

/// Service name reported by the health routes
pub const SERVICE_NAME: &str = "orders-rs";

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router
    ///
    /// Returns a router with:
    /// - Health check routes
    /// - Order CRUD routes
    /// - Custom routes
    pub fn build_router(service: OrderService, custom_routes: Vec<Router>) -> Router {
        let mut app = Self::health_routes().merge(build_order_routes(OrderAppState::new(service)));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        app
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": SERVICE_NAME
        }))
    }
}
