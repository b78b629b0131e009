//! HTTP handlers for order operations
//!
//! Handlers are thin: they extract the path and body, call the
//! [`OrderService`] and tag failures with their [`Operation`] so the error
//! maps to the route's status code.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::core::error::{Operation, OperationError};
use crate::core::order::Order;
use crate::core::service::OrderService;
use crate::core::validation::{CreateOrderRequest, UpdateOrderRequest, ValidatedJson};

/// Application state shared across handlers
#[derive(Clone)]
pub struct OrderAppState {
    pub service: OrderService,
}

impl OrderAppState {
    pub fn new(service: OrderService) -> Self {
        Self { service }
    }
}

/// `{"data": ...}` envelope used by the read routes
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// POST /orders
pub async fn create_order(
    State(state): State<OrderAppState>,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), OperationError> {
    let order = state
        .service
        .create(payload)
        .await
        .map_err(|e| e.during(Operation::Create))?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders
pub async fn list_orders(
    State(state): State<OrderAppState>,
) -> Result<Json<DataResponse<Vec<Order>>>, OperationError> {
    let orders = state
        .service
        .list()
        .await
        .map_err(|e| e.during(Operation::List))?;

    Ok(Json(DataResponse { data: orders }))
}

/// GET /orders/{id}
pub async fn get_order(
    State(state): State<OrderAppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Order>>, OperationError> {
    let order = state
        .service
        .get(&id)
        .await
        .map_err(|e| e.during(Operation::Get))?;

    Ok(Json(DataResponse { data: order }))
}

/// PUT /orders/{id}
pub async fn update_order(
    State(state): State<OrderAppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateOrderRequest>,
) -> Result<Json<Order>, OperationError> {
    let order = state
        .service
        .update(&id, payload)
        .await
        .map_err(|e| e.during(Operation::Update))?;

    Ok(Json(order))
}

/// DELETE /orders/{id}
pub async fn delete_order(
    State(state): State<OrderAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, OperationError> {
    state
        .service
        .delete(&id)
        .await
        .map_err(|e| e.during(Operation::Delete))?;

    Ok(StatusCode::NO_CONTENT)
}
