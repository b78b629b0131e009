//! # orders-rs
//!
//! A REST backend for customer orders and their line items.
//!
//! ## Features
//!
//! - **Orders own items**: every item belongs to exactly one order
//! - **Atomic replace**: `PUT /orders/{id}` swaps the whole item set in one transaction
//! - **Safe delete**: items are removed before their order, in one transaction
//! - **Pluggable storage**: PostgreSQL (`postgres` feature) or in-memory
//! - **Typed errors**: every failure maps to a JSON body and a per-route status code
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orders::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     ServerBuilder::new()
//!         .with_store(InMemoryOrderStore::new())
//!         .serve("127.0.0.1:8080")
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod logging;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{
            EntityError, ErrorResponse, Operation, OperationError, OrderError, OrderResult,
            StorageError, ValidationError,
        },
        order::{Item, ItemDraft, ItemLoading, NewOrder, Order, OrderFields, OrderId},
        service::OrderService,
        store::{OrderStore, OrderTransaction},
        validation::{
            CreateItemRequest, CreateOrderRequest, UpdateItemRequest, UpdateOrderRequest,
            ValidatedJson,
        },
    };

    // === Storage ===
    pub use crate::storage::InMemoryOrderStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresOrderStore;

    // === Config ===
    pub use crate::config::{AppConfig, ConfigError, DatabaseConfig, StorageBackend};

    // === Server ===
    pub use crate::server::{OrderAppState, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};

    // === Axum ===
    pub use axum::{
        Router,
        extract::{Path, State},
        routing::{delete, get, post, put},
    };
}
