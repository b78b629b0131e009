//! Core module containing the order domain types, traits and service

pub mod error;
pub mod order;
pub mod service;
pub mod store;
pub mod validation;

pub use error::{
    EntityError, ErrorResponse, Operation, OperationError, OrderError, OrderResult, StorageError,
    ValidationError,
};
pub use order::{Item, ItemDraft, ItemLoading, NewOrder, Order, OrderFields, OrderId};
pub use service::OrderService;
pub use store::{OrderStore, OrderTransaction};
pub use validation::{
    CreateItemRequest, CreateOrderRequest, UpdateItemRequest, UpdateOrderRequest, ValidatedJson,
};
