//! JSON request payloads for order writes

use crate::core::order::{ItemDraft, OrderId};
use serde::Deserialize;
use validator::Validate;

/// Body of `POST /orders`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "ordered_at is required"))]
    pub ordered_at: String,

    #[validate(length(min = 1, message = "customer_name is required"))]
    pub customer_name: String,

    #[validate(nested)]
    pub items: Vec<CreateItemRequest>,
}

/// Item entry of a create request; identifiers are always generated
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "item_code is required"))]
    pub item_code: String,

    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,

    #[validate(range(min = 0, message = "quantity must be non-negative"))]
    pub quantity: i32,
}

/// Body of `PUT /orders/{id}`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, message = "ordered_at is required"))]
    pub ordered_at: String,

    #[validate(length(min = 1, message = "customer_name is required"))]
    pub customer_name: String,

    #[validate(nested)]
    pub items: Vec<UpdateItemRequest>,
}

/// Item entry of an update request.
///
/// `id` is optional. An absent id or `0` means "new item".
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[serde(default)]
    #[validate(range(min = 0, message = "id must be non-negative"))]
    pub id: Option<OrderId>,

    #[validate(length(min = 1, message = "item_code is required"))]
    pub item_code: String,

    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,

    #[validate(range(min = 0, message = "quantity must be non-negative"))]
    pub quantity: i32,
}

impl From<CreateItemRequest> for ItemDraft {
    fn from(item: CreateItemRequest) -> Self {
        ItemDraft {
            id: None,
            item_code: item.item_code,
            description: item.description,
            quantity: item.quantity,
        }
    }
}

impl From<UpdateItemRequest> for ItemDraft {
    fn from(item: UpdateItemRequest) -> Self {
        ItemDraft {
            id: item.id.filter(|id| *id > 0),
            item_code: item.item_code,
            description: item.description,
            quantity: item.quantity,
        }
    }
}
