//! Order and Item entities plus the inputs used to write them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier type shared by orders and items (integer primary keys)
pub type OrderId = i64;

/// A customer order owning a set of line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub ordered_at: DateTime<Utc>,
    pub items: Vec<Item>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Entity type name used in error reporting and logs
    pub const ENTITY_TYPE: &'static str = "order";

    /// Sort items by id so that reads are deterministic regardless of backend
    pub fn sort_items(&mut self) {
        self.items.sort_by_key(|item| item.id);
    }
}

/// A line entry owned by exactly one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: OrderId,
    pub order_id: OrderId,
    pub item_code: String,
    pub description: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scalar fields written when creating or updating an order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFields {
    pub customer_name: String,
    pub ordered_at: DateTime<Utc>,
}

/// An item to be written under an order.
///
/// `id` is only honoured by the update flow, where it selects upsert
/// semantics. Creation always assigns fresh identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub id: Option<OrderId>,
    pub item_code: String,
    pub description: String,
    pub quantity: i32,
}

/// A complete order to insert in a single write
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub fields: OrderFields,
    pub items: Vec<ItemDraft>,
}

/// Whether a read should fetch the owned items together with the order rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemLoading {
    /// Fetch items in the same logical read
    #[default]
    Eager,
    /// Leave `Order::items` empty
    Skip,
}

impl ItemLoading {
    pub fn is_eager(self) -> bool {
        matches!(self, ItemLoading::Eager)
    }
}
