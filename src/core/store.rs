//! Data access traits for orders and their items
//!
//! The service never talks to a database directly. It receives an
//! [`OrderStore`] handle at construction and drives multi-step writes through
//! an explicit [`OrderTransaction`]. Both the PostgreSQL and in-memory
//! backends implement these traits.

use crate::core::error::OrderResult;
use crate::core::order::{Item, ItemDraft, ItemLoading, NewOrder, Order, OrderFields, OrderId};
use async_trait::async_trait;

/// Storage handle for orders
///
/// Single-statement reads and the one-shot create live here. Anything that
/// needs several statements to be atomic goes through [`OrderStore::begin`].
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Human readable backend name, for logs
    fn backend(&self) -> &'static str;

    /// Insert an order and all of its items atomically.
    ///
    /// Item identifiers in `order.items` are ignored; every item gets a fresh one.
    async fn insert_order(&self, order: NewOrder) -> OrderResult<Order>;

    /// Read every order, ordered by ascending id
    async fn list_orders(&self, loading: ItemLoading) -> OrderResult<Vec<Order>>;

    /// Read one order
    async fn find_order(&self, id: OrderId, loading: ItemLoading) -> OrderResult<Option<Order>>;

    /// Read the items owned by an order, ordered by ascending id
    async fn list_items(&self, order_id: OrderId) -> OrderResult<Vec<Item>>;

    /// Open a transaction
    async fn begin(&self) -> OrderResult<Box<dyn OrderTransaction>>;
}

/// A unit of work against the store.
///
/// Nothing written through a transaction is visible to other readers until
/// [`commit`](OrderTransaction::commit) succeeds. Dropping a transaction
/// without committing discards its writes.
#[async_trait]
pub trait OrderTransaction: Send {
    /// Read one order inside the transaction
    async fn find_order(&mut self, id: OrderId, loading: ItemLoading)
    -> OrderResult<Option<Order>>;

    /// Overwrite an order's scalar fields and bump `updated_at`
    async fn update_order(&mut self, id: OrderId, fields: &OrderFields) -> OrderResult<Order>;

    /// Delete every item owned by the order, returning how many were removed
    async fn delete_items(&mut self, order_id: OrderId) -> OrderResult<u64>;

    /// Owner of an item row, if the item exists
    async fn item_owner(&mut self, item_id: OrderId) -> OrderResult<Option<OrderId>>;

    /// Insert or update an item under `order_id`.
    ///
    /// With `item.id == None` a fresh identifier is generated. With an
    /// identifier the row is written under that identifier, created if absent.
    async fn save_item(&mut self, order_id: OrderId, item: &ItemDraft) -> OrderResult<Item>;

    /// Delete the order row itself
    async fn delete_order(&mut self, id: OrderId) -> OrderResult<()>;

    /// Make every write of this transaction durable and visible
    async fn commit(self: Box<Self>) -> OrderResult<()>;

    /// Discard every write of this transaction
    async fn rollback(self: Box<Self>) -> OrderResult<()>;
}
