//! In-memory implementation of OrderStore for testing and development
//!
//! Both tables live behind one `tokio::sync::Mutex`. A transaction takes the
//! lock for its whole lifetime and works on a private copy of the tables;
//! `commit` swaps the copy in, dropping the transaction discards it.
//! Transactions are therefore fully serialized.

use crate::core::error::{EntityError, OrderResult, StorageError};
use crate::core::order::{Item, ItemDraft, ItemLoading, NewOrder, Order, OrderFields, OrderId};
use crate::core::store::{OrderStore, OrderTransaction};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

const BACKEND: &str = "in-memory";

#[derive(Debug, Clone, Default)]
struct Tables {
    /// Order rows, stored with an empty `items` vector
    orders: BTreeMap<OrderId, Order>,
    items: BTreeMap<OrderId, Item>,
    last_order_id: OrderId,
    last_item_id: OrderId,
}

impl Tables {
    fn next_order_id(&mut self) -> OrderResult<OrderId> {
        self.last_order_id = next_id(self.last_order_id, "orders")?;
        Ok(self.last_order_id)
    }

    fn next_item_id(&mut self) -> OrderResult<OrderId> {
        self.last_item_id = next_id(self.last_item_id, "items")?;
        Ok(self.last_item_id)
    }

    fn items_of(&self, order_id: OrderId) -> Vec<Item> {
        self.items
            .values()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect()
    }

    fn load(&self, row: &Order, loading: ItemLoading) -> Order {
        let mut order = row.clone();
        if loading.is_eager() {
            order.items = self.items_of(row.id);
        }
        order
    }

    fn find_order(&self, id: OrderId, loading: ItemLoading) -> Option<Order> {
        self.orders.get(&id).map(|row| self.load(row, loading))
    }

    /// Write an item row, enforcing the order foreign key
    fn save_item(&mut self, order_id: OrderId, draft: &ItemDraft) -> OrderResult<Item> {
        if !self.orders.contains_key(&order_id) {
            return Err(StorageError::IntegrityError {
                message: format!("order '{}' does not exist", order_id),
            }
            .into());
        }

        let now = Utc::now();
        let (id, created_at) = match draft.id {
            Some(id) => match self.items.get(&id) {
                Some(existing) if existing.order_id != order_id => {
                    return Err(EntityError::ForeignItem {
                        item_id: id,
                        order_id: existing.order_id,
                    }
                    .into());
                }
                Some(existing) => (id, existing.created_at),
                None => {
                    // Keep generated ids ahead of explicitly chosen ones
                    self.last_item_id = self.last_item_id.max(id);
                    (id, now)
                }
            },
            None => (self.next_item_id()?, now),
        };

        let item = Item {
            id,
            order_id,
            item_code: draft.item_code.clone(),
            description: draft.description.clone(),
            quantity: draft.quantity,
            created_at,
            updated_at: now,
        };
        self.items.insert(id, item.clone());
        Ok(item)
    }
}

/// Id sequences stop at `i64::MAX` like a `BIGSERIAL` column
fn next_id(last: OrderId, table: &str) -> OrderResult<OrderId> {
    last.checked_add(1).ok_or_else(|| {
        StorageError::IntegrityError {
            message: format!("id sequence for '{}' is exhausted", table),
        }
        .into()
    })
}

/// In-memory order store
///
/// Cloning is cheap and every clone shares the same tables.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryOrderStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert_order(&self, new_order: NewOrder) -> OrderResult<Order> {
        let mut tables = self.tables.lock().await;
        let mut working = tables.clone();

        let now = Utc::now();
        let id = working.next_order_id()?;
        let mut order = Order {
            id,
            customer_name: new_order.fields.customer_name,
            ordered_at: new_order.fields.ordered_at,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        working.orders.insert(id, order.clone());

        let mut items = Vec::with_capacity(new_order.items.len());
        for draft in &new_order.items {
            let fresh = ItemDraft {
                id: None,
                ..draft.clone()
            };
            items.push(working.save_item(id, &fresh)?);
        }

        *tables = working;
        order.items = items;
        Ok(order)
    }

    async fn list_orders(&self, loading: ItemLoading) -> OrderResult<Vec<Order>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .values()
            .map(|row| tables.load(row, loading))
            .collect())
    }

    async fn find_order(&self, id: OrderId, loading: ItemLoading) -> OrderResult<Option<Order>> {
        Ok(self.tables.lock().await.find_order(id, loading))
    }

    async fn list_items(&self, order_id: OrderId) -> OrderResult<Vec<Item>> {
        Ok(self.tables.lock().await.items_of(order_id))
    }

    async fn begin(&self) -> OrderResult<Box<dyn OrderTransaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, working }))
    }
}

/// Transaction over [`InMemoryOrderStore`]
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl OrderTransaction for InMemoryTransaction {
    async fn find_order(
        &mut self,
        id: OrderId,
        loading: ItemLoading,
    ) -> OrderResult<Option<Order>> {
        Ok(self.working.find_order(id, loading))
    }

    async fn update_order(&mut self, id: OrderId, fields: &OrderFields) -> OrderResult<Order> {
        let row = self
            .working
            .orders
            .get_mut(&id)
            .ok_or_else(|| EntityError::order_not_found(id))?;

        row.customer_name = fields.customer_name.clone();
        row.ordered_at = fields.ordered_at;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_items(&mut self, order_id: OrderId) -> OrderResult<u64> {
        let before = self.working.items.len();
        self.working.items.retain(|_, item| item.order_id != order_id);
        Ok((before - self.working.items.len()) as u64)
    }

    async fn item_owner(&mut self, item_id: OrderId) -> OrderResult<Option<OrderId>> {
        Ok(self.working.items.get(&item_id).map(|item| item.order_id))
    }

    async fn save_item(&mut self, order_id: OrderId, item: &ItemDraft) -> OrderResult<Item> {
        self.working.save_item(order_id, item)
    }

    async fn delete_order(&mut self, id: OrderId) -> OrderResult<()> {
        if self.working.items.values().any(|item| item.order_id == id) {
            return Err(StorageError::IntegrityError {
                message: format!("order '{}' still owns items", id),
            }
            .into());
        }
        self.working
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| EntityError::order_not_found(id).into())
    }

    async fn commit(self: Box<Self>) -> OrderResult<()> {
        let InMemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> OrderResult<()> {
        Ok(())
    }
}
