//! Order service: the five order operations as sequences of store calls
//!
//! Multi-step writes run inside one [`OrderTransaction`]. Every failure
//! after `begin` rolls the transaction back before the error is returned, so
//! no partial item set is ever committed.

use crate::core::error::{EntityError, OrderError, OrderResult};
use crate::core::order::{Item, ItemDraft, ItemLoading, NewOrder, Order, OrderFields, OrderId};
use crate::core::store::{OrderStore, OrderTransaction};
use crate::core::validation::{CreateOrderRequest, UpdateOrderRequest, parse_ordered_at};
use std::sync::Arc;

/// Service implementing order create / list / get / update / delete
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    /// Create a service on top of an injected store handle
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// The store handle this service writes through
    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Create an order and its items in a single write
    pub async fn create(&self, request: CreateOrderRequest) -> OrderResult<Order> {
        let ordered_at = parse_ordered_at(&request.ordered_at)?;

        let new_order = NewOrder {
            fields: OrderFields {
                customer_name: request.customer_name,
                ordered_at,
            },
            items: request.items.into_iter().map(ItemDraft::from).collect(),
        };

        let order = self.store.insert_order(new_order).await?;
        tracing::info!(order_id = order.id, items = order.items.len(), "order created");
        Ok(order)
    }

    /// List every order with its items
    pub async fn list(&self) -> OrderResult<Vec<Order>> {
        self.store.list_orders(ItemLoading::Eager).await
    }

    /// Get one order with its items.
    ///
    /// `id` is the raw path segment; anything that is not an integer key
    /// cannot match a row and is reported as not found.
    pub async fn get(&self, id: &str) -> OrderResult<Order> {
        let order_id = parse_order_id(id)?;
        self.store
            .find_order(order_id, ItemLoading::Eager)
            .await?
            .ok_or_else(|| EntityError::order_not_found(order_id).into())
    }

    /// Replace an order's fields and its whole item set atomically
    pub async fn update(&self, id: &str, request: UpdateOrderRequest) -> OrderResult<Order> {
        // Fail fast, before any transaction is opened
        let ordered_at = parse_ordered_at(&request.ordered_at)?;
        let order_id = parse_order_id(id)?;

        let fields = OrderFields {
            customer_name: request.customer_name,
            ordered_at,
        };
        let items: Vec<ItemDraft> = request.items.into_iter().map(ItemDraft::from).collect();

        let mut tx = self.store.begin().await?;
        match replace_order(tx.as_mut(), order_id, &fields, &items).await {
            Ok(order) => {
                tx.commit().await?;
                tracing::info!(order_id, items = order.items.len(), "order updated");
                Ok(order)
            }
            Err(err) => Err(abort(tx, order_id, err).await),
        }
    }

    /// Delete an order after deleting all of its items
    pub async fn delete(&self, id: &str) -> OrderResult<()> {
        let order_id = parse_order_id(id)?;

        let mut tx = self.store.begin().await?;
        match remove_order(tx.as_mut(), order_id).await {
            Ok(removed_items) => {
                tx.commit().await?;
                tracing::info!(order_id, removed_items, "order deleted");
                Ok(())
            }
            Err(err) => Err(abort(tx, order_id, err).await),
        }
    }
}

/// Steps 3 to 6 of the update flow, run inside `tx`
async fn replace_order(
    tx: &mut dyn OrderTransaction,
    order_id: OrderId,
    fields: &OrderFields,
    items: &[ItemDraft],
) -> OrderResult<Order> {
    if tx.find_order(order_id, ItemLoading::Skip).await?.is_none() {
        return Err(EntityError::order_not_found(order_id).into());
    }

    let mut order = tx.update_order(order_id, fields).await?;
    tx.delete_items(order_id).await?;

    let mut saved: Vec<Item> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(item_id) = item.id {
            // Our previous rows are gone, so a surviving owner other than us
            // means the id belongs to another order
            if let Some(owner) = tx.item_owner(item_id).await? {
                if owner != order_id {
                    return Err(EntityError::ForeignItem {
                        item_id,
                        order_id: owner,
                    }
                    .into());
                }
            }
        }

        let item = tx.save_item(order_id, item).await?;
        // A repeated id in the payload overwrites the earlier entry
        match saved.iter_mut().find(|s| s.id == item.id) {
            Some(slot) => *slot = item,
            None => saved.push(item),
        }
    }

    order.items = saved;
    order.sort_items();
    Ok(order)
}

/// Delete flow inside `tx`, returning how many items were removed
async fn remove_order(tx: &mut dyn OrderTransaction, order_id: OrderId) -> OrderResult<u64> {
    if tx.find_order(order_id, ItemLoading::Skip).await?.is_none() {
        return Err(EntityError::order_not_found(order_id).into());
    }

    let removed = tx.delete_items(order_id).await?;
    tx.delete_order(order_id).await?;
    Ok(removed)
}

/// Roll back after a failed step and hand back the original error.
///
/// A rollback failure is logged but never replaces the error that caused it.
async fn abort(tx: Box<dyn OrderTransaction>, order_id: OrderId, err: OrderError) -> OrderError {
    if let Err(rollback_err) = tx.rollback().await {
        tracing::error!(order_id, error = %rollback_err, "rollback failed");
    }
    if err.is_not_found() {
        tracing::debug!(order_id, "order not found");
    } else {
        tracing::warn!(order_id, error = %err, "transaction rolled back");
    }
    err
}

fn parse_order_id(raw: &str) -> OrderResult<OrderId> {
    raw.trim()
        .parse::<OrderId>()
        .map_err(|_| EntityError::order_not_found(raw).into())
}
