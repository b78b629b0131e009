//! PostgreSQL storage backend using sqlx.
//!
//! Provides [`PostgresOrderStore`], an [`OrderStore`] backed by a
//! `sqlx::PgPool`, and [`PgOrderTransaction`] wrapping a
//! `sqlx::Transaction<'static, Postgres>`.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! orders-rs = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! `orders` and `items` tables, created by the migrations under
//! `migrations/`. `items.order_id` references `orders.id`, so an order can
//! only be deleted once its items are gone.
//!
//! # Consistency
//!
//! - Eager reads run their two queries (orders, then all their items with
//!   `order_id = ANY($1)`) inside one `REPEATABLE READ READ ONLY`
//!   transaction, so the items always match the orders returned.
//! - Transactions lock the order row (`SELECT ... FOR UPDATE`) before
//!   touching it, which serializes concurrent updates of the same order.

use crate::config::DatabaseConfig;
use crate::core::error::{EntityError, OrderError, OrderResult, StorageError};
use crate::core::order::{Item, ItemDraft, ItemLoading, NewOrder, Order, OrderFields, OrderId};
use crate::core::store::{OrderStore, OrderTransaction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::time::Duration;

const BACKEND: &str = "PostgreSQL";

const ORDER_COLUMNS: &str = "id, customer_name, ordered_at, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, item_code, description, quantity, created_at, updated_at";

// ---------------------------------------------------------------------------
// Pool and schema management
// ---------------------------------------------------------------------------

/// Open a connection pool using the `database` section of the configuration
pub async fn connect(config: &DatabaseConfig) -> OrderResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| {
            StorageError::ConnectionError {
                backend: BACKEND.to_string(),
                message: e.to_string(),
            }
            .into()
        })
}

/// Apply the embedded migrations (idempotent).
///
/// Safe to call on every startup.
pub async fn run_migrations(pool: &PgPool) -> OrderResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StorageError::query(BACKEND, format!("migration failed: {}", e)).into())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_name: String,
    ordered_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<Item>) -> Order {
        Order {
            id: self.id,
            customer_name: self.customer_name,
            ordered_at: self.ordered_at,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    order_id: i64,
    item_code: String,
    description: String,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            order_id: row.order_id,
            item_code: row.item_code,
            description: row.description,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries shared by the store and its transactions
// ---------------------------------------------------------------------------

/// Attach items to order rows with a single `ANY($1)` query
async fn attach_items(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
    loading: ItemLoading,
) -> OrderResult<Vec<Order>> {
    if !loading.is_eager() || rows.is_empty() {
        return Ok(rows.into_iter().map(|row| row.into_order(Vec::new())).collect());
    }

    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let items: Vec<ItemRow> = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE order_id = ANY($1) ORDER BY id"
    ))
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_order: HashMap<i64, Vec<Item>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect())
}

async fn insert_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    drafts: &[ItemDraft],
) -> OrderResult<Vec<Item>> {
    if drafts.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i64> = drafts.iter().map(|_| order_id).collect();
    let codes: Vec<String> = drafts.iter().map(|d| d.item_code.clone()).collect();
    let descriptions: Vec<String> = drafts.iter().map(|d| d.description.clone()).collect();
    let quantities: Vec<i32> = drafts.iter().map(|d| d.quantity).collect();

    let rows: Vec<ItemRow> = sqlx::query_as(&format!(
        "INSERT INTO items (order_id, item_code, description, quantity) \
         SELECT * FROM UNNEST($1::bigint[], $2::text[], $3::text[], $4::int[]) \
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(&order_ids)
    .bind(&codes)
    .bind(&descriptions)
    .bind(&quantities)
    .fetch_all(&mut *conn)
    .await?;

    let mut items: Vec<Item> = rows.into_iter().map(Item::from).collect();
    items.sort_by_key(|item| item.id);
    Ok(items)
}

/// Open a read-only snapshot transaction for multi-query reads
async fn read_snapshot(pool: &PgPool) -> OrderResult<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

// ---------------------------------------------------------------------------
// PostgresOrderStore
// ---------------------------------------------------------------------------

/// Order store backed by PostgreSQL.
///
/// # Example
///
/// ```rust,ignore
/// use orders::storage::postgres::{connect, run_migrations, PostgresOrderStore};
///
/// let pool = connect(&config.database).await?;
/// run_migrations(&pool).await?;
/// let store = PostgresOrderStore::new(pool);
/// ```
#[derive(Clone, Debug)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Create a new `PostgresOrderStore` with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert_order(&self, new_order: NewOrder) -> OrderResult<Order> {
        let mut tx = self.pool.begin().await?;

        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (customer_name, ordered_at) VALUES ($1, $2) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&new_order.fields.customer_name)
        .bind(new_order.fields.ordered_at)
        .fetch_one(&mut *tx)
        .await?;

        let items = insert_items(&mut tx, row.id, &new_order.items).await?;

        tx.commit().await.map_err(StorageError::transaction)?;
        Ok(row.into_order(items))
    }

    async fn list_orders(&self, loading: ItemLoading) -> OrderResult<Vec<Order>> {
        let mut tx = read_snapshot(&self.pool).await?;

        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id"))
                .fetch_all(&mut *tx)
                .await?;
        let orders = attach_items(&mut tx, rows, loading).await?;

        tx.commit().await?;
        Ok(orders)
    }

    async fn find_order(&self, id: OrderId, loading: ItemLoading) -> OrderResult<Option<Order>> {
        let mut tx = read_snapshot(&self.pool).await?;

        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let order = match row {
            Some(row) => attach_items(&mut tx, vec![row], loading).await?.pop(),
            None => None,
        };

        tx.commit().await?;
        Ok(order)
    }

    async fn list_items(&self, order_id: OrderId) -> OrderResult<Vec<Item>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn begin(&self) -> OrderResult<Box<dyn OrderTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgOrderTransaction { tx }))
    }
}

// ---------------------------------------------------------------------------
// PgOrderTransaction
// ---------------------------------------------------------------------------

/// Read-write transaction over [`PostgresOrderStore`].
///
/// Dropping it without calling `commit` rolls back.
pub struct PgOrderTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTransaction for PgOrderTransaction {
    async fn find_order(
        &mut self,
        id: OrderId,
        loading: ItemLoading,
    ) -> OrderResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => Ok(attach_items(&mut self.tx, vec![row], loading).await?.pop()),
            None => Ok(None),
        }
    }

    async fn update_order(&mut self, id: OrderId, fields: &OrderFields) -> OrderResult<Order> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET customer_name = $2, ordered_at = $3, updated_at = now() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(&fields.customer_name)
        .bind(fields.ordered_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| row.into_order(Vec::new()))
            .ok_or_else(|| EntityError::order_not_found(id).into())
    }

    async fn delete_items(&mut self, order_id: OrderId) -> OrderResult<u64> {
        let result = sqlx::query("DELETE FROM items WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn item_owner(&mut self, item_id: OrderId) -> OrderResult<Option<OrderId>> {
        let owner: Option<(i64,)> = sqlx::query_as("SELECT order_id FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(owner.map(|(order_id,)| order_id))
    }

    async fn save_item(&mut self, order_id: OrderId, item: &ItemDraft) -> OrderResult<Item> {
        let Some(item_id) = item.id else {
            let mut saved = insert_items(&mut self.tx, order_id, std::slice::from_ref(item)).await?;
            return saved
                .pop()
                .ok_or_else(|| OrderError::Internal("item insert returned no row".to_string()));
        };

        // The WHERE clause turns an upsert onto another order's row into a no-op
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "INSERT INTO items (id, order_id, item_code, description, quantity) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET \
                 item_code = EXCLUDED.item_code, \
                 description = EXCLUDED.description, \
                 quantity = EXCLUDED.quantity, \
                 updated_at = now() \
             WHERE items.order_id = EXCLUDED.order_id \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item_id)
        .bind(order_id)
        .bind(&item.item_code)
        .bind(&item.description)
        .bind(item.quantity)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            let owner = self.item_owner(item_id).await?.unwrap_or_default();
            return Err(EntityError::ForeignItem {
                item_id,
                order_id: owner,
            }
            .into());
        };

        // Explicit ids bypass the sequence, keep it ahead of them
        sqlx::query(
            "SELECT setval('items_id_seq', GREATEST($1, (SELECT last_value FROM items_id_seq)))",
        )
        .bind(item_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn delete_order(&mut self, id: OrderId) -> OrderResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(EntityError::order_not_found(id).into());
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> OrderResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| StorageError::transaction(e).into())
    }

    async fn rollback(self: Box<Self>) -> OrderResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| StorageError::transaction(e).into())
    }
}
