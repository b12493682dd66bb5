// florist_shop/src/db/orders.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use florist_notify::{
  Clock, FlowerId, NewOrder, NotifyError, NotifyResult, Order, OrderId, OrderItem, OrderStatus, OrderStore, UserId,
};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::store_error;

#[derive(Debug, FromRow)]
struct OrderRow {
  id: i64,
  user_id: i64,
  status: String,
  created_at: DateTime<Utc>,
  total_price_cents: i64,
  address: Option<String>,
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
  order_id: i64,
  flower_id: i64,
  flower_name: String,
  quantity: i32,
  price_cents: i64,
  subtotal_cents: i64,
}

impl OrderItemRow {
  fn into_item(self) -> OrderItem {
    OrderItem {
      flower_id: FlowerId(self.flower_id),
      flower_name: self.flower_name,
      quantity: u32::try_from(self.quantity).unwrap_or(0),
      price_cents: self.price_cents,
      subtotal_cents: self.subtotal_cents,
    }
  }
}

impl OrderRow {
  fn into_order(self, items: Vec<OrderItem>) -> NotifyResult<Order> {
    let status = self.status.parse::<OrderStatus>().map_err(|e| NotifyError::DataIntegrity {
      order_id: OrderId(self.id),
      message: e.to_string(),
    })?;
    Ok(Order {
      id: OrderId(self.id),
      user_id: UserId(self.user_id),
      status,
      created_at: self.created_at,
      total_price_cents: self.total_price_cents,
      address: self.address,
      items,
    })
  }
}

const ORDER_COLUMNS: &str = "id, user_id, status, created_at, total_price_cents, address";
const ITEM_COLUMNS: &str = "order_id, flower_id, flower_name, quantity, price_cents, subtotal_cents";

/// Order storage on Postgres. Status transitions are one guarded `UPDATE`, so concurrent writers
/// are arbitrated by the database.
#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
  clock: Arc<dyn Clock>,
}

impl PgOrderStore {
  pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
    Self { pool, clock }
  }

  async fn with_items(&self, rows: Vec<OrderRow>) -> NotifyResult<Vec<Order>> {
    if rows.is_empty() {
      return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let item_rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
      "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY id",
      ITEM_COLUMNS
    ))
    .bind(&ids)
    .fetch_all(&self.pool)
    .await
    .map_err(store_error)?;

    let mut items_by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for item in item_rows {
      items_by_order.entry(item.order_id).or_default().push(item.into_item());
    }
    rows
      .into_iter()
      .map(|row| {
        let items = items_by_order.remove(&row.id).unwrap_or_default();
        row.into_order(items)
      })
      .collect()
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "pg::orders::get", skip_all, fields(order_id = %order_id))]
  async fn get(&self, order_id: OrderId) -> NotifyResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id.0)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    match row {
      Some(row) => Ok(self.with_items(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn list(&self, status: OrderStatus) -> NotifyResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE status = $1 ORDER BY created_at, id",
      ORDER_COLUMNS
    ))
    .bind(status.as_str())
    .fetch_all(&self.pool)
    .await
    .map_err(store_error)?;
    self.with_items(rows).await
  }

  async fn list_for_user(&self, user_id: UserId) -> NotifyResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
      ORDER_COLUMNS
    ))
    .bind(user_id.0)
    .fetch_all(&self.pool)
    .await
    .map_err(store_error)?;
    self.with_items(rows).await
  }

  #[instrument(name = "pg::orders::compare_and_set_status", skip_all, fields(order_id = %order_id, new_status = %new_status))]
  async fn compare_and_set_status(
    &self,
    order_id: OrderId,
    expected_not_in: &[OrderStatus],
    new_status: OrderStatus,
  ) -> NotifyResult<bool> {
    let guard: Vec<String> = expected_not_in.iter().map(|s| s.as_str().to_string()).collect();
    let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status <> ALL($2::text[])")
      .bind(order_id.0)
      .bind(&guard)
      .bind(new_status.as_str())
      .execute(&self.pool)
      .await
      .map_err(store_error)?;
    let applied = result.rows_affected() == 1;
    debug!(applied, "Guarded status update finished.");
    Ok(applied)
  }

  #[instrument(name = "pg::orders::create", skip_all, fields(user_id = %new_order.user_id, items = new_order.items.len()))]
  async fn create(&self, new_order: NewOrder) -> NotifyResult<Order> {
    let created_at = self.clock.now();
    let mut tx = self.pool.begin().await.map_err(store_error)?;

    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (user_id, status, created_at, total_price_cents, address) \
       VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(new_order.user_id.0)
    .bind(OrderStatus::AwaitingPayment.as_str())
    .bind(created_at)
    .bind(new_order.total_price_cents)
    .bind(&new_order.address)
    .fetch_one(&mut *tx)
    .await
    .map_err(store_error)?;

    for item in &new_order.items {
      let quantity = i32::try_from(item.quantity).map_err(|e| NotifyError::Store { source: e.into() })?;
      sqlx::query(
        "INSERT INTO order_items (order_id, flower_id, flower_name, quantity, price_cents, subtotal_cents) \
         VALUES ($1, $2, $3, $4, $5, $6)",
      )
      .bind(row.id)
      .bind(item.flower_id.0)
      .bind(&item.flower_name)
      .bind(quantity)
      .bind(item.price_cents)
      .bind(item.subtotal_cents)
      .execute(&mut *tx)
      .await
      .map_err(store_error)?;
    }

    tx.commit().await.map_err(store_error)?;
    row.into_order(new_order.items)
  }
}
