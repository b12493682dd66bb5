// florist_notify/src/memory/store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{event, Level};

use crate::error::NotifyResult;
use crate::model::{Flower, FlowerId, NewOrder, NotificationLogEntry, Order, OrderId, OrderStatus, UserId};
use crate::ports::{Clock, FlowerCatalog, NotificationLog, OrderStore};

struct OrderTable {
  next_id: i64,
  orders: BTreeMap<OrderId, Order>,
}

/// Orders behind one mutex. The compare-and-set checks and writes under the same guard, which is
/// what makes it atomic here.
pub struct InMemoryOrderStore {
  table: Mutex<OrderTable>,
  clock: Arc<dyn Clock>,
}

impl InMemoryOrderStore {
  pub fn new(clock: Arc<dyn Clock>) -> Self {
    Self {
      table: Mutex::new(OrderTable {
        next_id: 1,
        orders: BTreeMap::new(),
      }),
      clock,
    }
  }

  /// Stores a fully formed order as-is, keeping its id, status and creation time.
  pub fn insert(&self, order: Order) {
    let mut table = self.table.lock();
    table.next_id = table.next_id.max(order.id.0 + 1);
    table.orders.insert(order.id, order);
  }

  pub fn status_of(&self, order_id: OrderId) -> Option<OrderStatus> {
    self.table.lock().orders.get(&order_id).map(|order| order.status)
  }

  pub fn len(&self) -> usize {
    self.table.lock().orders.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn get(&self, order_id: OrderId) -> NotifyResult<Option<Order>> {
    Ok(self.table.lock().orders.get(&order_id).cloned())
  }

  async fn list(&self, status: OrderStatus) -> NotifyResult<Vec<Order>> {
    Ok(
      self
        .table
        .lock()
        .orders
        .values()
        .filter(|order| order.status == status)
        .cloned()
        .collect(),
    )
  }

  async fn list_for_user(&self, user_id: UserId) -> NotifyResult<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .table
      .lock()
      .orders
      .values()
      .filter(|order| order.user_id == user_id)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(orders)
  }

  async fn compare_and_set_status(
    &self,
    order_id: OrderId,
    expected_not_in: &[OrderStatus],
    new_status: OrderStatus,
  ) -> NotifyResult<bool> {
    let mut table = self.table.lock();
    let Some(order) = table.orders.get_mut(&order_id) else {
      return Ok(false);
    };
    if expected_not_in.contains(&order.status) {
      event!(Level::DEBUG, %order_id, current = %order.status, requested = %new_status, "Compare-and-set rejected.");
      return Ok(false);
    }
    order.status = new_status;
    Ok(true)
  }

  async fn create(&self, new_order: NewOrder) -> NotifyResult<Order> {
    let created_at = self.clock.now();
    let mut table = self.table.lock();
    let id = OrderId(table.next_id);
    table.next_id += 1;
    let order = Order {
      id,
      user_id: new_order.user_id,
      status: OrderStatus::AwaitingPayment,
      created_at,
      total_price_cents: new_order.total_price_cents,
      address: Some(new_order.address),
      items: new_order.items,
    };
    table.orders.insert(id, order.clone());
    Ok(order)
  }
}

#[derive(Default)]
pub struct InMemoryCatalog {
  flowers: RwLock<HashMap<FlowerId, Flower>>,
}

impl InMemoryCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_flowers(flowers: impl IntoIterator<Item = Flower>) -> Self {
    let catalog = Self::new();
    for flower in flowers {
      catalog.insert(flower);
    }
    catalog
  }

  pub fn insert(&self, flower: Flower) {
    self.flowers.write().insert(flower.id, flower);
  }
}

#[async_trait]
impl FlowerCatalog for InMemoryCatalog {
  async fn get(&self, flower_id: FlowerId) -> NotifyResult<Option<Flower>> {
    Ok(self.flowers.read().get(&flower_id).cloned())
  }
}

#[derive(Default)]
pub struct InMemoryNotificationLog {
  entries: Mutex<Vec<NotificationLogEntry>>,
}

impl InMemoryNotificationLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn entries(&self) -> Vec<NotificationLogEntry> {
    self.entries.lock().clone()
  }

  pub fn entries_for(&self, user_id: UserId) -> Vec<NotificationLogEntry> {
    self
      .entries
      .lock()
      .iter()
      .filter(|entry| entry.user_id == Some(user_id))
      .cloned()
      .collect()
  }
}

#[async_trait]
impl NotificationLog for InMemoryNotificationLog {
  async fn append(&self, user_id: Option<UserId>, message: &str, created_at: DateTime<Utc>) -> NotifyResult<()> {
    self.entries.lock().push(NotificationLogEntry {
      user_id,
      message: message.to_string(),
      created_at,
    });
    Ok(())
  }
}
