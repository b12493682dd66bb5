// florist_notify/src/ports/store.rs

//! Persistence ports for orders and the flower catalog.

use async_trait::async_trait;

use crate::error::NotifyResult;
use crate::model::{Flower, FlowerId, NewOrder, Order, OrderId, OrderStatus, UserId};

/// Transactional record store for orders and their items.
///
/// Every status transition in this crate goes through [`OrderStore::compare_and_set_status`].
/// Implementations must make that call a single atomic conditional update; a read followed by a
/// write is exactly the race it exists to prevent.
#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Loads an order with its items. `Ok(None)` when the id is unknown.
  async fn get(&self, order_id: OrderId) -> NotifyResult<Option<Order>>;

  /// All orders currently in `status`, items included.
  async fn list(&self, status: OrderStatus) -> NotifyResult<Vec<Order>>;

  /// Orders owned by `user_id`, newest first.
  async fn list_for_user(&self, user_id: UserId) -> NotifyResult<Vec<Order>>;

  /// Sets `new_status` only if the current status is not in `expected_not_in`.
  /// Returns `true` when the update applied, `false` when the guard rejected it or the order is
  /// missing.
  async fn compare_and_set_status(
    &self,
    order_id: OrderId,
    expected_not_in: &[OrderStatus],
    new_status: OrderStatus,
  ) -> NotifyResult<bool>;

  /// Persists the order and its items in one transaction with status `awaiting_payment`.
  async fn create(&self, order: NewOrder) -> NotifyResult<Order>;
}

#[async_trait]
pub trait FlowerCatalog: Send + Sync {
  async fn get(&self, flower_id: FlowerId) -> NotifyResult<Option<Flower>>;
}
