// florist_shop/src/services/orders.rs

//! Web-side order operations. Each one changes the store and then tells the scheduler what
//! happened; chat messages are sent from the scheduler loop only.

use florist_notify::{
  normalize_phone, EventPublisher, FlowerCatalog, FlowerId, NewOrder, Order, OrderEvent, OrderId, OrderStatus,
  OrderStore, ProfileUpdate, UserDirectory, UserId, UserProfile,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutLine {
  pub flower_id: FlowerId,
  pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
  pub address: String,
  pub items: Vec<CheckoutLine>,
}

pub struct OrderService {
  orders: Arc<dyn OrderStore>,
  users: Arc<dyn UserDirectory>,
  catalog: Arc<dyn FlowerCatalog>,
  publisher: EventPublisher,
}

impl OrderService {
  pub fn new(
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
    catalog: Arc<dyn FlowerCatalog>,
    publisher: EventPublisher,
  ) -> Self {
    Self {
      orders,
      users,
      catalog,
      publisher,
    }
  }

  async fn profile(&self, user_id: UserId) -> Result<UserProfile> {
    self
      .users
      .get(user_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
  }

  /// Loads an order the caller owns. Someone else's order is reported as missing.
  async fn owned_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
    match self.orders.get(order_id).await? {
      Some(order) if order.user_id == user_id => Ok(order),
      _ => Err(AppError::NotFound(format!("Order #{} not found", order_id))),
    }
  }

  async fn publish(&self, order_id: OrderId, event: OrderEvent) {
    // The store already holds the change; a lost event only costs the chat message.
    if let Err(e) = self.publisher.order_event(order_id, event).await {
      warn!(%order_id, event = event.name(), error = %e, "Order event not queued for notification.");
    }
  }

  #[instrument(name = "service::checkout", skip_all, fields(user_id = %user_id))]
  pub async fn checkout(&self, user_id: UserId, request: CheckoutRequest) -> Result<Order> {
    let profile = self.profile(user_id).await?;
    if profile.phone.as_deref().map_or(true, |phone| phone.trim().is_empty()) {
      return Err(AppError::Validation(
        "A phone number is required before placing an order".to_string(),
      ));
    }
    let address = request.address.trim();
    if address.is_empty() {
      return Err(AppError::Validation("Delivery address is required".to_string()));
    }
    if request.items.is_empty() {
      return Err(AppError::Validation("Order must contain at least one item".to_string()));
    }

    // Repeated lines for the same flower collapse into one.
    let mut quantities: BTreeMap<i64, u32> = BTreeMap::new();
    for line in &request.items {
      if line.quantity == 0 {
        return Err(AppError::Validation(format!(
          "Quantity for flower {} must be positive",
          line.flower_id
        )));
      }
      let total = quantities.entry(line.flower_id.0).or_insert(0);
      *total = total
        .checked_add(line.quantity)
        .ok_or_else(|| AppError::Validation(format!("Quantity for flower {} is too large", line.flower_id)))?;
    }

    let mut lines = Vec::with_capacity(quantities.len());
    for (flower_id, quantity) in quantities {
      let flower = self
        .catalog
        .get(FlowerId(flower_id))
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown flower {}", flower_id)))?;
      lines.push((flower, quantity));
    }

    let order = self.orders.create(NewOrder::from_catalog(user_id, address, &lines)).await?;
    info!(order_id = %order.id, total_cents = order.total_price_cents, "Order created.");
    self.publish(order.id, OrderEvent::Created).await;
    Ok(order)
  }

  pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
    Ok(self.orders.list_for_user(user_id).await?)
  }

  #[instrument(name = "service::cancel_order", skip_all, fields(user_id = %user_id, order_id = %order_id))]
  pub async fn cancel_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
    let order = self.owned_order(user_id, order_id).await?;
    let old = order.status;
    if old.is_terminal() {
      return Err(AppError::Conflict(format!(
        "Order #{} is already {} and cannot be canceled",
        order_id,
        old.as_str()
      )));
    }

    let applied = self
      .orders
      .compare_and_set_status(order_id, &OrderStatus::TERMINAL, OrderStatus::Canceled)
      .await?;
    if !applied {
      return Err(AppError::Conflict(format!(
        "Order #{} was finalized before the cancel applied",
        order_id
      )));
    }
    info!("Order canceled from the web.");
    self
      .publish(order_id, OrderEvent::StatusChanged { old, new: OrderStatus::Canceled })
      .await;
    Ok(Order {
      status: OrderStatus::Canceled,
      ..order
    })
  }

  /// Moves a non-terminal order to `new_status`. Setting the current status again is a no-op.
  #[instrument(name = "service::admin_set_status", skip_all, fields(order_id = %order_id, new_status = %new_status))]
  pub async fn admin_set_status(&self, order_id: OrderId, new_status: OrderStatus) -> Result<Order> {
    let order = self
      .orders
      .get(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order #{} not found", order_id)))?;
    let old = order.status;
    if old == new_status {
      return Ok(order);
    }
    if old.is_terminal() {
      return Err(AppError::Conflict(format!(
        "Order #{} is already {}",
        order_id,
        old.as_str()
      )));
    }

    let applied = self
      .orders
      .compare_and_set_status(order_id, &OrderStatus::TERMINAL, new_status)
      .await?;
    if !applied {
      return Err(AppError::Conflict(format!(
        "Order #{} was finalized before the status change applied",
        order_id
      )));
    }
    info!(old_status = %old, "Order status changed by admin.");
    self
      .publish(order_id, OrderEvent::StatusChanged { old, new: new_status })
      .await;
    Ok(Order {
      status: new_status,
      ..order
    })
  }

  #[instrument(name = "service::update_profile", skip_all, fields(user_id = %user_id))]
  pub async fn update_profile(&self, user_id: UserId, mut update: ProfileUpdate) -> Result<UserProfile> {
    if let Some(name) = &update.full_name {
      if name.trim().is_empty() {
        return Err(AppError::Validation("Name must not be empty".to_string()));
      }
    }
    if let Some(raw) = update.phone.take() {
      let phone = normalize_phone(&raw);
      if phone.is_empty() {
        return Err(AppError::Validation("Phone must not be empty".to_string()));
      }
      if let Some(holder) = self.users.find_by_phone(&phone).await? {
        if holder.id != user_id {
          return Err(AppError::Conflict(format!("Phone {} belongs to another profile", phone)));
        }
      }
      update.phone = Some(phone);
    }

    let profile = self
      .users
      .update_profile(user_id, update)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
    if let Err(e) = self.publisher.profile_updated(user_id).await {
      warn!(error = %e, "Profile update not queued for notification.");
    }
    Ok(profile)
  }
}
