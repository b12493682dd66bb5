// florist_notify/src/model/order.rs

//! Orders, their line items and the closed status lifecycle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for OrderId {
  type Err = std::num::ParseIntError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.parse::<i64>().map(OrderId)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowerId(pub i64);

impl fmt::Display for FlowerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  AwaitingPayment,
  Pending,
  Processing,
  Shipped,
  Delivered,
  Canceled,
}

impl OrderStatus {
  /// Statuses that admit no further transition from any path.
  pub const TERMINAL: [OrderStatus; 3] = [OrderStatus::Shipped, OrderStatus::Delivered, OrderStatus::Canceled];

  pub const ALL: [OrderStatus; 6] = [
    OrderStatus::AwaitingPayment,
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Canceled,
  ];

  pub fn is_terminal(self) -> bool {
    Self::TERMINAL.contains(&self)
  }

  pub fn is_cancelable(self) -> bool {
    !self.is_terminal()
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::AwaitingPayment => "awaiting_payment",
      OrderStatus::Pending => "pending",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Canceled => "canceled",
    }
  }

  /// Human-readable label used in chat messages.
  pub fn label(self) -> &'static str {
    match self {
      OrderStatus::AwaitingPayment => "Awaiting payment",
      OrderStatus::Pending => "Pending",
      OrderStatus::Processing => "Processing",
      OrderStatus::Shipped => "Shipped",
      OrderStatus::Delivered => "Delivered",
      OrderStatus::Canceled => "Canceled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown order status '{}'", self.0)
  }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for OrderStatus {
  type Err = UnknownStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .iter()
      .copied()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| UnknownStatus(s.to_string()))
  }
}

/// A line of an order. Price is the unit price snapshot taken at checkout and is never recomputed
/// from the current catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
  pub flower_id: FlowerId,
  pub flower_name: String,
  pub quantity: u32,
  pub price_cents: i64,
  pub subtotal_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
  pub id: OrderId,
  pub user_id: UserId,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub total_price_cents: i64,
  pub address: Option<String>,
  pub items: Vec<OrderItem>,
}

impl Order {
  /// Only orders still awaiting payment can be overdue; the deadline itself is exclusive.
  pub fn is_payment_overdue(&self, now: DateTime<Utc>, overdue_after: Duration) -> bool {
    self.status == OrderStatus::AwaitingPayment && now > self.created_at + overdue_after
  }
}

/// Catalog entry as seen at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flower {
  pub id: FlowerId,
  pub name: String,
  pub price_cents: i64,
}

/// Everything needed to persist a fresh order. Built from catalog prices so the snapshot and
/// totals are computed once, here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
  pub user_id: UserId,
  pub address: String,
  pub total_price_cents: i64,
  pub items: Vec<OrderItem>,
}

impl NewOrder {
  pub fn from_catalog(user_id: UserId, address: impl Into<String>, lines: &[(Flower, u32)]) -> Self {
    let items: Vec<OrderItem> = lines
      .iter()
      .map(|(flower, quantity)| OrderItem {
        flower_id: flower.id,
        flower_name: flower.name.clone(),
        quantity: *quantity,
        price_cents: flower.price_cents,
        subtotal_cents: flower.price_cents * i64::from(*quantity),
      })
      .collect();
    let total_price_cents = items.iter().map(|item| item.subtotal_cents).sum();
    Self {
      user_id,
      address: address.into(),
      total_price_cents,
      items,
    }
  }
}

/// Renders minor units as `R.KK`.
pub fn format_money(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
