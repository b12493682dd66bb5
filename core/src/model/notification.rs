// florist_notify/src/model/notification.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::order::OrderStatus;
use super::user::UserId;

/// Append-only audit row. Written once, never updated or deleted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationLogEntry {
  pub user_id: Option<UserId>,
  pub message: String,
  pub created_at: DateTime<Utc>,
}

/// What happened to an order, as far as the notification channel cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
  Created,
  StatusChanged { old: OrderStatus, new: OrderStatus },
  Reminder,
}

impl OrderEvent {
  pub fn name(&self) -> &'static str {
    match self {
      OrderEvent::Created => "created",
      OrderEvent::StatusChanged { .. } => "status_changed",
      OrderEvent::Reminder => "reminder",
    }
  }
}
