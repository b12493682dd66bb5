// florist_notify/src/ports/mod.rs

//! Collaborators this crate consumes but does not own. Production adapters live in the
//! application crate; `crate::memory` has in-process ones.

pub mod gateway;
pub mod store;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NotifyResult;
use crate::model::UserId;

pub use gateway::{EventId, InlineButton, InlineKeyboard, MessageRef, NotificationGateway, ReplyMarkup, TimeoutGateway};
pub use store::{FlowerCatalog, OrderStore};
pub use users::UserDirectory;

/// Answers whether the shop is staffed right now.
pub trait WorkingHoursCalendar: Send + Sync {
  fn is_open_now(&self) -> bool;
}

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Append-only audit sink.
#[async_trait]
pub trait NotificationLog: Send + Sync {
  async fn append(&self, user_id: Option<UserId>, message: &str, created_at: DateTime<Utc>) -> NotifyResult<()>;
}
