// florist_notify/src/ports/gateway.rs

//! The outbound messaging boundary and the value types that cross it.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::error::{NotifyError, NotifyResult};
use crate::model::ChannelId;

/// Handle to a message already delivered, used to edit it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
  pub channel_id: ChannelId,
  pub message_id: i64,
}

/// Id of an inbound button press; answering it clears the client's spinner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventId(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
  pub text: String,
  /// Round-trips verbatim through the gateway's opaque callback-data field.
  pub payload: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
  pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
  /// One button per row.
  pub fn single_column(buttons: Vec<InlineButton>) -> Self {
    Self {
      rows: buttons.into_iter().map(|button| vec![button]).collect(),
    }
  }

  pub fn payloads(&self) -> Vec<&str> {
    self.rows.iter().flatten().map(|button| button.payload.as_str()).collect()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMarkup {
  Inline(InlineKeyboard),
  /// One-time keyboard asking the client to share its phone number.
  RequestContact { label: String },
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
  async fn send_message(
    &self,
    channel_id: ChannelId,
    text: &str,
    markup: Option<&ReplyMarkup>,
  ) -> NotifyResult<MessageRef>;

  /// Replaces text and buttons of an existing message. `None` removes all buttons.
  async fn edit_message(&self, message: &MessageRef, text: &str, keyboard: Option<&InlineKeyboard>) -> NotifyResult<()>;

  async fn answer_event(&self, event_id: &EventId, feedback: Option<&str>) -> NotifyResult<()>;
}

/// Puts a deadline on every call of the wrapped gateway. An elapsed deadline becomes
/// `NotifyError::GatewayTimeout`; nothing is retried here.
pub struct TimeoutGateway {
  inner: Arc<dyn NotificationGateway>,
  timeout: Duration,
}

impl TimeoutGateway {
  pub fn new(inner: Arc<dyn NotificationGateway>, timeout: Duration) -> Self {
    Self { inner, timeout }
  }

  async fn bounded<T>(
    &self,
    operation: &'static str,
    fut: impl std::future::Future<Output = NotifyResult<T>> + Send,
  ) -> NotifyResult<T> {
    match tokio::time::timeout(self.timeout, fut).await {
      Ok(result) => result,
      Err(_) => {
        warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "Gateway call timed out.");
        Err(NotifyError::GatewayTimeout {
          operation,
          timeout: self.timeout,
        })
      }
    }
  }
}

#[async_trait]
impl NotificationGateway for TimeoutGateway {
  async fn send_message(
    &self,
    channel_id: ChannelId,
    text: &str,
    markup: Option<&ReplyMarkup>,
  ) -> NotifyResult<MessageRef> {
    self
      .bounded("send_message", self.inner.send_message(channel_id, text, markup))
      .await
  }

  async fn edit_message(&self, message: &MessageRef, text: &str, keyboard: Option<&InlineKeyboard>) -> NotifyResult<()> {
    self
      .bounded("edit_message", self.inner.edit_message(message, text, keyboard))
      .await
  }

  async fn answer_event(&self, event_id: &EventId, feedback: Option<&str>) -> NotifyResult<()> {
    self
      .bounded("answer_event", self.inner.answer_event(event_id, feedback))
      .await
  }
}
