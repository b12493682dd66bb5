// florist_notify/src/inbound.rs

//! Everything that can arrive on the scheduler's queue.

use crate::model::{ChannelId, OrderEvent, OrderId, UserId};
use crate::ports::{EventId, MessageRef};

/// A button press in the messaging client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEvent {
  pub event_id: EventId,
  /// The message carrying the pressed button; edits target it.
  pub message: MessageRef,
  pub from: ChannelId,
  pub payload: String,
}

/// A text message or a shared contact sent to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEvent {
  pub chat: ChannelId,
  pub from: ChannelId,
  pub text: Option<String>,
  pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
  Button(ButtonEvent),
  /// A press whose message the client no longer provides. It can only be answered.
  DetachedButton { event_id: EventId },
  Text(TextEvent),
  /// Published by the web path after it changed the store.
  Order { order_id: OrderId, event: OrderEvent },
  ProfileUpdated { user_id: UserId },
}

impl InboundEvent {
  pub fn kind(&self) -> &'static str {
    match self {
      InboundEvent::Button(_) => "button",
      InboundEvent::DetachedButton { .. } => "detached_button",
      InboundEvent::Text(_) => "text",
      InboundEvent::Order { .. } => "order",
      InboundEvent::ProfileUpdated { .. } => "profile_updated",
    }
  }
}
