// florist_notify/src/registry.rs

//! Defines `ButtonRegistry`, an action-keyed registry of button handlers. The scheduler owns one
//! and routes every decoded button payload through it.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};

use crate::inbound::ButtonEvent;
use crate::model::OrderStatus;
use crate::payload::{CallbackAction, CallbackPayload};

/// What a button handler did, as rendered back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonOutcome {
  /// Confirmation prompt shown; nothing changed.
  Prompted,
  /// The compare-and-set applied and the order is now canceled.
  Canceled,
  /// The order is terminal; the message now shows its actual status without buttons.
  Final(OrderStatus),
  /// Cancellation declined and the single cancel button restored.
  Restored,
  NotFound,
  /// Pressed from a chat that is neither the owner's nor an admin's; nothing changed.
  Unauthorized,
  /// A store failure prevented a decision; the user got a generic error.
  Failed,
  /// Undecodable payload or no handler for the action.
  Ignored,
}

#[async_trait]
pub trait ButtonHandler: Send + Sync {
  async fn handle(&self, payload: CallbackPayload, event: &ButtonEvent) -> ButtonOutcome;
}

#[derive(Default)]
pub struct ButtonRegistry {
  handlers: RwLock<HashMap<CallbackAction, Arc<dyn ButtonHandler>>>,
}

impl ButtonRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `handler` for `action`, replacing any previous registration.
  pub fn register(&self, action: CallbackAction, handler: Arc<dyn ButtonHandler>) {
    event!(Level::DEBUG, %action, "Registering button handler.");
    if self.handlers.write().insert(action, handler).is_some() {
      event!(Level::WARN, %action, "Replaced an existing button handler.");
    }
  }

  pub fn handler_for(&self, action: CallbackAction) -> Option<Arc<dyn ButtonHandler>> {
    self.handlers.read().get(&action).cloned()
  }

  pub fn is_registered(&self, action: CallbackAction) -> bool {
    self.handlers.read().contains_key(&action)
  }

  /// Runs the handler registered for the payload's action. `None` when nothing is registered.
  pub async fn dispatch(&self, payload: CallbackPayload, button: &ButtonEvent) -> Option<ButtonOutcome> {
    // Clone the Arc out so the lock is not held across the await.
    let handler = self.handler_for(payload.action)?;
    event!(Level::TRACE, action = %payload.action, order_id = %payload.order_id, "Dispatching button event.");
    Some(handler.handle(payload, button).await)
  }
}
