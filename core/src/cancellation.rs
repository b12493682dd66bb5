// florist_notify/src/cancellation.rs

//! Two-step cancellation dialog driven only by button payloads and the order's persisted status.
//!
//! No dialog state is kept on the server. Each press re-reads the store, and the only write is
//! the compare-and-set in `confirm_cancel`; message edits render whatever the store says after
//! that decision, never the other way around.
//!
//! Only the order owner's linked chat or an admin chat may drive the dialog. Presses from any
//! other chat get a generic error and touch neither the order nor the message.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::inbound::ButtonEvent;
use crate::model::{ChannelId, Order, OrderId, OrderStatus};
use crate::payload::{CallbackAction, CallbackPayload};
use crate::ports::{Clock, InlineKeyboard, NotificationGateway, NotificationLog, OrderStore, UserDirectory};
use crate::registry::{ButtonHandler, ButtonOutcome, ButtonRegistry};
use crate::render;

pub struct CancellationFlow {
  orders: Arc<dyn OrderStore>,
  users: Arc<dyn UserDirectory>,
  gateway: Arc<dyn NotificationGateway>,
  log: Arc<dyn NotificationLog>,
  clock: Arc<dyn Clock>,
  admin_channels: Vec<ChannelId>,
}

impl CancellationFlow {
  pub fn new(
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
    gateway: Arc<dyn NotificationGateway>,
    log: Arc<dyn NotificationLog>,
    clock: Arc<dyn Clock>,
    admin_channels: Vec<ChannelId>,
  ) -> Self {
    Self {
      orders,
      users,
      gateway,
      log,
      clock,
      admin_channels,
    }
  }

  /// Registers this flow for all three dialog actions.
  pub fn register(self: &Arc<Self>, registry: &ButtonRegistry) {
    for action in CallbackAction::ALL {
      registry.register(action, self.clone());
    }
  }

  #[instrument(name = "cancellation::request_cancel", skip_all, fields(order_id = %order_id))]
  pub async fn request_cancel(&self, order_id: OrderId, button: &ButtonEvent) -> ButtonOutcome {
    let order = match self.load_authorized(order_id, button).await {
      Ok(order) => order,
      Err(outcome) => return outcome,
    };

    if order.status.is_terminal() {
      self.edit(button, &render::final_summary(&order), None).await;
      self.answer(button, Some(render::FEEDBACK_CANNOT_CANCEL)).await;
      return ButtonOutcome::Final(order.status);
    }

    let keyboard = render::confirm_keyboard(order.id);
    self
      .edit(button, &render::confirmation_prompt(&order), Some(&keyboard))
      .await;
    self.answer(button, None).await;
    ButtonOutcome::Prompted
  }

  #[instrument(name = "cancellation::confirm_cancel", skip_all, fields(order_id = %order_id))]
  pub async fn confirm_cancel(&self, order_id: OrderId, button: &ButtonEvent) -> ButtonOutcome {
    if let Err(outcome) = self.load_authorized(order_id, button).await {
      return outcome;
    }

    // The status seen above may be stale by now; the guarded update is the only authority.
    let applied = match self
      .orders
      .compare_and_set_status(order_id, &OrderStatus::TERMINAL, OrderStatus::Canceled)
      .await
    {
      Ok(applied) => applied,
      Err(e) => {
        error!(error = %e, "Compare-and-set failed.");
        self.answer(button, Some(render::FEEDBACK_SOMETHING_WRONG)).await;
        return ButtonOutcome::Failed;
      }
    };

    let order = match self.load(order_id, button).await {
      Ok(order) => order,
      Err(outcome) => return outcome,
    };

    if applied {
      let text = render::canceled_summary(&order);
      self.edit(button, &text, None).await;
      if let Err(e) = self.log.append(Some(order.user_id), &text, self.clock.now()).await {
        warn!(error = %e, "Failed to append notification log entry.");
      }
      self.answer(button, Some(render::FEEDBACK_ORDER_CANCELED)).await;
      info!("Order canceled from the chat dialog.");
      ButtonOutcome::Canceled
    } else {
      // Someone else finalized the order between the two presses; show what the store holds now.
      info!(current_status = %order.status, "Cancellation lost to a concurrent transition.");
      self.edit(button, &render::final_summary(&order), None).await;
      self.answer(button, Some(render::FEEDBACK_CANNOT_CANCEL)).await;
      ButtonOutcome::Final(order.status)
    }
  }

  #[instrument(name = "cancellation::deny_cancel", skip_all, fields(order_id = %order_id))]
  pub async fn deny_cancel(&self, order_id: OrderId, button: &ButtonEvent) -> ButtonOutcome {
    let order = match self.load_authorized(order_id, button).await {
      Ok(order) => order,
      Err(outcome) => return outcome,
    };

    let outcome = if order.status.is_cancelable() {
      let keyboard = render::cancel_keyboard(order.id);
      self
        .edit(button, &render::order_summary(&order), Some(&keyboard))
        .await;
      ButtonOutcome::Restored
    } else {
      self.edit(button, &render::final_summary(&order), None).await;
      ButtonOutcome::Final(order.status)
    };
    self.answer(button, Some(render::FEEDBACK_CANCEL_DECLINED)).await;
    outcome
  }

  /// Reads the order, answering the event with a generic error when that is impossible.
  async fn load(&self, order_id: OrderId, button: &ButtonEvent) -> Result<Order, ButtonOutcome> {
    match self.orders.get(order_id).await {
      Ok(Some(order)) => Ok(order),
      Ok(None) => {
        warn!("Button refers to an unknown order.");
        self.answer(button, Some(render::FEEDBACK_SOMETHING_WRONG)).await;
        Err(ButtonOutcome::NotFound)
      }
      Err(e) => {
        error!(error = %e, "Failed to load order.");
        self.answer(button, Some(render::FEEDBACK_SOMETHING_WRONG)).await;
        Err(ButtonOutcome::Failed)
      }
    }
  }

  /// Like `load`, but also requires the press to come from the owner's chat or an admin chat.
  async fn load_authorized(&self, order_id: OrderId, button: &ButtonEvent) -> Result<Order, ButtonOutcome> {
    let order = self.load(order_id, button).await?;
    // Admin channels may be group chats, where `from` is the member rather than the group.
    if self.admin_channels.contains(&button.from) || self.admin_channels.contains(&button.message.channel_id) {
      return Ok(order);
    }
    match self.users.channel_id(order.user_id).await {
      Ok(Some(owner)) if owner == button.from => Ok(order),
      Ok(_) => {
        warn!(from = %button.from, user_id = %order.user_id, "Button pressed from a chat that does not own the order.");
        self.answer(button, Some(render::FEEDBACK_SOMETHING_WRONG)).await;
        Err(ButtonOutcome::Unauthorized)
      }
      Err(e) => {
        error!(error = %e, "Failed to resolve the order owner's channel.");
        self.answer(button, Some(render::FEEDBACK_SOMETHING_WRONG)).await;
        Err(ButtonOutcome::Failed)
      }
    }
  }

  async fn edit(&self, button: &ButtonEvent, text: &str, keyboard: Option<&InlineKeyboard>) {
    if let Err(e) = self.gateway.edit_message(&button.message, text, keyboard).await {
      warn!(message_id = button.message.message_id, error = %e, "Message edit failed.");
    }
  }

  async fn answer(&self, button: &ButtonEvent, feedback: Option<&str>) {
    if let Err(e) = self.gateway.answer_event(&button.event_id, feedback).await {
      warn!(event_id = %button.event_id.0, error = %e, "Answering button event failed.");
    }
  }
}

#[async_trait]
impl ButtonHandler for CancellationFlow {
  async fn handle(&self, payload: CallbackPayload, event: &ButtonEvent) -> ButtonOutcome {
    match payload.action {
      CallbackAction::RequestCancel => self.request_cancel(payload.order_id, event).await,
      CallbackAction::ConfirmCancel => self.confirm_cancel(payload.order_id, event).await,
      CallbackAction::DenyCancel => self.deny_cancel(payload.order_id, event).await,
    }
  }
}
