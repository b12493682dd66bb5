// florist_notify/src/dispatcher.rs

//! Turns an order event into at most one outbound message: to the owner's linked channel, to the
//! audit log as a one-time fallback notice, or to every administrator channel.

use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{NotifyError, NotifyResult};
use crate::model::{ChannelId, Order, OrderEvent, OrderStatus, UserId, UserProfile};
use crate::ports::{Clock, MessageRef, NotificationGateway, NotificationLog, ReplyMarkup, UserDirectory};
use crate::render;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
  pub admin_channels: Vec<ChannelId>,
  pub shop_name: String,
}

impl Default for DispatcherConfig {
  fn default() -> Self {
    Self {
      admin_channels: Vec::new(),
      shop_name: "Flower Shop".to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAlert {
  /// The order's owner could not be resolved.
  MissingUser,
  /// Overdue order whose owner has no linked channel.
  UnlinkedOverdue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
  SentToUser(MessageRef),
  FallbackRecorded,
  /// The sticky flag was already set; nothing was done.
  FallbackAlreadyRecorded,
  AdminsNotified { alert: AdminAlert, delivered: usize, failed: usize },
  /// The event does not produce a message (e.g. creation in a status other than awaiting payment).
  Skipped,
}

pub struct NotificationDispatcher {
  users: Arc<dyn UserDirectory>,
  gateway: Arc<dyn NotificationGateway>,
  log: Arc<dyn NotificationLog>,
  clock: Arc<dyn Clock>,
  config: DispatcherConfig,
}

impl NotificationDispatcher {
  pub fn new(
    users: Arc<dyn UserDirectory>,
    gateway: Arc<dyn NotificationGateway>,
    log: Arc<dyn NotificationLog>,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
  ) -> Self {
    Self {
      users,
      gateway,
      log,
      clock,
      config,
    }
  }

  pub fn admin_channels(&self) -> &[ChannelId] {
    &self.config.admin_channels
  }

  /// Routes one order event. A failed send to the user is returned as an error after being
  /// logged; admin fan-out failures are counted per recipient and never abort the fan-out.
  #[instrument(name = "dispatcher::notify", skip_all, fields(order_id = %order.id, event = event.name()))]
  pub async fn notify(&self, order: &Order, event: OrderEvent) -> NotifyResult<DispatchOutcome> {
    let profile = match self.users.get(order.user_id).await? {
      Some(profile) => profile,
      None => {
        error!(user_id = %order.user_id, "Order references a user that cannot be resolved.");
        let (delivered, failed) = self.notify_admins(&render::admin_missing_user(order.id)).await;
        return Ok(DispatchOutcome::AdminsNotified {
          alert: AdminAlert::MissingUser,
          delivered,
          failed,
        });
      }
    };

    match (event, profile.channel_id) {
      (OrderEvent::Reminder, _) => self.remind(order, &profile).await,
      (_, None) => self.record_fallback(&profile).await,
      (OrderEvent::Created, Some(channel_id)) if order.status == OrderStatus::AwaitingPayment => {
        let markup = ReplyMarkup::Inline(render::cancel_keyboard(order.id));
        self
          .send_to_user(profile.id, channel_id, &render::order_summary(order), Some(&markup))
          .await
      }
      (OrderEvent::Created, Some(_)) => {
        debug!(status = %order.status, "Order created outside awaiting_payment; no creation message.");
        Ok(DispatchOutcome::Skipped)
      }
      (OrderEvent::StatusChanged { old, new }, Some(channel_id)) => {
        // Buttons are only ever re-attached by the cancellation dialog's own edits.
        debug!(%old, %new, terminal = new.is_terminal(), "Sending status change.");
        let text = render::status_changed(order.id, new, &self.config.shop_name);
        self.send_to_user(profile.id, channel_id, &text, None).await
      }
    }
  }

  /// Profile edits are echoed to a linked user; unlinked users get nothing.
  #[instrument(name = "dispatcher::notify_profile_updated", skip_all, fields(user_id = %user_id))]
  pub async fn notify_profile_updated(&self, user_id: UserId) -> NotifyResult<DispatchOutcome> {
    let profile = self
      .users
      .get(user_id)
      .await?
      .ok_or_else(|| NotifyError::NotFound(format!("user {}", user_id)))?;
    match profile.channel_id {
      Some(channel_id) => {
        self
          .send_to_user(profile.id, channel_id, &render::profile_updated(&profile), None)
          .await
      }
      None => Ok(DispatchOutcome::Skipped),
    }
  }

  async fn remind(&self, order: &Order, profile: &UserProfile) -> NotifyResult<DispatchOutcome> {
    match profile.channel_id {
      Some(channel_id) => {
        self
          .send_to_user(profile.id, channel_id, &render::payment_reminder(order.id), None)
          .await
      }
      None => {
        let (delivered, failed) = self
          .notify_admins(&render::admin_unlinked_overdue(order.id, profile))
          .await;
        info!(delivered, failed, "Owner has no linked chat; administrators notified.");
        Ok(DispatchOutcome::AdminsNotified {
          alert: AdminAlert::UnlinkedOverdue,
          delivered,
          failed,
        })
      }
    }
  }

  async fn record_fallback(&self, profile: &UserProfile) -> NotifyResult<DispatchOutcome> {
    if !self.users.set_fallback_notified(profile.id).await? {
      debug!(user_id = %profile.id, "Fallback notice already recorded.");
      return Ok(DispatchOutcome::FallbackAlreadyRecorded);
    }
    let message = render::fallback_notice(profile.phone.as_deref());
    self.log.append(Some(profile.id), &message, self.clock.now()).await?;
    info!(user_id = %profile.id, "User has no linked chat; fallback notice recorded.");
    Ok(DispatchOutcome::FallbackRecorded)
  }

  async fn send_to_user(
    &self,
    user_id: UserId,
    channel_id: ChannelId,
    text: &str,
    markup: Option<&ReplyMarkup>,
  ) -> NotifyResult<DispatchOutcome> {
    let message = match self.gateway.send_message(channel_id, text, markup).await {
      Ok(message) => message,
      Err(e) => {
        warn!(%channel_id, error = %e, "Send to user failed.");
        return Err(e);
      }
    };
    info!(%channel_id, message_id = message.message_id, "Message sent to user.");
    // The message is already out; a failed audit write must not turn into a resend.
    if let Err(e) = self.log.append(Some(user_id), text, self.clock.now()).await {
      warn!(%user_id, error = %e, "Failed to append notification log entry.");
    }
    Ok(DispatchOutcome::SentToUser(message))
  }

  /// Sends to every administrator channel concurrently. Returns `(delivered, failed)`.
  pub async fn notify_admins(&self, text: &str) -> (usize, usize) {
    if self.config.admin_channels.is_empty() {
      warn!("No administrator channels configured; alert dropped.");
      return (0, 0);
    }
    let sends = self
      .config
      .admin_channels
      .iter()
      .map(|admin| async move { (*admin, self.gateway.send_message(*admin, text, None).await) });
    let mut delivered = 0;
    let mut failed = 0;
    for (admin, result) in join_all(sends).await {
      match result {
        Ok(_) => delivered += 1,
        Err(e) => {
          failed += 1;
          warn!(admin_channel = %admin, error = %e, "Send to administrator failed.");
        }
      }
    }
    (delivered, failed)
  }
}
