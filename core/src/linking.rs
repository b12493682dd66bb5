// florist_notify/src/linking.rs

//! Chat commands that link a customer's chat to their shop profile, plus the admin overrides.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::error::NotifyResult;
use crate::inbound::TextEvent;
use crate::model::{normalize_phone, ChannelId, UserId};
use crate::ports::{NotificationGateway, ReplyMarkup, UserDirectory};
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
  ProfileShown,
  Linked(UserId),
  Unlinked(UserId),
  /// Unknown phone, unlinked chat, bad arguments or a non-admin caller; the user got an explanation.
  Rejected,
  /// Not a command this bot understands.
  Ignored,
  Failed,
}

pub struct LinkingCommands {
  users: Arc<dyn UserDirectory>,
  gateway: Arc<dyn NotificationGateway>,
  admin_channels: Vec<ChannelId>,
}

impl LinkingCommands {
  pub fn new(users: Arc<dyn UserDirectory>, gateway: Arc<dyn NotificationGateway>, admin_channels: Vec<ChannelId>) -> Self {
    Self {
      users,
      gateway,
      admin_channels,
    }
  }

  #[instrument(name = "linking::handle", skip_all, fields(chat = %event.chat))]
  pub async fn handle(&self, event: &TextEvent) -> CommandOutcome {
    let result = if let Some(phone) = event.contact_phone.as_deref() {
      self.link_by_contact(event, phone).await
    } else {
      let text = event.text.as_deref().unwrap_or_default();
      let args: Vec<&str> = text.split_whitespace().collect();
      // "/start@ShopBot" addresses the same command in group chats.
      let command = args.first().map(|c| c.split('@').next().unwrap_or(c)).unwrap_or_default();
      match command {
        "/start" => self.start(event).await,
        "/unlink" => self.unlink(event).await,
        "/admin_link" => self.admin_link(event, &args).await,
        "/admin_unlink" => self.admin_unlink(event, &args).await,
        _ => Ok(CommandOutcome::Ignored),
      }
    };

    match result {
      Ok(outcome) => outcome,
      Err(e) => {
        error!(error = %e, "Command failed.");
        self.reply(event, &format!("❌ Error: {}", e), None).await;
        CommandOutcome::Failed
      }
    }
  }

  async fn start(&self, event: &TextEvent) -> NotifyResult<CommandOutcome> {
    let text = match self.users.find_by_channel(event.from).await? {
      Some(profile) => render::start_linked(event.from, &profile),
      None => render::start_unlinked(event.from),
    };
    self
      .reply(event, &text, Some(&render::contact_request_markup()))
      .await;
    Ok(CommandOutcome::ProfileShown)
  }

  async fn link_by_contact(&self, event: &TextEvent, raw_phone: &str) -> NotifyResult<CommandOutcome> {
    let phone = normalize_phone(raw_phone);
    match self.users.find_by_phone(&phone).await? {
      Some(profile) => {
        self.attach(profile.id, event.from).await?;
        info!(user_id = %profile.id, "Chat linked by shared contact.");
        self
          .reply(event, "✅ Your chat has been linked to your account!", None)
          .await;
        Ok(CommandOutcome::Linked(profile.id))
      }
      None => {
        let text = format!(
          "❌ Error: no user with phone number {} was found. Please check the number.",
          render::escape_html(&phone)
        );
        self.reply(event, &text, None).await;
        Ok(CommandOutcome::Rejected)
      }
    }
  }

  async fn unlink(&self, event: &TextEvent) -> NotifyResult<CommandOutcome> {
    match self.users.find_by_channel(event.from).await? {
      Some(profile) => {
        self.users.set_channel(profile.id, None).await?;
        info!(user_id = %profile.id, "Chat unlinked by its owner.");
        self
          .reply(event, "✅ Your chat has been unlinked from your account.", None)
          .await;
        Ok(CommandOutcome::Unlinked(profile.id))
      }
      None => {
        self
          .reply(event, "❌ Error: your chat is not linked to an account.", None)
          .await;
        Ok(CommandOutcome::Rejected)
      }
    }
  }

  async fn admin_link(&self, event: &TextEvent, args: &[&str]) -> NotifyResult<CommandOutcome> {
    if !self.ensure_admin(event).await {
      return Ok(CommandOutcome::Rejected);
    }
    let [_, phone, channel] = args else {
      self
        .reply(event, "Usage: <code>/admin_link &lt;phone&gt; &lt;chat_id&gt;</code>", None)
        .await;
      return Ok(CommandOutcome::Rejected);
    };
    let Ok(channel_id) = channel.parse::<i64>().map(ChannelId) else {
      self.reply(event, "❌ Error: chat id must be a number.", None).await;
      return Ok(CommandOutcome::Rejected);
    };
    let phone = normalize_phone(phone);
    match self.users.find_by_phone(&phone).await? {
      Some(profile) => {
        self.attach(profile.id, channel_id).await?;
        info!(user_id = %profile.id, %channel_id, "Chat linked by an administrator.");
        let text = format!(
          "✅ Chat ID {} linked to user {}.",
          channel_id,
          render::escape_html(&phone)
        );
        self.reply(event, &text, None).await;
        Ok(CommandOutcome::Linked(profile.id))
      }
      None => {
        self
          .reply(event, "❌ Error: no user with this phone number was found.", None)
          .await;
        Ok(CommandOutcome::Rejected)
      }
    }
  }

  async fn admin_unlink(&self, event: &TextEvent, args: &[&str]) -> NotifyResult<CommandOutcome> {
    if !self.ensure_admin(event).await {
      return Ok(CommandOutcome::Rejected);
    }
    let [_, phone] = args else {
      self
        .reply(event, "Usage: <code>/admin_unlink &lt;phone&gt;</code>", None)
        .await;
      return Ok(CommandOutcome::Rejected);
    };
    let phone = normalize_phone(phone);
    match self.users.find_by_phone(&phone).await? {
      Some(profile) => {
        self.users.set_channel(profile.id, None).await?;
        info!(user_id = %profile.id, "Chat unlinked by an administrator.");
        let text = format!("✅ Chat unlinked from user {}.", render::escape_html(&phone));
        self.reply(event, &text, None).await;
        Ok(CommandOutcome::Unlinked(profile.id))
      }
      None => {
        self
          .reply(event, "❌ Error: no user with this phone number was found.", None)
          .await;
        Ok(CommandOutcome::Rejected)
      }
    }
  }

  /// A chat belongs to at most one profile; linking it elsewhere moves it.
  async fn attach(&self, user_id: UserId, channel_id: ChannelId) -> NotifyResult<()> {
    if let Some(holder) = self.users.find_by_channel(channel_id).await? {
      if holder.id != user_id {
        warn!(previous_user = %holder.id, %channel_id, "Chat was linked to another profile; moving it.");
        self.users.set_channel(holder.id, None).await?;
      }
    }
    self.users.set_channel(user_id, Some(channel_id)).await
  }

  async fn ensure_admin(&self, event: &TextEvent) -> bool {
    if self.admin_channels.contains(&event.from) {
      return true;
    }
    warn!(from = %event.from, "Admin command from a non-admin chat.");
    self
      .reply(event, "❌ You are not allowed to run this command.", None)
      .await;
    false
  }

  async fn reply(&self, event: &TextEvent, text: &str, markup: Option<&ReplyMarkup>) {
    if let Err(e) = self.gateway.send_message(event.chat, text, markup).await {
      warn!(chat = %event.chat, error = %e, "Reply failed.");
    }
  }
}
