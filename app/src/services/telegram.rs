// florist_shop/src/services/telegram.rs

//! Telegram Bot API client: the production `NotificationGateway` plus long-polling for updates.

use anyhow::anyhow;
use async_trait::async_trait;
use florist_notify::ports::{EventId, InlineKeyboard, MessageRef, ReplyMarkup};
use florist_notify::{ButtonEvent, ChannelId, InboundEvent, NotificationGateway, NotifyError, NotifyResult, TextEvent};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
  ok: bool,
  result: Option<T>,
  description: Option<String>,
  error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
  pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
  pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
  pub phone_number: String,
  pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
  pub message_id: i64,
  pub chat: Chat,
  pub from: Option<TgUser>,
  pub text: Option<String>,
  pub contact: Option<Contact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
  pub id: String,
  pub from: TgUser,
  pub message: Option<TgMessage>,
  pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
  pub update_id: i64,
  pub message: Option<TgMessage>,
  pub callback_query: Option<CallbackQuery>,
}

impl Update {
  /// Maps an update to the scheduler's event type. Updates the bot has no use for yield `None`.
  /// A callback without its message still becomes an event so the client gets an answer.
  pub fn into_inbound(self) -> Option<InboundEvent> {
    if let Some(query) = self.callback_query {
      let Some(message) = query.message else {
        return Some(InboundEvent::DetachedButton {
          event_id: EventId(query.id),
        });
      };
      return Some(InboundEvent::Button(ButtonEvent {
        event_id: EventId(query.id),
        message: MessageRef {
          channel_id: ChannelId(message.chat.id),
          message_id: message.message_id,
        },
        from: ChannelId(query.from.id),
        payload: query.data.unwrap_or_default(),
      }));
    }

    let message = self.message?;
    let from = message.from.as_ref().map(|user| user.id).unwrap_or(message.chat.id);
    // Only a contact the sender shared about themselves may link their chat.
    let contact_phone = message
      .contact
      .filter(|contact| contact.user_id == Some(from))
      .map(|contact| contact.phone_number);
    if message.text.is_none() && contact_phone.is_none() {
      return None;
    }
    Some(InboundEvent::Text(TextEvent {
      chat: ChannelId(message.chat.id),
      from: ChannelId(from),
      text: message.text,
      contact_phone,
    }))
  }
}

#[derive(Clone)]
pub struct TelegramGateway {
  client: Client,
  base_url: String,
}

impl TelegramGateway {
  pub fn new(api_url: &str, token: &str) -> Self {
    Self {
      client: Client::new(),
      base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
    }
  }

  async fn call<T: DeserializeOwned>(
    &self,
    operation: &'static str,
    method: &str,
    body: &Value,
    timeout: Option<Duration>,
  ) -> NotifyResult<T> {
    let mut request = self.client.post(format!("{}/{}", self.base_url, method)).json(body);
    if let Some(timeout) = timeout {
      request = request.timeout(timeout);
    }
    let response = request.send().await.map_err(|e| NotifyError::gateway(operation, e))?;
    let status = response.status();
    let parsed: ApiResponse<T> = response
      .json()
      .await
      .map_err(|e| NotifyError::gateway(operation, anyhow!("unreadable response (HTTP {}): {}", status, e)))?;

    match (parsed.ok, parsed.result) {
      (true, Some(result)) => Ok(result),
      _ => Err(NotifyError::gateway(
        operation,
        anyhow!(
          "Bot API error {}: {}",
          parsed.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
          parsed.description.unwrap_or_else(|| "no description".to_string())
        ),
      )),
    }
  }

  /// Long-polls for updates after `offset`. The HTTP deadline is padded past the poll timeout.
  #[instrument(name = "telegram::get_updates", skip(self))]
  pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> NotifyResult<Vec<Update>> {
    let body = json!({
      "offset": offset,
      "timeout": timeout_secs,
      "allowed_updates": ["message", "callback_query"],
    });
    self
      .call(
        "get_updates",
        "getUpdates",
        &body,
        Some(Duration::from_secs(timeout_secs + 10)),
      )
      .await
  }
}

pub(crate) fn inline_keyboard_json(keyboard: &InlineKeyboard) -> Value {
  let rows: Vec<Vec<Value>> = keyboard
    .rows
    .iter()
    .map(|row| {
      row
        .iter()
        .map(|button| json!({"text": button.text, "callback_data": button.payload}))
        .collect()
    })
    .collect();
  json!({ "inline_keyboard": rows })
}

pub(crate) fn reply_markup_json(markup: &ReplyMarkup) -> Value {
  match markup {
    ReplyMarkup::Inline(keyboard) => inline_keyboard_json(keyboard),
    ReplyMarkup::RequestContact { label } => json!({
      "keyboard": [[{"text": label, "request_contact": true}]],
      "one_time_keyboard": true,
      "resize_keyboard": true,
    }),
  }
}

#[async_trait]
impl NotificationGateway for TelegramGateway {
  #[instrument(name = "telegram::send_message", skip_all, fields(channel_id = %channel_id))]
  async fn send_message(
    &self,
    channel_id: ChannelId,
    text: &str,
    markup: Option<&ReplyMarkup>,
  ) -> NotifyResult<MessageRef> {
    let mut body = json!({
      "chat_id": channel_id.0,
      "text": text,
      "parse_mode": "HTML",
    });
    if let Some(markup) = markup {
      body["reply_markup"] = reply_markup_json(markup);
    }
    let message: TgMessage = self.call("send_message", "sendMessage", &body, None).await?;
    Ok(MessageRef {
      channel_id: ChannelId(message.chat.id),
      message_id: message.message_id,
    })
  }

  #[instrument(name = "telegram::edit_message", skip_all, fields(channel_id = %message.channel_id, message_id = message.message_id))]
  async fn edit_message(&self, message: &MessageRef, text: &str, keyboard: Option<&InlineKeyboard>) -> NotifyResult<()> {
    let body = json!({
      "chat_id": message.channel_id.0,
      "message_id": message.message_id,
      "text": text,
      "parse_mode": "HTML",
      "reply_markup": inline_keyboard_json(&keyboard.cloned().unwrap_or_default()),
    });
    // editMessageText returns the edited message, or `true` for inline messages.
    match self.call::<Value>("edit_message", "editMessageText", &body, None).await {
      Ok(_) => Ok(()),
      Err(e) if e.to_string().contains("message is not modified") => {
        debug!("Edit was a no-op; message already shows this content.");
        Ok(())
      }
      Err(e) => Err(e),
    }
  }

  #[instrument(name = "telegram::answer_event", skip_all, fields(event_id = %event_id.0))]
  async fn answer_event(&self, event_id: &EventId, feedback: Option<&str>) -> NotifyResult<()> {
    let mut body = json!({ "callback_query_id": event_id.0 });
    if let Some(feedback) = feedback {
      body["text"] = json!(feedback);
    }
    let answered: bool = self
      .call("answer_event", "answerCallbackQuery", &body, None)
      .await?;
    if !answered {
      warn!("answerCallbackQuery returned false.");
    }
    Ok(())
  }
}
