// florist_notify/src/memory/gateway.rs

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use crate::error::{NotifyError, NotifyResult};
use crate::model::ChannelId;
use crate::ports::{EventId, InlineKeyboard, MessageRef, NotificationGateway, ReplyMarkup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
  pub message: MessageRef,
  pub text: String,
  pub markup: Option<ReplyMarkup>,
}

impl SentMessage {
  pub fn channel_id(&self) -> ChannelId {
    self.message.channel_id
  }

  /// Callback payloads of the attached inline keyboard, if any.
  pub fn payloads(&self) -> Vec<String> {
    match &self.markup {
      Some(ReplyMarkup::Inline(keyboard)) => keyboard.payloads().into_iter().map(str::to_string).collect(),
      _ => Vec::new(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedMessage {
  pub message: MessageRef,
  pub text: String,
  pub keyboard: Option<InlineKeyboard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredEvent {
  pub event_id: EventId,
  pub feedback: Option<String>,
}

/// Records every call instead of talking to a network. Failures can be injected per channel or
/// for every call, and an artificial delay makes timeout paths reachable.
pub struct RecordingGateway {
  sent: Mutex<Vec<SentMessage>>,
  edits: Mutex<Vec<EditedMessage>>,
  answers: Mutex<Vec<AnsweredEvent>>,
  next_message_id: AtomicI64,
  failing_channels: Mutex<HashSet<ChannelId>>,
  fail_all: AtomicBool,
  delay: Mutex<Option<Duration>>,
}

impl Default for RecordingGateway {
  fn default() -> Self {
    Self {
      sent: Mutex::new(Vec::new()),
      edits: Mutex::new(Vec::new()),
      answers: Mutex::new(Vec::new()),
      next_message_id: AtomicI64::new(1),
      failing_channels: Mutex::new(HashSet::new()),
      fail_all: AtomicBool::new(false),
      delay: Mutex::new(None),
    }
  }
}

impl RecordingGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn sent(&self) -> Vec<SentMessage> {
    self.sent.lock().clone()
  }

  pub fn sent_to(&self, channel_id: ChannelId) -> Vec<SentMessage> {
    self
      .sent
      .lock()
      .iter()
      .filter(|sent| sent.message.channel_id == channel_id)
      .cloned()
      .collect()
  }

  pub fn edits(&self) -> Vec<EditedMessage> {
    self.edits.lock().clone()
  }

  pub fn answers(&self) -> Vec<AnsweredEvent> {
    self.answers.lock().clone()
  }

  pub fn clear(&self) {
    self.sent.lock().clear();
    self.edits.lock().clear();
    self.answers.lock().clear();
  }

  pub fn fail_channel(&self, channel_id: ChannelId) {
    self.failing_channels.lock().insert(channel_id);
  }

  pub fn fail_all(&self, fail: bool) {
    self.fail_all.store(fail, Ordering::SeqCst);
  }

  pub fn set_delay(&self, delay: Option<Duration>) {
    *self.delay.lock() = delay;
  }

  async fn before_call(&self, operation: &'static str, channel_id: Option<ChannelId>) -> NotifyResult<()> {
    let delay = *self.delay.lock();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    let channel_failing = channel_id.is_some_and(|channel_id| self.failing_channels.lock().contains(&channel_id));
    if self.fail_all.load(Ordering::SeqCst) || channel_failing {
      return Err(NotifyError::gateway(operation, anyhow!("injected gateway failure")));
    }
    Ok(())
  }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
  async fn send_message(
    &self,
    channel_id: ChannelId,
    text: &str,
    markup: Option<&ReplyMarkup>,
  ) -> NotifyResult<MessageRef> {
    self.before_call("send_message", Some(channel_id)).await?;
    let message = MessageRef {
      channel_id,
      message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
    };
    self.sent.lock().push(SentMessage {
      message,
      text: text.to_string(),
      markup: markup.cloned(),
    });
    Ok(message)
  }

  async fn edit_message(&self, message: &MessageRef, text: &str, keyboard: Option<&InlineKeyboard>) -> NotifyResult<()> {
    self.before_call("edit_message", Some(message.channel_id)).await?;
    self.edits.lock().push(EditedMessage {
      message: *message,
      text: text.to_string(),
      keyboard: keyboard.cloned(),
    });
    Ok(())
  }

  async fn answer_event(&self, event_id: &EventId, feedback: Option<&str>) -> NotifyResult<()> {
    self.before_call("answer_event", None).await?;
    self.answers.lock().push(AnsweredEvent {
      event_id: event_id.clone(),
      feedback: feedback.map(str::to_string),
    });
    Ok(())
  }
}
