// florist_notify/src/payload.rs

//! Button payload codec. The payload is the only carrier of cancellation-dialog state: an action
//! tag and the order id, as `"{action}_{order_id}"`.

use std::fmt;
use std::str::FromStr;

use crate::error::NotifyError;
use crate::model::OrderId;

/// Upper bound imposed by the gateway's callback-data field.
pub const MAX_PAYLOAD_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackAction {
  RequestCancel,
  ConfirmCancel,
  DenyCancel,
}

impl CallbackAction {
  pub const ALL: [CallbackAction; 3] = [
    CallbackAction::RequestCancel,
    CallbackAction::ConfirmCancel,
    CallbackAction::DenyCancel,
  ];

  pub fn wire_tag(self) -> &'static str {
    match self {
      CallbackAction::RequestCancel => "cancel_order",
      CallbackAction::ConfirmCancel => "confirm_cancel",
      CallbackAction::DenyCancel => "cancel_no",
    }
  }

  fn from_wire_tag(tag: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|action| action.wire_tag() == tag)
  }
}

impl fmt::Display for CallbackAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.wire_tag())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackPayload {
  pub action: CallbackAction,
  pub order_id: OrderId,
}

impl CallbackPayload {
  pub fn new(action: CallbackAction, order_id: OrderId) -> Self {
    Self { action, order_id }
  }

  pub fn encode(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for CallbackPayload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}_{}", self.action.wire_tag(), self.order_id)
  }
}

impl FromStr for CallbackPayload {
  type Err = NotifyError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    let invalid = |reason: &str| NotifyError::InvalidPayload {
      payload: raw.to_string(),
      reason: reason.to_string(),
    };

    if raw.len() > MAX_PAYLOAD_LEN {
      return Err(invalid("payload exceeds callback-data limit"));
    }
    let (tag, id) = raw.rsplit_once('_').ok_or_else(|| invalid("missing order id separator"))?;
    let action = CallbackAction::from_wire_tag(tag).ok_or_else(|| invalid("unknown action"))?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid("order id is not a decimal number"));
    }
    let order_id = id.parse::<OrderId>().map_err(|_| invalid("order id out of range"))?;
    Ok(CallbackPayload { action, order_id })
  }
}
