// florist_notify/src/render.rs

//! Message texts and keyboards. Output is HTML-mode safe: everything user-supplied is escaped.

use crate::model::{format_money, ChannelId, Order, OrderId, OrderStatus, UserProfile};
use crate::payload::{CallbackAction, CallbackPayload};
use crate::ports::{InlineButton, InlineKeyboard, ReplyMarkup};

pub const FEEDBACK_CANNOT_CANCEL: &str = "❌ Cannot cancel the order: it is already shipped, delivered or canceled.";
pub const FEEDBACK_ORDER_CANCELED: &str = "Order canceled.";
pub const FEEDBACK_CANCEL_DECLINED: &str = "Order cancellation declined.";
pub const FEEDBACK_SOMETHING_WRONG: &str = "Something went wrong. Please try again later.";

pub fn escape_html(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      _ => out.push(c),
    }
  }
  out
}

pub fn order_summary(order: &Order) -> String {
  let items = order
    .items
    .iter()
    .map(|item| {
      format!(
        "{} x {} - {}",
        escape_html(&item.flower_name),
        item.quantity,
        format_money(item.subtotal_cents)
      )
    })
    .collect::<Vec<_>>()
    .join("\n");
  let address = order
    .address
    .as_deref()
    .filter(|a| !a.trim().is_empty())
    .map(escape_html)
    .unwrap_or_else(|| "not specified".to_string());
  format!(
    "Order #{}\nStatus: {}\nItems:\n{}\nTotal: {}\nDelivery address: {}",
    order.id,
    order.status.label(),
    items,
    format_money(order.total_price_cents),
    address
  )
}

pub fn cancel_keyboard(order_id: OrderId) -> InlineKeyboard {
  InlineKeyboard::single_column(vec![InlineButton {
    text: "Cancel order".to_string(),
    payload: CallbackPayload::new(CallbackAction::RequestCancel, order_id).encode(),
  }])
}

pub fn confirm_keyboard(order_id: OrderId) -> InlineKeyboard {
  InlineKeyboard::single_column(vec![
    InlineButton {
      text: "Yes, cancel".to_string(),
      payload: CallbackPayload::new(CallbackAction::ConfirmCancel, order_id).encode(),
    },
    InlineButton {
      text: "No".to_string(),
      payload: CallbackPayload::new(CallbackAction::DenyCancel, order_id).encode(),
    },
  ])
}

pub fn confirmation_prompt(order: &Order) -> String {
  format!(
    "Are you sure you want to cancel order #{}?\n\n{}",
    order.id,
    order_summary(order)
  )
}

pub fn final_summary(order: &Order) -> String {
  format!("❌ Order #{}:\n\n{}", order.id, order_summary(order))
}

pub fn canceled_summary(order: &Order) -> String {
  format!("❌ Order #{} canceled.\n\n{}", order.id, order_summary(order))
}

pub fn status_changed(order_id: OrderId, new_status: OrderStatus, shop_name: &str) -> String {
  match new_status {
    OrderStatus::Delivered => format!(
      "Your order #{} has been delivered!\nThank you for choosing us! We look forward to seeing you again at {} 🌸",
      order_id,
      escape_html(shop_name)
    ),
    other => format!("The status of your order #{} changed to: {}", order_id, other.label()),
  }
}

pub fn payment_reminder(order_id: OrderId) -> String {
  format!("⚠️ Your order #{} is awaiting payment! Please pay for it.", order_id)
}

pub fn admin_unlinked_overdue(order_id: OrderId, profile: &UserProfile) -> String {
  format!(
    "⚠️ Order #{} is overdue, but user {} (phone: {}) has no linked chat.",
    order_id,
    escape_html(&profile.full_name),
    escape_html(profile.phone.as_deref().unwrap_or("not specified"))
  )
}

pub fn admin_missing_user(order_id: OrderId) -> String {
  format!("⚠️ Order #{} skipped: the owning user is missing.", order_id)
}

pub fn fallback_notice(phone: Option<&str>) -> String {
  format!(
    "Please contact the bot using phone number {} and send the /start command.",
    phone.unwrap_or("from your profile")
  )
}

pub fn profile_updated(profile: &UserProfile) -> String {
  format!(
    "Your profile has been updated.\nFull name: {}\nPhone: {}\nAddress: {}",
    escape_html(&profile.full_name),
    escape_html(profile.phone.as_deref().unwrap_or("not specified")),
    escape_html(profile.address.as_deref().unwrap_or("not specified"))
  )
}

pub fn contact_request_markup() -> ReplyMarkup {
  ReplyMarkup::RequestContact {
    label: "📞 Share phone number".to_string(),
  }
}

pub fn start_linked(channel_id: ChannelId, profile: &UserProfile) -> String {
  format!(
    "👤 <b>Your profile</b>\n📍 Chat ID: <code>{}</code>\n👤 Name: {}\n📞 Phone: {}\n📍 Address: {}",
    channel_id,
    escape_html(&profile.full_name),
    escape_html(profile.phone.as_deref().unwrap_or("not specified")),
    escape_html(profile.address.as_deref().unwrap_or("not specified"))
  )
}

pub fn start_unlinked(channel_id: ChannelId) -> String {
  format!(
    "⚠️ Your chat ID: <code>{}</code>\n\n❌ You are not registered in the system. Share your phone number to link this chat to your profile.",
    channel_id
  )
}
