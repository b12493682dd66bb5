// tests/dispatcher_tests.rs
mod common;

use chrono::Duration;
use common::*;
use florist_notify::ports::ReplyMarkup;
use florist_notify::{AdminAlert, ChannelId, DispatchOutcome, OrderEvent, OrderStatus, UserId};

#[tokio::test]
async fn test_created_order_sends_summary_with_single_cancel_button() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  let order = h.add_order(42, 1, OrderStatus::AwaitingPayment, Duration::minutes(1));

  let outcome = h.dispatcher().notify(&order, OrderEvent::Created).await.unwrap();
  assert!(matches!(outcome, DispatchOutcome::SentToUser(_)));

  let sent = h.gateway.sent_to(ChannelId(100));
  assert_eq!(sent.len(), 1);
  assert!(sent[0].text.starts_with("Order #42\nStatus: Awaiting payment"));
  assert!(sent[0].text.contains("Red Rose x 2 - 700.00"));
  assert_eq!(sent[0].payloads(), vec!["cancel_order_42".to_string()]);

  let log = h.log.entries_for(UserId(1));
  assert_eq!(log.len(), 1);
  assert_eq!(log[0].message, sent[0].text);
  assert_eq!(log[0].created_at, t0());
}

#[tokio::test]
async fn test_created_outside_awaiting_payment_sends_nothing() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  let order = h.add_order(7, 1, OrderStatus::Pending, Duration::minutes(1));

  let outcome = h.dispatcher().notify(&order, OrderEvent::Created).await.unwrap();
  assert_eq!(outcome, DispatchOutcome::Skipped);
  assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_status_change_sends_plain_text_without_buttons() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  let order = h.add_order(5, 1, OrderStatus::Shipped, Duration::hours(2));

  let event = OrderEvent::StatusChanged {
    old: OrderStatus::Processing,
    new: OrderStatus::Shipped,
  };
  h.dispatcher().notify(&order, event).await.unwrap();

  let sent = h.gateway.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].text, "The status of your order #5 changed to: Shipped");
  assert_eq!(sent[0].markup, None);
}

#[tokio::test]
async fn test_delivered_status_uses_thank_you_message_naming_the_shop() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  let order = h.add_order(5, 1, OrderStatus::Delivered, Duration::hours(30));

  let event = OrderEvent::StatusChanged {
    old: OrderStatus::Processing,
    new: OrderStatus::Delivered,
  };
  h.dispatcher().notify(&order, event).await.unwrap();

  let sent = h.gateway.sent();
  assert!(sent[0].text.contains("has been delivered"));
  assert!(sent[0].text.contains(SHOP_NAME));
}

#[tokio::test]
async fn test_unlinked_user_gets_exactly_one_fallback_entry() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(2, None);
  let order = h.add_order(8, 2, OrderStatus::AwaitingPayment, Duration::minutes(5));
  let dispatcher = h.dispatcher();

  let first = dispatcher.notify(&order, OrderEvent::Created).await.unwrap();
  assert_eq!(first, DispatchOutcome::FallbackRecorded);

  for new in [OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Shipped] {
    let event = OrderEvent::StatusChanged {
      old: OrderStatus::AwaitingPayment,
      new,
    };
    let outcome = dispatcher.notify(&order, event).await.unwrap();
    assert_eq!(outcome, DispatchOutcome::FallbackAlreadyRecorded);
  }

  let log = h.log.entries_for(UserId(2));
  assert_eq!(log.len(), 1);
  assert!(log[0].message.contains("+79990000002"));
  assert!(log[0].message.contains("/start"));
  assert!(h.users.snapshot(UserId(2)).unwrap().notified_fallback);
  assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_missing_user_alerts_every_admin_and_sends_nothing_else() {
  setup_tracing();
  let h = Harness::new();
  let order = h.add_order(13, 404, OrderStatus::AwaitingPayment, Duration::hours(1));

  let outcome = h.dispatcher().notify(&order, OrderEvent::Created).await.unwrap();
  assert_eq!(
    outcome,
    DispatchOutcome::AdminsNotified {
      alert: AdminAlert::MissingUser,
      delivered: 2,
      failed: 0,
    }
  );
  assert_eq!(h.gateway.sent_to(ADMIN_A).len(), 1);
  assert_eq!(h.gateway.sent_to(ADMIN_B).len(), 1);
  assert!(h.gateway.sent_to(ADMIN_A)[0].text.contains("#13"));
  assert_eq!(h.gateway.sent().len(), 2);
}

#[tokio::test]
async fn test_admin_fan_out_continues_past_a_failing_admin() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(3, None);
  let order = h.add_order(21, 3, OrderStatus::AwaitingPayment, Duration::hours(30));
  h.gateway.fail_channel(ADMIN_A);

  let outcome = h.dispatcher().notify(&order, OrderEvent::Reminder).await.unwrap();
  assert_eq!(
    outcome,
    DispatchOutcome::AdminsNotified {
      alert: AdminAlert::UnlinkedOverdue,
      delivered: 1,
      failed: 1,
    }
  );
  let alert = &h.gateway.sent_to(ADMIN_B)[0];
  assert!(alert.text.contains("#21"));
  assert!(alert.text.contains("Customer 3"));
}

#[tokio::test]
async fn test_failed_send_to_user_is_reported_and_not_logged() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  let order = h.add_order(9, 1, OrderStatus::AwaitingPayment, Duration::minutes(1));
  h.gateway.fail_channel(ChannelId(100));

  let err = h.dispatcher().notify(&order, OrderEvent::Created).await.unwrap_err();
  assert!(err.is_gateway_failure());
  assert!(h.log.entries().is_empty());
}

#[tokio::test]
async fn test_profile_update_is_echoed_only_to_linked_users() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  h.add_user(2, None);
  let dispatcher = h.dispatcher();

  let linked = dispatcher.notify_profile_updated(UserId(1)).await.unwrap();
  assert!(matches!(linked, DispatchOutcome::SentToUser(_)));
  let unlinked = dispatcher.notify_profile_updated(UserId(2)).await.unwrap();
  assert_eq!(unlinked, DispatchOutcome::Skipped);

  let sent = h.gateway.sent();
  assert_eq!(sent.len(), 1);
  assert!(sent[0].text.contains("Customer 1"));
  assert!(!matches!(sent[0].markup, Some(ReplyMarkup::Inline(_))));
}
