// tests/sweeper_tests.rs
mod common;

use chrono::Duration;
use common::*;
use florist_notify::{ChannelId, OrderStatus, SweepReport};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_sweep_reminds_linked_and_escalates_unlinked() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  h.add_user(2, None);
  h.add_order(1, 1, OrderStatus::AwaitingPayment, Duration::hours(25));
  h.add_order(2, 2, OrderStatus::AwaitingPayment, Duration::hours(25));

  let report = h.sweeper().run_once().await;
  assert_eq!(report.examined, 2);
  assert_eq!(report.overdue, 2);
  assert_eq!(report.reminded, 1);
  assert_eq!(report.admin_alerts, 1);
  assert_eq!(report.failed, 0);

  let reminder = &h.gateway.sent_to(ChannelId(100))[0];
  assert_eq!(reminder.text, "⚠️ Your order #1 is awaiting payment! Please pay for it.");
  assert!(h.gateway.sent_to(ADMIN_A)[0].text.contains("#2"));
  assert!(h.gateway.sent_to(ADMIN_B)[0].text.contains("#2"));
  // The sweep only reads.
  assert_eq!(h.status_of(1), Some(OrderStatus::AwaitingPayment));
  assert_eq!(h.status_of(2), Some(OrderStatus::AwaitingPayment));
}

#[tokio::test]
async fn test_order_of_a_missing_user_alerts_admins_and_the_batch_continues() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  // User 7 was never created.
  h.add_order(1, 7, OrderStatus::AwaitingPayment, Duration::hours(30));
  h.add_order(2, 1, OrderStatus::AwaitingPayment, Duration::hours(30));

  let report = h.sweeper().run_once().await;
  assert_eq!(report.examined, 2);
  assert_eq!(report.overdue, 2);
  assert_eq!(report.admin_alerts, 1);
  assert_eq!(report.reminded, 1);
  assert_eq!(report.failed, 0);

  for admin in [ADMIN_A, ADMIN_B] {
    let alerts = h.gateway.sent_to(admin);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].text, "⚠️ Order #1 skipped: the owning user is missing.");
  }
  let reminders = h.gateway.sent_to(ChannelId(100));
  assert_eq!(reminders.len(), 1);
  assert_eq!(reminders[0].text, "⚠️ Your order #2 is awaiting payment! Please pay for it.");
  assert_eq!(h.gateway.sent().len(), 3);
  assert_eq!(h.status_of(1), Some(OrderStatus::AwaitingPayment));
}

#[tokio::test]
async fn test_sweep_outside_working_hours_does_nothing() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  h.add_order(1, 1, OrderStatus::AwaitingPayment, Duration::hours(48));
  h.calendar.set_open(false);

  let report = h.sweeper().run_once().await;
  assert_eq!(
    report,
    SweepReport {
      skipped_closed: true,
      ..SweepReport::default()
    }
  );
  assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_recent_unpaid_order_is_not_overdue() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  h.add_order(1, 1, OrderStatus::AwaitingPayment, Duration::hours(23));
  // Exactly at the threshold is still on time.
  h.add_order(2, 1, OrderStatus::AwaitingPayment, Duration::hours(24));

  let report = h.sweeper().run_once().await;
  assert_eq!(report.examined, 2);
  assert_eq!(report.overdue, 0);
  assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_old_orders_in_other_statuses_are_ignored() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  for (id, status) in [
    (1, OrderStatus::Pending),
    (2, OrderStatus::Processing),
    (3, OrderStatus::Shipped),
    (4, OrderStatus::Canceled),
  ] {
    h.add_order(id, 1, status, Duration::days(10));
  }

  let report = h.sweeper().run_once().await;
  assert_eq!(report.examined, 0);
  assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_clock_advance_makes_an_order_overdue() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  h.add_order(1, 1, OrderStatus::AwaitingPayment, Duration::hours(20));
  let sweeper = h.sweeper();

  assert_eq!(sweeper.run_once().await.reminded, 0);
  h.clock.advance(Duration::hours(5));
  assert_eq!(sweeper.run_once().await.reminded, 1);
}

#[tokio::test]
async fn test_one_failed_send_does_not_stop_the_batch() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  h.add_user(2, Some(200));
  h.add_order(1, 1, OrderStatus::AwaitingPayment, Duration::hours(30));
  h.add_order(2, 2, OrderStatus::AwaitingPayment, Duration::hours(30));
  h.gateway.fail_channel(ChannelId(100));

  let report = h.sweeper().run_once().await;
  assert_eq!(report.failed, 1);
  assert_eq!(report.reminded, 1);
  assert_eq!(h.gateway.sent_to(ChannelId(200)).len(), 1);
}

#[tokio::test]
async fn test_cancelled_token_abandons_before_the_first_order() {
  setup_tracing();
  let h = Harness::new();
  h.add_user(1, Some(100));
  h.add_order(1, 1, OrderStatus::AwaitingPayment, Duration::hours(30));
  let stop = CancellationToken::new();
  stop.cancel();

  let report = h.sweeper().run_until(&stop).await;
  assert!(report.abandoned);
  assert_eq!(report.examined, 0);
  assert!(h.gateway.sent().is_empty());
}
