// florist_notify/src/sweeper.rs

//! Periodic scan for unpaid orders past their payment deadline.

use chrono::Duration;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::dispatcher::{DispatchOutcome, NotificationDispatcher};
use crate::model::{OrderEvent, OrderStatus};
use crate::ports::{Clock, OrderStore, WorkingHoursCalendar};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
  /// Working hours were closed; nothing was read or sent.
  pub skipped_closed: bool,
  /// Shutdown was requested mid-batch; the remaining orders were left for the next run.
  pub abandoned: bool,
  pub examined: usize,
  pub overdue: usize,
  pub reminded: usize,
  pub admin_alerts: usize,
  pub failed: usize,
}

pub struct ReminderSweeper {
  orders: Arc<dyn OrderStore>,
  calendar: Arc<dyn WorkingHoursCalendar>,
  clock: Arc<dyn Clock>,
  dispatcher: Arc<NotificationDispatcher>,
  overdue_after: Duration,
}

impl ReminderSweeper {
  pub fn new(
    orders: Arc<dyn OrderStore>,
    calendar: Arc<dyn WorkingHoursCalendar>,
    clock: Arc<dyn Clock>,
    dispatcher: Arc<NotificationDispatcher>,
    overdue_after: Duration,
  ) -> Self {
    Self {
      orders,
      calendar,
      clock,
      dispatcher,
      overdue_after,
    }
  }

  pub async fn run_once(&self) -> SweepReport {
    self.run_until(&CancellationToken::new()).await
  }

  /// One sweep. Orders are evaluated and dispatched one by one with no lock held across the
  /// batch; a failure on one order is counted and the sweep moves on. `stop` is only checked
  /// between orders, so an in-flight send always completes.
  #[instrument(name = "sweeper::run", skip_all)]
  pub async fn run_until(&self, stop: &CancellationToken) -> SweepReport {
    let mut report = SweepReport::default();

    if !self.calendar.is_open_now() {
      debug!("Outside working hours; sweep skipped.");
      report.skipped_closed = true;
      return report;
    }

    let awaiting = match self.orders.list(OrderStatus::AwaitingPayment).await {
      Ok(orders) => orders,
      Err(e) => {
        error!(error = %e, "Could not list unpaid orders; sweep aborted until next cycle.");
        report.failed += 1;
        return report;
      }
    };

    let now = self.clock.now();
    for order in awaiting {
      if stop.is_cancelled() {
        warn!(examined = report.examined, "Shutdown requested; abandoning the rest of the sweep.");
        report.abandoned = true;
        break;
      }
      report.examined += 1;
      if !order.is_payment_overdue(now, self.overdue_after) {
        continue;
      }
      report.overdue += 1;

      match self.dispatcher.notify(&order, OrderEvent::Reminder).await {
        Ok(DispatchOutcome::SentToUser(_)) => report.reminded += 1,
        Ok(DispatchOutcome::AdminsNotified { .. }) => report.admin_alerts += 1,
        Ok(other) => debug!(order_id = %order.id, outcome = ?other, "Reminder produced no send."),
        Err(e) => {
          report.failed += 1;
          warn!(order_id = %order.id, error = %e, "Reminder failed; retried next cycle.");
        }
      }
    }

    info!(
      examined = report.examined,
      overdue = report.overdue,
      reminded = report.reminded,
      admin_alerts = report.admin_alerts,
      failed = report.failed,
      "Payment reminder sweep finished."
    );
    report
  }
}
