// florist_notify/src/scheduler.rs

//! The single owner of the outbound channel.
//!
//! `Scheduler` runs one task that pulls inbound events off a bounded queue and fires the payment
//! reminder sweep on a timer. Both paths run inline on that task, so every gateway call made by
//! this crate is ordered against every other one. Anything outside (the web path, the update
//! poller) only gets an `EventPublisher`.

use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::cancellation::CancellationFlow;
use crate::dispatcher::{DispatcherConfig, NotificationDispatcher};
use crate::error::{NotifyError, NotifyResult};
use crate::inbound::{ButtonEvent, InboundEvent};
use crate::linking::LinkingCommands;
use crate::model::{ChannelId, OrderEvent, OrderId, UserId};
use crate::payload::CallbackPayload;
use crate::ports::{
  Clock, EventId, NotificationGateway, NotificationLog, OrderStore, TimeoutGateway, UserDirectory, WorkingHoursCalendar,
};
use crate::registry::{ButtonOutcome, ButtonRegistry};
use crate::render;
use crate::sweeper::{ReminderSweeper, SweepReport};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
  /// Time between payment reminder sweeps. The first sweep runs one interval after start.
  pub sweep_interval: Duration,
  /// Age after which an unpaid order counts as overdue.
  pub overdue_after: ChronoDuration,
  /// Deadline for every individual gateway call.
  pub gateway_timeout: Duration,
  pub admin_channels: Vec<ChannelId>,
  pub shop_name: String,
  pub queue_capacity: usize,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      sweep_interval: Duration::from_secs(3 * 60 * 60),
      overdue_after: ChronoDuration::hours(24),
      gateway_timeout: Duration::from_secs(10),
      admin_channels: Vec::new(),
      shop_name: DispatcherConfig::default().shop_name,
      queue_capacity: 256,
    }
  }
}

/// The ports the scheduler is assembled from.
#[derive(Clone)]
pub struct SchedulerPorts {
  pub orders: Arc<dyn OrderStore>,
  pub users: Arc<dyn UserDirectory>,
  pub log: Arc<dyn NotificationLog>,
  pub gateway: Arc<dyn NotificationGateway>,
  pub calendar: Arc<dyn WorkingHoursCalendar>,
  pub clock: Arc<dyn Clock>,
}

pub struct Scheduler {
  orders: Arc<dyn OrderStore>,
  gateway: Arc<dyn NotificationGateway>,
  dispatcher: Arc<NotificationDispatcher>,
  registry: ButtonRegistry,
  sweeper: ReminderSweeper,
  linking: LinkingCommands,
  config: SchedulerConfig,
}

impl Scheduler {
  /// Wires the dispatcher, cancellation dialog, sweeper and linking commands around one
  /// deadline-bounded gateway.
  pub fn new(ports: SchedulerPorts, config: SchedulerConfig) -> Self {
    let gateway: Arc<dyn NotificationGateway> = Arc::new(TimeoutGateway::new(ports.gateway, config.gateway_timeout));

    let dispatcher = Arc::new(NotificationDispatcher::new(
      ports.users.clone(),
      gateway.clone(),
      ports.log.clone(),
      ports.clock.clone(),
      DispatcherConfig {
        admin_channels: config.admin_channels.clone(),
        shop_name: config.shop_name.clone(),
      },
    ));

    let registry = ButtonRegistry::new();
    let cancellation = Arc::new(CancellationFlow::new(
      ports.orders.clone(),
      ports.users.clone(),
      gateway.clone(),
      ports.log.clone(),
      ports.clock.clone(),
      config.admin_channels.clone(),
    ));
    cancellation.register(&registry);

    let sweeper = ReminderSweeper::new(
      ports.orders.clone(),
      ports.calendar,
      ports.clock,
      dispatcher.clone(),
      config.overdue_after,
    );
    let linking = LinkingCommands::new(ports.users, gateway.clone(), config.admin_channels.clone());

    Self {
      orders: ports.orders,
      gateway,
      dispatcher,
      registry,
      sweeper,
      linking,
      config,
    }
  }

  pub fn registry(&self) -> &ButtonRegistry {
    &self.registry
  }

  pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
    &self.dispatcher
  }

  /// Spawns the loop on the current runtime.
  pub fn start(self) -> SchedulerHandle {
    let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
    let stop = CancellationToken::new();
    let task_stop = stop.clone();
    info!(
      sweep_interval_secs = self.config.sweep_interval.as_secs(),
      admin_channels = self.config.admin_channels.len(),
      "Starting notification scheduler."
    );
    let join = tokio::spawn(async move { self.run(rx, task_stop).await });
    SchedulerHandle {
      publisher: EventPublisher { tx },
      stop,
      join,
    }
  }

  async fn run(self, mut rx: mpsc::Receiver<InboundEvent>, stop: CancellationToken) {
    let period = self.config.sweep_interval;
    let mut sweep_timer = interval_at(Instant::now() + period, period);
    sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        biased;
        _ = stop.cancelled() => break,
        received = rx.recv() => match received {
          Some(event) => self.handle_event(event).await,
          None => {
            debug!("All publishers dropped.");
            break;
          }
        },
        _ = sweep_timer.tick() => {
          self.sweep(&stop).await;
        }
      }
    }

    rx.close();
    let mut drained = 0usize;
    while let Ok(event) = rx.try_recv() {
      self.handle_event(event).await;
      drained += 1;
    }
    info!(drained, "Notification scheduler stopped.");
  }

  /// Runs one sweep on the caller's task. The loop uses this on every timer tick.
  pub async fn sweep(&self, stop: &CancellationToken) -> SweepReport {
    self.sweeper.run_until(stop).await
  }

  /// Handles one inbound event to completion. Never fails: every error is logged here.
  #[instrument(name = "scheduler::handle_event", skip_all, fields(kind = event.kind()))]
  pub async fn handle_event(&self, event: InboundEvent) {
    match event {
      InboundEvent::Button(button) => {
        let outcome = self.handle_button(&button).await;
        debug!(?outcome, "Button event handled.");
      }
      InboundEvent::DetachedButton { event_id } => {
        debug!(event_id = %event_id.0, "Button press without a message; answering only.");
        self.answer_something_wrong(&event_id).await;
      }
      InboundEvent::Text(text) => {
        let outcome = self.linking.handle(&text).await;
        debug!(?outcome, "Text event handled.");
      }
      InboundEvent::Order { order_id, event } => self.handle_order_event(order_id, event).await,
      InboundEvent::ProfileUpdated { user_id } => self.handle_profile_updated(user_id).await,
    }
  }

  async fn handle_button(&self, button: &ButtonEvent) -> ButtonOutcome {
    let payload = match button.payload.parse::<CallbackPayload>() {
      Ok(payload) => payload,
      Err(e) => {
        warn!(error = %e, "Ignoring button with an undecodable payload.");
        self.answer_something_wrong(&button.event_id).await;
        return ButtonOutcome::Ignored;
      }
    };
    match self.registry.dispatch(payload, button).await {
      Some(outcome) => outcome,
      None => {
        warn!(action = %payload.action, "No handler registered for button action.");
        self.answer_something_wrong(&button.event_id).await;
        ButtonOutcome::Ignored
      }
    }
  }

  async fn answer_something_wrong(&self, event_id: &EventId) {
    if let Err(e) = self
      .gateway
      .answer_event(event_id, Some(render::FEEDBACK_SOMETHING_WRONG))
      .await
    {
      warn!(error = %e, "Answering button event failed.");
    }
  }

  /// The publisher only sends ids; the order is re-read so the message reflects the store now.
  async fn handle_order_event(&self, order_id: OrderId, event: OrderEvent) {
    let order = match self.orders.get(order_id).await {
      Ok(Some(order)) => order,
      Ok(None) => {
        warn!(%order_id, "Order event for an order that no longer exists.");
        return;
      }
      Err(e) => {
        error!(%order_id, error = %e, "Failed to load order for event.");
        return;
      }
    };
    match self.dispatcher.notify(&order, event).await {
      Ok(outcome) => debug!(%order_id, ?outcome, "Order event dispatched."),
      Err(e) if e.is_gateway_failure() => warn!(%order_id, error = %e, "Order notification not delivered."),
      Err(e) => error!(%order_id, error = %e, "Order notification failed."),
    }
  }

  async fn handle_profile_updated(&self, user_id: UserId) {
    match self.dispatcher.notify_profile_updated(user_id).await {
      Ok(outcome) => debug!(%user_id, ?outcome, "Profile update dispatched."),
      Err(e) => warn!(%user_id, error = %e, "Profile update notification failed."),
    }
  }
}

/// Cloneable entry point into the scheduler queue.
#[derive(Debug, Clone)]
pub struct EventPublisher {
  tx: mpsc::Sender<InboundEvent>,
}

impl EventPublisher {
  /// Queues an event, waiting for room when the queue is full.
  pub async fn publish(&self, event: InboundEvent) -> NotifyResult<()> {
    self.tx.send(event).await.map_err(|_| NotifyError::QueueClosed)
  }

  pub async fn order_event(&self, order_id: OrderId, event: OrderEvent) -> NotifyResult<()> {
    self.publish(InboundEvent::Order { order_id, event }).await
  }

  pub async fn profile_updated(&self, user_id: UserId) -> NotifyResult<()> {
    self.publish(InboundEvent::ProfileUpdated { user_id }).await
  }

  pub fn is_closed(&self) -> bool {
    self.tx.is_closed()
  }
}

pub struct SchedulerHandle {
  publisher: EventPublisher,
  stop: CancellationToken,
  join: JoinHandle<()>,
}

impl SchedulerHandle {
  pub fn publisher(&self) -> EventPublisher {
    self.publisher.clone()
  }

  /// Token cancelled when shutdown begins; long-running producers can watch it.
  pub fn stop_token(&self) -> CancellationToken {
    self.stop.clone()
  }

  /// Stops the loop. Events queued before this call are still handled; a running sweep stops
  /// after its current order.
  pub async fn shutdown(self) {
    info!("Shutting down notification scheduler.");
    self.stop.cancel();
    drop(self.publisher);
    if let Err(e) = self.join.await {
      error!(error = %e, "Notification scheduler task ended abnormally.");
    }
  }
}
