// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every fixture

use chrono::{DateTime, Duration, TimeZone, Utc};
use florist_notify::memory::{
  FixedCalendar, FixedClock, InMemoryNotificationLog, InMemoryOrderStore, InMemoryUserDirectory, RecordingGateway,
};
use florist_notify::ports::{EventId, MessageRef};
use florist_notify::{
  ButtonEvent, CancellationFlow, ChannelId, DispatcherConfig, FlowerId, NotificationDispatcher, Order, OrderId,
  OrderItem, OrderStatus, ReminderSweeper, SchedulerConfig, SchedulerPorts, TextEvent, UserId, UserProfile,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;

pub const ADMIN_A: ChannelId = ChannelId(9001);
pub const ADMIN_B: ChannelId = ChannelId(9002);
pub const SHOP_NAME: &str = "Rose Garden";

/// Monday 2024-03-04 12:00 UTC; the fixed "now" of every test.
pub fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()
}

// --- Shared in-memory world ---
pub struct Harness {
  pub clock: Arc<FixedClock>,
  pub calendar: Arc<FixedCalendar>,
  pub orders: Arc<InMemoryOrderStore>,
  pub users: Arc<InMemoryUserDirectory>,
  pub log: Arc<InMemoryNotificationLog>,
  pub gateway: Arc<RecordingGateway>,
  event_seq: AtomicUsize,
}

impl Harness {
  pub fn new() -> Self {
    let clock = Arc::new(FixedClock::new(t0()));
    Self {
      orders: Arc::new(InMemoryOrderStore::new(clock.clone())),
      clock,
      calendar: Arc::new(FixedCalendar::open()),
      users: Arc::new(InMemoryUserDirectory::new()),
      log: Arc::new(InMemoryNotificationLog::new()),
      gateway: Arc::new(RecordingGateway::new()),
      event_seq: AtomicUsize::new(1),
    }
  }

  pub fn ports(&self) -> SchedulerPorts {
    SchedulerPorts {
      orders: self.orders.clone(),
      users: self.users.clone(),
      log: self.log.clone(),
      gateway: self.gateway.clone(),
      calendar: self.calendar.clone(),
      clock: self.clock.clone(),
    }
  }

  pub fn scheduler_config(&self) -> SchedulerConfig {
    SchedulerConfig {
      admin_channels: vec![ADMIN_A, ADMIN_B],
      shop_name: SHOP_NAME.to_string(),
      ..SchedulerConfig::default()
    }
  }

  pub fn dispatcher(&self) -> Arc<NotificationDispatcher> {
    Arc::new(NotificationDispatcher::new(
      self.users.clone(),
      self.gateway.clone(),
      self.log.clone(),
      self.clock.clone(),
      DispatcherConfig {
        admin_channels: vec![ADMIN_A, ADMIN_B],
        shop_name: SHOP_NAME.to_string(),
      },
    ))
  }

  pub fn cancellation(&self) -> Arc<CancellationFlow> {
    Arc::new(CancellationFlow::new(
      self.orders.clone(),
      self.users.clone(),
      self.gateway.clone(),
      self.log.clone(),
      self.clock.clone(),
      vec![ADMIN_A, ADMIN_B],
    ))
  }

  pub fn sweeper(&self) -> ReminderSweeper {
    ReminderSweeper::new(
      self.orders.clone(),
      self.calendar.clone(),
      self.clock.clone(),
      self.dispatcher(),
      Duration::hours(24),
    )
  }

  pub fn add_user(&self, id: i64, channel: Option<i64>) -> UserProfile {
    let profile = UserProfile {
      id: UserId(id),
      full_name: format!("Customer {}", id),
      phone: Some(format!("+7999000{:04}", id)),
      address: Some("Flower St. 1".to_string()),
      channel_id: channel.map(ChannelId),
      notified_fallback: false,
    };
    self.users.insert(profile.clone());
    profile
  }

  /// Inserts an order created `age` before `t0()`.
  pub fn add_order(&self, id: i64, user_id: i64, status: OrderStatus, age: Duration) -> Order {
    let order = Order {
      id: OrderId(id),
      user_id: UserId(user_id),
      status,
      created_at: t0() - age,
      total_price_cents: 2 * 35_000,
      address: Some("Flower St. 1".to_string()),
      items: vec![OrderItem {
        flower_id: FlowerId(1),
        flower_name: "Red Rose".to_string(),
        quantity: 2,
        price_cents: 35_000,
        subtotal_cents: 70_000,
      }],
    };
    self.orders.insert(order.clone());
    order
  }

  /// A button press on `message` carrying `payload`.
  pub fn press(&self, message: MessageRef, payload: impl Into<String>) -> ButtonEvent {
    let seq = self.event_seq.fetch_add(1, Ordering::SeqCst);
    ButtonEvent {
      event_id: EventId(format!("evt-{}", seq)),
      message,
      from: message.channel_id,
      payload: payload.into(),
    }
  }

  pub fn status_of(&self, order_id: i64) -> Option<OrderStatus> {
    self.orders.status_of(OrderId(order_id))
  }
}

pub fn text_from(channel: i64, text: &str) -> TextEvent {
  TextEvent {
    chat: ChannelId(channel),
    from: ChannelId(channel),
    text: Some(text.to_string()),
    contact_phone: None,
  }
}

pub fn contact_from(channel: i64, phone: &str) -> TextEvent {
  TextEvent {
    chat: ChannelId(channel),
    from: ChannelId(channel),
    text: None,
    contact_phone: Some(phone.to_string()),
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
