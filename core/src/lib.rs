// src/lib.rs

//! florist_notify: order notifications for a flower shop, delivered through a chat bot.
//!
//! The crate owns the conversation side of an order's lifecycle:
//!  - Sending the order summary with a cancel button when an order is placed.
//!  - Telling the customer about every status change, or recording a one-time fallback notice
//!    when they have no linked chat.
//!  - A two-step cancellation dialog whose only server-side state is the order's status.
//!  - A periodic sweep reminding customers (or administrators) about unpaid orders.
//!  - Linking a customer's chat to their shop profile.
//!
//! Storage, the chat transport and the working-hours calendar are ports (`ports`), implemented by
//! the application crate; `memory` has in-process versions of all of them.

pub mod cancellation;
pub mod dispatcher;
pub mod error;
pub mod inbound;
pub mod linking;
pub mod memory;
pub mod model;
pub mod payload;
pub mod ports;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod sweeper;

// --- Re-exports for the Public API ---

pub use crate::error::{NotifyError, NotifyResult};
pub use crate::model::{
  normalize_phone, ChannelId, Flower, FlowerId, NewOrder, NotificationLogEntry, Order, OrderEvent, OrderId, OrderItem, OrderStatus,
  ProfileUpdate, UserId, UserProfile,
};
pub use crate::ports::{
  Clock, FlowerCatalog, NotificationGateway, NotificationLog, OrderStore, SystemClock, UserDirectory,
  WorkingHoursCalendar,
};

// The four components and their wiring
pub use crate::cancellation::CancellationFlow;
pub use crate::dispatcher::{AdminAlert, DispatchOutcome, DispatcherConfig, NotificationDispatcher};
pub use crate::scheduler::{EventPublisher, Scheduler, SchedulerConfig, SchedulerHandle, SchedulerPorts};
pub use crate::sweeper::{ReminderSweeper, SweepReport};

pub use crate::inbound::{ButtonEvent, InboundEvent, TextEvent};
pub use crate::linking::{CommandOutcome, LinkingCommands};
pub use crate::payload::{CallbackAction, CallbackPayload};
pub use crate::registry::{ButtonHandler, ButtonOutcome, ButtonRegistry};
