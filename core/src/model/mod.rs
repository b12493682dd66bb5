// florist_notify/src/model/mod.rs

//! Data structures shared by the core components and the store adapters.

pub mod notification;
pub mod order;
pub mod user;

pub use notification::{NotificationLogEntry, OrderEvent};
pub use order::{format_money, Flower, FlowerId, NewOrder, Order, OrderId, OrderItem, OrderStatus, UnknownStatus};
pub use user::{normalize_phone, ChannelId, ProfileUpdate, UserId, UserProfile};
