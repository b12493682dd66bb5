// florist_shop/src/services/mod.rs

pub mod orders;
pub mod telegram;
pub mod telegram_poller;
pub mod working_hours;

pub use orders::{CheckoutRequest, OrderService};
pub use telegram::TelegramGateway;
pub use telegram_poller::UpdatePoller;
pub use working_hours::ShopHours;
