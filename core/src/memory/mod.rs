// florist_notify/src/memory/mod.rs

//! In-process implementations of every port. The application uses the stores for its `memory`
//! backend; the gateway, clock and calendar doubles exist for tests.

mod gateway;
mod store;
mod time;
mod users;

pub use gateway::{AnsweredEvent, EditedMessage, RecordingGateway, SentMessage};
pub use store::{InMemoryCatalog, InMemoryNotificationLog, InMemoryOrderStore};
pub use time::{FixedCalendar, FixedClock};
pub use users::InMemoryUserDirectory;
