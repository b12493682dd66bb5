// florist_shop/src/services/working_hours.rs

use chrono::{FixedOffset, Timelike};
use florist_notify::{Clock, WorkingHoursCalendar};
use std::sync::Arc;

use crate::errors::{AppError, Result};

/// Daily staffed window `[start, end)` in the shop's local time.
pub struct ShopHours {
  start: u32,
  end: u32,
  offset: FixedOffset,
  clock: Arc<dyn Clock>,
}

impl ShopHours {
  pub fn new(start: u32, end: u32, utc_offset_hours: i32, clock: Arc<dyn Clock>) -> Result<Self> {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
      .ok_or_else(|| AppError::Config(format!("UTC offset {}h is out of range", utc_offset_hours)))?;
    if start >= end || end > 24 {
      return Err(AppError::Config(format!(
        "Working hours {}..{} must satisfy start < end <= 24",
        start, end
      )));
    }
    Ok(Self {
      start,
      end,
      offset,
      clock,
    })
  }
}

impl WorkingHoursCalendar for ShopHours {
  fn is_open_now(&self) -> bool {
    let local_hour = self.clock.now().with_timezone(&self.offset).hour();
    local_hour >= self.start && local_hour < self.end
  }
}
