// florist_notify/src/memory/time.rs

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ports::{Clock, WorkingHoursCalendar};

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
  now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
  pub fn new(now: DateTime<Utc>) -> Self {
    Self { now: Mutex::new(now) }
  }

  pub fn set(&self, now: DateTime<Utc>) {
    *self.now.lock() = now;
  }

  pub fn advance(&self, by: Duration) {
    let mut now = self.now.lock();
    *now += by;
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock()
  }
}

#[derive(Debug)]
pub struct FixedCalendar {
  open: AtomicBool,
}

impl FixedCalendar {
  pub fn open() -> Self {
    Self {
      open: AtomicBool::new(true),
    }
  }

  pub fn closed() -> Self {
    Self {
      open: AtomicBool::new(false),
    }
  }

  pub fn set_open(&self, open: bool) {
    self.open.store(open, Ordering::SeqCst);
  }
}

impl WorkingHoursCalendar for FixedCalendar {
  fn is_open_now(&self) -> bool {
    self.open.load(Ordering::SeqCst)
  }
}
