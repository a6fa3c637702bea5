//! Time source for creation timestamps and overdue checks.
//!
//! # Responsibility
//! - Abstract wall-clock reads so store behavior is testable.
//!
//! # Invariants
//! - `now_millis` is epoch milliseconds (UTC).
//! - `today` is the local calendar date used for overdue evaluation.

use chrono::{Local, NaiveDate, Utc};
use std::cell::Cell;

/// Clock port used by `TaskStore` and views.
pub trait Clock {
    fn now_millis(&self) -> i64;
    fn today(&self) -> NaiveDate;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock for tests and replay.
#[derive(Debug, Clone)]
pub struct FixedClock {
    millis: Cell<i64>,
    today: Cell<NaiveDate>,
}

impl FixedClock {
    pub fn new(millis: i64, today: NaiveDate) -> Self {
        Self {
            millis: Cell::new(millis),
            today: Cell::new(today),
        }
    }

    pub fn set_millis(&self, millis: i64) {
        self.millis.set(millis);
    }

    pub fn advance_millis(&self, delta: i64) {
        self.millis.set(self.millis.get() + delta);
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.today.set(today);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis.get()
    }

    fn today(&self) -> NaiveDate {
        self.today.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
