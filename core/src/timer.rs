use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use web_time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis().try_into().unwrap_or(u64::MAX))
            .unwrap_or_default()
    }
}

/// Settable clock, cloned handles share the same time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Game timer: accumulated milliseconds plus the start of the running stretch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    accumulated_ms: u64,
    running_since: Option<u64>,
}

impl Timer {
    pub const fn new(accumulated_ms: u64) -> Self {
        Self {
            accumulated_ms,
            running_since: None,
        }
    }

    pub const fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn start(&mut self, now_ms: u64) {
        if self.running_since.is_none() {
            self.running_since = Some(now_ms);
        }
    }

    pub fn pause(&mut self, now_ms: u64) {
        self.accumulated_ms = self.elapsed_ms(now_ms);
        self.running_since = None;
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.running_since {
            Some(since) => self
                .accumulated_ms
                .saturating_add(now_ms.saturating_sub(since)),
            None => self.accumulated_ms,
        }
    }
}
