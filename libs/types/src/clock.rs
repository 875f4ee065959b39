//! Arrival clock
//!
//! Stamps orders at the submission boundary. Timestamps are nanoseconds
//! since the Unix epoch and strictly increase for a single clock, even if
//! the wall clock stalls or steps backwards.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct ArrivalClock {
    last: i64,
}

impl ArrivalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next arrival timestamp from the wall clock
    pub fn next(&mut self) -> i64 {
        self.next_from(Utc::now())
    }

    /// Next arrival timestamp given an explicit wall-clock reading
    pub fn next_from(&mut self, now: DateTime<Utc>) -> i64 {
        // None only past year 2262
        let wall = now.timestamp_nanos_opt().unwrap_or(i64::MAX);
        let ts = wall.max(self.last.saturating_add(1));
        self.last = ts;
        ts
    }

    /// Last timestamp handed out (0 before the first call)
    pub fn last(&self) -> i64 {
        self.last
    }
}
