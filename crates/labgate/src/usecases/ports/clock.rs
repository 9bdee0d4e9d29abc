use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Wall-clock time, used only for display.
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn elapsed(&self, start: Instant) -> Duration {
        self.now().saturating_duration_since(start)
    }
}
