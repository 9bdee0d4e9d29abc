use std::time::Instant;

use crate::usecases::ports::Clock;

/// Monotonic clock backed by the tokio timer, so paused test time applies.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
