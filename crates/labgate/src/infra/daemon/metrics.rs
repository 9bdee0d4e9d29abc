use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::domain::EndReason;
use crate::usecases::ports::{MetricsSink, MetricsSnapshot};

pub struct DaemonMetrics {
    sessions_admitted: AtomicU64,
    admissions_rejected: AtomicU64,
    auth_failures: AtomicU64,
    ended_manual: AtomicU64,
    ended_timeout: AtomicU64,
    ended_auth_failed: AtomicU64,
    ended_disconnect: AtomicU64,
    tokens_issued: AtomicU64,
    start_time: Instant,
}

impl Default for DaemonMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DaemonMetrics {
    pub fn new() -> Self {
        Self {
            sessions_admitted: AtomicU64::new(0),
            admissions_rejected: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            ended_manual: AtomicU64::new(0),
            ended_timeout: AtomicU64::new(0),
            ended_auth_failed: AtomicU64::new(0),
            ended_disconnect: AtomicU64::new(0),
            tokens_issued: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    fn ended_counter(&self, reason: EndReason) -> &AtomicU64 {
        match reason {
            EndReason::Manual => &self.ended_manual,
            EndReason::Timeout => &self.ended_timeout,
            EndReason::AuthFailed => &self.ended_auth_failed,
            EndReason::Disconnect => &self.ended_disconnect,
        }
    }
}

impl MetricsSink for DaemonMetrics {
    fn session_admitted(&self) {
        self.sessions_admitted.fetch_add(1, Ordering::Relaxed);
    }

    fn admission_rejected(&self) {
        self.admissions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn auth_failed(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn session_ended(&self, reason: EndReason) {
        self.ended_counter(reason).fetch_add(1, Ordering::Relaxed);
    }

    fn token_issued(&self) {
        self.tokens_issued.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_admitted: self.sessions_admitted.load(Ordering::Relaxed),
            admissions_rejected: self.admissions_rejected.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            ended_manual: self.ended_manual.load(Ordering::Relaxed),
            ended_timeout: self.ended_timeout.load(Ordering::Relaxed),
            ended_auth_failed: self.ended_auth_failed.load(Ordering::Relaxed),
            ended_disconnect: self.ended_disconnect.load(Ordering::Relaxed),
            tokens_issued: self.tokens_issued.load(Ordering::Relaxed),
            uptime_ms: self.uptime_ms(),
        }
    }
}
