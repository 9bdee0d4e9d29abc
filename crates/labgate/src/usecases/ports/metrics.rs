use crate::domain::EndReason;

/// Counters recorded by the session engine.
pub trait MetricsSink: Send + Sync {
    fn session_admitted(&self);
    fn admission_rejected(&self);
    fn auth_failed(&self);
    fn session_ended(&self, reason: EndReason);
    fn token_issued(&self);
    fn snapshot(&self) -> MetricsSnapshot;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub sessions_admitted: u64,
    pub admissions_rejected: u64,
    pub auth_failures: u64,
    pub ended_manual: u64,
    pub ended_timeout: u64,
    pub ended_auth_failed: u64,
    pub ended_disconnect: u64,
    pub tokens_issued: u64,
    pub uptime_ms: u64,
}
