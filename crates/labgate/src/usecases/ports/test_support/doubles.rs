use crate::domain::EndReason;
use crate::usecases::ports::{HealthProbe, MetricsSink, MetricsSnapshot};

#[derive(Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn session_admitted(&self) {}
    fn admission_rejected(&self) {}
    fn auth_failed(&self) {}
    fn session_ended(&self, _reason: EndReason) {}
    fn token_issued(&self) {}

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
}

#[derive(Default)]
pub struct AlwaysHealthy;

impl HealthProbe for AlwaysHealthy {
    fn is_healthy(&self) -> bool {
        true
    }
}
