pub mod clock;
pub mod entropy;
pub mod health;
pub mod metrics;
pub mod shutdown_notifier;
#[cfg(test)]
pub(crate) mod test_support;

pub use clock::Clock;
pub use entropy::Entropy;
pub use health::HealthProbe;
pub use metrics::{MetricsSink, MetricsSnapshot};
pub use shutdown_notifier::{ShutdownNotifier, ShutdownNotifierHandle};
