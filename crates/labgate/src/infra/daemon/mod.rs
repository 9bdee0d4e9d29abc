#![deny(clippy::all)]
mod clock;
mod config;
mod entropy;
mod health;
mod metrics;
mod shutdown;
#[cfg(unix)]
mod signal_handler;

pub use clock::SystemClock;
pub use config::{DEFAULT_LISTEN, DaemonConfig, MAX_DURATION_SECS, generate_admin_password};
pub use entropy::OsEntropy;
pub use health::UpstreamMonitor;
pub use metrics::DaemonMetrics;
pub use shutdown::ShutdownSwitch;
#[cfg(unix)]
pub use signal_handler::SignalHandler;
