#![deny(clippy::all)]

pub mod daemon_error;
mod sync;
pub mod telemetry;

pub use daemon_error::DaemonError;
pub use sync::mutex_lock_or_recover;
