//! SIGINT/SIGTERM handling for the gateway.

use std::thread;
use std::thread::JoinHandle;

use signal_hook::consts::SIGINT;
use signal_hook::consts::SIGTERM;
use signal_hook::iterator::Signals;
use tracing::info;

use super::shutdown::ShutdownSwitch;
use crate::common::DaemonError;

/// Background thread that trips the [`ShutdownSwitch`] on every signal.
///
/// The first signal lets open lab sessions receive their shutdown notice; a
/// second one stops waiting for them.
pub struct SignalHandler {
    _handle: JoinHandle<()>,
}

impl SignalHandler {
    pub fn setup(switch: ShutdownSwitch) -> Result<Self, DaemonError> {
        let mut signals =
            Signals::new([SIGINT, SIGTERM]).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;

        let handle = thread::Builder::new()
            .name("labgate-signals".to_string())
            .spawn(move || {
                for sig in signals.forever() {
                    info!(signal = sig, "Received stop signal");
                    switch.trip("signal");
                }
            })
            .map_err(|e| {
                DaemonError::SignalSetup(format!("failed to spawn signal thread: {e}"))
            })?;

        Ok(Self { _handle: handle })
    }
}
