//! Two-stage stop switch shared by signals, Ctrl-C and the daemon handle.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::Notify;
use tracing::info;
use tracing::warn;

use crate::usecases::ports::ShutdownNotifierHandle;

/// The first trip drains sessions gracefully; any later trip cuts the drain
/// short.
#[derive(Clone)]
pub struct ShutdownSwitch {
    requested: Arc<AtomicBool>,
    notifier: ShutdownNotifierHandle,
    force: Arc<Notify>,
}

impl ShutdownSwitch {
    pub fn new(notifier: ShutdownNotifierHandle) -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            notifier,
            force: Arc::new(Notify::new()),
        }
    }

    /// Flag read by components that only poll, such as the health monitor.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.requested)
    }

    /// Returns `true` for the trip that started the graceful stop.
    pub fn trip(&self, source: &'static str) -> bool {
        if self.requested.swap(true, Ordering::SeqCst) {
            warn!(source, "Shutdown already in progress; closing without draining");
            self.force.notify_one();
            return false;
        }
        info!(source, "Shutdown requested; ending active sessions");
        self.notifier.notify();
        true
    }

    /// Marks the daemon stopped without waking anything.
    pub fn mark_stopped(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Resolves once a second trip asks to skip the drain.
    pub async fn forced(&self) {
        self.force.notified().await;
    }
}
