use std::sync::Arc;

/// Wakes whatever is waiting on daemon shutdown.
pub trait ShutdownNotifier: Send + Sync {
    fn notify(&self);
}

pub type ShutdownNotifierHandle = Arc<dyn ShutdownNotifier>;
