use std::sync::Mutex;
use std::sync::MutexGuard;
use tracing::error;

/// Locks `lock`, taking the data back out of a poisoned mutex.
pub fn mutex_lock_or_recover<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        error!("Mutex poisoned by a panicking holder; recovering its data");
        poisoned.into_inner()
    })
}
