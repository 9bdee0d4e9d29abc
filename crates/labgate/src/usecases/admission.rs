use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::domain::CapacitySnapshot;

pub const DEFAULT_MAX_SESSIONS: usize = 3;

/// Counts active sessions against a fixed capacity.
#[derive(Debug)]
pub struct AdmissionController {
    active: AtomicUsize,
    max_sessions: usize,
}

impl AdmissionController {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            active: AtomicUsize::new(0),
            max_sessions,
        }
    }

    /// Reserves one slot. Never admits past `max_sessions`.
    pub fn try_admit(&self) -> bool {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                (active < self.max_sessions).then_some(active + 1)
            })
            .is_ok()
    }

    /// Frees one slot; a release with nothing active is ignored.
    pub fn release(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                active.checked_sub(1)
            });
    }

    pub fn snapshot(&self) -> CapacitySnapshot {
        CapacitySnapshot {
            active: self.active.load(Ordering::Acquire),
            max_sessions: self.max_sessions,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

/// One admitted slot. Released exactly once, explicitly or on drop.
#[derive(Debug)]
pub struct SessionLease {
    controller: Arc<AdmissionController>,
    released: AtomicBool,
}

impl SessionLease {
    pub fn acquire(controller: &Arc<AdmissionController>) -> Option<Self> {
        controller.try_admit().then(|| Self {
            controller: Arc::clone(controller),
            released: AtomicBool::new(false),
        })
    }

    /// Returns `true` only for the call that actually freed the slot.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.controller.release();
        true
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.release();
    }
}
