//! Capacity and service status snapshots.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacitySnapshot {
    pub active: usize,
    pub max_sessions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: ServiceState,
    pub active_sessions: usize,
    pub max_sessions: usize,
}

impl StatusSnapshot {
    pub fn new(state: ServiceState, capacity: CapacitySnapshot) -> Self {
        Self {
            state,
            active_sessions: capacity.active,
            max_sessions: capacity.max_sessions,
        }
    }
}
