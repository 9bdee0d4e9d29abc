use std::sync::Arc;

use crate::domain::{ServiceState, StatusSnapshot};
use crate::usecases::admission::AdmissionController;
use crate::usecases::ports::HealthProbe;

pub trait StatusUseCase: Send + Sync {
    fn execute(&self) -> StatusSnapshot;
}

/// Combines live capacity with the health probe.
pub struct StatusUseCaseImpl {
    admission: Arc<AdmissionController>,
    health: Arc<dyn HealthProbe>,
}

impl StatusUseCaseImpl {
    pub fn new(admission: Arc<AdmissionController>, health: Arc<dyn HealthProbe>) -> Self {
        Self { admission, health }
    }
}

impl StatusUseCase for StatusUseCaseImpl {
    fn execute(&self) -> StatusSnapshot {
        let state = if self.health.is_healthy() {
            ServiceState::Active
        } else {
            ServiceState::Inactive
        };
        StatusSnapshot::new(state, self.admission.snapshot())
    }
}
