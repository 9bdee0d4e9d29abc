pub trait HealthProbe: Send + Sync {
    fn is_healthy(&self) -> bool;
}
