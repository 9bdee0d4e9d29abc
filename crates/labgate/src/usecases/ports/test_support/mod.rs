//! Deterministic port implementations for unit tests.

mod doubles;
mod manual_clock;
mod sequence_entropy;

pub use doubles::{AlwaysHealthy, NoopMetrics};
pub use manual_clock::ManualClock;
pub use sequence_entropy::SequenceEntropy;
