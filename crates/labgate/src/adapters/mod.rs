pub mod daemon;
pub mod wire;
