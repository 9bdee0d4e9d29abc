#![deny(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod adapters;
mod app;
mod common;
mod domain;
mod infra;
mod usecases;

pub use adapters::wire;
pub use app::Application;
pub use app::daemon::{DaemonHandle, spawn_daemon};
pub use common::DaemonError;
pub use infra::daemon::DaemonConfig;
pub use infra::http_client::{ApiClient, ClientError};
