//! Daemon application wiring and startup logic.

mod http_api;
mod server;
mod session_driver;
mod terminal_ws;
mod usecase_container;

pub use server::{DaemonHandle, spawn_daemon, start_daemon};
