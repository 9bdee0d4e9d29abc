//! Daemon server runtime.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::http_api::{ApiState, bind_listener, build_router};
use crate::adapters::daemon::UseCaseContainer;
use crate::common::DaemonError;
use crate::infra::daemon::{
    DaemonConfig, ShutdownSwitch, UpstreamMonitor, generate_admin_password,
};
use crate::usecases::AdminCredential;
use crate::usecases::ports::ShutdownNotifier;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

struct WatchShutdownNotifier {
    tx: watch::Sender<bool>,
}

impl ShutdownNotifier for WatchShutdownNotifier {
    fn notify(&self) {
        self.tx.send_replace(true);
    }
}

/// A running daemon. Dropping the handle does not stop the server; call
/// [`DaemonHandle::shutdown`] and then [`DaemonHandle::wait`].
pub struct DaemonHandle {
    local_addr: SocketAddr,
    switch: ShutdownSwitch,
    container: Arc<UseCaseContainer>,
    server: JoinHandle<Result<(), DaemonError>>,
    monitor: Option<JoinHandle<()>>,
}

impl DaemonHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Ends open sessions with a shutdown notice and stops accepting
    /// connections. Calling it again skips the drain timeout.
    pub fn shutdown(&self) {
        self.switch.trip("handle");
    }

    pub(crate) fn shutdown_switch(&self) -> ShutdownSwitch {
        self.switch.clone()
    }

    /// Waits for the HTTP server to stop, then logs the final counters.
    pub async fn wait(self) -> Result<(), DaemonError> {
        let result = match self.server.await {
            Ok(result) => result,
            Err(err) => Err(DaemonError::Server(format!("server task failed: {err}"))),
        };
        self.switch.mark_stopped();
        if let Some(monitor) = self.monitor {
            monitor.abort();
        }

        log_final_metrics(&self.container);
        match &result {
            Ok(()) => info!("Daemon shutdown complete"),
            Err(err) => error!(error = %err, "Daemon stopped with error"),
        }
        result
    }
}

fn log_final_metrics(container: &UseCaseContainer) {
    let metrics = container.metrics.snapshot();
    info!(
        sessions_admitted = metrics.sessions_admitted,
        admissions_rejected = metrics.admissions_rejected,
        auth_failures = metrics.auth_failures,
        ended_manual = metrics.ended_manual,
        ended_timeout = metrics.ended_timeout,
        ended_auth_failed = metrics.ended_auth_failed,
        ended_disconnect = metrics.ended_disconnect,
        tokens_issued = metrics.tokens_issued,
        tokens_outstanding = container.tokens.outstanding(),
        uptime_ms = metrics.uptime_ms,
        "Final metrics"
    );
}

fn admin_credential(config: &DaemonConfig) -> AdminCredential {
    match config.admin_password() {
        Some(password) => AdminCredential::new(config.admin_user(), password),
        None => {
            let password = generate_admin_password();
            warn!(
                username = %config.admin_user(),
                password = %password,
                "LABGATE_ADMIN_PASSWORD not set; generated an admin password for this run"
            );
            AdminCredential::new(config.admin_user(), password)
        }
    }
}

/// Binds the listener and starts serving on the current runtime.
pub async fn spawn_daemon(config: DaemonConfig) -> Result<DaemonHandle, DaemonError> {
    let (std_listener, local_addr) = bind_listener(config.listen(), config.allow_remote())?;
    let listener = tokio::net::TcpListener::from_std(std_listener)
        .map_err(|e| DaemonError::Bind(e.to_string()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let switch = ShutdownSwitch::new(Arc::new(WatchShutdownNotifier { tx: shutdown_tx }));

    let monitor = Arc::new(UpstreamMonitor::new(
        config.upstream_addr().map(str::to_string),
        config.health_interval(),
        switch.flag(),
    ));
    let monitor_task = monitor.spawn();

    let container = Arc::new(UseCaseContainer::new(
        &config,
        admin_credential(&config),
        monitor,
    ));
    let state = Arc::new(ApiState {
        container: Arc::clone(&container),
        ws_limits: Arc::new(Semaphore::new(config.max_connections())),
        ws_queue_capacity: config.ws_queue_capacity(),
        shutdown_rx: shutdown_rx.clone(),
        poll_interval_seconds: config.status_poll_interval().as_secs(),
    });
    let router = build_router(state);

    let mut graceful_rx = shutdown_rx.clone();
    let mut deadline_rx = shutdown_rx;
    let force = switch.clone();
    let server = tokio::spawn(async move {
        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = graceful_rx.wait_for(|stop| *stop).await;
        });
        tokio::select! {
            result = serve => result.map_err(|e| DaemonError::Server(e.to_string())),
            _ = async {
                let _ = deadline_rx.wait_for(|stop| *stop).await;
                tokio::select! {
                    _ = tokio::time::sleep(SHUTDOWN_TIMEOUT) => {}
                    _ = force.forced() => {}
                }
            } => {
                warn!(
                    timeout_ms = SHUTDOWN_TIMEOUT.as_millis() as u64,
                    "Closing with connections still open"
                );
                Ok(())
            }
        }
    });

    info!(
        listen = %local_addr,
        max_sessions = config.max_sessions(),
        session_duration_secs = config.session_duration().as_secs(),
        upstream = config.upstream_addr().unwrap_or("-"),
        pid = std::process::id(),
        "Lab gateway started"
    );

    Ok(DaemonHandle {
        local_addr,
        switch,
        container,
        server,
        monitor: monitor_task,
    })
}

/// Runs the daemon on a fresh runtime until SIGINT or SIGTERM.
pub fn start_daemon(config: DaemonConfig) -> Result<(), DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("labgate-worker")
        .build()
        .map_err(|e| DaemonError::Runtime(e.to_string()))?;

    runtime.block_on(async move {
        let handle = spawn_daemon(config).await?;
        install_shutdown_trigger(&handle)?;
        handle.wait().await
    })
}

#[cfg(unix)]
fn install_shutdown_trigger(handle: &DaemonHandle) -> Result<(), DaemonError> {
    use crate::infra::daemon::SignalHandler;

    // The handler thread lives for the rest of the process.
    let _handler = SignalHandler::setup(handle.shutdown_switch())?;
    Ok(())
}

#[cfg(not(unix))]
fn install_shutdown_trigger(handle: &DaemonHandle) -> Result<(), DaemonError> {
    let switch = handle.shutdown_switch();
    tokio::spawn(async move {
        loop {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    switch.trip("ctrl-c");
                }
                Err(err) => {
                    error!(error = %err, "Failed to listen for Ctrl-C");
                    break;
                }
            }
        }
    });
    Ok(())
}
