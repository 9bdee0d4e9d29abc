use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::usecases::ports::HealthProbe;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Cached health of the lab upstream.
///
/// Unhealthy while the daemon shuts down, or while the optional upstream
/// address refuses TCP connections. Reads never block; a background task
/// refreshes the cached result.
pub struct UpstreamMonitor {
    upstream: Option<String>,
    interval: Duration,
    healthy: AtomicBool,
    shutdown: Arc<AtomicBool>,
}

impl UpstreamMonitor {
    pub fn new(upstream: Option<String>, interval: Duration, shutdown: Arc<AtomicBool>) -> Self {
        // Without an upstream only the shutdown flag matters.
        let healthy = upstream.is_none();
        Self {
            upstream,
            interval,
            healthy: AtomicBool::new(healthy),
            shutdown,
        }
    }

    /// Starts the refresh task. Returns `None` when there is nothing to probe.
    pub fn spawn(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.upstream.as_ref()?;
        let monitor = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if monitor.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                monitor.refresh().await;
            }
        }))
    }

    /// Probes once and stores the result.
    pub async fn refresh(&self) -> bool {
        let Some(addr) = self.upstream.as_deref() else {
            return true;
        };
        let healthy = match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                debug!(upstream = %addr, error = %err, "Upstream probe failed");
                false
            }
            Err(_) => {
                debug!(upstream = %addr, "Upstream probe timed out");
                false
            }
        };
        let was_healthy = self.healthy.swap(healthy, Ordering::SeqCst);
        if was_healthy && !healthy {
            warn!(upstream = %addr, "Lab upstream unreachable; reporting inactive");
        } else if !was_healthy && healthy {
            info!(upstream = %addr, "Lab upstream reachable");
        }
        healthy
    }
}

impl HealthProbe for UpstreamMonitor {
    fn is_healthy(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst) && self.healthy.load(Ordering::SeqCst)
    }
}
