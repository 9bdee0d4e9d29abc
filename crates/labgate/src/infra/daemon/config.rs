//! Daemon configuration.

use std::env;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::warn;

use crate::usecases::{
    DEFAULT_AUTH_TIMEOUT, DEFAULT_GRACE_PERIOD, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_DURATION,
    SessionPolicy,
};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_STATUS_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_MAX_CONNECTIONS: usize = 32;
const DEFAULT_WS_QUEUE_CAPACITY: usize = 128;
const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 5;
const GENERATED_PASSWORD_LEN: usize = 16;
/// Upper bound for every configured duration, in seconds (one week).
pub const MAX_DURATION_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_DURATION: Duration = Duration::from_secs(MAX_DURATION_SECS);

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    listen: String,
    allow_remote: bool,
    max_sessions: usize,
    session_duration: Duration,
    grace_period: Duration,
    auth_timeout: Duration,
    status_poll_interval: Duration,
    max_connections: usize,
    ws_queue_capacity: usize,
    refund_on_full: bool,
    admin_user: String,
    admin_password: Option<String>,
    upstream_addr: Option<String>,
    health_interval: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl DaemonConfig {
    pub fn listen(&self) -> &str {
        &self.listen
    }

    pub fn allow_remote(&self) -> bool {
        self.allow_remote
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn auth_timeout(&self) -> Duration {
        self.auth_timeout
    }

    pub fn status_poll_interval(&self) -> Duration {
        self.status_poll_interval
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn ws_queue_capacity(&self) -> usize {
        self.ws_queue_capacity
    }

    pub fn refund_on_full(&self) -> bool {
        self.refund_on_full
    }

    pub fn admin_user(&self) -> &str {
        &self.admin_user
    }

    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password.as_deref()
    }

    pub fn upstream_addr(&self) -> Option<&str> {
        self.upstream_addr.as_deref()
    }

    pub fn health_interval(&self) -> Duration {
        self.health_interval
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            duration: self.session_duration,
            grace: self.grace_period,
            auth_timeout: self.auth_timeout,
            refund_on_full: self.refund_on_full,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = &lookup;
        Self {
            listen: parse_string(lookup, "LABGATE_LISTEN")
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            allow_remote: parse_bool(lookup, "LABGATE_ALLOW_REMOTE", false),
            max_sessions: parse_usize(lookup, "LABGATE_MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
            session_duration: parse_duration_secs(
                lookup,
                "LABGATE_SESSION_DURATION",
                DEFAULT_SESSION_DURATION.as_secs(),
                1,
            ),
            grace_period: parse_duration_secs(
                lookup,
                "LABGATE_GRACE_PERIOD",
                DEFAULT_GRACE_PERIOD.as_secs(),
                0,
            ),
            auth_timeout: parse_duration_secs(
                lookup,
                "LABGATE_AUTH_TIMEOUT",
                DEFAULT_AUTH_TIMEOUT.as_secs(),
                1,
            ),
            status_poll_interval: parse_duration_secs(
                lookup,
                "LABGATE_STATUS_POLL_INTERVAL",
                DEFAULT_STATUS_POLL_INTERVAL_SECS,
                1,
            ),
            max_connections: parse_positive_usize(
                lookup,
                "LABGATE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            ),
            ws_queue_capacity: parse_positive_usize(
                lookup,
                "LABGATE_WS_QUEUE",
                DEFAULT_WS_QUEUE_CAPACITY,
            ),
            refund_on_full: parse_bool(lookup, "LABGATE_REFUND_ON_FULL", true),
            admin_user: parse_string(lookup, "LABGATE_ADMIN_USER")
                .unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()),
            admin_password: parse_string(lookup, "LABGATE_ADMIN_PASSWORD"),
            upstream_addr: parse_string(lookup, "LABGATE_UPSTREAM_ADDR"),
            health_interval: parse_duration_secs(
                lookup,
                "LABGATE_HEALTH_INTERVAL",
                DEFAULT_HEALTH_INTERVAL_SECS,
                1,
            ),
        }
    }

    pub fn with_listen(mut self, listen: impl Into<String>) -> Self {
        self.listen = listen.into();
        self
    }

    pub fn with_allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    pub fn with_session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration.min(MAX_DURATION);
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace.min(MAX_DURATION);
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout.min(MAX_DURATION);
        self
    }

    pub fn with_status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = interval.min(MAX_DURATION);
        self
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn with_refund_on_full(mut self, refund: bool) -> Self {
        self.refund_on_full = refund;
        self
    }

    pub fn with_admin_credential(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.admin_user = user.into();
        self.admin_password = Some(password.into());
        self
    }

    pub fn with_upstream_addr(mut self, addr: Option<String>) -> Self {
        self.upstream_addr = addr;
        self
    }

    pub fn with_health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = interval.min(MAX_DURATION);
        self
    }
}

/// Random admin password for when none is configured.
pub fn generate_admin_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

fn parse_string(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    let value = lookup(key)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    let Some(value) = parse_string(lookup, key) else {
        return default;
    };
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(value = %value, key, "Invalid boolean config; using default");
            default
        }
    }
}

fn parse_usize(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    let Some(value) = parse_string(lookup, key) else {
        return default;
    };
    match value.parse::<usize>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid numeric config; using default");
            default
        }
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    let Some(value) = parse_string(lookup, key) else {
        return default;
    };
    match value.parse::<u64>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid numeric config; using default");
            default
        }
    }
}

fn parse_positive_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> usize {
    match parse_usize(lookup, key, default) {
        0 => {
            warn!(key, "Config value must be at least 1; using default");
            default
        }
        parsed => parsed,
    }
}

fn parse_duration_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
    min: u64,
) -> Duration {
    let secs = match parse_u64(lookup, key, default) {
        parsed if parsed < min => {
            warn!(key, min, "Duration config below minimum; using default");
            default
        }
        parsed if parsed > MAX_DURATION_SECS => {
            warn!(
                key,
                max = MAX_DURATION_SECS,
                "Duration config above maximum; using default"
            );
            default
        }
        parsed => parsed,
    };
    Duration::from_secs(secs)
}
