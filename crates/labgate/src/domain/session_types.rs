//! Session identifier and lifecycle types.

use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Short random id, the first eight hex digits of a v4 uuid.
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Connecting,
    Authenticating,
    Active,
    Ended,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Connecting => "connecting",
            SessionStatus::Authenticating => "authenticating",
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndReason {
    Manual,
    Timeout,
    AuthFailed,
    Disconnect,
}

impl EndReason {
    pub const ALL: [EndReason; 4] = [
        EndReason::Manual,
        EndReason::Timeout,
        EndReason::AuthFailed,
        EndReason::Disconnect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::Manual => "manual",
            EndReason::Timeout => "timeout",
            EndReason::AuthFailed => "auth-failed",
            EndReason::Disconnect => "disconnect",
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
