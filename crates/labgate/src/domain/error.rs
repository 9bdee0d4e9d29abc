use thiserror::Error;

use crate::domain::messages;

/// Errors surfaced to lab clients.
///
/// `Display` is for logs; clients only ever see [`LabError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabError {
    #[error("access token is unknown or already consumed")]
    InvalidToken,
    #[error("admin credential or admin token rejected")]
    Unauthorized,
    #[error("all {max_sessions} session slots are in use")]
    ServerFull { max_sessions: usize },
    #[error("lab upstream is unavailable")]
    UpstreamUnavailable,
}

impl LabError {
    pub fn code(&self) -> &'static str {
        match self {
            LabError::InvalidToken => "INVALID_TOKEN",
            LabError::Unauthorized => "UNAUTHORIZED",
            LabError::ServerFull { .. } => "SERVER_FULL",
            LabError::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LabError::ServerFull { .. } | LabError::UpstreamUnavailable
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            LabError::InvalidToken => messages::INVALID_TOKEN.to_string(),
            LabError::Unauthorized => messages::UNAUTHORIZED.to_string(),
            LabError::ServerFull { max_sessions } => messages::server_full(*max_sessions),
            LabError::UpstreamUnavailable => messages::UPSTREAM_UNAVAILABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(LabError::ServerFull { max_sessions: 3 }.is_retryable());
        assert!(LabError::UpstreamUnavailable.is_retryable());
        assert!(!LabError::InvalidToken.is_retryable());
        assert!(!LabError::Unauthorized.is_retryable());
    }

    #[test]
    fn test_user_message_hides_internal_wording() {
        let err = LabError::ServerFull { max_sessions: 3 };
        assert_eq!(
            err.user_message(),
            "Server penuh (3/3 sesi). Silakan coba lagi nanti."
        );
        assert_eq!(
            LabError::InvalidToken.user_message(),
            "Token tidak valid atau sudah digunakan"
        );
    }
}
