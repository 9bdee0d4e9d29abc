//! JSON shapes of the HTTP API and the session channel.

use serde::Deserialize;
use serde::Serialize;
use tracing::error;

use crate::domain::{ClientEvent, LabError, ServerEvent, ServiceState, StatusSnapshot};
use crate::usecases::ports::MetricsSnapshot;

pub const STATUS_ACTIVE: &str = "AKTIF";
pub const STATUS_INACTIVE: &str = "TIDAK AKTIF";

/// Client frame on `/api/terminal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientMessage {
    Authenticate { token: String },
    Input { data: String },
    EndSession,
}

/// Server frame on `/api/terminal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerMessage {
    AuthSuccess,
    AuthFail { message: String },
    TerminalOutput { data: String },
    ClearTerminal,
    SessionEnd { message: String },
    Disconnect,
}

impl From<ClientMessage> for ClientEvent {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Authenticate { token } => ClientEvent::Authenticate { token },
            ClientMessage::Input { data } => ClientEvent::Input { data },
            ClientMessage::EndSession => ClientEvent::EndSession,
        }
    }
}

impl From<ServerEvent> for ServerMessage {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::AuthSuccess => ServerMessage::AuthSuccess,
            ServerEvent::AuthFail { message } => ServerMessage::AuthFail { message },
            ServerEvent::TerminalOutput { data } => ServerMessage::TerminalOutput { data },
            ServerEvent::ClearTerminal => ServerMessage::ClearTerminal,
            ServerEvent::SessionEnd { message } => ServerMessage::SessionEnd { message },
            ServerEvent::Disconnect => ServerMessage::Disconnect,
        }
    }
}

pub fn decode_client_message(text: &str) -> Result<ClientEvent, serde_json::Error> {
    serde_json::from_str::<ClientMessage>(text).map(ClientEvent::from)
}

pub fn encode_server_event(event: ServerEvent) -> String {
    serde_json::to_string(&ServerMessage::from(event)).unwrap_or_else(|err| {
        error!(error = %err, "Failed to serialize session event");
        "{\"event\":\"disconnect\"}".to_string()
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub active_sessions: usize,
    pub max_sessions: usize,
    pub poll_interval_seconds: u64,
}

impl StatusResponse {
    pub fn from_snapshot(snapshot: StatusSnapshot, poll_interval_seconds: u64) -> Self {
        let status = match snapshot.state {
            ServiceState::Active => STATUS_ACTIVE,
            ServiceState::Inactive => STATUS_INACTIVE,
        };
        Self {
            status: status.to_string(),
            active_sessions: snapshot.active_sessions,
            max_sessions: snapshot.max_sessions,
            poll_interval_seconds,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueTokenRequest {
    #[serde(default)]
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTokenResponse {
    pub token_string: String,
    pub issued_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub retryable: bool,
}

impl ErrorResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: None,
            retryable: false,
        }
    }
}

impl From<&LabError> for ErrorResponse {
    fn from(err: &LabError) -> Self {
        Self {
            error: err.user_message(),
            code: Some(err.code().to_string()),
            retryable: err.is_retryable(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub sessions_admitted: u64,
    pub admissions_rejected: u64,
    pub auth_failures: u64,
    pub ended: EndedCounts,
    pub tokens_issued: u64,
    pub tokens_outstanding: usize,
    pub active_sessions: usize,
    pub max_sessions: usize,
    pub uptime_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndedCounts {
    pub manual: u64,
    pub timeout: u64,
    pub auth_failed: u64,
    pub disconnect: u64,
}

impl MetricsResponse {
    pub fn new(
        metrics: MetricsSnapshot,
        tokens_outstanding: usize,
        active_sessions: usize,
        max_sessions: usize,
    ) -> Self {
        Self {
            sessions_admitted: metrics.sessions_admitted,
            admissions_rejected: metrics.admissions_rejected,
            auth_failures: metrics.auth_failures,
            ended: EndedCounts {
                manual: metrics.ended_manual,
                timeout: metrics.ended_timeout,
                auth_failed: metrics.ended_auth_failed,
                disconnect: metrics.ended_disconnect,
            },
            tokens_issued: metrics.tokens_issued,
            tokens_outstanding,
            active_sessions,
            max_sessions,
            uptime_ms: metrics.uptime_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CapacitySnapshot;
    use serde_json::json;

    #[test]
    fn test_client_frames_use_kebab_case_tags() {
        assert_eq!(
            decode_client_message(r#"{"event":"authenticate","token":"LAB-AAAA-BBBB"}"#).unwrap(),
            ClientEvent::Authenticate {
                token: "LAB-AAAA-BBBB".to_string()
            }
        );
        assert_eq!(
            decode_client_message(r#"{"event":"end-session"}"#).unwrap(),
            ClientEvent::EndSession
        );
        assert!(decode_client_message(r#"{"event":"resize","cols":80}"#).is_err());
        assert!(decode_client_message("not json").is_err());
    }

    #[test]
    fn test_server_frames_serialize_as_tagged_objects() {
        let value: serde_json::Value = serde_json::from_str(&encode_server_event(
            ServerEvent::AuthFail {
                message: "nope".to_string(),
            },
        ))
        .unwrap();
        assert_eq!(value, json!({"event": "auth-fail", "message": "nope"}));

        let value: serde_json::Value =
            serde_json::from_str(&encode_server_event(ServerEvent::ClearTerminal)).unwrap();
        assert_eq!(value, json!({"event": "clear-terminal"}));
    }

    #[test]
    fn test_status_response_labels() {
        let capacity = CapacitySnapshot {
            active: 1,
            max_sessions: 3,
        };
        let active = StatusResponse::from_snapshot(
            StatusSnapshot::new(ServiceState::Active, capacity),
            10,
        );
        assert_eq!(
            serde_json::to_value(&active).unwrap(),
            json!({
                "status": "AKTIF",
                "active_sessions": 1,
                "max_sessions": 3,
                "poll_interval_seconds": 10
            })
        );
        let inactive = StatusResponse::from_snapshot(
            StatusSnapshot::new(ServiceState::Inactive, capacity),
            10,
        );
        assert_eq!(inactive.status, "TIDAK AKTIF");
        assert!(!inactive.is_active());
    }

    #[test]
    fn test_issue_token_request_accepts_empty_body() {
        let request: IssueTokenRequest = serde_json::from_str("{}").unwrap();
        assert!(request.admin_token.is_none());
    }

    #[test]
    fn test_error_response_from_lab_error() {
        let body = ErrorResponse::from(&LabError::ServerFull { max_sessions: 3 });
        assert_eq!(body.code.as_deref(), Some("SERVER_FULL"));
        assert!(body.retryable);
        assert!(body.error.starts_with("Server penuh"));
    }
}
