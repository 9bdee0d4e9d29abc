use thiserror::Error;

/// Failures talking to a running gateway over HTTP.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to reach gateway at {url}: {source}")]
    ConnectionFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Gateway rejected the request ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        code: Option<String>,
        retryable: bool,
    },

    #[error("Invalid response from gateway: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ConnectionFailed { .. } => true,
            ClientError::Rejected { retryable, .. } => *retryable,
            ClientError::InvalidResponse(_) => false,
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            ClientError::ConnectionFailed { .. } => Some(
                "Start the gateway with 'labgate serve' or pass --url to point at it.".to_string(),
            ),
            ClientError::Rejected { status: 401, .. } => {
                Some("Check the admin username and password.".to_string())
            }
            ClientError::Rejected { .. } | ClientError::InvalidResponse(_) => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_carries_server_retryability() {
        let err = ClientError::Rejected {
            status: 503,
            message: "full".into(),
            code: Some("SERVER_FULL".into()),
            retryable: true,
        };
        assert!(err.is_retryable());
        assert_eq!(err.code(), Some("SERVER_FULL"));
        assert!(err.suggestion().is_none());
    }

    #[test]
    fn test_unauthorized_suggests_credentials() {
        let err = ClientError::Rejected {
            status: 401,
            message: "no".into(),
            code: Some("UNAUTHORIZED".into()),
            retryable: false,
        };
        assert!(!err.is_retryable());
        assert!(err.suggestion().unwrap().contains("password"));
    }
}
