use thiserror::Error;

use crate::common::DaemonError;

#[derive(Debug, Error)]
pub(crate) enum ApiServerError {
    #[error("Invalid listen address: {message}")]
    InvalidListen { message: String },
    #[error("API server I/O error ({operation}): {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl From<ApiServerError> for DaemonError {
    fn from(err: ApiServerError) -> Self {
        match err {
            ApiServerError::InvalidListen { message } => DaemonError::InvalidListen(message),
            ApiServerError::Io { .. } => DaemonError::Bind(err.to_string()),
        }
    }
}
