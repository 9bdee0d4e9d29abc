use thiserror::Error;

/// Failures that stop the daemon from starting or running.
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Invalid listen address: {0}")]
    InvalidListen(String),
    #[error("Failed to bind listener: {0}")]
    Bind(String),
    #[error("Failed to setup signal handler: {0}")]
    SignalSetup(String),
    #[error("Failed to create runtime: {0}")]
    Runtime(String),
    #[error("Server stopped unexpectedly: {0}")]
    Server(String),
}

impl DaemonError {
    pub fn suggestion(&self) -> String {
        match self {
            DaemonError::InvalidListen(_) => {
                "Use host:port, e.g. LABGATE_LISTEN=127.0.0.1:8080. \
                 Set LABGATE_ALLOW_REMOTE=1 to bind a public address."
                    .to_string()
            }
            DaemonError::Bind(_) => {
                "Another process may be using the port. Pick another with --listen.".to_string()
            }
            DaemonError::SignalSetup(_) => {
                "Signal handler setup failed. Check system signal configuration.".to_string()
            }
            DaemonError::Runtime(_) => {
                "Runtime creation failed. Check system thread limits (ulimit -u).".to_string()
            }
            DaemonError::Server(_) => "Check the daemon log for the failing request.".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DaemonError::Bind(_))
    }
}
