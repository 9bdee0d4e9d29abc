//! Typed events exchanged on the session channel.

/// Event received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Authenticate { token: String },
    Input { data: String },
    EndSession,
}

/// Event emitted towards the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    AuthSuccess,
    AuthFail { message: String },
    TerminalOutput { data: String },
    ClearTerminal,
    SessionEnd { message: String },
    /// Last event of a channel; the transport closes after sending it.
    Disconnect,
}

impl ServerEvent {
    pub fn output(data: impl Into<String>) -> Self {
        ServerEvent::TerminalOutput { data: data.into() }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerEvent::Disconnect)
    }
}
