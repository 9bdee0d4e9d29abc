//! Harness that runs a real gateway on an ephemeral loopback port.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::SinkExt;
use futures_util::StreamExt;
use labgate::{ApiClient, DaemonConfig, DaemonHandle, spawn_daemon};
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse";

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

pub type Terminal = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub fn test_config() -> DaemonConfig {
    DaemonConfig::default()
        .with_listen("127.0.0.1:0")
        .with_admin_credential(ADMIN_USER, ADMIN_PASSWORD)
}

pub struct TestGateway {
    handle: DaemonHandle,
    pub client: ApiClient,
}

impl TestGateway {
    pub async fn start(config: DaemonConfig) -> Self {
        let handle = spawn_daemon(config).await.expect("gateway should start");
        let client = ApiClient::new(handle.base_url()).expect("client should build");
        Self { handle, client }
    }

    pub fn base_url(&self) -> String {
        self.handle.base_url()
    }

    pub async fn admin_token(&self) -> String {
        self.client
            .login(ADMIN_USER, ADMIN_PASSWORD)
            .await
            .expect("admin login should succeed")
    }

    pub async fn issue_token(&self) -> String {
        let admin = self.admin_token().await;
        self.client
            .issue_token(&admin)
            .await
            .expect("token should be issued")
            .token_string
    }

    pub async fn connect(&self) -> Terminal {
        let url = format!("ws://{}/api/terminal", self.handle.local_addr());
        let (socket, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("terminal channel should open");
        socket
    }

    pub async fn active_sessions(&self) -> usize {
        self.client
            .status()
            .await
            .expect("status should be served")
            .active_sessions
    }

    pub async fn stop(self) {
        self.handle.shutdown();
        self.handle.wait().await.expect("gateway should stop cleanly");
    }
}

pub async fn send_event(socket: &mut Terminal, event: Value) {
    socket
        .send(Message::Text(event.to_string()))
        .await
        .expect("frame should send");
}

pub async fn send_raw(socket: &mut Terminal, text: &str) {
    socket
        .send(Message::Text(text.to_string()))
        .await
        .expect("frame should send");
}

pub async fn authenticate(socket: &mut Terminal, token: &str) {
    send_event(socket, json!({"event": "authenticate", "token": token})).await;
}

/// Next JSON event, or `None` once the server closes the channel.
pub async fn next_event(socket: &mut Terminal) -> Option<Value> {
    loop {
        let frame = tokio::time::timeout(FRAME_TIMEOUT, socket.next())
            .await
            .expect("server frame should arrive in time")?;
        match frame.ok()? {
            Message::Text(text) => {
                return Some(serde_json::from_str(&text).expect("server frames are JSON"));
            }
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// Reads events until one named `name` arrives and returns it.
pub async fn expect_event(socket: &mut Terminal, name: &str) -> Value {
    loop {
        let event = next_event(socket)
            .await
            .unwrap_or_else(|| panic!("channel closed before `{name}`"));
        if event["event"] == name {
            return event;
        }
    }
}

/// Collects terminal output until `needle` appears.
pub async fn read_output_until(socket: &mut Terminal, needle: &str) -> String {
    let mut output = String::new();
    while !output.contains(needle) {
        let event = next_event(socket)
            .await
            .unwrap_or_else(|| panic!("channel closed before output contained {needle:?}"));
        if event["event"] == "terminal-output" {
            output.push_str(event["data"].as_str().unwrap_or_default());
        }
    }
    output
}

/// Waits for the server's close frame, skipping any remaining text frames.
pub async fn close_frame(socket: &mut Terminal) -> Option<CloseFrame<'static>> {
    loop {
        let frame = tokio::time::timeout(FRAME_TIMEOUT, socket.next())
            .await
            .expect("close should arrive in time")?;
        match frame {
            Ok(Message::Close(frame)) => return frame.map(CloseFrame::into_owned),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}
