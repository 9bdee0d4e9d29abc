//! WebSocket bridge between a browser terminal and its session task.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::CloseFrame;
use axum::extract::ws::Message;
use axum::extract::ws::WebSocket;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::close_code;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::error;
use tracing::warn;

use super::http_api::{ApiState, error_response, lab_error_response};
use super::session_driver::drive_session;
use crate::adapters::wire::{decode_client_message, encode_server_event};
use crate::domain::{ClientEvent, LabError, ServerEvent, ServiceState};
use crate::usecases::{Session, StatusUseCase};

const WS_MAX_PARSE_ERRORS: u8 = 3;

#[derive(Debug, PartialEq, Eq)]
enum Delivery {
    Queued,
    /// Keystrokes lost to a full queue.
    Dropped,
    /// A control event did not fit; the channel has to close.
    Overflow,
}

fn queue_client_event(in_tx: &mpsc::Sender<ClientEvent>, event: ClientEvent) -> Delivery {
    match in_tx.try_send(event) {
        Ok(()) => Delivery::Queued,
        Err(TrySendError::Full(ClientEvent::Input { .. })) => Delivery::Dropped,
        Err(TrySendError::Full(_)) => Delivery::Overflow,
        // The driver already ended; its final events are still draining.
        Err(TrySendError::Closed(_)) => Delivery::Queued,
    }
}

pub(crate) async fn terminal_handler(
    State(state): State<Arc<ApiState>>,
    ws: WebSocketUpgrade,
) -> Response {
    if *state.shutdown_rx.borrow() {
        return lab_error_response(&LabError::UpstreamUnavailable);
    }
    if state.container.status.execute().state == ServiceState::Inactive {
        return lab_error_response(&LabError::UpstreamUnavailable);
    }
    let permit = match state.ws_limits.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => return error_response(StatusCode::SERVICE_UNAVAILABLE, "too many connections"),
    };

    ws.on_upgrade(move |socket| async move {
        handle_terminal(socket, state, permit).await;
    })
    .into_response()
}

async fn handle_terminal(
    mut socket: WebSocket,
    state: Arc<ApiState>,
    _permit: OwnedSemaphorePermit,
) {
    let (in_tx, in_rx) = mpsc::channel(state.ws_queue_capacity);
    let (out_tx, mut out_rx) = mpsc::channel::<ServerEvent>(state.ws_queue_capacity);
    let session = Session::new(state.container.session_deps.clone());
    let driver = tokio::spawn(drive_session(
        session,
        in_rx,
        out_tx,
        state.shutdown_rx.clone(),
    ));

    let mut parse_errors = 0u8;
    loop {
        tokio::select! {
            maybe = out_rx.recv() => {
                let Some(event) = maybe else {
                    break;
                };
                let last = event.is_terminal();
                if socket.send(Message::Text(encode_server_event(event))).await.is_err() {
                    break;
                }
                if last {
                    let _ = socket.send(Message::Close(Some(CloseFrame {
                        code: close_code::NORMAL,
                        reason: "session ended".into(),
                    }))).await;
                    break;
                }
            }
            msg = socket.recv() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(_)) | None => break,
                };
                match msg {
                    Message::Text(text) => match decode_client_message(&text) {
                        Ok(event) => {
                            parse_errors = 0;
                            match queue_client_event(&in_tx, event) {
                                Delivery::Queued => {}
                                Delivery::Dropped => {
                                    warn!("Session input queue full; dropping keystrokes");
                                }
                                Delivery::Overflow => {
                                    warn!("Session input queue full; closing channel");
                                    let _ = socket.send(Message::Close(Some(CloseFrame {
                                        code: close_code::AGAIN,
                                        reason: "session input overflow".into(),
                                    }))).await;
                                    break;
                                }
                            }
                        }
                        Err(err) => {
                            parse_errors = parse_errors.saturating_add(1);
                            warn!(error = %err, parse_errors, "Ignoring malformed session frame");
                            if parse_errors >= WS_MAX_PARSE_ERRORS {
                                let _ = socket.send(Message::Close(Some(CloseFrame {
                                    code: close_code::POLICY,
                                    reason: "too many malformed frames".into(),
                                }))).await;
                                break;
                            }
                        }
                    },
                    Message::Binary(_) => {
                        let _ = socket.send(Message::Close(Some(CloseFrame {
                            code: close_code::PROTOCOL,
                            reason: "binary frames are not supported".into(),
                        }))).await;
                        break;
                    }
                    Message::Ping(payload) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => break,
                }
            }
        }
    }

    // Closing both ends unblocks the driver whichever side it is waiting on.
    drop(in_tx);
    drop(out_rx);
    if let Err(err) = driver.await {
        error!(error = %err, "Session task failed");
    }
}
