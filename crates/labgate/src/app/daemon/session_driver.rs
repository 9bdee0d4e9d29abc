//! Async task that runs one [`Session`] against its channels and deadline.

use std::future::pending;

use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::Instrument;
use tracing::debug;
use tracing::info;
use tracing::info_span;

use crate::domain::{ClientEvent, EndReason, ServerEvent, SessionStatus};
use crate::usecases::Session;

/// Feeds client events and deadline expiries into `session` until it ends.
///
/// The deadline timer lives inside this task, so dropping or finishing the task
/// cancels it. A closed `inbound` channel means the transport is gone.
pub(crate) async fn drive_session(
    mut session: Session,
    mut inbound: mpsc::Receiver<ClientEvent>,
    outbound: mpsc::Sender<ServerEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Option<EndReason> {
    let span = info_span!("session", id = %session.id());
    async move {
        session.transport_ready();
        debug!("Session channel open");

        if *shutdown_rx.borrow_and_update() {
            let events = session.shutdown();
            forward(&outbound, events).await;
        }

        while !session.is_ended() {
            let before = session.status();
            let deadline = session.next_deadline();
            let events = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_ok() && !*shutdown_rx.borrow_and_update() {
                        continue;
                    }
                    session.shutdown()
                }
                _ = sleep_until(deadline) => session.poll_deadline(),
                maybe = inbound.recv() => match maybe {
                    Some(event) => session.handle(event),
                    None => {
                        session.disconnect();
                        break;
                    }
                },
            };

            if before != SessionStatus::Active && session.status() == SessionStatus::Active {
                info!(
                    token = %session.token().map(|t| t.redacted()).unwrap_or_default(),
                    "Session admitted"
                );
            }

            if !forward(&outbound, events).await {
                session.disconnect();
                break;
            }
        }

        let reason = session.end_reason();
        if let Some(reason) = reason {
            info!(reason = %reason, "Session ended");
        }
        reason
    }
    .instrument(span)
    .await
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(Instant::from_std(deadline)).await,
        None => pending::<()>().await,
    }
}

/// Returns `false` once the transport side has gone away.
async fn forward(outbound: &mpsc::Sender<ServerEvent>, events: Vec<ServerEvent>) -> bool {
    for event in events {
        if outbound.send(event).await.is_err() {
            return false;
        }
    }
    true
}
