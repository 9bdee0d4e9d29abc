//! One terminal session as a sans-IO state machine.
//!
//! Every method reads the current instant from the [`Clock`] port and returns the
//! server events to emit. The caller owns the transport and the timers; it asks
//! [`Session::next_deadline`] when to call [`Session::poll_deadline`] again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::messages;
use crate::domain::{
    ClientEvent, Control, DispatchContext, EndReason, LabError, PROMPT, ServerEvent, SessionId,
    SessionStatus, TokenString, dispatch,
};
use crate::usecases::admission::{AdmissionController, SessionLease};
use crate::usecases::ports::{Clock, MetricsSink};
use crate::usecases::token_store::TokenStore;

pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(3600);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_LINE_BYTES: usize = 1024;

const BACKSPACE_ECHO: &str = "\x08 \x08";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub duration: Duration,
    pub grace: Duration,
    pub auth_timeout: Duration,
    pub refund_on_full: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            duration: DEFAULT_SESSION_DURATION,
            grace: DEFAULT_GRACE_PERIOD,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            refund_on_full: true,
        }
    }
}

/// Shared collaborators handed to every new session.
#[derive(Clone)]
pub struct SessionDeps {
    pub tokens: Arc<TokenStore>,
    pub admission: Arc<AdmissionController>,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<dyn MetricsSink>,
    pub policy: SessionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    Esc,
    Csi,
    Ss3,
}

pub struct Session {
    id: SessionId,
    deps: SessionDeps,
    status: SessionStatus,
    opened_at: Instant,
    started_at: Option<Instant>,
    expiry_notified_at: Option<Instant>,
    token: Option<TokenString>,
    lease: Option<SessionLease>,
    end_reason: Option<EndReason>,
    line: String,
    escape: Escape,
    skip_lf: bool,
}

impl Session {
    pub fn new(deps: SessionDeps) -> Self {
        let opened_at = deps.clock.now();
        Self {
            id: SessionId::generate(),
            deps,
            status: SessionStatus::Connecting,
            opened_at,
            started_at: None,
            expiry_notified_at: None,
            token: None,
            lease: None,
            end_reason: None,
            line: String::new(),
            escape: Escape::None,
            skip_lf: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn token(&self) -> Option<&TokenString> {
        self.token.as_ref()
    }

    pub fn is_ended(&self) -> bool {
        self.status == SessionStatus::Ended
    }

    /// The channel is open; the authentication deadline starts now.
    pub fn transport_ready(&mut self) -> Vec<ServerEvent> {
        if self.status == SessionStatus::Connecting {
            self.opened_at = self.deps.clock.now();
            self.status = SessionStatus::Authenticating;
        }
        Vec::new()
    }

    pub fn handle(&mut self, event: ClientEvent) -> Vec<ServerEvent> {
        match event {
            ClientEvent::Authenticate { token } => self.authenticate(&token),
            ClientEvent::Input { data } => self.input(&data),
            ClientEvent::EndSession => self.end_session(),
        }
    }

    /// Redeems the token, then asks for a capacity slot.
    pub fn authenticate(&mut self, raw_token: &str) -> Vec<ServerEvent> {
        if self.status == SessionStatus::Connecting {
            self.transport_ready();
        }
        if self.status != SessionStatus::Authenticating {
            return Vec::new();
        }

        let token = match self.deps.tokens.redeem(raw_token) {
            Ok(token) => token,
            Err(err) => {
                self.deps.metrics.auth_failed();
                return self.fail_auth(&err);
            }
        };

        let Some(lease) = SessionLease::acquire(&self.deps.admission) else {
            self.deps.metrics.admission_rejected();
            if self.deps.policy.refund_on_full {
                self.deps.tokens.refund(token.value());
            } else {
                self.deps.tokens.finalize(token.value());
            }
            let err = LabError::ServerFull {
                max_sessions: self.deps.admission.max_sessions(),
            };
            return self.fail_auth(&err);
        };

        self.deps.metrics.session_admitted();
        self.token = Some(token.value().clone());
        self.lease = Some(lease);
        self.started_at = Some(self.deps.clock.now());
        self.status = SessionStatus::Active;

        vec![
            ServerEvent::AuthSuccess,
            ServerEvent::output(messages::welcome_banner(self.deps.policy.duration, PROMPT)),
        ]
    }

    /// Echoes raw input, buffers it into lines and runs complete lines.
    pub fn input(&mut self, data: &str) -> Vec<ServerEvent> {
        if self.status != SessionStatus::Active || self.expiry_notified_at.is_some() {
            return Vec::new();
        }

        let mut events = Vec::new();
        let mut echo = String::new();
        for ch in data.chars() {
            if self.consume_escape(ch) {
                continue;
            }
            if ch == '\n' && self.skip_lf {
                self.skip_lf = false;
                continue;
            }
            self.skip_lf = ch == '\r';

            match ch {
                '\r' | '\n' => {
                    flush_echo(&mut echo, &mut events);
                    let line = std::mem::take(&mut self.line);
                    if self.run_line(&line, &mut events) {
                        return events;
                    }
                }
                '\x7f' | '\x08' => {
                    if self.line.pop().is_some() {
                        echo.push_str(BACKSPACE_ECHO);
                    }
                }
                '\x03' => {
                    self.line.clear();
                    echo.push_str("^C\r\n");
                    echo.push_str(PROMPT);
                }
                c if c.is_control() => {}
                c => {
                    if self.line.len() + c.len_utf8() <= MAX_LINE_BYTES {
                        self.line.push(c);
                        echo.push(c);
                    }
                }
            }
        }
        flush_echo(&mut echo, &mut events);
        events
    }

    pub fn end_session(&mut self) -> Vec<ServerEvent> {
        self.end(EndReason::Manual, true)
    }

    /// The transport is gone; nothing can be sent any more.
    pub fn disconnect(&mut self) {
        let _ = self.end(EndReason::Disconnect, false);
    }

    /// The daemon is stopping.
    pub fn shutdown(&mut self) -> Vec<ServerEvent> {
        if self.is_ended() {
            return Vec::new();
        }
        let mut events = vec![ServerEvent::SessionEnd {
            message: messages::SERVER_SHUTDOWN.to_string(),
        }];
        events.extend(self.end(EndReason::Disconnect, true));
        events
    }

    /// The instant at which [`Session::poll_deadline`] has work to do.
    ///
    /// `None` when nothing is pending, or when the deadline lies past what
    /// `Instant` can represent.
    pub fn next_deadline(&self) -> Option<Instant> {
        let policy = &self.deps.policy;
        match self.status {
            SessionStatus::Connecting | SessionStatus::Ended => None,
            SessionStatus::Authenticating => self.opened_at.checked_add(policy.auth_timeout),
            SessionStatus::Active => match (self.expiry_notified_at, self.started_at) {
                (Some(notified), _) => notified.checked_add(policy.grace),
                (None, Some(started)) => started.checked_add(policy.duration),
                (None, None) => None,
            },
        }
    }

    pub fn poll_deadline(&mut self) -> Vec<ServerEvent> {
        let now = self.deps.clock.now();
        let policy = self.deps.policy;
        match self.status {
            SessionStatus::Connecting | SessionStatus::Ended => Vec::new(),
            SessionStatus::Authenticating => {
                if now.saturating_duration_since(self.opened_at) < policy.auth_timeout {
                    return Vec::new();
                }
                self.deps.metrics.auth_failed();
                let mut events = vec![ServerEvent::AuthFail {
                    message: messages::AUTH_TIMEOUT.to_string(),
                }];
                events.extend(self.end(EndReason::AuthFailed, true));
                events
            }
            SessionStatus::Active => {
                if let Some(notified) = self.expiry_notified_at {
                    if now.saturating_duration_since(notified) >= policy.grace {
                        return self.end(EndReason::Timeout, true);
                    }
                    return Vec::new();
                }
                let Some(started) = self.started_at else {
                    return Vec::new();
                };
                if now.saturating_duration_since(started) < policy.duration {
                    return Vec::new();
                }
                self.expiry_notified_at = Some(now);
                let mut events = vec![ServerEvent::SessionEnd {
                    message: messages::session_timeout(policy.duration),
                }];
                if policy.grace.is_zero() {
                    events.extend(self.end(EndReason::Timeout, true));
                }
                events
            }
        }
    }

    /// Session time left; the full duration before admission.
    pub fn remaining(&self) -> Duration {
        match self.started_at {
            Some(started) => self
                .deps
                .policy
                .duration
                .saturating_sub(self.deps.clock.elapsed(started)),
            None => self.deps.policy.duration,
        }
    }

    fn consume_escape(&mut self, ch: char) -> bool {
        match self.escape {
            Escape::None => {
                if ch == '\x1b' {
                    self.escape = Escape::Esc;
                    return true;
                }
                false
            }
            Escape::Esc => {
                self.escape = match ch {
                    '[' => Escape::Csi,
                    'O' => Escape::Ss3,
                    _ => Escape::None,
                };
                true
            }
            Escape::Csi => {
                if ('\x40'..='\x7e').contains(&ch) {
                    self.escape = Escape::None;
                }
                true
            }
            Escape::Ss3 => {
                self.escape = Escape::None;
                true
            }
        }
    }

    /// Runs one line. Returns `true` when the session ended.
    fn run_line(&mut self, line: &str, events: &mut Vec<ServerEvent>) -> bool {
        let ctx = DispatchContext {
            now: self.deps.clock.utc_now(),
            remaining: self.remaining(),
        };
        let result = dispatch(line, &ctx);
        match result.control {
            None => events.push(ServerEvent::output(result.transcript)),
            Some(Control::ClearScreen) => {
                events.push(ServerEvent::ClearTerminal);
                events.push(ServerEvent::output(PROMPT));
            }
            Some(Control::Terminate) => {
                if !result.transcript.is_empty() {
                    events.push(ServerEvent::output(result.transcript));
                }
                events.push(ServerEvent::SessionEnd {
                    message: messages::SESSION_ENDED.to_string(),
                });
                events.extend(self.end(EndReason::Manual, true));
                return true;
            }
        }
        false
    }

    fn fail_auth(&mut self, err: &LabError) -> Vec<ServerEvent> {
        let mut events = vec![ServerEvent::AuthFail {
            message: err.user_message(),
        }];
        events.extend(self.end(EndReason::AuthFailed, true));
        events
    }

    /// Moves to `Ended` once; later calls return nothing.
    fn end(&mut self, reason: EndReason, notify: bool) -> Vec<ServerEvent> {
        if self.status == SessionStatus::Ended {
            return Vec::new();
        }
        self.status = SessionStatus::Ended;
        self.end_reason = Some(reason);
        self.line.clear();
        if let Some(lease) = self.lease.take() {
            lease.release();
        }
        if let Some(token) = self.token.as_ref() {
            self.deps.tokens.finalize(token);
        }
        self.deps.metrics.session_ended(reason);
        if notify {
            vec![ServerEvent::Disconnect]
        } else {
            Vec::new()
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn flush_echo(echo: &mut String, events: &mut Vec<ServerEvent>) {
    if !echo.is_empty() {
        events.push(ServerEvent::output(std::mem::take(echo)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::admin::AdminGrant;
    use crate::usecases::ports::test_support::{ManualClock, NoopMetrics, SequenceEntropy};

    struct Harness {
        clock: Arc<ManualClock>,
        deps: SessionDeps,
    }

    impl Harness {
        fn new(max_sessions: usize, policy: SessionPolicy) -> Self {
            let clock = Arc::new(ManualClock::new());
            let tokens = Arc::new(TokenStore::new(
                Arc::new(SequenceEntropy::counting()),
                clock.clone(),
            ));
            let deps = SessionDeps {
                tokens,
                admission: Arc::new(AdmissionController::new(max_sessions)),
                clock: clock.clone(),
                metrics: Arc::new(NoopMetrics),
                policy,
            };
            Self { clock, deps }
        }

        fn issue(&self) -> String {
            self.deps
                .tokens
                .issue(&AdminGrant::for_tests())
                .value()
                .to_string()
        }

        fn session(&self) -> Session {
            let mut session = Session::new(self.deps.clone());
            session.transport_ready();
            session
        }

        fn active_session(&self) -> Session {
            let mut session = self.session();
            let token = self.issue();
            let events = session.authenticate(&token);
            assert_eq!(events[0], ServerEvent::AuthSuccess);
            session
        }

        fn active(&self) -> usize {
            self.deps.admission.snapshot().active
        }
    }

    fn short_policy() -> SessionPolicy {
        SessionPolicy {
            duration: Duration::from_secs(5),
            grace: Duration::from_secs(3),
            ..SessionPolicy::default()
        }
    }

    fn outputs(events: &[ServerEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                ServerEvent::TerminalOutput { data } => Some(data.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_authenticate_admits_and_sends_banner() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.session();
        let token = h.issue();
        let events = session.authenticate(&token);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ServerEvent::AuthSuccess);
        assert!(outputs(&events).contains("Welcome to Linux Terminal Simulation Lab"));
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(h.active(), 1);
    }

    #[test]
    fn test_invalid_token_ends_without_holding_capacity() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.session();
        let events = session.authenticate("LAB-NOPE-0000");
        assert_eq!(
            events,
            vec![
                ServerEvent::AuthFail {
                    message: messages::INVALID_TOKEN.to_string()
                },
                ServerEvent::Disconnect,
            ]
        );
        assert_eq!(session.end_reason(), Some(EndReason::AuthFailed));
        assert_eq!(h.active(), 0);
    }

    #[test]
    fn test_token_cannot_open_two_sessions() {
        let h = Harness::new(3, SessionPolicy::default());
        let token = h.issue();
        let mut first = h.session();
        first.authenticate(&token);
        let mut second = h.session();
        let events = second.authenticate(&token);
        assert!(matches!(events[0], ServerEvent::AuthFail { .. }));
        assert_eq!(h.active(), 1);
    }

    #[test]
    fn test_fourth_session_is_rejected_and_token_refunded() {
        let h = Harness::new(3, SessionPolicy::default());
        let _sessions: Vec<_> = (0..3).map(|_| h.active_session()).collect();
        assert_eq!(h.active(), 3);

        let token = h.issue();
        let mut fourth = h.session();
        let events = fourth.authenticate(&token);
        assert_eq!(
            events[0],
            ServerEvent::AuthFail {
                message: messages::server_full(3)
            }
        );
        assert_eq!(fourth.end_reason(), Some(EndReason::AuthFailed));
        assert_eq!(h.active(), 3);
        assert_eq!(h.deps.tokens.outstanding(), 1);
        assert!(h.deps.tokens.redeem(&token).is_ok());
    }

    #[test]
    fn test_full_server_burns_token_when_refund_disabled() {
        let policy = SessionPolicy {
            refund_on_full: false,
            ..SessionPolicy::default()
        };
        let h = Harness::new(0, policy);
        let token = h.issue();
        let mut session = h.session();
        session.authenticate(&token);
        assert_eq!(h.deps.tokens.outstanding(), 0);
        assert!(h.deps.tokens.redeem(&token).is_err());
    }

    #[test]
    fn test_timeout_notice_then_disconnect_after_grace() {
        let h = Harness::new(3, short_policy());
        let mut session = h.active_session();
        let start = h.clock.now();
        assert_eq!(session.next_deadline(), Some(start + Duration::from_secs(5)));

        h.clock.advance_secs(4);
        assert!(session.poll_deadline().is_empty());

        h.clock.advance_secs(1);
        let events = session.poll_deadline();
        assert_eq!(
            events,
            vec![ServerEvent::SessionEnd {
                message: messages::session_timeout(Duration::from_secs(5))
            }]
        );
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(session.input("ls\r").is_empty());
        assert_eq!(session.next_deadline(), Some(start + Duration::from_secs(8)));

        h.clock.advance_secs(3);
        assert_eq!(session.poll_deadline(), vec![ServerEvent::Disconnect]);
        assert_eq!(session.end_reason(), Some(EndReason::Timeout));
        assert_eq!(session.next_deadline(), None);
        assert_eq!(h.active(), 0);
    }

    #[test]
    fn test_unrepresentable_deadline_never_fires() {
        let h = Harness::new(
            3,
            SessionPolicy {
                duration: Duration::from_secs(u64::MAX),
                auth_timeout: Duration::from_secs(u64::MAX),
                ..SessionPolicy::default()
            },
        );
        let idle = h.session();
        assert_eq!(idle.next_deadline(), None);

        let mut session = h.active_session();
        assert_eq!(session.next_deadline(), None);
        h.clock.advance_secs(3600);
        assert!(session.poll_deadline().is_empty());
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn test_auth_deadline_ends_idle_channel() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.session();
        h.clock.advance(DEFAULT_AUTH_TIMEOUT);
        let events = session.poll_deadline();
        assert!(matches!(events[0], ServerEvent::AuthFail { .. }));
        assert_eq!(events.last(), Some(&ServerEvent::Disconnect));
        assert_eq!(session.end_reason(), Some(EndReason::AuthFailed));
    }

    #[test]
    fn test_double_end_releases_once() {
        let h = Harness::new(3, SessionPolicy::default());
        let _other = h.active_session();
        let mut session = h.active_session();
        assert_eq!(h.active(), 2);

        assert_eq!(session.end_session(), vec![ServerEvent::Disconnect]);
        assert!(session.end_session().is_empty());
        session.disconnect();
        assert!(session.shutdown().is_empty());
        drop(session);

        assert_eq!(h.active(), 1);
    }

    #[test]
    fn test_end_finalizes_token() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.session();
        let token = h.issue();
        session.authenticate(&token);
        session.end_session();
        assert!(!h.deps.tokens.refund(&TokenString::parse(&token).unwrap()));
        assert!(h.deps.tokens.redeem(&token).is_err());
    }

    #[test]
    fn test_drop_releases_capacity() {
        let h = Harness::new(1, SessionPolicy::default());
        let session = h.active_session();
        assert_eq!(h.active(), 1);
        drop(session);
        assert_eq!(h.active(), 0);
    }

    #[test]
    fn test_input_echoes_and_dispatches_line() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        let events = session.input("pwd\r");
        assert_eq!(
            events,
            vec![
                ServerEvent::output("pwd"),
                ServerEvent::output("\r\n/home/student\r\nstudent@lab:~$ "),
            ]
        );
    }

    #[test]
    fn test_input_split_across_frames() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        session.input("who");
        let events = session.input("ami\r\n");
        assert!(outputs(&events).contains("\r\nstudent\r\n"));
        // LF of the CRLF pair must not dispatch an extra empty line.
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_backspace_edits_buffer() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        let echo = session.input("lsx\x7f");
        assert_eq!(outputs(&echo), "lsx\x08 \x08");
        let events = session.input("\r");
        assert!(outputs(&events).contains("Desktop"));
        assert!(session.input("\x7f").is_empty());
    }

    #[test]
    fn test_escape_sequences_are_dropped() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        let events = session.input("\x1b[Apwd\x1bOA\r");
        assert_eq!(events[0], ServerEvent::output("pwd"));
        assert!(outputs(&events).contains("/home/student"));
    }

    #[test]
    fn test_ctrl_c_discards_line() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        session.input("bogus");
        let events = session.input("\x03\r");
        let text = outputs(&events);
        assert!(text.starts_with("^C\r\nstudent@lab:~$ "));
        assert!(!text.contains("command not found"));
    }

    #[test]
    fn test_long_lines_are_truncated() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        let long = "x".repeat(MAX_LINE_BYTES + 50);
        let echo = session.input(&long);
        assert_eq!(outputs(&echo).len(), MAX_LINE_BYTES);
    }

    #[test]
    fn test_clear_emits_clear_then_prompt() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        let events = session.input("clear\r");
        assert_eq!(
            events,
            vec![
                ServerEvent::output("clear"),
                ServerEvent::ClearTerminal,
                ServerEvent::output(PROMPT),
            ]
        );
    }

    #[test]
    fn test_exit_ends_session_manually() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        let events = session.input("exit\rls\r");
        assert!(outputs(&events).contains("logout"));
        assert!(!outputs(&events).contains("Desktop"));
        assert_eq!(events.last(), Some(&ServerEvent::Disconnect));
        assert_eq!(session.end_reason(), Some(EndReason::Manual));
        assert_eq!(h.active(), 0);
    }

    #[test]
    fn test_lab_status_reports_remaining_minutes() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        h.clock.advance_secs(150);
        let events = session.input("lab status\r");
        assert!(outputs(&events).contains("Session Time Remaining: 58 minutes"));
    }

    #[test]
    fn test_input_before_auth_is_ignored() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.session();
        assert!(session.input("ls\r").is_empty());
        assert_eq!(session.status(), SessionStatus::Authenticating);
    }

    #[test]
    fn test_shutdown_notifies_client() {
        let h = Harness::new(3, SessionPolicy::default());
        let mut session = h.active_session();
        let events = session.shutdown();
        assert!(matches!(events[0], ServerEvent::SessionEnd { .. }));
        assert_eq!(events[1], ServerEvent::Disconnect);
        assert_eq!(session.end_reason(), Some(EndReason::Disconnect));
    }
}
