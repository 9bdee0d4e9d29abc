#![expect(clippy::print_stdout, reason = "CLI output is emitted here")]
#![expect(clippy::print_stderr, reason = "CLI output is emitted here")]

//! CLI application layer and composition root wiring.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing::debug;

pub mod commands;
pub mod daemon;

use crate::app::commands::Cli;
use crate::app::commands::Commands;
use crate::app::commands::IssueTokenArgs;
use crate::app::commands::OutputFormat;
use crate::app::commands::ServeArgs;
use crate::app::commands::ServerArgs;
use crate::app::daemon::start_daemon;
use crate::common::DaemonError;
use crate::common::telemetry;
use crate::infra::daemon::DaemonConfig;
use crate::infra::http_client::ApiClient;
use crate::infra::http_client::ClientError;

const PROGRAM_NAME: &str = "labgate";

/// Exit codes following sysexits.h.
mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const UNAVAILABLE: i32 = 69;
    pub const IOERR: i32 = 74;
    pub const TEMPFAIL: i32 = 75;
    pub const NOPERM: i32 = 77;
}

pub struct Application;

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self) -> Result<i32> {
        let exit_code = match self.execute() {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => self.handle_error(e),
        };
        Ok(exit_code)
    }

    fn execute(&self) -> Result<()> {
        let cli = Cli::parse();
        let default_level = match (&cli.command, cli.verbose) {
            (_, true) => "debug",
            (Commands::Serve(_), false) => "info",
            _ => "warn",
        };
        let _telemetry = telemetry::init_tracing(default_level);
        let format = cli.effective_format();
        debug!(format = ?format, verbose = cli.verbose, "CLI command parsed");

        match &cli.command {
            Commands::Serve(args) => {
                start_daemon(serve_config(args)).context("daemon failed")?;
            }
            Commands::Status(args) => {
                block_on(print_status(args, format)).context("failed to query status")?;
            }
            Commands::IssueToken(args) => {
                block_on(issue_token(args, format)).context("failed to issue token")?;
            }
        }
        Ok(())
    }

    fn handle_error(&self, e: anyhow::Error) -> i32 {
        if let Some(client_error) = find_error::<ClientError>(&e) {
            eprintln!("{PROGRAM_NAME}: Error: {client_error}");
            if let Some(suggestion) = client_error.suggestion() {
                eprintln!("Suggestion: {suggestion}");
            }
            if client_error.is_retryable() {
                eprintln!("(This error may be transient - retry may succeed)");
            }
            exit_code_for_client_error(client_error)
        } else if let Some(daemon_error) = find_error::<DaemonError>(&e) {
            eprintln!("{PROGRAM_NAME}: Error: {daemon_error}");
            eprintln!("Suggestion: {}", daemon_error.suggestion());
            if daemon_error.is_retryable() {
                eprintln!("(This error may be transient - retry may succeed)");
            }
            exit_codes::IOERR
        } else {
            eprintln!("{PROGRAM_NAME}: Error: {e:#}");
            exit_codes::GENERAL_ERROR
        }
    }
}

fn serve_config(args: &ServeArgs) -> DaemonConfig {
    let mut config = DaemonConfig::from_env();
    if let Some(listen) = &args.listen {
        config = config.with_listen(listen.clone());
    }
    if args.allow_remote {
        config = config.with_allow_remote(true);
    }
    if let Some(max) = args.max_sessions {
        config = config.with_max_sessions(max);
    }
    if let Some(secs) = args.session_duration {
        config = config.with_session_duration(Duration::from_secs(secs));
    }
    if let Some(upstream) = &args.upstream {
        config = config.with_upstream_addr(Some(upstream.clone()));
    }
    config
}

fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DaemonError::Runtime(e.to_string()))?;
    runtime.block_on(future)
}

async fn print_status(args: &ServerArgs, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(&args.url)?;
    let status = client.status().await?;
    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Text => println!(
            "Lab status: {} ({}/{} sessions active)",
            status.status, status.active_sessions, status.max_sessions
        ),
    }
    Ok(())
}

async fn issue_token(args: &IssueTokenArgs, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(&args.server.url)?;
    let admin_token = client.login(&args.user, &args.password).await?;
    let issued = client.issue_token(&admin_token).await;
    if let Err(err) = client.logout(&admin_token).await {
        debug!(error = %err, "Admin logout failed");
    }
    let issued = issued?;
    match format {
        OutputFormat::Json => print_json(&issued)?,
        OutputFormat::Text => println!("{}", issued.token_string),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode JSON output")?;
    println!("{text}");
    Ok(())
}

fn find_error<T: std::error::Error + 'static>(error: &anyhow::Error) -> Option<&T> {
    error.chain().find_map(|source| source.downcast_ref::<T>())
}

fn exit_code_for_client_error(error: &ClientError) -> i32 {
    match error {
        ClientError::ConnectionFailed { .. } => exit_codes::UNAVAILABLE,
        ClientError::Rejected { status: 401, .. } => exit_codes::NOPERM,
        ClientError::Rejected {
            retryable: true, ..
        } => exit_codes::TEMPFAIL,
        ClientError::Rejected { .. } => exit_codes::GENERAL_ERROR,
        ClientError::InvalidResponse(_) => exit_codes::IOERR,
    }
}
