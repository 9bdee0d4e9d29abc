use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

use crate::infra::daemon::MAX_DURATION_SECS;

pub const DEFAULT_URL: &str = "http://127.0.0.1:8080";

const AFTER_LONG_HELP: &str = r#"EXAMPLES:
    # Run the gateway with two seats and 30 minute sessions
    labgate serve --max-sessions 2 --session-duration 1800

    # Check lab availability
    labgate status

    # Issue a single-use access token for a student
    LABGATE_ADMIN_PASSWORD=secret labgate issue-token --user admin"#;

#[derive(Parser)]
#[command(name = "labgate")]
#[command(author, version, propagate_version = true)]
#[command(about = "Token-gated, time-limited lab terminal sessions")]
#[command(after_long_help = AFTER_LONG_HELP)]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json)
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        value_name = "FORMAT",
        default_value_t = OutputFormat::Text,
        help_heading = "Output Options"
    )]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true, help_heading = "Output Options")]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true, help_heading = "Debug Options")]
    pub verbose: bool,
}

impl Cli {
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the gateway daemon in the foreground
    Serve(ServeArgs),

    /// Show whether the lab is accepting sessions
    Status(ServerArgs),

    /// Log in as admin and print a fresh access token
    #[command(name = "issue-token")]
    IssueToken(IssueTokenArgs),
}

/// Flags override the matching LABGATE_* environment variables.
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Address to listen on (host:port)
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Allow binding a non-loopback address
    #[arg(long)]
    pub allow_remote: bool,

    /// Maximum concurrent lab sessions
    #[arg(long, value_name = "N")]
    pub max_sessions: Option<usize>,

    /// Session length in seconds (1 to 604800)
    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..=MAX_DURATION_SECS)
    )]
    pub session_duration: Option<u64>,

    /// TCP address whose reachability gates the lab status
    #[arg(long, value_name = "HOST:PORT")]
    pub upstream: Option<String>,
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Base URL of a running gateway
    #[arg(long, env = "LABGATE_URL", default_value = DEFAULT_URL)]
    pub url: String,
}

#[derive(Debug, Args)]
pub struct IssueTokenArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Admin username
    #[arg(long, env = "LABGATE_ADMIN_USER", default_value = "admin")]
    pub user: String,

    /// Admin password
    #[arg(long, env = "LABGATE_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
