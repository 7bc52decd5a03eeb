//! Commonality CLI
//!
//! Thin wrapper around commonality-core for writing and inspecting
//! session logs from the command line. Every invocation that writes is a
//! fresh logger, and therefore a fresh session.
//!
//! ## Usage
//!
//! ```bash
//! # Begin a session
//! commonality start
//!
//! # Log an event with parameters
//! commonality event Opened realm=inbox count=3
//!
//! # Log an informative message
//! commonality info "cache warmed"
//!
//! # Report an error with its causes, outermost first
//! commonality error --tag sync "cannot reach peer" --cause "connection refused"
//!
//! # List sessions, oldest first
//! commonality sessions
//!
//! # Print a session
//! commonality show latest
//!
//! # Summarize every session
//! commonality report
//! ```
//!
//! With `-v`, console diagnostics from the libraries underneath are also
//! recorded in the session as `FYI:` lines. The binary's own diagnostics
//! stay on the console.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use commonality_core::logging::{render_report, summarize, LINE_TIMESTAMP_FORMAT};
use commonality_core::{
    ErrorReport, FileLogStore, LogStore, LoggerConfig, SessionId, SessionLayer, SessionLogger,
    WriteOutcome,
};
use tracing_subscriber::prelude::*;

/// Commonality - session logs
#[derive(Parser)]
#[command(name = "commonality")]
#[command(version = "0.1.0")]
#[command(about = "Commonality - write and inspect session logs")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Home directory (default: ~/.commonality)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Begin a new session
    Start,

    /// Log an event
    Event {
        /// What happened
        message: String,

        /// Parameters, usually key=value
        params: Vec<String>,
    },

    /// Log an informative message
    Info {
        /// Message text
        message: String,
    },

    /// Report an error
    Error {
        /// Error message
        message: String,

        /// Category tag shown in the header
        #[arg(short, long)]
        tag: Option<String>,

        /// Where the error was raised, used when no tag is given
        #[arg(short, long)]
        source: Option<String>,

        /// Kind name of the error
        #[arg(short, long, default_value = "Error")]
        kind: String,

        /// Underlying causes, outermost first
        #[arg(short, long = "cause")]
        causes: Vec<String>,
    },

    /// List sessions, oldest first
    Sessions,

    /// Print every line of a session
    Show {
        /// Session identifier (16 hex digits) or "latest"
        session: String,
    },

    /// Summarize every session
    Report,
}

fn setup_logging(verbosity: u8, bridge: Option<SessionLayer>) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(bridge)
        .init();
}

/// Parse a session token: 16 hex digits, optionally with the file suffix
fn parse_session(s: &str) -> Result<SessionId> {
    SessionId::from_hex(s)
        .or_else(|_| SessionId::from_file_name(s))
        .map_err(|e| anyhow::anyhow!("Invalid session '{}': {}", s, e))
}

fn stamp(at: NaiveDateTime) -> String {
    at.format(LINE_TIMESTAMP_FORMAT).to_string()
}

/// Build the error report: the message wraps each cause in turn
fn build_report(
    message: String,
    kind: String,
    source: Option<String>,
    causes: Vec<String>,
) -> ErrorReport {
    let cause = causes
        .into_iter()
        .rev()
        .fold(None, |inner: Option<ErrorReport>, text| {
            let report = ErrorReport::new("Error", text);
            Some(match inner {
                Some(inner) => report.caused_by(inner),
                None => report,
            })
        });

    let mut report = ErrorReport::new(kind, message);
    if let Some(cause) = cause {
        report = report.caused_by(cause);
    }
    if let Some(source) = source {
        report = report.with_source_tag(source);
    }
    report
}

fn print_outcome(outcome: WriteOutcome) -> Result<()> {
    match outcome {
        WriteOutcome::Written { session, lines } => {
            println!("Session: {}", session);
            println!("Wrote {} line(s)", lines);
            Ok(())
        }
        WriteOutcome::Dropped { reason } => anyhow::bail!("Entry dropped: {}", reason),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.home {
        Some(home) => LoggerConfig::new(home),
        None => LoggerConfig::default(),
    };
    let store = Arc::new(FileLogStore::from_config(&config));

    // Only writing commands get a logger; reading must not open a session.
    let writes = matches!(
        cli.command,
        Commands::Start | Commands::Event { .. } | Commands::Info { .. } | Commands::Error { .. }
    );
    let logger = writes.then(|| SessionLogger::new(store.clone()));

    // The session records what was asked for, not this binary's chatter.
    let bridge = logger
        .clone()
        .map(|logger| SessionLayer::new(logger).skip_target(module_path!()));
    setup_logging(cli.verbose, bridge);
    tracing::debug!(logs_dir = %store.logs_dir().display(), "using log store");

    match (cli.command, logger.as_ref()) {
        (Commands::Start, Some(logger)) => {
            print_outcome(logger.start_session().await)?;
        }

        (Commands::Event { message, params }, Some(logger)) => {
            let params: Vec<&str> = params.iter().map(String::as_str).collect();
            print_outcome(logger.log_event(&message, &params).await)?;
        }

        (Commands::Info { message }, Some(logger)) => {
            print_outcome(logger.log_info(&message).await)?;
        }

        (
            Commands::Error {
                message,
                tag,
                source,
                kind,
                causes,
            },
            Some(logger),
        ) => {
            let report = build_report(message, kind, source, causes);
            print_outcome(logger.log_error(tag.as_deref(), report).await)?;
        }

        (Commands::Sessions, _) => {
            let sessions = store.list_sessions().await?;
            if sessions.is_empty() {
                println!("No sessions found.");
            }
            for session in sessions {
                println!("{}  {}", session, stamp(session.to_datetime()));
            }
        }

        (Commands::Show { session }, _) => {
            let session = if session == "latest" {
                match store.list_sessions().await?.last() {
                    Some(latest) => *latest,
                    None => anyhow::bail!("No sessions found in {}", store.logs_dir().display()),
                }
            } else {
                parse_session(&session)?
            };

            for line in store.read_contents(session).await? {
                println!("{}", line);
            }
        }

        (Commands::Report, _) => {
            let summaries = summarize(store.as_ref()).await?;
            print!("{}", render_report(&summaries));
        }

        (_, None) => anyhow::bail!("No logger for a writing command"),
    }

    // Bridged tracing events are written detached.
    if let Some(logger) = logger {
        logger.wait().await;
    }
    Ok(())
}
