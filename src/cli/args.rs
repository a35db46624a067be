//! Command-line argument parsing for WeRead Pacer
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::app::notify::TaskStatus;

/// WeRead Pacer - Accumulate reading time on WeRead
#[derive(Parser, Debug)]
#[command(
    name = "weread_pacer",
    version,
    about = "Accumulate simulated reading time on WeRead",
    long_about = "Replays a captured browser reading session against WeRead in fixed-interval ticks,
renewing the session key when it expires and pushing a summary when the run finishes."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - only errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full reading session
    Run(RunArgs),

    /// Send a single message through the configured channel
    Notify(NotifyArgs),

    /// Print the legacy checksum of a string
    Sign(SignArgs),
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Number of read ticks (overrides READ_NUM)
    #[arg(short, long, value_name = "N")]
    pub reads: Option<u32>,

    /// Notification channel (pushplus, telegram, wxpusher, webhook)
    #[arg(short, long, value_name = "NAME")]
    pub channel: Option<String>,
}

/// Status flag for a test notification
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusArg {
    #[default]
    Success,
    Failure,
}

impl From<StatusArg> for TaskStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Success => TaskStatus::Success,
            StatusArg::Failure => TaskStatus::Failure,
        }
    }
}

/// Arguments for the notify command
#[derive(Args, Debug, Clone)]
pub struct NotifyArgs {
    /// Message body
    #[arg(short, long)]
    pub message: String,

    /// Status reported to the status webhook
    #[arg(short, long, value_enum, default_value_t = StatusArg::Success)]
    pub status: StatusArg,

    /// Notification channel (overrides PUSH_METHOD)
    #[arg(short, long, value_name = "NAME")]
    pub channel: Option<String>,
}

/// Arguments for the sign command
#[derive(Args, Debug, Clone)]
pub struct SignArgs {
    /// Text to hash
    #[arg(short, long)]
    pub text: String,
}

impl RunArgs {
    /// Validate run arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.reads == Some(0) {
            return Err("--reads must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level from the verbosity flags, `None` when no flag was given
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parsing() {
        let cli = Cli::try_parse_from(["weread_pacer", "run", "--reads", "5", "--channel", "telegram"])
            .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.reads, Some(5));
                assert_eq!(args.channel.as_deref(), Some("telegram"));
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_run_args_validation() {
        let args = RunArgs {
            reads: Some(0),
            channel: None,
        };
        assert!(args.validate().is_err());
        assert!(RunArgs::default().validate().is_ok());
    }

    #[test]
    fn test_notify_status_default() {
        let cli = Cli::try_parse_from(["weread_pacer", "notify", "--message", "hi"]).unwrap();
        match cli.command {
            Commands::Notify(args) => {
                assert_eq!(args.status, StatusArg::Success);
                assert_eq!(TaskStatus::from(args.status), TaskStatus::Success);
            }
            _ => panic!("Expected notify command"),
        }
    }

    #[test]
    fn test_log_level_flags() {
        let cli = Cli::try_parse_from(["weread_pacer", "-q", "sign", "--text", "a"]).unwrap();
        assert_eq!(cli.log_level(), Some(tracing::Level::ERROR));

        let cli = Cli::try_parse_from(["weread_pacer", "sign", "--text", "a", "--very-verbose"])
            .unwrap();
        assert_eq!(cli.log_level(), Some(tracing::Level::DEBUG));

        let cli = Cli::try_parse_from(["weread_pacer", "sign", "--text", "a"]).unwrap();
        assert_eq!(cli.log_level(), None);
    }
}
