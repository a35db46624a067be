//! Command handlers for WeRead Pacer CLI
//!
//! This module implements the command handlers that coordinate between
//! CLI arguments and the core application functionality.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::app::encoding::legacy_hash;
use crate::app::engine::RunSummary;
use crate::app::notify::TaskStatus;
use crate::app::Runner;
use crate::cli::{NotifyArgs, RunArgs, SignArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the run command
///
/// Applies CLI overrides, builds the session from configuration and runs the
/// engine to completion.
pub async fn handle_run(args: RunArgs, mut config: AppConfig) -> Result<RunSummary> {
    let start_time = Instant::now();
    args.validate().map_err(AppError::generic)?;

    if let Some(reads) = args.reads {
        config.engine.read_num = reads;
    }
    if let Some(channel) = args.channel {
        config.notify.method = Some(channel);
    }
    config.validate()?;

    let mut session = config.session()?;
    if session.credentials().is_empty() {
        warn!("⚠️ No cookies configured; set WXREAD_CURL_BASH or [session] cookies");
    }
    debug!(
        "Session has {} headers and {} cookies",
        session.headers().len(),
        session.credentials().len()
    );

    let mut runner = Runner::from_config(&config)?;
    let summary = runner.run(&mut session).await?;

    info!(
        "Run completed in {:.1}s with {} retries and {} renewals",
        start_time.elapsed().as_secs_f64(),
        summary.retries,
        summary.renewals
    );
    Ok(summary)
}

/// Handle the notify command
///
/// Sends one message through the configured channel and reports whether it
/// was delivered.
pub async fn handle_notify(args: NotifyArgs, mut config: AppConfig) -> Result<()> {
    if let Some(channel) = args.channel {
        config.notify.method = Some(channel);
    }
    config.validate()?;

    let notifier = config.notifier()?;
    let status = TaskStatus::from(args.status);

    match notifier.notify(&args.message, status).await {
        None => {
            println!("No notification channel configured (set PUSH_METHOD or --channel)");
            Ok(())
        }
        Some(report) if report.delivered => {
            println!(
                "✅ Delivered via {} after {} attempt(s)",
                report.channel, report.attempts
            );
            Ok(())
        }
        Some(report) => Err(AppError::generic(format!(
            "Notification via {} not delivered after {} attempt(s)",
            report.channel, report.attempts
        ))),
    }
}

/// Handle the sign command
pub fn handle_sign(args: SignArgs) -> Result<()> {
    println!("{}", legacy_hash(&args.text));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_sign() {
        let args = SignArgs {
            text: "hello world".to_string(),
        };
        assert!(handle_sign(args).is_ok());
    }

    #[tokio::test]
    async fn test_handle_notify_without_channel() {
        let args = NotifyArgs {
            message: "ping".to_string(),
            status: crate::cli::StatusArg::Success,
            channel: None,
        };
        assert!(handle_notify(args, AppConfig::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_run_rejects_unknown_channel() {
        let args = RunArgs {
            reads: Some(1),
            channel: Some("carrier-pigeon".to_string()),
        };
        let result = handle_run(args, AppConfig::default()).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_handle_run_rejects_zero_reads() {
        let args = RunArgs {
            reads: Some(0),
            channel: None,
        };
        let result = handle_run(args, AppConfig::default()).await;
        assert!(matches!(result, Err(AppError::Generic { .. })));
    }
}
