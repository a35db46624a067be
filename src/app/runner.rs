//! Process-level control flow: engine run, completion push, signal handling

use tokio::signal;
use tracing::{error, info};

use crate::app::client::WeReadClient;
use crate::app::credentials::CredentialManager;
use crate::app::engine::{ReadEngine, RunSummary};
use crate::app::notify::{Notifier, TaskStatus};
use crate::app::session::Session;
use crate::config::AppConfig;
use crate::errors::{AuthError, Result};

/// Owns the engine and the notifier for one run
#[derive(Debug)]
pub struct Runner {
    engine: ReadEngine,
    notifier: Notifier,
}

impl Runner {
    /// Create a runner
    pub fn new(engine: ReadEngine, notifier: Notifier) -> Self {
        Self { engine, notifier }
    }

    /// Wire a runner from configuration
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the channel is unknown or an HTTP client cannot
    /// be built
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let notifier = config.notifier()?;
        let client = WeReadClient::from_config(&config.client_config())?;
        let credentials = CredentialManager::new(
            client,
            notifier.clone(),
            config.payload.repair_book_ids.clone(),
        );
        let engine = ReadEngine::new(
            credentials,
            config.payload_builder(),
            config.engine_config(),
        );
        Ok(Self::new(engine, notifier))
    }

    /// Run the engine and push the completion summary
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if the session could not be renewed. A failure
    /// push has been sent by then.
    pub async fn run(&mut self, session: &mut Session) -> Result<RunSummary> {
        info!(
            "🚀 Starting run: {} reads planned",
            self.engine.config().read_num
        );

        let summary = match self.engine.run(session).await {
            Ok(summary) => summary,
            Err(AuthError::Transport(e)) => {
                let message = format!("❌ Session renewal request failed: {}", e);
                error!("{}", message);
                self.notifier.notify(&message, TaskStatus::Failure).await;
                return Err(AuthError::Transport(e).into());
            }
            Err(e) => return Err(e.into()),
        };

        let message = summary.completion_message();
        info!("{}", message);
        if let Some(report) = self.notifier.notify(&message, TaskStatus::Success).await {
            if !report.delivered {
                error!(
                    "❌ Completion notice not delivered via {} after {} attempts",
                    report.channel, report.attempts
                );
            }
        }

        Ok(summary)
    }
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C signal received");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("SIGTERM signal received");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runner_from_default_config() {
        let config = AppConfig::default();
        let runner = Runner::from_config(&config).unwrap();
        assert_eq!(runner.engine.config().read_num, 40);
        assert!(runner.notifier.channel().is_none());
    }
}
