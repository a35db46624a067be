//! Read-tick engine
//!
//! Runs a fixed number of ticks. Each tick is a bounded retry loop: network
//! failures and expired sessions cost one retry each, and a tick whose budget
//! runs out is abandoned so the run keeps moving. Only a failed renewal ends
//! the run early.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

pub mod state;
pub mod stats;

pub use state::{TickOutcome, TickState};
pub use stats::RunSummary;

use crate::app::client::ReadOutcome;
use crate::app::credentials::CredentialManager;
use crate::app::payload::PayloadBuilder;
use crate::app::session::Session;
use crate::constants::limits;
use crate::errors::{AuthError, AuthResult};

/// Pacing and retry settings for the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Ticks per run
    pub read_num: u32,
    /// Recoverable failures tolerated per tick
    pub max_retries: u32,
    /// Wait after each recoverable failure
    pub retry_delay: Duration,
    /// Pause after a counted tick
    pub think_time: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_num: limits::DEFAULT_READ_NUM,
            max_retries: limits::MAX_RETRIES,
            retry_delay: limits::RETRY_DELAY,
            think_time: limits::THINK_TIME,
        }
    }
}

/// Drives read ticks against the reading endpoint
#[derive(Debug)]
pub struct ReadEngine {
    credentials: CredentialManager,
    payload: PayloadBuilder,
    config: EngineConfig,
}

impl ReadEngine {
    /// Create an engine
    pub fn new(credentials: CredentialManager, payload: PayloadBuilder, config: EngineConfig) -> Self {
        Self {
            credentials,
            payload,
            config,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Renew the session once, then run `read_num` ticks
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the startup renewal fails in any way, or if a
    /// renewal during a tick finds no session cookie
    pub async fn run(&mut self, session: &mut Session) -> AuthResult<RunSummary> {
        let mut summary = RunSummary::new();

        self.credentials.renew(session).await?;
        summary.renewals += 1;

        while summary.ticks_finished() < self.config.read_num {
            self.tick(session, &mut summary).await?;
        }

        info!(
            "🎉 Reading finished: {} counted, {} uncounted, {} abandoned, {} minutes",
            summary.counted,
            summary.uncounted,
            summary.abandoned,
            summary.elapsed_minutes()
        );
        Ok(summary)
    }

    /// Run a single tick and record it in `summary`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RenewalFailed` if the session cannot be renewed
    pub async fn tick(
        &mut self,
        session: &mut Session,
        summary: &mut RunSummary,
    ) -> AuthResult<TickOutcome> {
        let mut retries = 0;
        let mut state = TickState::Start;

        loop {
            debug!("Tick {} state: {}", summary.index, state);
            state = match state {
                TickState::Start => {
                    retries = 0;
                    TickState::Attempt
                }
                TickState::Attempt => self.attempt(session, retries).await,
                TickState::Success { issued_at } => {
                    self.payload.mark_progress(issued_at);
                    summary.record(TickOutcome::Counted);
                    sleep(self.config.think_time).await;
                    info!(
                        "✅ Read succeeded, progress: {} minutes",
                        summary.elapsed_minutes()
                    );
                    TickState::Done(TickOutcome::Counted)
                }
                TickState::Unsynced => {
                    warn!("❌ No synckey in response, attempting repair...");
                    self.credentials.repair_missing_sync(session).await;
                    summary.record(TickOutcome::Uncounted);
                    TickState::Done(TickOutcome::Uncounted)
                }
                TickState::Reauth => {
                    match self.credentials.renew(session).await {
                        Ok(_) => {
                            summary.renewals += 1;
                            info!("🔄 Retrying this read");
                        }
                        Err(AuthError::Transport(e)) => {
                            error!("📡 Renewal request failed: {}", e);
                        }
                        Err(fatal) => return Err(fatal),
                    }
                    retries += 1;
                    summary.retries += 1;
                    TickState::Backoff
                }
                TickState::TransportFail => {
                    retries += 1;
                    summary.retries += 1;
                    TickState::Backoff
                }
                TickState::Backoff => {
                    sleep(self.config.retry_delay).await;
                    if retries < self.config.max_retries {
                        TickState::Attempt
                    } else {
                        TickState::Abandoned
                    }
                }
                TickState::Abandoned => {
                    error!(
                        "⛔ Max retries exceeded, skipping read #{}",
                        summary.index
                    );
                    summary.record(TickOutcome::Abandoned);
                    TickState::Done(TickOutcome::Abandoned)
                }
                TickState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    async fn attempt(&self, session: &Session, retries: u32) -> TickState {
        if let Err(e) = session.require_session_token() {
            warn!("❌ {}, renewing before reading", e);
            return TickState::Reauth;
        }

        let payload = self.payload.build_now();
        match self
            .credentials
            .client()
            .read(session, &payload.fields)
            .await
        {
            Ok(ReadOutcome::Fresh(_)) => TickState::Success {
                issued_at: payload.issued_at,
            },
            Ok(ReadOutcome::Unsynced(_)) => TickState::Unsynced,
            Ok(ReadOutcome::Expired(_)) => {
                warn!("❌ Cookie expired, refreshing...");
                TickState::Reauth
            }
            Err(e) => {
                error!("📡 Network request failed (attempt {}): {}", retries + 1, e);
                TickState::TransportFail
            }
        }
    }
}
