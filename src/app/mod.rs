//! Core application logic for WeRead Pacer
//!
//! This module contains the payload signing scheme, the reading-platform client,
//! session renewal, the read-tick engine and notification dispatch.
//!
//! # Examples
//!
//! ```rust,no_run
//! use weread_pacer::app::Runner;
//! use weread_pacer::config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None).await?;
//! let mut session = config.session()?;
//!
//! let mut runner = Runner::from_config(&config)?;
//! let summary = runner.run(&mut session).await?;
//! println!("Read for {} minutes", summary.elapsed_minutes());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod credentials;
pub mod encoding;
pub mod engine;
pub mod notify;
pub mod payload;
pub mod runner;
pub mod session;

// Re-export main public API
pub use client::{ApiResponse, ClientConfig, Endpoints, ReadOutcome, Transport, WeReadClient};
pub use credentials::{extract_session_token, CredentialManager};
pub use encoding::{encode, legacy_hash};
pub use engine::{EngineConfig, ReadEngine, RunSummary, TickOutcome, TickState};
pub use notify::{
    Channel, ChannelKind, DeliveryReport, DispatchPolicy, Dispatcher, Notice, Notifier,
    PushRequest, PushSender, TaskStatus,
};
pub use payload::{PayloadBuilder, ReadPayload};
pub use runner::{shutdown_signal, Runner};
pub use session::{CredentialSet, Session};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Ensure public API is accessible
        let config = ClientConfig::default();
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(legacy_hash(""), "2a0a2a0a");
    }
}
