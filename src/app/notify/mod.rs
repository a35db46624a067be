//! Notification dispatch
//!
//! Sends one status message through exactly one configured [`Channel`]. Each
//! channel has its own retry policy:
//!
//! | Channel  | Retry policy |
//! |----------|--------------|
//! | PushPlus | up to `attempts` tries, randomized backoff between them |
//! | Telegram | one try through the proxy, then one direct try |
//! | WxPusher | up to `attempts` tries, randomized backoff between them |
//! | Webhook  | single try |
//!
//! Dispatch is best-effort: every failure is logged and reported in the
//! returned [`DeliveryReport`], never raised to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub mod channel;
pub mod sender;

pub use channel::{Channel, ChannelKind};
pub use sender::{HttpPushSender, PushRequest, PushSender, Route};

use crate::constants::notify;
use crate::errors::NotifyResult;

/// Outcome reported with a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Run completed
    Success,
    /// Run aborted
    Failure,
}

/// A single status message and its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// Message body
    pub message: String,
    /// Reported status
    pub status: TaskStatus,
    /// Task name reported to the status webhook
    pub task_name: String,
    /// Source reported to the status webhook
    pub source: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    /// Create a notice stamped with the current time
    pub fn new(
        message: impl Into<String>,
        status: TaskStatus,
        task_name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            status,
            task_name: task_name.into(),
            source: source.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Result of one dispatch call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Channel used
    pub channel: ChannelKind,
    /// Whether any attempt succeeded
    pub delivered: bool,
    /// Requests actually sent
    pub attempts: u32,
}

/// Retry and timeout policy shared by all channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Attempts for retrying channels
    pub attempts: u32,
    /// Lower bound of the randomized backoff
    pub backoff_min: Duration,
    /// Upper bound of the randomized backoff
    pub backoff_max: Duration,
    /// Timeout for PushPlus, WxPusher and the webhook
    pub request_timeout: Duration,
    /// Timeout for Telegram
    pub telegram_timeout: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            attempts: notify::MAX_ATTEMPTS,
            backoff_min: notify::BACKOFF_MIN,
            backoff_max: notify::BACKOFF_MAX,
            request_timeout: notify::REQUEST_TIMEOUT,
            telegram_timeout: notify::TELEGRAM_TIMEOUT,
        }
    }
}

impl DispatchPolicy {
    /// Draw a backoff uniformly from `[backoff_min, backoff_max]`
    pub fn backoff(&self) -> Duration {
        let (low, high) = if self.backoff_min <= self.backoff_max {
            (self.backoff_min, self.backoff_max)
        } else {
            (self.backoff_max, self.backoff_min)
        };
        let low_ms = low.as_millis() as u64;
        let high_ms = high.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(low_ms..=high_ms))
    }
}

/// Sends notices through a channel according to its policy
#[derive(Clone)]
pub struct Dispatcher {
    sender: Arc<dyn PushSender>,
    policy: DispatchPolicy,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher over a sender
    pub fn new(sender: Arc<dyn PushSender>, policy: DispatchPolicy) -> Self {
        Self { sender, policy }
    }

    /// Send a notice through `channel`
    pub async fn dispatch(&self, notice: &Notice, channel: &Channel) -> DeliveryReport {
        let kind = channel.kind();
        let timeout = match kind {
            ChannelKind::Telegram => self.policy.telegram_timeout,
            _ => self.policy.request_timeout,
        };

        let request = match channel.request(notice, timeout) {
            Ok(request) => request,
            Err(e) => {
                error!("❌ {} not sent: {}", kind, e);
                return DeliveryReport {
                    channel: kind,
                    delivered: false,
                    attempts: 0,
                };
            }
        };

        let (delivered, attempts) = match kind {
            ChannelKind::PushPlus | ChannelKind::WxPusher => {
                self.send_with_backoff(kind, &request).await
            }
            ChannelKind::Telegram => self.send_with_direct_fallback(kind, &request).await,
            ChannelKind::Webhook => (self.send_once(kind, &request).await.is_ok(), 1),
        };

        DeliveryReport {
            channel: kind,
            delivered,
            attempts,
        }
    }

    async fn send_once(&self, kind: ChannelKind, request: &PushRequest) -> NotifyResult<()> {
        match self.sender.send(request).await {
            Ok(text) => {
                info!("✅ {} response: {}", kind, text);
                Ok(())
            }
            Err(e) => {
                error!("❌ {} push failed: {}", kind, e);
                Err(e)
            }
        }
    }

    async fn send_with_backoff(&self, kind: ChannelKind, request: &PushRequest) -> (bool, u32) {
        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            if self.send_once(kind, request).await.is_ok() {
                return (true, attempt);
            }
            if attempt < attempts {
                let delay = self.policy.backoff();
                info!("Retrying {} in {} seconds...", kind, delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        }
        error!("❌ {} gave up after {} attempts", kind, attempts);
        (false, attempts)
    }

    async fn send_with_direct_fallback(
        &self,
        kind: ChannelKind,
        request: &PushRequest,
    ) -> (bool, u32) {
        if self.send_once(kind, request).await.is_ok() {
            return (true, 1);
        }
        info!("{} retrying without proxy", kind);
        (self.send_once(kind, &request.direct()).await.is_ok(), 2)
    }
}

/// The run's notification endpoint: a dispatcher plus the selected channel
///
/// With no channel selected every notify call is a no-op.
#[derive(Debug, Clone)]
pub struct Notifier {
    dispatcher: Option<Dispatcher>,
    channel: Option<Channel>,
    task_name: String,
    source: String,
}

impl Notifier {
    /// Create a notifier for `channel`
    pub fn new(
        dispatcher: Dispatcher,
        channel: Option<Channel>,
        task_name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher: Some(dispatcher),
            channel,
            task_name: task_name.into(),
            source: source.into(),
        }
    }

    /// A notifier that never sends anything
    pub fn disabled() -> Self {
        Self {
            dispatcher: None,
            channel: None,
            task_name: notify::DEFAULT_TASK_NAME.to_string(),
            source: notify::DEFAULT_SOURCE.to_string(),
        }
    }

    /// Selected channel, if any
    pub fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }

    /// Dispatch `message`; returns `None` when dispatch is disabled
    pub async fn notify(&self, message: &str, status: TaskStatus) -> Option<DeliveryReport> {
        let (Some(dispatcher), Some(channel)) = (&self.dispatcher, &self.channel) else {
            return None;
        };
        info!("⏱️ Sending notification via {}...", channel.kind());
        let notice = Notice::new(message, status, &self.task_name, &self.source);
        Some(dispatcher.dispatch(&notice, channel).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_service_limits() {
        let policy = DispatchPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.backoff_min, Duration::from_secs(180));
        assert_eq!(policy.backoff_max, Duration::from_secs(360));
    }

    #[test]
    fn test_backoff_stays_in_range() {
        let policy = DispatchPolicy::default();
        for _ in 0..200 {
            let delay = policy.backoff();
            assert!(delay >= policy.backoff_min);
            assert!(delay <= policy.backoff_max);
        }
    }

    #[test]
    fn test_backoff_with_swapped_bounds() {
        let policy = DispatchPolicy {
            backoff_min: Duration::from_secs(2),
            backoff_max: Duration::from_secs(1),
            ..Default::default()
        };
        let delay = policy.backoff();
        assert!(delay >= Duration::from_secs(1) && delay <= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_disabled_notifier_sends_nothing() {
        let notifier = Notifier::disabled();
        assert!(notifier.notify("hello", TaskStatus::Success).await.is_none());
    }
}
