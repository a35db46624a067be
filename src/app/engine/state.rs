//! Per-tick state machine states

use std::fmt;

/// How a tick ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Accepted with a sync key; counts toward reading time
    Counted,
    /// Accepted without a sync key; repaired, not counted
    Uncounted,
    /// Retry budget exhausted
    Abandoned,
}

/// States of one tick
///
/// ```text
/// Start -> Attempt -> Success | Unsynced | Reauth | TransportFail
/// Reauth | TransportFail -> Backoff -> Attempt | Abandoned
/// Success | Unsynced | Abandoned -> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickState {
    /// Retry counter reset
    Start,
    /// Sending the read request
    Attempt,
    /// Response carried both markers; `issued_at` is the payload's `ct`
    Success { issued_at: i64 },
    /// Response accepted without a sync key
    Unsynced,
    /// Session expired; renew before retrying
    Reauth,
    /// Network or decoding failure
    TransportFail,
    /// Waiting after a recoverable failure
    Backoff,
    /// Retry budget exhausted
    Abandoned,
    /// Terminal
    Done(TickOutcome),
}

impl fmt::Display for TickState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Attempt => "attempt",
            Self::Success { .. } => "success",
            Self::Unsynced => "unsynced",
            Self::Reauth => "reauth",
            Self::TransportFail => "transport-fail",
            Self::Backoff => "backoff",
            Self::Abandoned => "abandoned",
            Self::Done(_) => "done",
        };
        f.write_str(name)
    }
}
