//! Run statistics and the completion summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::TickOutcome;
use crate::constants::limits;

/// Aggregated statistics for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Tick counter; starts at 1 and advances once per finished tick
    pub index: u32,
    /// Ticks that recorded progress
    pub counted: u32,
    /// Ticks accepted without a sync key
    pub uncounted: u32,
    /// Ticks abandoned after exhausting retries
    pub abandoned: u32,
    /// Recoverable failures across all ticks
    pub retries: u32,
    /// Successful session renewals, including the startup renewal
    pub renewals: u32,
    /// Start of the run
    pub started_at: DateTime<Utc>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            index: 1,
            counted: 0,
            uncounted: 0,
            abandoned: 0,
            retries: 0,
            renewals: 0,
            started_at: Utc::now(),
        }
    }
}

impl RunSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ticks finished so far
    pub fn ticks_finished(&self) -> u32 {
        self.index - 1
    }

    /// Record a finished tick; the counter advances whatever the outcome
    pub fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Counted => self.counted += 1,
            TickOutcome::Uncounted => self.uncounted += 1,
            TickOutcome::Abandoned => self.abandoned += 1,
        }
        self.index += 1;
    }

    /// Simulated reading minutes credited so far
    ///
    /// Every finished tick is credited except those accepted without a sync key.
    pub fn elapsed_minutes(&self) -> f64 {
        f64::from(self.counted + self.abandoned) * limits::MINUTES_PER_TICK
    }

    /// Message pushed when the run finishes
    pub fn completion_message(&self) -> String {
        format!(
            "🎉 WeRead auto-reading finished!\n⏱️ Reading time: {} minutes.",
            self.elapsed_minutes()
        )
    }
}
