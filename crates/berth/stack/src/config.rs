//! Poll loop configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed-interval polling bounds.
///
/// The defaults bound the worst-case wait to ten minutes (60 polls, 10s apart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between two polls
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Iteration at which a still pending stack times out
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_retries: u32) -> Self {
        Self {
            interval_secs: interval.as_secs(),
            max_retries,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Upper bound on the time spent waiting between polls
    pub fn budget(&self) -> Duration {
        self.interval() * self.max_retries
    }
}

fn default_interval_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    60
}
