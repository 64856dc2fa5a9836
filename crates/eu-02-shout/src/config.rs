//! Configuration for the Shout Subsystem

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::DEFAULT_MESSAGE;

/// Session configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShoutConfig {
    /// How long neighbors and ripples stay visible after the first appears (ms)
    pub debounce_window_ms: u64,
    /// Poll the location provider this often (ms); `None` disables polling
    pub location_poll_ms: Option<u64>,
    /// Text shouted when no message is given or selected
    pub default_message: String,
    /// Maximum shout length in characters
    pub max_message_chars: usize,
}

impl Default for ShoutConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: 2_000,
            location_poll_ms: None,
            default_message: DEFAULT_MESSAGE.to_string(),
            max_message_chars: 140,
        }
    }
}

impl ShoutConfig {
    /// Short windows for tests.
    pub fn for_testing() -> Self {
        Self {
            debounce_window_ms: 500,
            ..Self::default()
        }
    }

    /// Debounce window as a duration.
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    /// Location polling period, if enabled.
    pub fn location_poll_interval(&self) -> Option<Duration> {
        self.location_poll_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}
