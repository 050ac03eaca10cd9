//! Observer tuning.

use std::time::Duration;

/// Default quiet period after a change before re-reading a file.
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Default interval for the modification-time fallback check.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Changes arriving within this window are folded into one merge pass.
    pub debounce: Duration,
    /// How often each watch task compares the file's modification time and
    /// length, in case a change notification was missed.
    pub poll_interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
