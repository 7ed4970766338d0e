//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default polling interval in seconds.
pub const POLL_INTERVAL_SECS: u64 = 2;

/// Default per-attempt reply timeout in milliseconds.
pub const ATTEMPT_TIMEOUT_MS: u64 = 750;

/// Default number of consecutive failures before a receiver is
/// reported as disconnected.
pub const DISCONNECT_AFTER: u32 = 3;

/// Default maximum number of concurrently monitored receivers.
pub const MAX_DEVICES: usize = 64;

/// Default UDP port receivers answer status queries on.
pub const STATUS_PORT: u16 = 53212;

/// Default initial retry delay in seconds.
pub const RETRY_INITIAL_DELAY_SECS: u64 = 2;

/// Default maximum retry delay in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = 30;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Default polling interval as Duration.
#[must_use]
pub const fn poll_interval() -> Duration {
    Duration::from_secs(POLL_INTERVAL_SECS)
}

/// Default per-attempt timeout as Duration.
#[must_use]
pub const fn attempt_timeout() -> Duration {
    Duration::from_millis(ATTEMPT_TIMEOUT_MS)
}

/// Default initial retry delay as Duration.
#[must_use]
pub const fn retry_initial_delay() -> Duration {
    Duration::from_secs(RETRY_INITIAL_DELAY_SECS)
}

/// Default maximum retry delay as Duration.
#[must_use]
pub const fn retry_max_delay() -> Duration {
    Duration::from_secs(RETRY_MAX_DELAY_SECS)
}
