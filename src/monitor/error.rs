//! Error types for the monitor layer.

use std::time::Duration;

use thiserror::Error;

/// Error type for a single status query against one receiver.
///
/// These are per-device conditions. The poll task recovers from all of them
/// internally via backoff and reflects them as a link state in the device's
/// snapshot; they are never surfaced as hard failures.
#[derive(Debug, Error)]
pub enum PollError {
    /// The device could not be reached at the socket level.
    #[error("Device unreachable: {0}")]
    Unreachable(#[source] std::io::Error),

    /// The device did not answer within the per-attempt timeout.
    #[error("No reply within {timeout:?}")]
    Timeout {
        /// The attempt timeout that elapsed.
        timeout: Duration,
    },

    /// The device answered, but the reply could not be decoded.
    #[error("Malformed status reply: {reason}")]
    MalformedReply {
        /// Decoder-provided description of what was wrong.
        reason: String,
    },
}

/// Error type for monitor-level operations.
///
/// Unlike [`PollError`], these are fatal at the monitor level and are
/// surfaced to the coordinator, which should stop attempting further
/// `track` calls and report upward rather than crash.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No further polling contexts can be allocated.
    #[error("Tracking capacity exhausted ({capacity} devices)")]
    ResourceExhausted {
        /// The configured device capacity.
        capacity: usize,
    },
}
