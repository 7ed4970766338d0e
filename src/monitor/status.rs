//! Snapshot and event types for receiver telemetry.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::registry::RxAddress;

/// Link state of one tracked receiver.
///
/// `Disconnected` is latched: once a receiver crosses the failure
/// threshold it stays `Disconnected` until a poll succeeds, so a flapping
/// device does not oscillate through intermediate states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    /// Tracked, but no poll has completed yet.
    Connecting,
    /// The last poll succeeded.
    Connected,
    /// The failure threshold was crossed and no poll has succeeded since.
    Disconnected,
}

impl LinkState {
    /// Returns true for `Connected`.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

/// Decoded telemetry from one status reply.
///
/// Every field is optional: firmware revisions differ in what they report,
/// and a reply that carries any recognizable field at all is usable.
/// Gauge values are percentages clamped to `0..=100`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Receiver's self-reported name.
    pub name: Option<String>,

    /// Battery charge gauge.
    pub battery_percent: Option<u8>,

    /// Audio (AF) level gauge.
    pub af_level: Option<u8>,

    /// Radio (RF) level gauge.
    pub rf_level: Option<u8>,
}

impl StatusReport {
    /// Returns true if no field carries a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.battery_percent.is_none()
            && self.af_level.is_none()
            && self.rf_level.is_none()
    }
}

/// The most recent known status of one tracked receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxSnapshot {
    /// The receiver this snapshot describes.
    pub address: RxAddress,

    /// Current link state.
    pub link: LinkState,

    /// Telemetry from the last successful poll.
    ///
    /// Kept as-is while the link is down, so displays can show the last
    /// known values alongside the disconnected state.
    pub report: StatusReport,

    /// Consecutive failed polls; zero whenever the last poll succeeded.
    pub consecutive_failures: u32,

    /// When this snapshot was produced.
    pub updated_at: SystemTime,
}

impl RxSnapshot {
    /// Initial snapshot published when tracking begins, before any poll.
    #[must_use]
    pub fn connecting(address: RxAddress, updated_at: SystemTime) -> Self {
        Self {
            address,
            link: LinkState::Connecting,
            report: StatusReport::default(),
            consecutive_failures: 0,
            updated_at,
        }
    }
}

/// One telemetry event as delivered to subscribers.
///
/// Every publish of a snapshot produces one event (heartbeats included),
/// so subscribers can detect staleness without polling the monitor.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    /// The receiver the event concerns.
    pub address: RxAddress,

    /// The snapshot as of this event.
    pub snapshot: RxSnapshot,
}
