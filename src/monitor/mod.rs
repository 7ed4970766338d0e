//! Monitor layer: per-device polling and telemetry fan-out.
//!
//! This module provides:
//! - Snapshot and event types ([`LinkState`], [`RxSnapshot`], [`StatusEvent`])
//! - The status endpoint seam ([`StatusClient`], [`UdpStatusClient`])
//! - Failure backoff ([`RetryPolicy`])
//! - Error handling ([`MonitorError`], [`PollError`])
//! - The monitor itself ([`DeviceMonitor`], [`MonitorOptions`])

mod backoff;
mod client;
mod error;
#[allow(clippy::module_inception)]
mod monitor;
mod poller;
mod status;

pub use backoff::RetryPolicy;
pub use client::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_STATUS_PORT, StatusClient, UdpStatusClient, decode_report,
};
pub use error::{MonitorError, PollError};
pub use monitor::{DeviceMonitor, MonitorOptions};
pub use status::{LinkState, RxSnapshot, StatusEvent, StatusReport};
