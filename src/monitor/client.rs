//! Status endpoint clients.
//!
//! The manufacturer status protocol is an unauthenticated LAN
//! request/response exchange. Its exact byte layout is confined to this
//! module behind the [`StatusClient`] seam: the poll loop only ever sees a
//! decoded [`StatusReport`] or a [`PollError`].

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

use super::error::PollError;
use super::status::StatusReport;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Abstraction over a receiver's status endpoint.
///
/// One `query` call performs one bounded request/response exchange. The
/// implementation owns the per-attempt timeout; callers never wait
/// indefinitely. Implementations must be cheap to share, since one client
/// serves every poll task concurrently.
pub trait StatusClient: Send + Sync + 'static {
    /// Queries the current status of the receiver at `addr`.
    ///
    /// # Errors
    ///
    /// Returns a [`PollError`] describing why no decoded report is
    /// available: unreachable, timed out, or undecodable reply.
    fn query(
        &self,
        addr: Ipv4Addr,
    ) -> impl std::future::Future<Output = Result<StatusReport, PollError>> + Send;
}

/// Default control port receivers answer status queries on.
pub const DEFAULT_STATUS_PORT: u16 = 53212;

/// Default per-attempt reply timeout.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(750);

/// The status request payload.
///
/// A single push request; the receiver answers with one datagram of
/// `Key: value` lines.
const STATUS_REQUEST: &[u8] = b"Push\r";

/// Maximum accepted reply size. Real replies are a few hundred bytes.
const MAX_REPLY_BYTES: usize = 2048;

/// UDP implementation of [`StatusClient`].
///
/// Sends one status request datagram per query and waits (bounded by the
/// attempt timeout) for one reply datagram, decoded by [`decode_report`].
/// Each query binds an ephemeral local socket, so concurrent queries to
/// different receivers never interfere.
#[derive(Debug, Clone)]
pub struct UdpStatusClient {
    port: u16,
    attempt_timeout: Duration,
}

impl UdpStatusClient {
    /// Creates a client with the default port and timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            port: DEFAULT_STATUS_PORT,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Sets the destination control port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-attempt reply timeout.
    #[must_use]
    pub const fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Returns the configured destination port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the configured per-attempt timeout.
    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Performs the unbounded part of the exchange; wrapped in a timeout
    /// by [`StatusClient::query`].
    async fn exchange(&self, addr: Ipv4Addr) -> Result<StatusReport, PollError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(PollError::Unreachable)?;
        socket
            .connect((addr, self.port))
            .await
            .map_err(PollError::Unreachable)?;
        socket
            .send(STATUS_REQUEST)
            .await
            .map_err(PollError::Unreachable)?;

        let mut buf = vec![0u8; MAX_REPLY_BYTES];
        let len = socket.recv(&mut buf).await.map_err(PollError::Unreachable)?;
        buf.truncate(len);

        decode_report(&buf)
    }
}

impl Default for UdpStatusClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusClient for UdpStatusClient {
    async fn query(&self, addr: Ipv4Addr) -> Result<StatusReport, PollError> {
        match timeout(self.attempt_timeout, self.exchange(addr)).await {
            Ok(result) => result,
            Err(_) => Err(PollError::Timeout {
                timeout: self.attempt_timeout,
            }),
        }
    }
}

/// Decodes a status reply datagram into a [`StatusReport`].
///
/// The reply is a sequence of `Key: value` lines (CR, LF, or CRLF
/// separated). Unrecognized keys are ignored so firmware revisions can add
/// fields freely. Gauge values are clamped to `0..=100`.
///
/// # Errors
///
/// Returns [`PollError::MalformedReply`] if the payload is not UTF-8 or
/// contains no recognizable line at all.
pub fn decode_report(payload: &[u8]) -> Result<StatusReport, PollError> {
    let text = std::str::from_utf8(payload).map_err(|_| PollError::MalformedReply {
        reason: "reply is not valid UTF-8".to_string(),
    })?;

    let mut report = StatusReport::default();
    let mut recognized = false;

    for line in text.split(['\r', '\n']) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "Name" => {
                report.name = Some(value.to_string());
                recognized = true;
            }
            "Bat" => {
                report.battery_percent = parse_gauge(value);
                recognized = true;
            }
            "AF" => {
                report.af_level = parse_gauge(value);
                recognized = true;
            }
            "RF" => {
                report.rf_level = parse_gauge(value);
                recognized = true;
            }
            _ => {}
        }
    }

    if recognized {
        Ok(report)
    } else {
        Err(PollError::MalformedReply {
            reason: "no recognizable status line in reply".to_string(),
        })
    }
}

/// Parses a gauge value, clamping to `0..=100`.
///
/// Unparsable gauges become `None` rather than failing the whole reply.
fn parse_gauge(value: &str) -> Option<u8> {
    // Some firmware suffixes a unit, e.g. "85%"
    let digits = value.trim_end_matches('%').trim();
    digits
        .parse::<u16>()
        .ok()
        .and_then(|v| u8::try_from(v.min(100)).ok())
}
