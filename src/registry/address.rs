//! Canonical receiver address type.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;
use super::validate::parse_dotted_quad;

/// A normalized IPv4 address identifying one receiver.
///
/// This is the unit of identity for the whole crate: the registry stores
/// these, the monitor keys its snapshot table by them, and telemetry events
/// are tagged with them.
///
/// # Canonical form
///
/// Two addresses are equal iff their canonical forms are equal. The canonical
/// form is the numeric-value rendering of the four octets (what
/// [`Ipv4Addr`] displays), so `"192.168.001.001"` and `"192.168.1.1"` name
/// the same receiver. Parsing accepts leading zeros; display always emits
/// the canonical form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RxAddress(Ipv4Addr);

impl RxAddress {
    /// Creates an address from an already-parsed IPv4 address.
    #[must_use]
    pub const fn new(ip: Ipv4Addr) -> Self {
        Self(ip)
    }

    /// Returns the underlying IPv4 address.
    #[must_use]
    pub const fn ip(self) -> Ipv4Addr {
        self.0
    }

    /// Returns the four octets of the address.
    #[must_use]
    pub const fn octets(self) -> [u8; 4] {
        self.0.octets()
    }
}

impl fmt::Display for RxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Ipv4Addr> for RxAddress {
    fn from(ip: Ipv4Addr) -> Self {
        Self(ip)
    }
}

impl FromStr for RxAddress {
    type Err = ValidationError;

    /// Parses a dotted-quad string, normalizing octet values.
    ///
    /// Unlike [`Ipv4Addr`]'s parser this accepts leading zeros, matching
    /// what fixed-width address entry fields produce.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dotted_quad(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_canonical() {
        let addr: RxAddress = "192.168.001.001".parse().unwrap();
        assert_eq!(addr.to_string(), "192.168.1.1");
    }

    #[test]
    fn equality_ignores_leading_zeros() {
        let a: RxAddress = "010.000.000.001".parse().unwrap();
        let b: RxAddress = "10.0.0.1".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn octets_round_trip() {
        let addr = RxAddress::new(Ipv4Addr::new(10, 0, 0, 42));
        assert_eq!(addr.octets(), [10, 0, 0, 42]);
        assert_eq!(addr.ip(), Ipv4Addr::new(10, 0, 0, 42));
    }

    #[test]
    fn serializes_as_canonical_string() {
        let addr: RxAddress = "172.016.0.1".parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"172.16.0.1\"");

        let back: RxAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
