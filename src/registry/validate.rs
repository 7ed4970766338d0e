//! Candidate address validation.
//!
//! Pure logic deciding whether a candidate string is a well-formed
//! dotted-quad and not already registered. No side effects; safe to call
//! repeatedly and concurrently.

use thiserror::Error;

use super::{ReceiverRegistry, RxAddress};

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;

/// Error type for candidate address validation.
///
/// The two variants are deliberately distinct so callers can show a
/// specific message per failure kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The input is not a syntactically complete dotted-quad.
    #[error("Not a valid IPv4 address: '{input}'")]
    MalformedAddress {
        /// The rejected input, verbatim.
        input: String,
    },

    /// The input names an address that is already registered.
    #[error("Address already registered: {address}")]
    DuplicateAddress {
        /// The canonical form of the colliding address.
        address: RxAddress,
    },
}

/// Validates a candidate address string against the current registry.
///
/// Accepts only a complete dotted-quad: four dot-separated, non-empty,
/// all-digit octets, each in `0..=255`. Leading zeros are allowed and
/// normalized by numeric value, so `"192.168.001.001"` collides with an
/// existing `"192.168.1.1"` entry.
///
/// # Errors
///
/// - [`ValidationError::MalformedAddress`] if the input fails syntactic
///   validation.
/// - [`ValidationError::DuplicateAddress`] if the canonical form is already
///   present in `existing`.
pub fn validate(
    candidate: &str,
    existing: &ReceiverRegistry,
) -> Result<RxAddress, ValidationError> {
    let address = parse_dotted_quad(candidate)?;

    if existing.contains(address) {
        return Err(ValidationError::DuplicateAddress { address });
    }

    Ok(address)
}

/// Parses a dotted-quad string into a normalized address.
///
/// Std's [`Ipv4Addr`](std::net::Ipv4Addr) parser rejects leading zeros,
/// which fixed-width entry fields legitimately produce, so octets are
/// parsed here by numeric value.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedAddress`] unless the input is
/// exactly four dot-separated decimal octets, each in `0..=255`.
pub fn parse_dotted_quad(input: &str) -> Result<RxAddress, ValidationError> {
    let malformed = || ValidationError::MalformedAddress {
        input: input.to_string(),
    };

    let mut octets = [0u8; 4];
    let mut count = 0;

    for part in input.split('.') {
        if count == 4 {
            // More than four octets
            return Err(malformed());
        }
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        // Parse as u32 first so "0256" overflows the range check, not u8.
        let value: u32 = part.parse().map_err(|_| malformed())?;
        if value > 255 {
            return Err(malformed());
        }
        // Range checked above
        #[allow(clippy::cast_possible_truncation)]
        {
            octets[count] = value as u8;
        }
        count += 1;
    }

    if count != 4 {
        return Err(malformed());
    }

    Ok(RxAddress::new(octets.into()))
}
