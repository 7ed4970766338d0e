//! Receiver registry: the ordered, deduplicated list of monitored addresses.
//!
//! This module provides:
//! - The canonical address type ([`RxAddress`])
//! - Candidate validation ([`validate`], [`ValidationError`])
//! - The session-scoped registry itself ([`ReceiverRegistry`])

mod address;
pub mod validate;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use address::RxAddress;
pub use validate::{ValidationError, validate};

/// An ordered, deduplicated collection of receiver addresses.
///
/// Scoped to one working session: created empty (or restored from persisted
/// session state), mutated by explicit operations, discarded when the
/// session ends. Order is caller-controlled and drives display order.
///
/// # Invariants
///
/// - No two entries are equal.
/// - Order is preserved across `append`/`remove`.
///
/// # Absence policy
///
/// No operation errors on a "not found" condition. The registry is
/// best-effort session state, not a strict collection with existence
/// preconditions: `remove` of an absent address is a no-op, `move_to` of an
/// absent address is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverRegistry {
    entries: Vec<RxAddress>,
}

impl ReceiverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an address at the end of the registry.
    ///
    /// No-op if the address is already present.
    ///
    /// # Returns
    ///
    /// `true` if an addition occurred.
    pub fn append(&mut self, address: RxAddress) -> bool {
        if self.contains(address) {
            return false;
        }
        self.entries.push(address);
        true
    }

    /// Moves an address to a new position.
    ///
    /// Removes the address if present, then re-inserts it at `new_index`
    /// clamped to `[0, len]`. No-op (but not an error) if the address is
    /// absent.
    pub fn move_to(&mut self, address: RxAddress, new_index: usize) {
        let Some(current) = self.entries.iter().position(|a| *a == address) else {
            return;
        };
        self.entries.remove(current);
        let index = new_index.min(self.entries.len());
        self.entries.insert(index, address);
    }

    /// Removes an address if present.
    ///
    /// # Returns
    ///
    /// `true` if a removal occurred.
    pub fn remove(&mut self, address: RxAddress) -> bool {
        let Some(index) = self.entries.iter().position(|a| *a == address) else {
            return false;
        };
        self.entries.remove(index);
        true
    }

    /// Returns true if the address is registered.
    #[must_use]
    pub fn contains(&self, address: RxAddress) -> bool {
        self.entries.contains(&address)
    }

    /// Returns the current entries in order, as a read-only snapshot.
    #[must_use]
    pub fn list(&self) -> &[RxAddress] {
        &self.entries
    }

    /// Returns the number of registered addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no addresses are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, RxAddress> {
        self.entries.iter()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Appends every address from `addresses`, preserving order.
    ///
    /// Restoration from persisted session state goes through [`append`],
    /// so the uniqueness invariant holds even for duplicated input.
    ///
    /// # Returns
    ///
    /// The number of additions that occurred.
    ///
    /// [`append`]: Self::append
    pub fn restore<I>(&mut self, addresses: I) -> usize
    where
        I: IntoIterator<Item = RxAddress>,
    {
        addresses
            .into_iter()
            .filter(|addr| self.append(*addr))
            .count()
    }
}

impl<'a> IntoIterator for &'a ReceiverRegistry {
    type Item = &'a RxAddress;
    type IntoIter = std::slice::Iter<'a, RxAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
