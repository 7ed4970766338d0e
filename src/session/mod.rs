//! Session persistence for the receiver list.
//!
//! The host's session collaborator persists the registry's ordered address
//! list and restores it when a session is loaded, before the monitor is
//! told to track anything.

mod file;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use file::FileSessionStore;

use std::io;

use thiserror::Error;

use crate::registry::RxAddress;

/// Result of loading the receiver list from persistent storage.
///
/// Explicitly models all valid states to avoid ambiguity:
/// - Successfully loaded a previous receiver list
/// - No previous session state exists (first run)
/// - State exists but is corrupted/unreadable
#[derive(Debug, Clone)]
pub enum LoadResult {
    /// Successfully loaded a previously saved receiver list, in order.
    Loaded(Vec<RxAddress>),

    /// No session state exists (first run or explicitly deleted).
    NotFound,

    /// Session state exists but could not be parsed.
    /// The session should continue empty and overwrite on next save.
    Corrupted {
        /// Reason for corruption (for logging/debugging).
        reason: String,
    },
}

impl LoadResult {
    /// Returns the loaded addresses, or an empty vec for
    /// `NotFound`/`Corrupted`.
    #[must_use]
    pub fn into_addresses(self) -> Vec<RxAddress> {
        match self {
            Self::Loaded(addresses) => addresses,
            Self::NotFound | Self::Corrupted { .. } => Vec::new(),
        }
    }

    /// Returns `true` if state was successfully loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Errors that can occur when persisting the receiver list.
///
/// Only covers write-side errors; read-side issues are modeled as
/// [`LoadResult`] variants to allow graceful degradation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to write the session state file.
    #[error("Failed to write session state: {0}")]
    Write(#[source] io::Error),

    /// Failed to serialize the receiver list to JSON.
    #[error("Failed to serialize session state: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Abstraction for persisting the receiver list between sessions.
///
/// Implementations should:
/// - Use atomic writes to prevent corruption from crashes
/// - Handle missing files gracefully (return `LoadResult::NotFound`)
/// - Degrade gracefully on read errors (return `LoadResult::Corrupted`)
pub trait SessionStore: Send + Sync {
    /// Loads the previously saved receiver list.
    fn load(&self) -> LoadResult;

    /// Saves the receiver list, preserving order.
    ///
    /// Implementations should use atomic write semantics (write to temp
    /// file, then rename) so a crash mid-write cannot corrupt the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(
        &self,
        addresses: &[RxAddress],
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;
}
