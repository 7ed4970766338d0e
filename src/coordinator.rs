//! The monitoring coordinator: binds registry membership to monitor
//! tracking.
//!
//! The coordinator is the sole integration point between the session's
//! receiver registry and the device monitor. It is the only component
//! permitted to start or stop the monitor, and the single source of truth
//! other layers query for the receiver list.

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::monitor::{DeviceMonitor, MonitorError, StatusClient};
use crate::registry::{ReceiverRegistry, RxAddress, ValidationError, validate};

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

/// Error type for coordinator operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A candidate address failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The monitor refused to allocate another polling context.
    ///
    /// The address stays in the registry; monitoring of it resumes on the
    /// next session start if capacity allows.
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Lifecycle state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// No session is active; registry mutations have no tracking effect.
    Idle,
    /// A session is active; registry membership is mirrored into the
    /// monitor's tracked set.
    Running,
}

struct Inner {
    registry: ReceiverRegistry,
    state: SessionState,
}

/// Binds the receiver registry to the device monitor.
///
/// Registry mutations made while a session is running are reflected into
/// the monitor's tracked set before the mutation call returns; `move` never
/// touches the monitor since membership is unchanged. Mutations made while
/// idle are accepted into the registry only, and the full address set is
/// re-applied on the next session start.
///
/// All methods take `&self`; the registry lives behind a mutex so the
/// display and add-receiver collaborators can call in from any thread.
pub struct MonitoringCoordinator<C> {
    inner: Mutex<Inner>,
    monitor: DeviceMonitor<C>,
}

impl<C: StatusClient> MonitoringCoordinator<C> {
    /// Creates a coordinator with an empty registry.
    #[must_use]
    pub fn new(monitor: DeviceMonitor<C>) -> Self {
        Self::with_registry(monitor, ReceiverRegistry::new())
    }

    /// Creates a coordinator over a restored registry.
    ///
    /// Restoration happens before the monitor is told to track anything;
    /// the restored addresses are applied on the next [`session_start`].
    ///
    /// [`session_start`]: Self::session_start
    #[must_use]
    pub fn with_registry(monitor: DeviceMonitor<C>, registry: ReceiverRegistry) -> Self {
        Self {
            inner: Mutex::new(Inner {
                registry,
                state: SessionState::Idle,
            }),
            monitor,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a working session: starts the monitor, then tracks every
    /// address already in the registry, in order. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ResourceExhausted`] if the registry holds
    /// more addresses than the monitor's capacity. Addresses tracked before
    /// the capacity ran out keep being polled; no further `track` calls are
    /// issued for the remainder.
    pub fn session_start(&self) -> Result<(), MonitorError> {
        let mut inner = self.lock();
        if inner.state == SessionState::Running {
            return Ok(());
        }
        inner.state = SessionState::Running;
        self.monitor.start();

        let count = inner.registry.len();
        tracing::info!(receivers = count, "Monitoring session started");

        for address in inner.registry.iter() {
            if let Err(error) = self.monitor.track(*address) {
                tracing::error!(address = %address, "Cannot track receiver: {error}");
                return Err(error);
            }
        }
        Ok(())
    }

    /// Ends the working session: stops the monitor and discards the
    /// registry contents. Safe to call when already idle.
    pub fn session_end(&self) {
        let mut inner = self.lock();
        if inner.state == SessionState::Idle && inner.registry.is_empty() {
            return;
        }
        inner.state = SessionState::Idle;
        self.monitor.stop();
        inner.registry.clear();
        tracing::info!("Monitoring session ended");
    }

    /// Validates a candidate address and appends it to the registry.
    ///
    /// While running, the new address is tracked before this returns.
    ///
    /// # Errors
    ///
    /// - [`CoordinatorError::Validation`] for a malformed or duplicate
    ///   candidate (surfaced to the caller, registry unchanged).
    /// - [`CoordinatorError::Monitor`] if tracking capacity is exhausted;
    ///   the registry keeps the entry and monitoring of it is deferred.
    pub fn append_receiver(&self, candidate: &str) -> Result<RxAddress, CoordinatorError> {
        let mut inner = self.lock();
        let address = validate(candidate, &inner.registry)?;
        inner.registry.append(address);
        tracing::debug!(address = %address, "Receiver appended");

        if inner.state == SessionState::Running {
            self.monitor.track(address)?;
        }
        Ok(address)
    }

    /// Moves an address to a new position in the registry.
    ///
    /// Membership is unchanged, so the monitor is never involved. No-op if
    /// the address is absent.
    pub fn move_receiver(&self, address: RxAddress, new_index: usize) {
        self.lock().registry.move_to(address, new_index);
    }

    /// Removes an address from the registry.
    ///
    /// While running, the address is untracked before this returns: its
    /// snapshot becomes unavailable and no further events for it are
    /// delivered. No-op if the address is absent.
    pub fn remove_receiver(&self, address: RxAddress) {
        let mut inner = self.lock();
        let removed = inner.registry.remove(address);
        if removed && inner.state == SessionState::Running {
            self.monitor.untrack(address);
            tracing::debug!(address = %address, "Receiver removed");
        }
    }

    /// Returns true if the address is registered.
    #[must_use]
    pub fn contains(&self, address: RxAddress) -> bool {
        self.lock().registry.contains(address)
    }

    /// Returns the registry's current ordered contents.
    #[must_use]
    pub fn receivers(&self) -> Vec<RxAddress> {
        self.lock().registry.list().to_vec()
    }

    /// Returns true while a session is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock().state == SessionState::Running
    }

    /// Read access to the monitor, for `subscribe`/`snapshot` consumers.
    ///
    /// The coordinator does not transform or filter telemetry; display
    /// surfaces talk to the monitor directly.
    #[must_use]
    pub const fn monitor(&self) -> &DeviceMonitor<C> {
        &self.monitor
    }
}
