//! The device monitor: tracked-address set, snapshot table, event fan-out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::backoff::RetryPolicy;
use super::client::StatusClient;
use super::error::MonitorError;
use super::poller::Poller;
use super::status::{RxSnapshot, StatusEvent};
use crate::registry::RxAddress;
use crate::time::{Clock, SystemClock};

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;

/// Event channel capacity per monitor.
///
/// A subscriber that falls more than this many events behind loses the
/// oldest ones (drop-oldest policy); producers never block on delivery.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Tuning options for a [`DeviceMonitor`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOptions {
    /// Interval between successful polls of one device.
    pub poll_interval: Duration,

    /// Consecutive failed polls before a device's link state latches to
    /// `Disconnected`.
    pub disconnect_after: u32,

    /// Maximum number of concurrently tracked devices. Exceeding it is the
    /// monitor's only fatal condition
    /// ([`MonitorError::ResourceExhausted`]).
    pub capacity: usize,

    /// Backoff applied between failed polls of one device.
    pub backoff: RetryPolicy,
}

impl MonitorOptions {
    /// Default poll interval (2 seconds).
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// Default failure threshold before `Disconnected`.
    pub const DEFAULT_DISCONNECT_AFTER: u32 = 3;

    /// Default tracked-device capacity.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Creates options with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            disconnect_after: Self::DEFAULT_DISCONNECT_AFTER,
            capacity: Self::DEFAULT_CAPACITY,
            backoff: RetryPolicy::new(),
        }
    }

    /// Sets the interval between successful polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the failure threshold before a device latches `Disconnected`.
    ///
    /// # Panics
    ///
    /// Panics if `disconnect_after` is zero.
    #[must_use]
    pub const fn with_disconnect_after(mut self, disconnect_after: u32) -> Self {
        assert!(disconnect_after >= 1, "disconnect_after must be at least 1");
        self.disconnect_after = disconnect_after;
        self
    }

    /// Sets the tracked-device capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity >= 1, "capacity must be at least 1");
        self.capacity = capacity;
        self
    }

    /// Sets the failure backoff policy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: RetryPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle to one tracked device's poll task.
struct TrackedDevice {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// The state shared between the monitor handle and every poll task.
///
/// One mutex guards both the task handles and the snapshot table, and no
/// `.await` ever runs under it. Publishing and untracking take the same
/// lock, which is what makes the untrack guarantee strict: once `untrack`
/// returns, no publish can observe the address as tracked, so no further
/// event for it reaches subscribers.
pub(super) struct Shared {
    table: Mutex<TrackTable>,
    events: broadcast::Sender<StatusEvent>,
}

#[derive(Default)]
struct TrackTable {
    running: bool,
    devices: HashMap<RxAddress, TrackedDevice>,
    snapshots: HashMap<RxAddress, RxSnapshot>,
}

impl Shared {
    fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            table: Mutex::new(TrackTable::default()),
            events,
        }
    }

    /// Locks the table, recovering from poisoning.
    ///
    /// Poll tasks never panic while holding the lock, but recovery keeps a
    /// poisoned table from wedging the whole monitor.
    fn lock(&self) -> MutexGuard<'_, TrackTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a snapshot and fans it out to subscribers.
    ///
    /// Refused (returns `false`) when the monitor has stopped or the
    /// address is no longer tracked; the calling poll task exits on refusal.
    pub(super) fn publish(&self, snapshot: RxSnapshot) -> bool {
        let mut table = self.lock();
        if !table.running || !table.devices.contains_key(&snapshot.address) {
            return false;
        }

        let address = snapshot.address;
        table.snapshots.insert(address, snapshot.clone());

        // A send error only means there is no subscriber right now.
        let _ = self.events.send(StatusEvent { address, snapshot });
        true
    }
}

/// Polls every tracked receiver and holds its current status snapshot.
///
/// One independent poll task runs per tracked address. Consumers read
/// state through [`snapshot`] and [`subscribe`]; the coordinator drives
/// [`start`]/[`stop`]/[`track`]/[`untrack`].
///
/// All operations take `&self` and are safe from any thread;
/// [`start`]/[`stop`] are expected to be called from the single control
/// context that owns the monitor (the coordinator).
///
/// [`snapshot`]: Self::snapshot
/// [`subscribe`]: Self::subscribe
/// [`start`]: Self::start
/// [`stop`]: Self::stop
/// [`track`]: Self::track
/// [`untrack`]: Self::untrack
pub struct DeviceMonitor<C> {
    client: Arc<C>,
    clock: Arc<dyn Clock>,
    options: MonitorOptions,
    shared: Arc<Shared>,
}

impl<C: StatusClient> DeviceMonitor<C> {
    /// Creates a monitor with the system clock.
    #[must_use]
    pub fn new(client: C, options: MonitorOptions) -> Self {
        Self::with_clock(client, SystemClock, options)
    }

    /// Creates a monitor with a custom clock (for tests).
    #[must_use]
    pub fn with_clock(client: C, clock: impl Clock + 'static, options: MonitorOptions) -> Self {
        Self {
            client: Arc::new(client),
            clock: Arc::new(clock),
            options,
            shared: Arc::new(Shared::new()),
        }
    }

    /// Returns the configured options.
    #[must_use]
    pub const fn options(&self) -> &MonitorOptions {
        &self.options
    }

    /// Begins the monitor's background execution context.
    ///
    /// Idempotent. Must be called before [`track`]/[`untrack`] take
    /// effect; tracking requests made while stopped are discarded, and the
    /// coordinator re-applies the full address set on session start.
    ///
    /// [`track`]: Self::track
    /// [`untrack`]: Self::untrack
    pub fn start(&self) {
        let mut table = self.shared.lock();
        if !table.running {
            table.running = true;
            tracing::debug!("Device monitor started");
        }
    }

    /// Stops all polling, discards every snapshot, and halts.
    ///
    /// Safe to call when never started, and safe to call while `track`
    /// calls are in flight: requests that lose the race are discarded, not
    /// applied after stop. Completion is bounded because poll tasks never
    /// block outside an await point and are aborted here.
    pub fn stop(&self) {
        let mut table = self.shared.lock();
        if !table.running && table.devices.is_empty() {
            return;
        }
        table.running = false;

        for (address, device) in table.devices.drain() {
            let _ = device.shutdown.send(true);
            device.task.abort();
            tracing::debug!(address = %address, "Stopped polling");
        }
        table.snapshots.clear();
        tracing::debug!("Device monitor stopped");
    }

    /// Begins polling an address. Idempotent.
    ///
    /// No effect (and no error) while the monitor is stopped.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::ResourceExhausted`] when the configured
    /// device capacity is already fully used.
    pub fn track(&self, address: RxAddress) -> Result<(), MonitorError> {
        let mut table = self.shared.lock();
        if !table.running || table.devices.contains_key(&address) {
            return Ok(());
        }
        if table.devices.len() >= self.options.capacity {
            return Err(MonitorError::ResourceExhausted {
                capacity: self.options.capacity,
            });
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = Poller::new(
            address,
            Arc::clone(&self.client),
            Arc::clone(&self.clock),
            Arc::clone(&self.shared),
            self.options.clone(),
            shutdown_rx,
        );
        let task = tokio::spawn(poller.run());

        table.devices.insert(
            address,
            TrackedDevice {
                shutdown: shutdown_tx,
                task,
            },
        );
        tracing::debug!(address = %address, "Tracking receiver");
        Ok(())
    }

    /// Stops polling an address and discards its snapshot. Idempotent.
    ///
    /// Once this returns, no further event for the address is delivered to
    /// subscribers.
    pub fn untrack(&self, address: RxAddress) {
        let mut table = self.shared.lock();
        if let Some(device) = table.devices.remove(&address) {
            let _ = device.shutdown.send(true);
            device.task.abort();
            tracing::debug!(address = %address, "Untracked receiver");
        }
        table.snapshots.remove(&address);
    }

    /// Returns the current best-known status for an address, or `None` if
    /// it was never tracked or no status has been received yet.
    #[must_use]
    pub fn snapshot(&self, address: RxAddress) -> Option<RxSnapshot> {
        self.shared.lock().snapshots.get(&address).cloned()
    }

    /// Returns the set of currently tracked addresses, in no defined order.
    #[must_use]
    pub fn tracked(&self) -> Vec<RxAddress> {
        self.shared.lock().devices.keys().copied().collect()
    }

    /// Returns the number of currently tracked addresses.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.shared.lock().devices.len()
    }

    /// Returns true if the monitor has been started and not stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    /// Subscribes to the telemetry event feed.
    ///
    /// Every subscriber receives every event independently (fan-out, not a
    /// shared cursor), and subscribing never blocks producers. A subscriber
    /// that cannot keep up loses the oldest events and observes
    /// [`broadcast::error::RecvError::Lagged`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.shared.events.subscribe()
    }
}
