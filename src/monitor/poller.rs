//! Per-device poll task.
//!
//! One [`Poller`] runs per tracked address, independently of every other
//! device. It queries the status endpoint in a cycle, publishes a snapshot
//! into the monitor's table on every cycle (heartbeat included), and backs
//! off on failures. Per-device failures never leave this task.

use std::sync::Arc;

use tokio::sync::watch;

use super::client::StatusClient;
use super::monitor::{MonitorOptions, Shared};
use super::status::{LinkState, RxSnapshot, StatusReport};
use crate::registry::RxAddress;
use crate::time::Clock;

/// The poll loop state for one tracked receiver.
pub(super) struct Poller<C> {
    address: RxAddress,
    client: Arc<C>,
    clock: Arc<dyn Clock>,
    shared: Arc<Shared>,
    options: MonitorOptions,
    shutdown: watch::Receiver<bool>,
    link: LinkState,
    report: StatusReport,
    failures: u32,
}

impl<C: StatusClient> Poller<C> {
    pub(super) fn new(
        address: RxAddress,
        client: Arc<C>,
        clock: Arc<dyn Clock>,
        shared: Arc<Shared>,
        options: MonitorOptions,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            address,
            client,
            clock,
            shared,
            options,
            shutdown,
            link: LinkState::Connecting,
            report: StatusReport::default(),
            failures: 0,
        }
    }

    /// Runs the poll cycle until untracked or the monitor stops.
    ///
    /// Exits when the shutdown signal fires or when a publish is refused,
    /// which means this address is no longer tracked.
    pub(super) async fn run(mut self) {
        let initial = RxSnapshot::connecting(self.address, self.clock.now());
        if !self.shared.publish(initial) {
            return;
        }

        loop {
            let result = tokio::select! {
                _ = self.shutdown.changed() => return,
                result = self.client.query(self.address.ip()) => result,
            };

            match result {
                Ok(report) => self.observe_success(report),
                Err(error) => self.observe_failure(&error),
            }

            if !self.shared.publish(self.snapshot()) {
                return;
            }

            let delay = if self.failures == 0 {
                self.options.poll_interval
            } else {
                self.options.backoff.delay_for_failures(self.failures)
            };

            tokio::select! {
                _ = self.shutdown.changed() => return,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn observe_success(&mut self, report: StatusReport) {
        if !self.link.is_connected() {
            tracing::info!(address = %self.address, "Receiver connected");
        }
        self.link = LinkState::Connected;
        self.report = report;
        self.failures = 0;
    }

    fn observe_failure(&mut self, error: &crate::monitor::PollError) {
        self.failures = self.failures.saturating_add(1);
        tracing::debug!(
            address = %self.address,
            failures = self.failures,
            "Status poll failed: {error}"
        );

        // Latched: once offline, the link stays Disconnected until a poll
        // succeeds, so a flapping device does not oscillate through
        // intermediate states.
        if self.failures >= self.options.disconnect_after && self.link != LinkState::Disconnected
        {
            tracing::warn!(
                address = %self.address,
                failures = self.failures,
                "Receiver considered offline"
            );
            self.link = LinkState::Disconnected;
        }
    }

    fn snapshot(&self) -> RxSnapshot {
        RxSnapshot {
            address: self.address,
            link: self.link,
            report: self.report.clone(),
            consecutive_failures: self.failures,
            updated_at: self.clock.now(),
        }
    }
}
