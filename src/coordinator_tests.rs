use super::*;
use crate::monitor::{
    LinkState, MonitorOptions, PollError, RetryPolicy, StatusReport,
};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Mock status client answering every query.
struct AlwaysUp;

impl StatusClient for AlwaysUp {
    async fn query(&self, addr: Ipv4Addr) -> Result<StatusReport, PollError> {
        Ok(StatusReport {
            name: Some(format!("rx-{addr}")),
            battery_percent: Some(70),
            ..StatusReport::default()
        })
    }
}

fn addr(s: &str) -> RxAddress {
    s.parse().unwrap()
}

fn fast_options() -> MonitorOptions {
    MonitorOptions::new()
        .with_poll_interval(Duration::from_millis(10))
        .with_backoff(RetryPolicy::new().with_initial_delay(Duration::from_millis(10)))
}

fn coordinator() -> MonitoringCoordinator<AlwaysUp> {
    MonitoringCoordinator::new(DeviceMonitor::new(AlwaysUp, fast_options()))
}

fn coordinator_with(addrs: &[&str]) -> MonitoringCoordinator<AlwaysUp> {
    let mut registry = ReceiverRegistry::new();
    for a in addrs {
        registry.append(addr(a));
    }
    MonitoringCoordinator::with_registry(DeviceMonitor::new(AlwaysUp, fast_options()), registry)
}

fn tracked_set(coordinator: &MonitoringCoordinator<AlwaysUp>) -> HashSet<RxAddress> {
    coordinator.monitor().tracked().into_iter().collect()
}

fn registry_set(coordinator: &MonitoringCoordinator<AlwaysUp>) -> HashSet<RxAddress> {
    coordinator.receivers().into_iter().collect()
}

mod session_lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn session_start_tracks_every_registered_address() {
        let coordinator = coordinator_with(&["10.0.0.1", "10.0.0.2"]);

        coordinator.session_start().unwrap();

        assert!(coordinator.is_running());
        assert_eq!(tracked_set(&coordinator), registry_set(&coordinator));
        assert_eq!(coordinator.monitor().tracked_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn session_start_is_idempotent() {
        let coordinator = coordinator_with(&["10.0.0.1"]);

        coordinator.session_start().unwrap();
        coordinator.session_start().unwrap();

        assert_eq!(coordinator.monitor().tracked_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn session_end_stops_monitor_and_discards_registry() {
        let coordinator = coordinator_with(&["10.0.0.1", "10.0.0.2"]);
        coordinator.session_start().unwrap();

        coordinator.session_end();

        assert!(!coordinator.is_running());
        assert!(coordinator.receivers().is_empty());
        assert_eq!(coordinator.monitor().tracked_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn session_end_when_idle_is_safe() {
        let coordinator = coordinator();
        coordinator.session_end();
        coordinator.session_end();

        assert!(!coordinator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_reapplies_current_registry() {
        let coordinator = coordinator_with(&["10.0.0.1"]);
        coordinator.session_start().unwrap();
        coordinator.append_receiver("10.0.0.2").unwrap();
        coordinator.session_end();

        // Registry was discarded on session end; a fresh set is built
        // before the next session, as the host would on session restore.
        assert_eq!(coordinator.monitor().tracked_count(), 0);
        coordinator.append_receiver("192.168.1.5").unwrap();
        coordinator.session_start().unwrap();

        assert_eq!(
            tracked_set(&coordinator),
            HashSet::from([addr("192.168.1.5")])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn restored_registry_is_applied_on_start() {
        let coordinator = coordinator_with(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

        assert_eq!(coordinator.monitor().tracked_count(), 0);
        coordinator.session_start().unwrap();

        assert_eq!(coordinator.monitor().tracked_count(), 3);
    }
}

mod mutations_while_running {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn append_tracks_immediately() {
        let coordinator = coordinator();
        coordinator.session_start().unwrap();

        let address = coordinator.append_receiver("10.0.0.1").unwrap();

        assert_eq!(tracked_set(&coordinator), HashSet::from([address]));
    }

    #[tokio::test(start_paused = true)]
    async fn remove_untracks_and_discards_snapshot() {
        let coordinator = coordinator();
        coordinator.session_start().unwrap();
        let address = coordinator.append_receiver("10.0.0.1").unwrap();

        // Wait until telemetry has arrived.
        let mut rx = coordinator.monitor().subscribe();
        loop {
            let event = rx.recv().await.unwrap();
            if event.snapshot.link == LinkState::Connected {
                break;
            }
        }

        coordinator.remove_receiver(address);

        assert!(coordinator.monitor().snapshot(address).is_none());
        assert_eq!(coordinator.monitor().tracked_count(), 0);
        assert!(!coordinator.contains(address));
    }

    #[tokio::test(start_paused = true)]
    async fn move_changes_order_but_not_tracking() {
        let coordinator = coordinator_with(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        coordinator.session_start().unwrap();
        let before = tracked_set(&coordinator);

        coordinator.move_receiver(addr("10.0.0.3"), 0);

        let listed: Vec<String> = coordinator
            .receivers()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(listed, ["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
        assert_eq!(tracked_set(&coordinator), before);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_absent_address_is_noop() {
        let coordinator = coordinator_with(&["10.0.0.1"]);
        coordinator.session_start().unwrap();

        coordinator.remove_receiver(addr("192.168.1.1"));

        assert_eq!(coordinator.monitor().tracked_count(), 1);
    }
}

mod mutations_while_idle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn append_while_idle_registers_without_tracking() {
        let coordinator = coordinator();

        let address = coordinator.append_receiver("10.0.0.1").unwrap();

        assert!(coordinator.contains(address));
        assert_eq!(coordinator.monitor().tracked_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_mutations_take_effect_on_next_start() {
        let coordinator = coordinator();
        coordinator.append_receiver("10.0.0.1").unwrap();
        coordinator.append_receiver("10.0.0.2").unwrap();
        coordinator.remove_receiver(addr("10.0.0.1"));

        coordinator.session_start().unwrap();

        assert_eq!(tracked_set(&coordinator), HashSet::from([addr("10.0.0.2")]));
    }
}

mod validation {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn malformed_candidate_is_rejected() {
        let coordinator = coordinator();

        let result = coordinator.append_receiver("1.2.3");

        assert!(matches!(
            result,
            Err(CoordinatorError::Validation(
                ValidationError::MalformedAddress { .. }
            ))
        ));
        assert!(coordinator.receivers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_candidate_is_rejected() {
        let coordinator = coordinator();
        coordinator.append_receiver("192.168.1.5").unwrap();

        let result = coordinator.append_receiver("192.168.001.005");

        assert!(matches!(
            result,
            Err(CoordinatorError::Validation(
                ValidationError::DuplicateAddress { .. }
            ))
        ));
        assert_eq!(coordinator.receivers().len(), 1);
    }
}

mod capacity {
    use super::*;

    fn tiny_coordinator() -> MonitoringCoordinator<AlwaysUp> {
        let options = fast_options().with_capacity(1);
        MonitoringCoordinator::new(DeviceMonitor::new(AlwaysUp, options))
    }

    #[tokio::test(start_paused = true)]
    async fn append_beyond_capacity_reports_but_keeps_entry() {
        let coordinator = tiny_coordinator();
        coordinator.session_start().unwrap();
        coordinator.append_receiver("10.0.0.1").unwrap();

        let result = coordinator.append_receiver("10.0.0.2");

        assert!(matches!(
            result,
            Err(CoordinatorError::Monitor(
                MonitorError::ResourceExhausted { .. }
            ))
        ));
        // The registry keeps the entry; only tracking is degraded.
        assert!(coordinator.contains(addr("10.0.0.2")));
        assert_eq!(coordinator.monitor().tracked_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn session_start_beyond_capacity_reports_upward() {
        let options = fast_options().with_capacity(1);
        let mut registry = ReceiverRegistry::new();
        registry.append(addr("10.0.0.1"));
        registry.append(addr("10.0.0.2"));
        let coordinator = MonitoringCoordinator::with_registry(
            DeviceMonitor::new(AlwaysUp, options),
            registry,
        );

        let result = coordinator.session_start();

        assert!(matches!(
            result,
            Err(MonitorError::ResourceExhausted { .. })
        ));
        // The first address was tracked before capacity ran out.
        assert_eq!(coordinator.monitor().tracked_count(), 1);
    }
}
