//! Tests for the run module.

use super::*;

fn addr(s: &str) -> RxAddress {
    s.parse().unwrap()
}

fn listed(registry: &ReceiverRegistry) -> Vec<String> {
    registry.iter().map(ToString::to_string).collect()
}

mod run_error {
    use super::*;

    #[test]
    fn stream_terminated_displays_message() {
        let error = RunError::StreamTerminated;
        assert_eq!(
            error.to_string(),
            "Telemetry stream terminated unexpectedly"
        );
    }

    #[test]
    fn session_save_displays_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = RunError::SessionSave(SessionError::Write(io));
        assert!(error.to_string().contains("Failed to save session state"));
    }
}

mod build_registry {
    use super::*;

    #[test]
    fn saved_state_is_restored_in_order() {
        let loaded = LoadResult::Loaded(vec![addr("10.0.0.2"), addr("10.0.0.1")]);

        let registry = build_registry(loaded, &[]);

        assert_eq!(listed(&registry), ["10.0.0.2", "10.0.0.1"]);
    }

    #[test]
    fn seeds_follow_saved_state() {
        let loaded = LoadResult::Loaded(vec![addr("10.0.0.1")]);

        let registry = build_registry(loaded, &[addr("192.168.1.5")]);

        assert_eq!(listed(&registry), ["10.0.0.1", "192.168.1.5"]);
    }

    #[test]
    fn seed_duplicating_saved_state_is_absorbed() {
        let loaded = LoadResult::Loaded(vec![addr("10.0.0.1")]);

        let registry = build_registry(loaded, &[addr("10.0.0.1"), addr("10.0.0.2")]);

        assert_eq!(listed(&registry), ["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn not_found_uses_seeds_only() {
        let registry = build_registry(LoadResult::NotFound, &[addr("10.0.0.1")]);

        assert_eq!(listed(&registry), ["10.0.0.1"]);
    }

    #[test]
    fn corrupted_state_falls_back_to_seeds() {
        let loaded = LoadResult::Corrupted {
            reason: "bad json".to_string(),
        };

        let registry = build_registry(loaded, &[addr("10.0.0.1")]);

        assert_eq!(listed(&registry), ["10.0.0.1"]);
    }

    #[test]
    fn empty_inputs_yield_empty_registry() {
        let registry = build_registry(LoadResult::NotFound, &[]);

        assert!(registry.is_empty());
    }
}

mod event_stream {
    use super::*;
    use rxmon::monitor::{DeviceMonitor, MonitorOptions, PollError, StatusClient, StatusReport};
    use std::net::Ipv4Addr;

    struct AlwaysUp;

    impl StatusClient for AlwaysUp {
        async fn query(&self, addr: Ipv4Addr) -> Result<StatusReport, PollError> {
            Ok(StatusReport {
                name: Some(format!("rx-{addr}")),
                ..StatusReport::default()
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_is_consumable_as_a_stream() {
        let monitor = DeviceMonitor::new(AlwaysUp, MonitorOptions::new());
        monitor.start();
        let mut events = BroadcastStream::new(monitor.subscribe());
        monitor.track(addr("10.0.0.1")).unwrap();

        let event = events.next().await.unwrap().unwrap();
        assert_eq!(event.address, addr("10.0.0.1"));
    }
}

mod persist_receivers {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn saves_to_configured_store() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("state.json"));
        let receivers = vec![addr("10.0.0.1"), addr("10.0.0.2")];

        persist_receivers(Some(&store), &receivers).await.unwrap();

        assert_eq!(store.load().into_addresses(), receivers);
    }

    #[tokio::test]
    async fn no_store_is_a_noop() {
        persist_receivers(None, &[addr("10.0.0.1")]).await.unwrap();
    }

    #[tokio::test]
    async fn unwritable_path_surfaces_error() {
        let dir = TempDir::new().unwrap();
        // A directory at the target path makes the rename fail.
        let path = dir.path().join("state.json");
        std::fs::create_dir(&path).unwrap();
        let store = FileSessionStore::new(&path);

        let result = persist_receivers(Some(&store), &[addr("10.0.0.1")]).await;

        assert!(matches!(result, Err(RunError::SessionSave(_))));
    }
}
