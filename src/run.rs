//! Application execution logic.
//!
//! This module contains the main async execution loop that restores the
//! receiver list, starts a monitoring session, and logs telemetry until a
//! shutdown signal arrives.

use thiserror::Error;
use tokio::signal;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use rxmon::config::ValidatedConfig;
use rxmon::coordinator::MonitoringCoordinator;
use rxmon::monitor::{DeviceMonitor, StatusEvent, UdpStatusClient};
use rxmon::registry::{ReceiverRegistry, RxAddress};
use rxmon::session::{FileSessionStore, LoadResult, SessionError, SessionStore};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Unexpected event stream termination.
    #[error("Telemetry stream terminated unexpectedly")]
    StreamTerminated,

    /// Failed to save session state.
    #[error("Failed to save session state: {0}")]
    SessionSave(#[source] SessionError),
}

/// Executes the main application loop.
///
/// This function:
/// 1. Restores the receiver list from the state file (if configured),
///    then appends any configured seed addresses
/// 2. Starts a monitoring session over the restored list
/// 3. Logs telemetry events until a shutdown signal (Ctrl+C / SIGTERM)
/// 4. Saves the receiver list and ends the session
///
/// # Errors
///
/// Returns an error if the telemetry stream terminates unexpectedly or the
/// receiver list cannot be saved at shutdown.
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires a real
/// async runtime with signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let store = config.state_file.as_ref().map(FileSessionStore::new);

    let registry = match store {
        Some(ref store) => {
            tracing::info!("State persistence enabled: {}", store.path().display());
            build_registry(store.load(), &config.receivers)
        }
        None => build_registry(LoadResult::NotFound, &config.receivers),
    };

    let monitor: DeviceMonitor<UdpStatusClient> =
        DeviceMonitor::new(config.status_client(), config.monitor_options());
    let coordinator = MonitoringCoordinator::with_registry(monitor, registry);

    // Receivers beyond capacity stay registered; monitoring of them is
    // degraded, not the whole run.
    if let Err(error) = coordinator.session_start() {
        tracing::warn!("Not all receivers are monitored: {error}");
    }

    let mut events = BroadcastStream::new(coordinator.monitor().subscribe());
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping...");
                break;
            }

            event = events.next() => {
                match event {
                    Some(Ok(event)) => log_event(&event),
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        tracing::warn!("Telemetry consumer lagged, {skipped} event(s) dropped");
                    }
                    None => return Err(RunError::StreamTerminated),
                }
            }
        }
    }

    let receivers = coordinator.receivers();
    coordinator.session_end();
    persist_receivers(store.as_ref(), &receivers).await
}

/// Rebuilds the receiver registry from saved state plus configured seeds.
///
/// Saved addresses come first (preserving their order), then seed
/// addresses from the configuration; duplicates between the two are
/// absorbed by the registry's append invariant.
fn build_registry(loaded: LoadResult, seeds: &[RxAddress]) -> ReceiverRegistry {
    let mut registry = ReceiverRegistry::new();

    match loaded {
        LoadResult::Loaded(saved) => {
            let restored = registry.restore(saved);
            tracing::info!("Restored {restored} receiver(s) from saved state");
        }
        LoadResult::NotFound => {
            tracing::debug!("No previous state found, starting fresh");
        }
        LoadResult::Corrupted { reason } => {
            tracing::warn!("State file corrupted ({reason}), will overwrite on next save");
        }
    }

    for seed in seeds {
        if registry.append(*seed) {
            tracing::debug!(address = %seed, "Seeded receiver from configuration");
        }
    }

    registry
}

/// Saves the receiver list to the store if configured.
async fn persist_receivers(
    store: Option<&FileSessionStore>,
    receivers: &[RxAddress],
) -> Result<(), RunError> {
    let Some(store) = store else {
        return Ok(());
    };

    match store.save(receivers).await {
        Ok(()) => {
            tracing::debug!("Saved {} receiver(s)", receivers.len());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to save session state: {e}");
            Err(RunError::SessionSave(e))
        }
    }
}

/// Logs one telemetry event.
///
/// Heartbeats are logged at debug; the poll tasks themselves log link
/// transitions at info/warn, so the default level stays quiet between
/// changes.
fn log_event(event: &StatusEvent) {
    tracing::debug!(
        address = %event.address,
        link = %event.snapshot.link,
        name = event.snapshot.report.name.as_deref().unwrap_or("-"),
        battery = event.snapshot.report.battery_percent,
        af = event.snapshot.report.af_level,
        rf = event.snapshot.report.rf_level,
        "Status update"
    );
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
