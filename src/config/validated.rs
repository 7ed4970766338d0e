//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::monitor::{MonitorOptions, RetryPolicy, UdpStatusClient};
use crate::registry::{ReceiverRegistry, RxAddress, validate};

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// This struct represents a complete, validated configuration where all
/// values have been merged from CLI and TOML sources and checked.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional
/// TOML config. The function validates all inputs and returns errors for
/// invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Receiver addresses to seed the registry with, in order.
    /// Validated for syntax and duplicates at construction.
    pub receivers: Vec<RxAddress>,

    /// Polling interval per tracked receiver
    pub poll_interval: Duration,

    /// Per-attempt reply timeout
    pub attempt_timeout: Duration,

    /// Consecutive failures before a receiver is reported disconnected
    pub disconnect_after: u32,

    /// Maximum number of concurrently monitored receivers
    pub max_devices: usize,

    /// UDP port receivers answer status queries on
    pub port: u16,

    /// Retry policy for failed polls
    pub retry_policy: RetryPolicy,

    /// Path to state file for restoring the receiver list across runs.
    /// If `None`, persistence is disabled.
    pub state_file: Option<PathBuf>,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_file_str = self
            .state_file
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string());

        write!(
            f,
            "Config {{ receivers: {}, port: {}, poll_interval: {}s, timeout: {}ms, \
             disconnect_after: {}, max_devices: {}, retry: {}s..{}s, state_file: {} }}",
            self.receivers.len(),
            self.port,
            self.poll_interval.as_secs(),
            self.attempt_timeout.as_millis(),
            self.disconnect_after,
            self.max_devices,
            self.retry_policy.initial_delay.as_secs(),
            self.retry_policy.max_delay.as_secs(),
            state_file_str,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional
    /// TOML config.
    ///
    /// CLI arguments take precedence over TOML config values. Receiver
    /// lists use replace semantics: if any `--receiver` flag is given,
    /// the TOML `receivers` list is ignored entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A seeded receiver address is malformed or duplicated
    /// - Duration values are zero
    /// - Device or failure limits are zero
    /// - The retry policy is inconsistent
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let receivers = Self::resolve_receivers(cli, toml)?;
        let poll_interval = Self::resolve_poll_interval(cli, toml)?;
        let attempt_timeout = Self::resolve_attempt_timeout(cli, toml)?;
        let disconnect_after = Self::resolve_disconnect_after(cli, toml)?;
        let max_devices = Self::resolve_max_devices(cli, toml)?;

        let port = cli
            .port
            .or_else(|| toml.and_then(|t| t.protocol.port))
            .unwrap_or(defaults::STATUS_PORT);

        let retry_policy = Self::build_retry_policy(cli, toml)?;
        let state_file = Self::resolve_state_file(cli, toml);

        Ok(Self {
            receivers,
            poll_interval,
            attempt_timeout,
            disconnect_after,
            max_devices,
            port,
            retry_policy,
            state_file,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Builds monitor options from the merged values.
    #[must_use]
    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions::new()
            .with_poll_interval(self.poll_interval)
            .with_disconnect_after(self.disconnect_after)
            .with_capacity(self.max_devices)
            .with_backoff(self.retry_policy.clone())
    }

    /// Builds the UDP status client from the merged values.
    #[must_use]
    pub const fn status_client(&self) -> UdpStatusClient {
        UdpStatusClient::new()
            .with_port(self.port)
            .with_attempt_timeout(self.attempt_timeout)
    }

    fn resolve_receivers(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Vec<RxAddress>, ConfigError> {
        // CLI receivers REPLACE TOML receivers entirely (not merged)
        let candidates: &[String] = if cli.receivers.is_empty() {
            toml.map_or(&[], |t| &t.receivers)
        } else {
            &cli.receivers
        };

        // Run the candidates through the same registry invariant the host
        // applies at runtime so duplicates in the seed list are rejected.
        let mut registry = ReceiverRegistry::new();
        for candidate in candidates {
            let address = validate(candidate, &registry)
                .map_err(|source| ConfigError::InvalidReceiver { source })?;
            registry.append(address);
        }
        Ok(registry.list().to_vec())
    }

    fn resolve_poll_interval(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let seconds = cli
            .poll_interval
            .or_else(|| toml.and_then(|t| t.monitor.poll_interval))
            .unwrap_or(defaults::POLL_INTERVAL_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "poll_interval",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }

    fn resolve_attempt_timeout(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Duration, ConfigError> {
        let millis = cli
            .timeout_ms
            .or_else(|| toml.and_then(|t| t.protocol.timeout_ms))
            .unwrap_or(defaults::ATTEMPT_TIMEOUT_MS);

        if millis == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_millis(millis))
    }

    fn resolve_disconnect_after(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<u32, ConfigError> {
        let threshold = cli
            .disconnect_after
            .or_else(|| toml.and_then(|t| t.monitor.disconnect_after))
            .unwrap_or(defaults::DISCONNECT_AFTER);

        if threshold == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "disconnect_after",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(threshold)
    }

    fn resolve_max_devices(cli: &Cli, toml: Option<&TomlConfig>) -> Result<usize, ConfigError> {
        let capacity = cli
            .max_devices
            .or_else(|| toml.and_then(|t| t.monitor.max_devices))
            .unwrap_or(defaults::MAX_DEVICES);

        if capacity == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_devices",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(capacity)
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        // Priority: CLI explicit > TOML > default; the multiplier is
        // TOML-only.
        let initial_delay_secs = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.initial_delay))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_SECS);

        let max_delay_secs = cli
            .retry_max_delay
            .or_else(|| retry.and_then(|r| r.max_delay))
            .unwrap_or(defaults::RETRY_MAX_DELAY_SECS);

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        if initial_delay_secs == 0 {
            return Err(ConfigError::InvalidRetry(
                "initial_delay must be greater than 0".to_string(),
            ));
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        if max_delay_secs < initial_delay_secs {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay ({max_delay_secs}s) must be >= initial_delay ({initial_delay_secs}s)"
            )));
        }

        Ok(RetryPolicy::new()
            .with_initial_delay(Duration::from_secs(initial_delay_secs))
            .with_max_delay(Duration::from_secs(max_delay_secs))
            .with_multiplier(multiplier))
    }

    fn resolve_state_file(cli: &Cli, toml: Option<&TomlConfig>) -> Option<PathBuf> {
        // CLI takes precedence
        if let Some(ref path) = cli.state_file {
            return Some(path.clone());
        }

        toml.and_then(|t| t.session.state_file.as_ref().map(PathBuf::from))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
