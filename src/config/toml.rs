//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Receiver addresses to monitor, in dotted-quad IPv4 form
    #[serde(default)]
    pub receivers: Vec<String>,

    /// Monitoring configuration section
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Status protocol configuration section
    #[serde(default)]
    pub protocol: ProtocolSection,

    /// Retry policy configuration section
    #[serde(default)]
    pub retry: RetrySection,

    /// Session persistence configuration section
    #[serde(default)]
    pub session: SessionSection,
}

/// Monitoring configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Polling interval in seconds
    pub poll_interval: Option<u64>,

    /// Consecutive failures before a receiver is reported disconnected
    pub disconnect_after: Option<u32>,

    /// Maximum number of concurrently monitored receivers
    pub max_devices: Option<usize>,
}

/// Status protocol configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolSection {
    /// UDP port receivers answer status queries on
    pub port: Option<u16>,

    /// Per-attempt reply timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Initial retry delay in seconds
    pub initial_delay: Option<u64>,

    /// Maximum retry delay in seconds
    pub max_delay: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,
}

/// Session persistence configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    /// Path to the state file the receiver list is saved to
    pub state_file: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# rxmon Configuration File

# Receiver addresses to monitor, in dotted-quad IPv4 form.
# Note: CLI --receiver flags REPLACE this list entirely (not merged).
# receivers = ["192.168.1.10", "192.168.1.11"]

[monitor]
# Polling interval in seconds (default: 2)
# poll_interval = 2

# Consecutive failures before a receiver is reported disconnected (default: 3)
# disconnect_after = 3

# Maximum number of concurrently monitored receivers (default: 64)
# max_devices = 64

[protocol]
# UDP port receivers answer status queries on (default: 53212)
# port = 53212

# Per-attempt reply timeout in milliseconds (default: 750)
# timeout_ms = 750

[retry]
# Initial retry delay in seconds after a failed poll (default: 2)
# initial_delay = 2

# Maximum retry delay in seconds (default: 30)
# max_delay = 30

# Backoff multiplier (default: 2.0)
# multiplier = 2.0

[session]
# Path to the state file the receiver list is saved to.
# If unset, the receiver list is not persisted across runs.
# state_file = "rxmon-state.json"
"#
    .to_string()
}
