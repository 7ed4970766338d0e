//! Configuration layer for rxmon.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! For the receiver seed list, CLI `--receiver` flags **replace** the TOML
//! `receivers` list entirely (not merged). This is intentional "replace"
//! semantics: a command line that names receivers describes the whole fleet.
//!
//! # CLI-Only vs TOML-Only Options
//!
//! The retry backoff multiplier (`retry.multiplier`, default: 2.0) is
//! TOML-only; everything else is reachable from both sources.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;


pub use cli::{Cli, Command};
pub use error::ConfigError;
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
