//! rxmon: Wireless receiver fleet monitor
//!
//! A library for tracking a registry of networked wireless-microphone
//! receivers and polling each one for link, battery, and signal status.
//!
//! The pieces fit together as follows:
//!
//! - [`registry`] validates candidate addresses and holds the ordered,
//!   deduplicated receiver list.
//! - [`monitor`] polls every tracked receiver on its own task and fans
//!   status events out to subscribers.
//! - [`coordinator`] binds the two: registry membership is mirrored into
//!   the monitor's tracked set while a session runs.
//! - [`session`] persists the receiver list across runs.

pub mod config;
pub mod coordinator;
pub mod monitor;
pub mod registry;
pub mod session;
pub mod time;
