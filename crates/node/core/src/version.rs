//! Version information for the relay daemon.

/// The version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The agent version announced through identify.
pub const USER_AGENT: &str = concat!("relayd/", env!("CARGO_PKG_VERSION"));
