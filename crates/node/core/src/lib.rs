//! Relay daemon infrastructure.
//!
//! This crate provides:
//! - [`args`] - CLI argument structs
//! - [`config`] - TOML configuration with defaults
//! - [`identity`] - Node key and private network key loading
//! - [`logging`] - Logging initialization
//! - [`network`] - libp2p relay node assembly and event loop
//! - [`observed`] - Confirmation of addresses peers observe us at
//! - [`version`] - Version information
//!
//! Admission control lives in `relayd-net-acl`.

pub mod args;
pub mod config;
pub mod constants;
pub mod identity;
pub mod logging;
pub mod network;
pub mod observed;
pub mod version;
