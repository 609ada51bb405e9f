//! Relay resource limits.

use std::time::Duration;

use libp2p::relay;
use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Relay server configuration (TOML-serializable).
///
/// Converted to [`relay::Config`] at startup. The rate limiters of the
/// default relay configuration are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayResourcesConfig {
    /// Must stay true: the relay service cannot be switched off
    pub enabled: bool,

    /// Lifetime of a reservation in seconds
    pub reservation_ttl_secs: u64,

    /// Maximum number of active reservations
    pub max_reservations: usize,

    /// Maximum number of reservations per peer
    pub max_reservations_per_peer: usize,

    /// Maximum number of relayed circuits
    pub max_circuits: usize,

    /// Maximum number of relayed circuits per peer
    pub max_circuits_per_peer: usize,

    /// Lifetime of a relayed circuit in seconds
    pub limit_duration_secs: u64,

    /// Bytes relayed per circuit before it is closed
    pub limit_data_bytes: u64,
}

impl Default for RelayResourcesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reservation_ttl_secs: DEFAULT_RESERVATION_TTL_SECS,
            max_reservations: DEFAULT_MAX_RESERVATIONS,
            max_reservations_per_peer: DEFAULT_MAX_RESERVATIONS_PER_PEER,
            max_circuits: DEFAULT_MAX_CIRCUITS,
            max_circuits_per_peer: DEFAULT_MAX_CIRCUITS_PER_PEER,
            limit_duration_secs: DEFAULT_CIRCUIT_DURATION_SECS,
            limit_data_bytes: DEFAULT_CIRCUIT_BYTES,
        }
    }
}

impl RelayResourcesConfig {
    pub fn to_relay_config(&self) -> relay::Config {
        relay::Config {
            max_reservations: self.max_reservations,
            max_reservations_per_peer: self.max_reservations_per_peer,
            reservation_duration: Duration::from_secs(self.reservation_ttl_secs),
            max_circuits: self.max_circuits,
            max_circuits_per_peer: self.max_circuits_per_peer,
            max_circuit_duration: Duration::from_secs(self.limit_duration_secs),
            max_circuit_bytes: self.limit_data_bytes,
            ..relay::Config::default()
        }
    }
}
