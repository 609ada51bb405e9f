//! Connection limits.

use std::time::Duration;

use libp2p::connection_limits::ConnectionLimits;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_ESTABLISHED};

/// Connection limit configuration (TOML-serializable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnLimitsConfig {
    /// Maximum number of established connections
    pub max_established: u32,

    /// Maximum number of established connections per peer (unlimited if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_established_per_peer: Option<u32>,

    /// Seconds after which a connection without open streams is closed
    pub idle_timeout_secs: u64,
}

impl Default for ConnLimitsConfig {
    fn default() -> Self {
        Self {
            max_established: DEFAULT_MAX_ESTABLISHED,
            max_established_per_peer: None,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl ConnLimitsConfig {
    pub fn connection_limits(&self) -> ConnectionLimits {
        ConnectionLimits::default()
            .with_max_established(Some(self.max_established))
            .with_max_established_per_peer(self.max_established_per_peer)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
