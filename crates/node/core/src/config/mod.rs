//! Relay daemon configuration.
//!
//! Configuration is split into submodules:
//! - `network` - listen and announce addresses
//! - `limits` - connection limits
//! - `relay` - relay resource limits
//!
//! The ACL section is [`AclConfig`] from `relayd-net-acl`.
//!
//! Every section is optional in the file; missing fields take their defaults.

mod limits;
mod network;
mod relay;

pub use limits::ConnLimitsConfig;
pub use network::NetworkConfig;
pub use relay::RelayResourcesConfig;
pub use relayd_net_acl::AclConfig;

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;
use tracing::debug;

/// Errors loading or saving a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Full configuration of the relay daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Listen and announce addresses
    pub network: NetworkConfig,

    /// Connection limits
    pub limits: ConnLimitsConfig,

    /// Relay resource limits
    pub relay: RelayResourcesConfig,

    /// Reservation allow-lists
    pub acl: AclConfig,
}

impl RelayConfig {
    /// Load the configuration from `path`, or the defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("no config file given, using defaults");
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save the configuration to the given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::constants::*;

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = RelayConfig::load(None).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert!(config.acl.allow_peers.is_empty());
        assert!(config.acl.allow_subnets.is_empty());
        assert!(config.relay.enabled);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = RelayConfig::from_toml(
            r#"
            [acl]
            allow_subnets = ["10.0.0.0/8"]

            [relay]
            max_circuits = 64
            "#,
        )
        .unwrap();

        assert_eq!(config.acl.allow_subnets, vec!["10.0.0.0/8".to_string()]);
        assert!(config.acl.allow_peers.is_empty());
        assert_eq!(config.relay.max_circuits, 64);
        assert_eq!(config.relay.max_reservations, DEFAULT_MAX_RESERVATIONS);
        assert_eq!(config.network, NetworkConfig::default());
        assert_eq!(config.limits, ConnLimitsConfig::default());
    }

    #[test]
    fn test_network_addresses_parse() {
        let config = RelayConfig::from_toml(
            r#"
            [network]
            listen_addrs = ["/ip4/127.0.0.1/tcp/4010"]
            announce_addrs = ["/dns4/relay.example.com/tcp/4010"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.network.listen_addrs,
            vec!["/ip4/127.0.0.1/tcp/4010".parse().unwrap()]
        );
        assert_eq!(config.network.announce_addrs.len(), 1);
    }

    #[test]
    fn test_unknown_types_rejected() {
        let err = RelayConfig::from_toml("[relay]\nmax_circuits = \"many\"\n");
        assert!(err.is_err());

        let err = RelayConfig::from_toml("[network]\nlisten_addrs = [\"not a multiaddr\"]\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relayd.toml");

        let mut config = RelayConfig::default();
        config.acl.allow_subnets = vec!["192.168.0.0/16".into()];
        config.limits.max_established_per_peer = Some(2);
        config.save(&path).unwrap();

        let loaded = RelayConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = RelayConfig::load(Some(dir.path().join("missing.toml").as_path())).unwrap_err();
        assert_matches!(err, ConfigError::Read { .. });
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[acl\nallow_peers = 1").unwrap();

        let err = RelayConfig::load(Some(path.as_path())).unwrap_err();
        assert_matches!(err, ConfigError::Parse { .. });
    }
}
