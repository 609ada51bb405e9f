//! Listen and announce addresses.

use std::net::{Ipv4Addr, Ipv6Addr};

use libp2p::{Multiaddr, multiaddr::Protocol};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_P2P_PORT;

/// Network configuration (TOML-serializable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Addresses to listen on
    pub listen_addrs: Vec<Multiaddr>,

    /// Addresses to advertise instead of the observed ones
    pub announce_addrs: Vec<Multiaddr>,

    /// Map listen ports on the gateway through UPnP
    pub nat_port_map: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addrs: default_listen_addrs(),
            announce_addrs: Vec::new(),
            nat_port_map: true,
        }
    }
}

/// QUIC and TCP on all IPv4 and IPv6 interfaces.
fn default_listen_addrs() -> Vec<Multiaddr> {
    let v4 = Multiaddr::empty().with(Protocol::Ip4(Ipv4Addr::UNSPECIFIED));
    let v6 = Multiaddr::empty().with(Protocol::Ip6(Ipv6Addr::UNSPECIFIED));

    vec![
        v4.clone()
            .with(Protocol::Udp(DEFAULT_P2P_PORT))
            .with(Protocol::QuicV1),
        v6.clone()
            .with(Protocol::Udp(DEFAULT_P2P_PORT))
            .with(Protocol::QuicV1),
        v4.with(Protocol::Tcp(DEFAULT_P2P_PORT)),
        v6.with(Protocol::Tcp(DEFAULT_P2P_PORT)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listen_addrs() {
        let addrs: Vec<String> = NetworkConfig::default()
            .listen_addrs
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            addrs,
            vec![
                "/ip4/0.0.0.0/udp/4001/quic-v1",
                "/ip6/::/udp/4001/quic-v1",
                "/ip4/0.0.0.0/tcp/4001",
                "/ip6/::/tcp/4001",
            ]
        );
        assert!(NetworkConfig::default().nat_port_map);
    }
}
