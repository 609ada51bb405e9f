//! Static allow-lists for peer ids and IP subnets.
//!
//! An allow-list built from zero entries is [`Policy::Disabled`]: it imposes
//! no restriction at all. It is never an empty list that denies everyone.

use std::collections::HashSet;
use std::net::IpAddr;

use ipnet::IpNet;
use libp2p::{Multiaddr, PeerId, multiaddr::Protocol};

use crate::error::AclError;

/// A policy that is either switched off or restricts to the given entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Policy<T> {
    #[default]
    Disabled,
    Enabled(T),
}

impl<T> Policy<T> {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    pub fn as_enabled(&self) -> Option<&T> {
        match self {
            Self::Disabled => None,
            Self::Enabled(entries) => Some(entries),
        }
    }
}

/// Peer ids allowed to make reservations.
#[derive(Debug, Clone, Default)]
pub struct PeerAllowList(Policy<HashSet<PeerId>>);

impl PeerAllowList {
    /// Parse base58 peer ids, failing on the first malformed entry.
    pub fn parse<I, S>(entries: I) -> Result<Self, AclError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut peers = HashSet::new();
        for entry in entries {
            let entry = entry.as_ref();
            let peer = entry
                .parse::<PeerId>()
                .map_err(|source| AclError::MalformedIdentity {
                    input: entry.to_string(),
                    source,
                })?;
            peers.insert(peer);
        }

        if peers.is_empty() {
            Ok(Self(Policy::Disabled))
        } else {
            Ok(Self(Policy::Enabled(peers)))
        }
    }

    pub fn policy(&self) -> &Policy<HashSet<PeerId>> {
        &self.0
    }

    pub fn is_active(&self) -> bool {
        self.0.is_active()
    }

    pub fn len(&self) -> usize {
        self.0.as_enabled().map_or(0, HashSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if the list is disabled or contains `peer`.
    pub fn permits(&self, peer: &PeerId) -> bool {
        match &self.0 {
            Policy::Disabled => true,
            Policy::Enabled(peers) => peers.contains(peer),
        }
    }
}

/// IP networks whose hosts are allowed to make reservations.
#[derive(Debug, Clone, Default)]
pub struct SubnetAllowList(Policy<Vec<IpNet>>);

impl SubnetAllowList {
    /// Parse CIDR strings (`10.0.0.0/8`, `fd00::/8`), failing on the first
    /// malformed entry. Host bits are masked off.
    pub fn parse<I, S>(entries: I) -> Result<Self, AclError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut subnets = Vec::new();
        for entry in entries {
            let entry = entry.as_ref();
            let net = entry
                .parse::<IpNet>()
                .map_err(|source| AclError::MalformedSubnet {
                    input: entry.to_string(),
                    source,
                })?;
            subnets.push(net.trunc());
        }

        if subnets.is_empty() {
            Ok(Self(Policy::Disabled))
        } else {
            Ok(Self(Policy::Enabled(subnets)))
        }
    }

    pub fn policy(&self) -> &Policy<Vec<IpNet>> {
        &self.0
    }

    pub fn is_active(&self) -> bool {
        self.0.is_active()
    }

    pub fn len(&self) -> usize {
        self.0.as_enabled().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if `ip` lies in at least one configured subnet.
    ///
    /// Always `false` for a disabled list; callers check [`Self::is_active`]
    /// first.
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.0
            .as_enabled()
            .is_some_and(|subnets| subnets.iter().any(|net| net.contains(&ip)))
    }

    /// `true` if `addr` resolves to an IP inside a configured subnet.
    ///
    /// Addresses without an IP head are unresolvable and never match.
    pub fn contains_addr(&self, addr: &Multiaddr) -> bool {
        multiaddr_to_ip(addr).is_some_and(|ip| self.contains(ip))
    }
}

/// Extract the IP of a multiaddr whose first component (after an optional
/// `/ip6zone`) is `/ip4` or `/ip6`.
///
/// DNS names, other non-IP heads and relayed (`/p2p-circuit`) addresses
/// yield `None`. The IP in front of a circuit belongs to the relay, not to
/// the peer.
pub fn multiaddr_to_ip(addr: &Multiaddr) -> Option<IpAddr> {
    if addr.iter().any(|p| matches!(p, Protocol::P2pCircuit)) {
        return None;
    }

    let mut protocols = addr.iter().skip_while(|p| matches!(p, Protocol::Ip6zone(_)));
    match protocols.next()? {
        Protocol::Ip4(ip) => Some(IpAddr::V4(ip)),
        Protocol::Ip6(ip) => Some(IpAddr::V6(ip)),
        _ => None,
    }
}
