//! Relay admission decisions.
//!
//! [`AclFilter`] answers the relay's yes/no questions from two static
//! allow-lists and, for the legacy hop path, the live [`AddressBook`].

use std::sync::Arc;

use libp2p::{Multiaddr, PeerId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    address_book::AddressBook,
    allow_list::{PeerAllowList, SubnetAllowList},
    error::AclError,
    notify::{ConnectionNotifier, ConnectionSubscriber},
};

/// Allow-list configuration.
///
/// For reservations this names the peers and subnets allowed to reserve a
/// slot on the relay. For legacy hops it names the peers and subnets that
/// may be reached through the relay. Empty lists disable the respective
/// check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Base58 peer ids.
    pub allow_peers: Vec<String>,
    /// CIDR networks, IPv4 or IPv6.
    pub allow_subnets: Vec<String>,
}

/// Admission queries asked by a relay server.
pub trait RelayAcl: Send + Sync {
    /// May `peer`, connected from `addr`, hold a reservation?
    fn allow_reservation(&self, peer: &PeerId, addr: &Multiaddr) -> bool;

    /// May `src` open a circuit to `dst`?
    fn allow_connect(&self, src: &PeerId, src_addr: &Multiaddr, dst: &PeerId) -> bool;

    /// Legacy (circuit v1) hop from `src` to `dst`. The request carries no
    /// address for `dst`.
    fn allow_hop(&self, src: &PeerId, dst: &PeerId) -> bool;
}

/// Allow-list based [`RelayAcl`].
#[derive(Debug)]
pub struct AclFilter {
    peers: PeerAllowList,
    subnets: SubnetAllowList,
    /// Only allocated when subnet filtering is active.
    address_book: Option<AddressBook>,
}

impl AclFilter {
    /// Build a filter from configuration.
    ///
    /// When subnet filtering is active the filter subscribes itself to
    /// `notifier` so that it can track the addresses of connected peers.
    pub fn new<N>(notifier: &mut N, config: &AclConfig) -> Result<Arc<Self>, AclError>
    where
        N: ConnectionNotifier + ?Sized,
    {
        let filter = Arc::new(Self::from_config(config)?);
        if filter.address_book.is_some() {
            notifier.subscribe(filter.clone());
        }

        info!(
            allow_peers = filter.peers.len(),
            allow_subnets = filter.subnets.len(),
            tracking_addresses = filter.address_book.is_some(),
            "relay ACL configured"
        );
        Ok(filter)
    }

    /// Build a filter without subscribing it anywhere.
    pub fn from_config(config: &AclConfig) -> Result<Self, AclError> {
        let peers = PeerAllowList::parse(&config.allow_peers)?;
        let subnets = SubnetAllowList::parse(&config.allow_subnets)?;
        let address_book = subnets.is_active().then(AddressBook::new);

        Ok(Self {
            peers,
            subnets,
            address_book,
        })
    }

    pub fn peers(&self) -> &PeerAllowList {
        &self.peers
    }

    pub fn subnets(&self) -> &SubnetAllowList {
        &self.subnets
    }

    pub fn address_book(&self) -> Option<&AddressBook> {
        self.address_book.as_ref()
    }
}

impl RelayAcl for AclFilter {
    fn allow_reservation(&self, peer: &PeerId, addr: &Multiaddr) -> bool {
        if !self.peers.permits(peer) {
            debug!(%peer, %addr, "reservation denied: peer not in allow-list");
            return false;
        }

        if self.subnets.is_active() && !self.subnets.contains_addr(addr) {
            debug!(%peer, %addr, "reservation denied: address outside allowed subnets");
            return false;
        }

        trace!(%peer, %addr, "reservation allowed");
        true
    }

    /// Always `true`: any peer may reach the peers that were vetted when
    /// they made their reservation.
    fn allow_connect(&self, _src: &PeerId, _src_addr: &Multiaddr, _dst: &PeerId) -> bool {
        true
    }

    // Circuit v1 is not served by this relay, so nothing calls this. It is
    // kept for a relay that speaks v1 again.
    fn allow_hop(&self, src: &PeerId, dst: &PeerId) -> bool {
        if !self.peers.permits(dst) {
            debug!(%src, %dst, "hop denied: destination not in allow-list");
            return false;
        }

        if let Some(book) = &self.address_book {
            // A destination with no tracked address is denied, even if it
            // might be reachable by other means.
            if !book.any_address(dst, |addr| self.subnets.contains_addr(addr)) {
                debug!(%src, %dst, "hop denied: no destination address in allowed subnets");
                return false;
            }
        }

        trace!(%src, %dst, "hop allowed");
        true
    }
}

impl ConnectionSubscriber for AclFilter {
    fn connected(&self, peer: PeerId, addr: &Multiaddr) {
        if let Some(book) = &self.address_book {
            book.connected(peer, addr.clone());
        }
    }

    fn disconnected(&self, peer: PeerId, addr: &Multiaddr) {
        if let Some(book) = &self.address_book {
            book.disconnected(&peer, addr);
        }
    }
}
