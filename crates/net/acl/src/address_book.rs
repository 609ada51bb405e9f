//! Remote addresses of currently connected peers.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use libp2p::{Multiaddr, PeerId};
use parking_lot::RwLock;
use tracing::trace;

/// PeerId → set of remote addresses with an open connection (RwLock-protected).
///
/// A peer is present only while at least one of its addresses is tracked;
/// removing the last address removes the peer.
#[derive(Debug, Default)]
pub struct AddressBook {
    addrs: RwLock<HashMap<PeerId, HashSet<Multiaddr>>>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `addr` for `peer`. Inserting an address twice is a no-op.
    pub fn connected(&self, peer: PeerId, addr: Multiaddr) {
        let mut addrs = self.addrs.write();
        let inserted = addrs.entry(peer).or_default().insert(addr);
        trace!(%peer, inserted, "address book: connected");
    }

    /// Stop tracking `addr` for `peer`, dropping the peer once it has no
    /// addresses left. Unknown pairs are ignored, so duplicate or late
    /// disconnect notifications are harmless.
    pub fn disconnected(&self, peer: &PeerId, addr: &Multiaddr) {
        let mut addrs = self.addrs.write();
        if let Entry::Occupied(mut entry) = addrs.entry(*peer) {
            entry.get_mut().remove(addr);
            if entry.get().is_empty() {
                entry.remove();
                trace!(%peer, "address book: last address gone");
            }
        }
    }

    /// `true` if any tracked address of `peer` satisfies `pred`.
    ///
    /// The read lock is held while `pred` runs.
    pub fn any_address<F>(&self, peer: &PeerId, pred: F) -> bool
    where
        F: FnMut(&Multiaddr) -> bool,
    {
        self.addrs
            .read()
            .get(peer)
            .is_some_and(|addrs| addrs.iter().any(pred))
    }

    /// Snapshot of the addresses tracked for `peer`.
    #[cfg(test)]
    pub(crate) fn addresses(&self, peer: &PeerId) -> Option<Vec<Multiaddr>> {
        self.addrs
            .read()
            .get(peer)
            .map(|addrs| addrs.iter().cloned().collect())
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, peer: &PeerId) -> bool {
        self.addrs.read().contains_key(peer)
    }

    /// Number of peers with at least one tracked address.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.addrs.read().len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
