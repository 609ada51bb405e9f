//! Confirmation of externally observed addresses.
//!
//! Peers tell us through identify which address they see us at. A single
//! report is not trusted: an address only becomes external once peers at
//! [`CONFIRMATION_THRESHOLD`] distinct IPs of the same family reported it.
//! Public addresses are only learned from public peers, and the set of
//! addresses awaiting confirmation is bounded.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use libp2p::Multiaddr;
use relayd_net_acl::multiaddr_to_ip;
use tracing::{debug, info, trace};

/// Distinct reporter IPs required before an observed address is trusted.
pub const CONFIRMATION_THRESHOLD: usize = 2;

/// Maximum number of observed addresses awaiting confirmation.
const MAX_PENDING: usize = 10;

/// Scope of an IP address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressScope {
    Loopback,
    Private,
    LinkLocal,
    Public,
}

impl AddressScope {
    /// Classify `ip`. Unspecified and broadcast addresses have no scope.
    pub fn of(ip: IpAddr) -> Option<Self> {
        match ip {
            IpAddr::V4(ip) => classify_ipv4(ip),
            IpAddr::V6(ip) => classify_ipv6(ip),
        }
    }
}

fn classify_ipv4(ip: Ipv4Addr) -> Option<AddressScope> {
    if ip.is_unspecified() || ip.is_broadcast() {
        None
    } else if ip.is_loopback() {
        Some(AddressScope::Loopback)
    } else if ip.is_private() {
        Some(AddressScope::Private)
    } else if ip.is_link_local() {
        Some(AddressScope::LinkLocal)
    } else {
        Some(AddressScope::Public)
    }
}

fn classify_ipv6(ip: Ipv6Addr) -> Option<AddressScope> {
    if ip.is_unspecified() {
        None
    } else if ip.is_loopback() {
        Some(AddressScope::Loopback)
    } else if ip.is_unique_local() {
        Some(AddressScope::Private)
    } else if ip.is_unicast_link_local() {
        Some(AddressScope::LinkLocal)
    } else {
        Some(AddressScope::Public)
    }
}

#[derive(Debug)]
struct Pending {
    reporters: HashSet<IpAddr>,
    last_seen: u64,
}

/// Tracks observed addresses until enough distinct peers agree on them.
#[derive(Debug)]
pub struct ObservedAddrs {
    threshold: usize,
    pending: HashMap<Multiaddr, Pending>,
    confirmed: HashSet<Multiaddr>,
    /// Monotonic counter ordering observations for eviction.
    clock: u64,
}

impl Default for ObservedAddrs {
    fn default() -> Self {
        Self::new(CONFIRMATION_THRESHOLD)
    }
}

impl ObservedAddrs {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            pending: HashMap::new(),
            confirmed: HashSet::new(),
            clock: 0,
        }
    }

    /// Record that the peer connected from `reporter` sees us at `observed`.
    ///
    /// Returns the address when this report confirms it for the first time.
    pub fn observe(&mut self, observed: Multiaddr, reporter: &Multiaddr) -> Option<Multiaddr> {
        let Some(reporter_ip) = multiaddr_to_ip(reporter) else {
            trace!(%reporter, "reporter address has no IP, ignoring observation");
            return None;
        };
        let Some(observed_ip) = multiaddr_to_ip(&observed) else {
            trace!(%observed, "observed address has no IP, ignoring");
            return None;
        };
        let (Some(reporter_scope), Some(observed_scope)) =
            (AddressScope::of(reporter_ip), AddressScope::of(observed_ip))
        else {
            return None;
        };

        if observed_scope == AddressScope::Public && reporter_scope != AddressScope::Public {
            trace!(%observed, %reporter_ip, "ignoring public address from non-public peer");
            return None;
        }
        if observed_ip.is_ipv4() != reporter_ip.is_ipv4() {
            trace!(%observed, %reporter_ip, "ignoring report from other address family");
            return None;
        }
        if self.confirmed.contains(&observed) {
            return None;
        }

        self.clock += 1;
        let now = self.clock;

        if !self.pending.contains_key(&observed) && self.pending.len() >= MAX_PENDING {
            let oldest = self
                .pending
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(addr, _)| addr.clone());
            if let Some(oldest) = oldest {
                debug!(evicted = %oldest, "evicting oldest unconfirmed observed address");
                self.pending.remove(&oldest);
            }
        }

        let entry = self.pending.entry(observed.clone()).or_insert_with(|| Pending {
            reporters: HashSet::new(),
            last_seen: now,
        });
        entry.last_seen = now;
        entry.reporters.insert(reporter_ip);

        if entry.reporters.len() < self.threshold {
            trace!(
                %observed,
                confirmations = entry.reporters.len(),
                threshold = self.threshold,
                "observed address pending confirmation"
            );
            return None;
        }

        self.pending.remove(&observed);
        self.confirmed.insert(observed.clone());
        info!(%observed, "observed address confirmed");
        Some(observed)
    }

    #[cfg(test)]
    pub(crate) fn is_confirmed(&self, addr: &Multiaddr) -> bool {
        self.confirmed.contains(addr)
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Multiaddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_single_report_is_not_enough() {
        let mut observed = ObservedAddrs::default();
        let ours = addr("/ip4/6.6.6.6/tcp/31337");

        assert_eq!(observed.observe(ours.clone(), &addr("/ip4/8.8.8.8/tcp/1")), None);
        assert!(!observed.is_confirmed(&ours));
    }

    #[test]
    fn test_same_ip_cannot_confirm_twice() {
        let mut observed = ObservedAddrs::default();
        let ours = addr("/ip4/6.6.6.6/tcp/4001");

        for port in 1..20 {
            let reporter = addr(&format!("/ip4/8.8.8.8/tcp/{port}"));
            assert_eq!(observed.observe(ours.clone(), &reporter), None);
        }
        assert!(!observed.is_confirmed(&ours));
    }

    #[test]
    fn test_distinct_ips_confirm() {
        let mut observed = ObservedAddrs::default();
        let ours = addr("/ip4/6.6.6.6/tcp/4001");

        assert_eq!(observed.observe(ours.clone(), &addr("/ip4/8.8.8.8/tcp/1")), None);
        assert_eq!(
            observed.observe(ours.clone(), &addr("/ip4/1.1.1.1/udp/1/quic-v1")),
            Some(ours.clone())
        );
        assert!(observed.is_confirmed(&ours));
        assert_eq!(observed.pending_len(), 0);

        // Reported once.
        assert_eq!(observed.observe(ours, &addr("/ip4/9.9.9.9/tcp/1")), None);
    }

    #[test]
    fn test_public_claim_from_private_peer_ignored() {
        let mut observed = ObservedAddrs::default();
        let ours = addr("/ip4/6.6.6.6/tcp/4001");

        observed.observe(ours.clone(), &addr("/ip4/10.0.0.1/tcp/1"));
        observed.observe(ours.clone(), &addr("/ip4/192.168.1.1/tcp/1"));
        assert!(!observed.is_confirmed(&ours));
        assert_eq!(observed.pending_len(), 0);

        // Private addresses may be learned from private peers.
        let lan = addr("/ip4/192.168.1.5/tcp/4001");
        observed.observe(lan.clone(), &addr("/ip4/192.168.1.2/tcp/1"));
        assert_eq!(
            observed.observe(lan.clone(), &addr("/ip4/192.168.1.3/tcp/1")),
            Some(lan)
        );
    }

    #[test]
    fn test_other_family_ignored() {
        let mut observed = ObservedAddrs::default();
        let ours = addr("/ip4/6.6.6.6/tcp/4001");

        observed.observe(ours.clone(), &addr("/ip6/2001:4860::1/tcp/1"));
        observed.observe(ours.clone(), &addr("/ip6/2606:4700::1/tcp/1"));
        assert!(!observed.is_confirmed(&ours));
    }

    #[test]
    fn test_unresolvable_addresses_ignored() {
        let mut observed = ObservedAddrs::default();

        observed.observe(addr("/dns4/relay.example.com/tcp/1"), &addr("/ip4/8.8.8.8/tcp/1"));
        observed.observe(addr("/ip4/6.6.6.6/tcp/1"), &addr("/ip4/8.8.8.8/tcp/1/p2p-circuit"));
        observed.observe(addr("/ip4/0.0.0.0/tcp/1"), &addr("/ip4/8.8.8.8/tcp/1"));
        assert_eq!(observed.pending_len(), 0);
    }

    #[test]
    fn test_pending_is_bounded() {
        let mut observed = ObservedAddrs::default();
        let reporter = addr("/ip4/8.8.8.8/tcp/1");

        for port in 0..(MAX_PENDING as u16 * 3) {
            observed.observe(addr(&format!("/ip4/6.6.6.6/tcp/{port}")), &reporter);
        }
        assert_eq!(observed.pending_len(), MAX_PENDING);

        // The newest entry survived eviction and can still be confirmed.
        let newest = addr(&format!("/ip4/6.6.6.6/tcp/{}", MAX_PENDING as u16 * 3 - 1));
        assert_eq!(
            observed.observe(newest.clone(), &addr("/ip4/1.1.1.1/tcp/1")),
            Some(newest)
        );
    }

    #[test]
    fn test_address_scope() {
        assert_eq!(AddressScope::of("127.0.0.1".parse().unwrap()), Some(AddressScope::Loopback));
        assert_eq!(AddressScope::of("172.16.0.1".parse().unwrap()), Some(AddressScope::Private));
        assert_eq!(AddressScope::of("169.254.1.1".parse().unwrap()), Some(AddressScope::LinkLocal));
        assert_eq!(AddressScope::of("fd00::1".parse().unwrap()), Some(AddressScope::Private));
        assert_eq!(AddressScope::of("fe80::1".parse().unwrap()), Some(AddressScope::LinkLocal));
        assert_eq!(AddressScope::of("2001:4860::1".parse().unwrap()), Some(AddressScope::Public));
        assert_eq!(AddressScope::of("0.0.0.0".parse().unwrap()), None);
        assert_eq!(AddressScope::of("::".parse().unwrap()), None);
    }
}
