//! Hooks the ACL into `libp2p::relay`.
//!
//! The relay server has no ACL trait of its own. It does consult every
//! configured [`RateLimiter`] before accepting a reservation, and a refusal
//! there is answered with the same protocol-level error as resource
//! exhaustion. [`ReservationGate`] is such a limiter that never counts and
//! only asks the ACL.

use std::{fmt, sync::Arc};

use libp2p::{Multiaddr, PeerId, relay::RateLimiter};
use web_time::Instant;

use crate::filter::RelayAcl;

/// Reservation limiter backed by a [`RelayAcl`].
#[derive(Clone)]
pub struct ReservationGate {
    acl: Arc<dyn RelayAcl>,
}

impl ReservationGate {
    pub fn new(acl: Arc<dyn RelayAcl>) -> Self {
        Self { acl }
    }

    /// Boxed, ready for `relay::Config::reservation_rate_limiters`.
    pub fn boxed(acl: Arc<dyn RelayAcl>) -> Box<dyn RateLimiter> {
        Box::new(Self::new(acl))
    }
}

impl fmt::Debug for ReservationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReservationGate").finish_non_exhaustive()
    }
}

impl RateLimiter for ReservationGate {
    fn try_next(&mut self, peer: PeerId, addr: &Multiaddr, _now: Instant) -> bool {
        self.acl.allow_reservation(&peer, addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{AclConfig, AclFilter};
    use crate::test_utils::{addr, test_peer_id};

    #[test]
    fn test_gate_follows_reservation_policy() {
        let allowed = test_peer_id(1);
        let filter = AclFilter::from_config(&AclConfig {
            allow_peers: vec![allowed.to_string()],
            allow_subnets: vec!["10.0.0.0/8".into()],
        })
        .unwrap();
        let mut gate = ReservationGate::new(Arc::new(filter));
        let now = Instant::now();

        assert!(gate.try_next(allowed, &addr("/ip4/10.0.0.1/tcp/1"), now));
        assert!(!gate.try_next(allowed, &addr("/ip4/11.0.0.1/tcp/1"), now));
        assert!(!gate.try_next(test_peer_id(2), &addr("/ip4/10.0.0.1/tcp/1"), now));

        // No budget is consumed: repeated requests get the same answer.
        for _ in 0..100 {
            assert!(gate.try_next(allowed, &addr("/ip4/10.0.0.1/tcp/1"), now));
        }
    }

    #[test]
    fn test_gate_without_policy() {
        let filter = AclFilter::from_config(&AclConfig::default()).unwrap();
        let mut gate = ReservationGate::new(Arc::new(filter));

        assert!(gate.try_next(
            test_peer_id(3),
            &addr("/dns4/example.com/tcp/1"),
            Instant::now()
        ));
    }
}
