//! Admission control for a libp2p relay.
//!
//! The relay consults an [`AclFilter`] before it commits resources to a peer:
//! - [`allow_list`] - static peer and subnet allow-lists, parsed once at startup
//! - [`address_book`] - remote addresses of currently connected peers
//! - [`notify`] - connection lifecycle fan-out from the swarm to subscribers
//! - [`filter`] - the decision engine composing the above
//! - [`gate`] - adapter plugging the filter into the relay's reservation hook

pub mod address_book;
pub mod allow_list;
mod error;
pub mod filter;
pub mod gate;
pub mod notify;

pub use address_book::AddressBook;
pub use allow_list::{PeerAllowList, Policy, SubnetAllowList, multiaddr_to_ip};
pub use error::AclError;
pub use filter::{AclConfig, AclFilter, RelayAcl};
pub use gate::ReservationGate;
pub use notify::{ConnectionEvents, ConnectionNotifier, ConnectionSubscriber};
