//! Connection lifecycle notifications.
//!
//! [`ConnectionEvents`] sits in the swarm's behaviour tree and forwards every
//! established and closed connection to its subscribers, together with the
//! remote address of that connection. Subscribers are called synchronously
//! from the swarm task and must not block.

use std::{
    convert::Infallible,
    fmt,
    sync::Arc,
    task::{Context, Poll},
};

use libp2p::{
    Multiaddr, PeerId,
    core::{Endpoint, transport::PortUse},
    swarm::{
        ConnectionDenied, ConnectionId, FromSwarm, NetworkBehaviour, THandler, THandlerInEvent,
        THandlerOutEvent, ToSwarm, behaviour::ConnectionClosed, dummy,
    },
};
use tracing::trace;

/// Receiver of connection lifecycle events.
///
/// Called once per connection transition. Delivery is ordered per
/// connection but not across peers.
pub trait ConnectionSubscriber: Send + Sync {
    fn connected(&self, peer: PeerId, addr: &Multiaddr);

    fn disconnected(&self, peer: PeerId, addr: &Multiaddr);
}

/// Source of connection lifecycle events.
pub trait ConnectionNotifier {
    fn subscribe(&mut self, subscriber: Arc<dyn ConnectionSubscriber>);
}

/// NetworkBehaviour fanning connection lifecycle events out to subscribers.
///
/// Never emits events of its own and never denies a connection.
#[derive(Default)]
pub struct ConnectionEvents {
    subscribers: Vec<Arc<dyn ConnectionSubscriber>>,
}

impl fmt::Debug for ConnectionEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionEvents")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ConnectionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify_connected(&self, peer: PeerId, addr: &Multiaddr) {
        trace!(%peer, %addr, "connection established");
        for subscriber in &self.subscribers {
            subscriber.connected(peer, addr);
        }
    }

    fn notify_disconnected(&self, peer: PeerId, addr: &Multiaddr) {
        trace!(%peer, %addr, "connection closed");
        for subscriber in &self.subscribers {
            subscriber.disconnected(peer, addr);
        }
    }
}

impl ConnectionNotifier for ConnectionEvents {
    fn subscribe(&mut self, subscriber: Arc<dyn ConnectionSubscriber>) {
        self.subscribers.push(subscriber);
    }
}

impl NetworkBehaviour for ConnectionEvents {
    type ConnectionHandler = dummy::ConnectionHandler;
    type ToSwarm = Infallible;

    fn handle_established_inbound_connection(
        &mut self,
        _: ConnectionId,
        _: PeerId,
        _: &Multiaddr,
        _: &Multiaddr,
    ) -> Result<THandler<Self>, ConnectionDenied> {
        Ok(dummy::ConnectionHandler)
    }

    fn handle_established_outbound_connection(
        &mut self,
        _: ConnectionId,
        _: PeerId,
        _: &Multiaddr,
        _: Endpoint,
        _: PortUse,
    ) -> Result<THandler<Self>, ConnectionDenied> {
        Ok(dummy::ConnectionHandler)
    }

    fn on_swarm_event(&mut self, event: FromSwarm) {
        match event {
            FromSwarm::ConnectionEstablished(established) => {
                self.notify_connected(
                    established.peer_id,
                    established.endpoint.get_remote_address(),
                );
            }
            FromSwarm::ConnectionClosed(ConnectionClosed {
                peer_id, endpoint, ..
            }) => {
                self.notify_disconnected(peer_id, endpoint.get_remote_address());
            }
            _ => {}
        }
    }

    fn on_connection_handler_event(
        &mut self,
        _: PeerId,
        _: ConnectionId,
        event: THandlerOutEvent<Self>,
    ) {
        match event {}
    }

    fn poll(&mut self, _: &mut Context<'_>) -> Poll<ToSwarm<Self::ToSwarm, THandlerInEvent<Self>>> {
        Poll::Pending
    }
}
