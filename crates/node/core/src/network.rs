//! libp2p relay node.
//!
//! This module handles:
//! - Creating the libp2p Swarm with the transports for public or private networks
//! - Wiring the ACL into the relay server's reservation path
//! - Driving the swarm and logging relay activity
//!
//! # Transport Stack
//!
//! Public network:
//! ```text
//! DNS
//!   ├── TCP ── Noise ── Yamux
//!   └── QUIC
//! ```
//!
//! Private network (swarm key configured):
//! ```text
//! DNS
//!   └── TCP ── pnet ── Noise ── Yamux
//! ```
//!
//! # Behaviours
//!
//! - Relay: circuit v2 hop protocol, gated by the ACL
//! - Identify: exchange peer information, report observed addresses
//! - Ping: keep connections alive
//! - Limits: cap established connections
//! - UPnP: map listen ports on the gateway, when enabled
//! - AclEvents: feed connection lifecycle into the ACL address book

use std::{collections::HashMap, error::Error, sync::Arc, time::Duration};

use eyre::{Result, WrapErr, bail, eyre};
use futures::StreamExt;
use libp2p::{
    Multiaddr, PeerId, Swarm, SwarmBuilder, Transport, connection_limits,
    core::upgrade::Version,
    identify,
    identity::Keypair,
    multiaddr::Protocol,
    noise, ping,
    pnet::{PnetConfig, PreSharedKey},
    relay,
    swarm::{ConnectionId, NetworkBehaviour, SwarmEvent, behaviour::toggle::Toggle},
    tcp, upnp, yamux,
};
use relayd_net_acl::{AclFilter, ConnectionEvents, RelayAcl, ReservationGate};
use tracing::{debug, info, trace, warn};

use crate::{
    config::{RelayConfig, RelayResourcesConfig},
    constants::IDENTIFY_PROTOCOL_VERSION,
    observed::ObservedAddrs,
    version::USER_AGENT,
};

/// Upper bound on a full transport upgrade for the private network stack.
const PNET_UPGRADE_TIMEOUT: Duration = Duration::from_secs(20);

/// Combined network behaviour of the relay node.
#[derive(NetworkBehaviour)]
pub struct RelayBehaviour {
    /// Relay server.
    relay: relay::Behaviour,

    /// Identify protocol.
    identify: identify::Behaviour,

    /// Ping protocol.
    ping: ping::Behaviour,

    /// Connection limits.
    limits: connection_limits::Behaviour,

    /// Gateway port mapping.
    upnp: Toggle<upnp::tokio::Behaviour>,

    /// Connection lifecycle fan-out to the ACL.
    acl_events: ConnectionEvents,
}

impl RelayBehaviour {
    /// Create the behaviour, constructing the ACL and installing it in the
    /// relay's reservation path.
    ///
    /// Must be called within a tokio runtime when UPnP is enabled.
    pub fn new(keypair: &Keypair, config: &RelayConfig) -> Result<(Self, Arc<AclFilter>)> {
        if !config.relay.enabled {
            bail!("relay.enabled = false is not supported, relayd always runs the relay service");
        }

        let local_peer_id = keypair.public().to_peer_id();

        let mut acl_events = ConnectionEvents::new();
        let acl = AclFilter::new(&mut acl_events, &config.acl)
            .wrap_err("invalid ACL configuration")?;

        let relay = relay::Behaviour::new(local_peer_id, gated_relay_config(&config.relay, acl.clone()));

        let identify = identify::Behaviour::new(
            identify::Config::new(IDENTIFY_PROTOCOL_VERSION.to_string(), keypair.public())
                .with_agent_version(USER_AGENT.to_string()),
        );

        let upnp = config
            .network
            .nat_port_map
            .then(upnp::tokio::Behaviour::default);

        let behaviour = Self {
            relay,
            identify,
            ping: ping::Behaviour::default(),
            limits: connection_limits::Behaviour::new(config.limits.connection_limits()),
            upnp: Toggle::from(upnp),
            acl_events,
        };

        Ok((behaviour, acl))
    }
}

/// Relay server configuration with the ACL appended to the reservation limiters.
fn gated_relay_config(resources: &RelayResourcesConfig, acl: Arc<dyn RelayAcl>) -> relay::Config {
    let mut relay_config = resources.to_relay_config();
    relay_config
        .reservation_rate_limiters
        .push(ReservationGate::boxed(acl));
    relay_config
}

/// The relay node: a libp2p swarm plus the ACL guarding it.
pub struct RelayNode {
    /// The libp2p swarm.
    swarm: Swarm<RelayBehaviour>,

    /// Reservation filter shared with the relay behaviour.
    acl: Arc<AclFilter>,

    /// Listen addresses from the configuration.
    listen_addrs: Vec<Multiaddr>,

    /// Whether external addresses come from the configuration rather than peers.
    announce_configured: bool,

    /// Remote address of every open connection, for weighing identify reports.
    connections: HashMap<ConnectionId, Multiaddr>,

    /// Observed addresses awaiting confirmation by distinct peers.
    observed: ObservedAddrs,
}

impl RelayNode {
    /// Build the swarm for `keypair`.
    ///
    /// With a swarm key the node runs TCP-only over the pnet handshake.
    pub fn new(keypair: Keypair, psk: Option<PreSharedKey>, config: &RelayConfig) -> Result<Self> {
        let (behaviour, acl) = RelayBehaviour::new(&keypair, config)?;
        let idle_timeout = config.limits.idle_timeout();

        let mut swarm = match psk {
            None => public_swarm(keypair, behaviour, idle_timeout)?,
            Some(psk) => {
                warn!(
                    fingerprint = %psk.fingerprint(),
                    "private network enabled, QUIC listeners are disabled"
                );
                private_swarm(keypair, psk, behaviour, idle_timeout)?
            }
        };

        for addr in &config.network.announce_addrs {
            info!(%addr, "announcing external address");
            swarm.add_external_address(addr.clone());
        }

        let listen_addrs = match psk {
            None => config.network.listen_addrs.clone(),
            Some(_) => config
                .network
                .listen_addrs
                .iter()
                .filter(|addr| !is_quic(addr))
                .cloned()
                .collect(),
        };

        info!(peer_id = %swarm.local_peer_id(), "relay node initialized");

        Ok(Self {
            swarm,
            acl,
            listen_addrs,
            announce_configured: !config.network.announce_addrs.is_empty(),
            connections: HashMap::new(),
            observed: ObservedAddrs::default(),
        })
    }

    /// Get the local peer ID.
    pub fn local_peer_id(&self) -> &PeerId {
        self.swarm.local_peer_id()
    }

    /// The ACL consulted by the relay.
    pub fn acl(&self) -> &Arc<AclFilter> {
        &self.acl
    }

    /// Addresses [`Self::start_listening`] will bind.
    pub fn listen_addrs(&self) -> &[Multiaddr] {
        &self.listen_addrs
    }

    /// Addresses handed to peers in reservation responses.
    pub fn external_addresses(&self) -> impl Iterator<Item = &Multiaddr> {
        self.swarm.external_addresses()
    }

    /// Start listening on configured addresses.
    ///
    /// Fails only if none of them could be bound.
    pub fn start_listening(&mut self) -> Result<()> {
        let mut listening = 0usize;
        for addr in &self.listen_addrs {
            match self.swarm.listen_on(addr.clone()) {
                Ok(_) => listening += 1,
                Err(e) => warn!(%addr, %e, "failed to listen on address"),
            }
        }

        if listening == 0 {
            bail!("no usable listen address");
        }
        Ok(())
    }

    /// Run the swarm until ctrl-c.
    pub async fn run(&mut self) -> Result<()> {
        info!("starting relay event loop");

        loop {
            tokio::select! {
                event = self.swarm.select_next_some() => self.handle_swarm_event(event),
                res = tokio::signal::ctrl_c() => {
                    res.wrap_err("failed to wait for ctrl-c")?;
                    info!("shutting down");
                    return Ok(());
                }
            }
        }
    }

    fn handle_swarm_event(&mut self, event: SwarmEvent<RelayBehaviourEvent>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                let full = address.with(Protocol::P2p(*self.swarm.local_peer_id()));
                info!(address = %full, "listening");
            }
            SwarmEvent::ExpiredListenAddr { address, .. } => {
                info!(%address, "listen address expired");
            }
            SwarmEvent::ConnectionEstablished {
                peer_id,
                connection_id,
                endpoint,
                num_established,
                ..
            } => {
                debug!(
                    %peer_id,
                    remote = %endpoint.get_remote_address(),
                    num_established,
                    "connection established"
                );
                self.connections
                    .insert(connection_id, endpoint.get_remote_address().clone());
            }
            SwarmEvent::ConnectionClosed {
                peer_id,
                connection_id,
                num_established,
                cause,
                ..
            } => {
                debug!(%peer_id, num_established, ?cause, "connection closed");
                self.connections.remove(&connection_id);
            }
            SwarmEvent::IncomingConnectionError {
                send_back_addr,
                error,
                ..
            } => {
                debug!(%send_back_addr, %error, "incoming connection failed");
            }
            SwarmEvent::ListenerError { error, .. } => {
                warn!(%error, "listener error");
            }
            SwarmEvent::Behaviour(event) => self.handle_behaviour_event(event),
            _ => {}
        }
    }

    /// Handle behaviour-specific events.
    fn handle_behaviour_event(&mut self, event: RelayBehaviourEvent) {
        match event {
            RelayBehaviourEvent::Relay(event) => log_relay_event(event),
            RelayBehaviourEvent::Identify(identify::Event::Received {
                connection_id,
                peer_id,
                info,
            }) => {
                debug!(
                    %peer_id,
                    agent_version = %info.agent_version,
                    observed_addr = %info.observed_addr,
                    "received identify info"
                );
                self.on_observed_addr(connection_id, info.observed_addr);
            }
            RelayBehaviourEvent::Identify(identify::Event::Error { peer_id, error, .. }) => {
                debug!(%peer_id, %error, "identify error");
            }
            RelayBehaviourEvent::Identify(_) => {}
            RelayBehaviourEvent::Ping(ping::Event { peer, result, .. }) => match result {
                Ok(rtt) => trace!(%peer, ?rtt, "ping"),
                Err(e) => debug!(%peer, %e, "ping failed"),
            },
            RelayBehaviourEvent::Upnp(event) => log_upnp_event(event),
            RelayBehaviourEvent::Limits(never) => match never {},
            RelayBehaviourEvent::AclEvents(never) => match never {},
        }
    }

    /// Weigh an identify report of our address made over `connection_id`.
    ///
    /// The address is only advertised once distinct peers agree on it.
    fn on_observed_addr(&mut self, connection_id: ConnectionId, observed: Multiaddr) {
        if self.announce_configured {
            return;
        }
        let Some(reporter) = self.connections.get(&connection_id) else {
            trace!(%observed, "observed address from unknown connection");
            return;
        };
        if let Some(confirmed) = self.observed.observe(observed, reporter) {
            self.swarm.add_external_address(confirmed);
        }
    }
}

fn log_relay_event(event: relay::Event) {
    match event {
        relay::Event::ReservationReqAccepted {
            src_peer_id,
            renewed,
        } => {
            info!(peer = %src_peer_id, renewed, "reservation accepted");
        }
        relay::Event::ReservationReqDenied {
            src_peer_id,
            status,
        } => {
            info!(peer = %src_peer_id, ?status, "reservation denied");
        }
        relay::Event::ReservationClosed { src_peer_id } => {
            debug!(peer = %src_peer_id, "reservation closed");
        }
        relay::Event::ReservationTimedOut { src_peer_id } => {
            debug!(peer = %src_peer_id, "reservation timed out");
        }
        relay::Event::CircuitReqAccepted {
            src_peer_id,
            dst_peer_id,
        } => {
            info!(src = %src_peer_id, dst = %dst_peer_id, "circuit opened");
        }
        relay::Event::CircuitReqDenied {
            src_peer_id,
            dst_peer_id,
            status,
        } => {
            info!(src = %src_peer_id, dst = %dst_peer_id, ?status, "circuit denied");
        }
        relay::Event::CircuitClosed {
            src_peer_id,
            dst_peer_id,
            error,
        } => match error {
            Some(error) => debug!(src = %src_peer_id, dst = %dst_peer_id, %error, "circuit failed"),
            None => debug!(src = %src_peer_id, dst = %dst_peer_id, "circuit closed"),
        },
        other => debug!(event = ?other, "relay event"),
    }
}

fn log_upnp_event(event: upnp::Event) {
    match event {
        upnp::Event::NewExternalAddr(addr) => info!(%addr, "gateway port mapped"),
        upnp::Event::ExpiredExternalAddr(addr) => warn!(%addr, "gateway port mapping expired"),
        upnp::Event::GatewayNotFound => info!("no UPnP gateway found"),
        upnp::Event::NonRoutableGateway => info!("UPnP gateway is not publicly routable"),
    }
}

fn public_swarm(
    keypair: Keypair,
    behaviour: RelayBehaviour,
    idle_timeout: Duration,
) -> Result<Swarm<RelayBehaviour>> {
    let swarm = SwarmBuilder::with_existing_identity(keypair)
        .with_tokio()
        .with_tcp(
            tcp::Config::default().nodelay(true),
            noise::Config::new,
            yamux::Config::default,
        )?
        .with_quic()
        .with_dns()?
        .with_behaviour(|_| Ok(behaviour))?
        .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(idle_timeout))
        .build();
    Ok(swarm)
}

fn private_swarm(
    keypair: Keypair,
    psk: PreSharedKey,
    behaviour: RelayBehaviour,
    idle_timeout: Duration,
) -> Result<Swarm<RelayBehaviour>> {
    let swarm = SwarmBuilder::with_existing_identity(keypair)
        .with_tokio()
        .with_other_transport(|key| {
            let noise = noise::Config::new(key)?;
            let transport = tcp::tokio::Transport::new(tcp::Config::default().nodelay(true))
                .and_then(move |socket, _| PnetConfig::new(psk).handshake(socket))
                .upgrade(Version::V1Lazy)
                .authenticate(noise)
                .multiplex(yamux::Config::default())
                .timeout(PNET_UPGRADE_TIMEOUT);
            Ok::<_, Box<dyn Error + Send + Sync>>(transport)
        })
        .map_err(|e| eyre!("failed to build private network transport: {e}"))?
        .with_dns()?
        .with_behaviour(|_| Ok(behaviour))?
        .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(idle_timeout))
        .build();
    Ok(swarm)
}

fn is_quic(addr: &Multiaddr) -> bool {
    addr.iter()
        .any(|p| matches!(p, Protocol::QuicV1 | Protocol::Quic))
}
