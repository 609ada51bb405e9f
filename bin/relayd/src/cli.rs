//! Relay daemon CLI entry point.

use clap::Parser;
use eyre::{Result, WrapErr};
use libp2p::identity::Keypair;
use relayd_node_core::{
    args::{LogArgs, NodeArgs},
    config::RelayConfig,
    identity, logging,
    network::RelayNode,
    version,
};
use tracing::info;

/// relayd - libp2p circuit relay with reservation allow-lists
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration.
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Key and configuration files.
    #[command(flatten)]
    pub(crate) node: NodeArgs,
}

/// Parse the command line and run the relay until ctrl-c.
pub(crate) async fn run() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    info!("starting relayd {}", version::VERSION);

    let config = RelayConfig::load(cli.node.config.as_deref())?;
    let keypair = load_keypair(&cli.node)?;
    let psk = match &cli.node.swarm_key {
        Some(path) => {
            let (psk, fingerprint) = identity::load_swarm_key(path)?;
            info!(%fingerprint, path = %path.display(), "loaded swarm key");
            Some(psk)
        }
        None => None,
    };

    let mut node = RelayNode::new(keypair, psk, &config).wrap_err("failed to build relay node")?;
    node.start_listening()?;
    node.run().await
}

fn load_keypair(args: &NodeArgs) -> Result<Keypair> {
    let keypair = identity::load_identity(&args.identity)
        .wrap_err_with(|| format!("failed to load identity {}", args.identity.display()))?;
    info!(peer_id = %keypair.public().to_peer_id(), "loaded identity");
    Ok(keypair)
}
