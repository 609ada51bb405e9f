//! Node key and configuration file arguments.

use std::path::PathBuf;

use clap::Args;

use crate::constants::DEFAULT_IDENTITY_PATH;

/// Files the relay node is started from.
#[derive(Debug, Args, Clone, PartialEq, Eq)]
#[command(next_help_heading = "Node")]
pub struct NodeArgs {
    /// Node key file. Generated on first start if missing.
    #[arg(long = "id", value_name = "FILE", default_value = DEFAULT_IDENTITY_PATH)]
    pub identity: PathBuf,

    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Private network key. Restricts the node to TCP.
    #[arg(long = "swarmkey", value_name = "FILE")]
    pub swarm_key: Option<PathBuf>,
}

impl Default for NodeArgs {
    fn default() -> Self {
        Self {
            identity: PathBuf::from(DEFAULT_IDENTITY_PATH),
            config: None,
            swarm_key: None,
        }
    }
}
