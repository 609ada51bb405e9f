//! Logging CLI arguments.

use clap::Args;

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq)]
#[command(next_help_heading = "Logging")]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Log filter directive (e.g., "relayd_net_acl=debug,libp2p_relay=info").
    #[arg(long = "log.filter", value_name = "DIRECTIVE")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json")]
    pub json: bool,
}

impl LogArgs {
    /// Base level implied by `--quiet` and the verbosity count.
    pub fn base_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
