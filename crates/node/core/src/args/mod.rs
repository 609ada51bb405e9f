//! CLI argument structs for the relay daemon.

mod log;
mod node;

pub use log::LogArgs;
pub use node::NodeArgs;
