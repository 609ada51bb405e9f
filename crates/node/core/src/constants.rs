//! Constants used throughout the relay daemon.
//!
//! Defaults for the configuration file live here so that the config structs
//! and the CLI agree on them.

// =============================================================================
// Network
// =============================================================================

/// Default port for TCP and QUIC listeners.
pub const DEFAULT_P2P_PORT: u16 = 4001;

// =============================================================================
// Connection Limits
// =============================================================================

/// Default maximum number of established connections.
pub const DEFAULT_MAX_ESTABLISHED: u32 = 768;

/// Default idle connection timeout in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Relay Resources
// =============================================================================

/// Default reservation lifetime in seconds.
pub const DEFAULT_RESERVATION_TTL_SECS: u64 = 60 * 60;

/// Default maximum number of active reservations.
pub const DEFAULT_MAX_RESERVATIONS: usize = 128;

/// Default maximum number of reservations a single peer may hold.
pub const DEFAULT_MAX_RESERVATIONS_PER_PEER: usize = 4;

/// Default maximum number of relayed circuits.
pub const DEFAULT_MAX_CIRCUITS: usize = 16;

/// Default maximum number of relayed circuits per peer.
pub const DEFAULT_MAX_CIRCUITS_PER_PEER: usize = 4;

/// Default lifetime of a relayed circuit in seconds.
pub const DEFAULT_CIRCUIT_DURATION_SECS: u64 = 2 * 60;

/// Default number of bytes relayed per circuit, in each direction.
pub const DEFAULT_CIRCUIT_BYTES: u64 = 1 << 17;

// =============================================================================
// Protocol Identification
// =============================================================================

/// Protocol version string for the identify protocol.
pub const IDENTIFY_PROTOCOL_VERSION: &str = "ipfs/0.1.0";

// =============================================================================
// File System
// =============================================================================

/// Default path of the node key file.
pub const DEFAULT_IDENTITY_PATH: &str = "identity";

/// Permissions for a freshly generated key file (Unix: owner read only).
#[cfg(unix)]
pub const IDENTITY_FILE_MODE: u32 = 0o400;
