//! Node key and private network key.
//!
//! The node key is stored as a protobuf-encoded libp2p keypair. A missing
//! key file is not an error: a fresh Ed25519 key is generated and written
//! read-only for the owner.
//!
//! The optional swarm key is a v1 pre-shared key:
//!
//! ```text
//! /key/swarm/psk/1.0.0/
//! /base16/
//! <64 hex characters>
//! ```

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::Path,
};

use libp2p::{
    identity::{DecodingError, Keypair},
    pnet::{Fingerprint, KeyParseError, PreSharedKey},
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid key file {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodingError,
    },
    #[error("invalid swarm key {path}: {source}")]
    SwarmKey {
        path: String,
        #[source]
        source: KeyParseError,
    },
}

impl IdentityError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Read the node key from `path`, generating one if the file does not exist.
pub fn load_identity(path: &Path) -> Result<Keypair, IdentityError> {
    match fs::metadata(path) {
        Ok(_) => read_identity(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "generating node identity");
            generate_identity(path)
        }
        Err(e) => Err(IdentityError::io(path, e)),
    }
}

/// Read a protobuf-encoded keypair from `path`.
pub fn read_identity(path: &Path) -> Result<Keypair, IdentityError> {
    let bytes = fs::read(path).map_err(|e| IdentityError::io(path, e))?;
    Keypair::from_protobuf_encoding(&bytes).map_err(|source| IdentityError::Decode {
        path: path.display().to_string(),
        source,
    })
}

/// Generate an Ed25519 keypair and write it to `path`.
///
/// Fails if the file already exists.
pub fn generate_identity(path: &Path) -> Result<Keypair, IdentityError> {
    let keypair = Keypair::generate_ed25519();
    let bytes = keypair
        .to_protobuf_encoding()
        .map_err(|source| IdentityError::Decode {
            path: path.display().to_string(),
            source,
        })?;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(crate::constants::IDENTITY_FILE_MODE);
    }

    let mut file = options.open(path).map_err(|e| IdentityError::io(path, e))?;
    file.write_all(&bytes)
        .map_err(|e| IdentityError::io(path, e))?;

    Ok(keypair)
}

/// Read a v1 swarm key from `path` and compute its fingerprint.
pub fn load_swarm_key(path: &Path) -> Result<(PreSharedKey, Fingerprint), IdentityError> {
    let content = fs::read_to_string(path).map_err(|e| IdentityError::io(path, e))?;
    let psk: PreSharedKey = content
        .parse()
        .map_err(|source| IdentityError::SwarmKey {
            path: path.display().to_string(),
            source,
        })?;

    Ok((psk, psk.fingerprint()))
}
