use thiserror::Error;

/// Errors raised while building an ACL from configuration.
///
/// Any of these must abort startup: an allow-list that silently skips an
/// entry it could not parse admits a different set of peers than configured.
#[derive(Debug, Error)]
pub enum AclError {
    #[error("malformed peer id {input:?}: {source}")]
    MalformedIdentity {
        input: String,
        #[source]
        source: libp2p::identity::ParseError,
    },
    #[error("malformed subnet {input:?}: {source}")]
    MalformedSubnet {
        input: String,
        #[source]
        source: ipnet::AddrParseError,
    },
}
