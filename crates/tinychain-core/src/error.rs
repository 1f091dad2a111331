use thiserror::Error;

/// Failures surfaced to callers of the ledger and the node registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Node registration was handed something that is not a network address.
    #[error("invalid node address: {0}")]
    InvalidAddress(String),
    /// A submitted transaction is missing a required field.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(&'static str),
}

/// Failures while fetching a peer's chain. These never escape consensus
/// resolution; a failing peer is skipped, not fatal.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer unreachable: {0}")]
    Unreachable(String),
    #[error("peer returned status {0}")]
    BadStatus(u16),
    #[error("malformed chain response: {0}")]
    MalformedBody(String),
}
