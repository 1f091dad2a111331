use crate::error::{LedgerError, PeerError};
use crate::{validate, Block, Ledger};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use tracing::{info, warn};
use url::Url;

/// Known peers, deduplicated by normalized `host[:port]`. Peers are added
/// by explicit registration and never removed.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashSet<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer given either a bare `host:port` or a full URL.
    /// Re-registering an existing peer is a no-op.
    pub fn register(&mut self, address: &str) -> Result<(), LedgerError> {
        let netloc = normalize_address(address)?;
        self.nodes.insert(netloc);
        Ok(())
    }

    /// Iteration order is unspecified; consensus must not depend on it.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Reduces an address to its network location. `Url::parse` rejects
/// scheme-less input like "127.0.0.1:5000", so that form gets an
/// `http://` prefix and a second chance.
fn normalize_address(address: &str) -> Result<String, LedgerError> {
    let invalid = || LedgerError::InvalidAddress(address.to_string());
    let url = match Url::parse(address) {
        Ok(url) if url.host_str().is_some() => url,
        _ => Url::parse(&format!("http://{address}")).map_err(|_| invalid())?,
    };
    let host = url.host_str().ok_or_else(invalid)?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Wire shape of a peer's chain report: `{"length": n, "chain": [...]}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteChain {
    pub length: u64,
    pub chain: Vec<Block>,
}

/// The network boundary consensus resolution talks through. The node backs
/// it with an HTTP client; tests back it with an in-memory map.
pub trait PeerClient {
    fn fetch_chain(
        &self,
        peer: &str,
    ) -> impl Future<Output = Result<RemoteChain, PeerError>> + Send;
}

/// Longest-valid-chain consensus.
///
/// Fetches every registered peer's chain, keeps the longest one that is
/// strictly longer than ours and passes validation, and adopts it. Returns
/// whether the local chain was replaced. Unreachable peers and invalid
/// chains are skipped, never fatal.
///
/// Length comparison uses the fetched chain itself, not the peer's
/// reported `length` field, so a peer overstating its length can never
/// shrink the local chain.
pub async fn resolve_conflicts<C: PeerClient>(
    ledger: &mut Ledger,
    registry: &NodeRegistry,
    client: &C,
) -> bool {
    let mut max_length = ledger.len() as u64;
    let mut candidate: Option<Vec<Block>> = None;

    for peer in registry.nodes() {
        let remote = match client.fetch_chain(peer).await {
            Ok(remote) => remote,
            Err(err) => {
                warn!(peer, error = %err, "skipping peer");
                continue;
            }
        };
        let length = remote.chain.len() as u64;
        if length <= max_length {
            continue;
        }
        if !validate::is_valid(&remote.chain) {
            warn!(peer, length, "peer offered an invalid chain");
            continue;
        }
        max_length = length;
        candidate = Some(remote.chain);
    }

    match candidate {
        Some(chain) => {
            info!(length = max_length, "replacing local chain");
            ledger.replace_chain(chain);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_and_full_urls_normalize_the_same() {
        let mut registry = NodeRegistry::new();
        registry.register("127.0.0.1:5000").unwrap();
        registry.register("http://127.0.0.1:5000").unwrap();
        registry.register("http://127.0.0.1:5000/chain").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.nodes().next(), Some("127.0.0.1:5000"));
    }

    #[test]
    fn host_without_port_is_kept_as_is() {
        let mut registry = NodeRegistry::new();
        registry.register("https://node.example.com").unwrap();
        assert_eq!(registry.nodes().next(), Some("node.example.com"));
    }

    #[test]
    fn hostname_with_port_is_not_mistaken_for_a_scheme() {
        // "localhost:5000" parses as scheme "localhost" with no host; the
        // http:// fallback has to recover it.
        let mut registry = NodeRegistry::new();
        registry.register("localhost:5000").unwrap();
        assert_eq!(registry.nodes().next(), Some("localhost:5000"));
    }

    #[test]
    fn garbage_addresses_are_rejected() {
        let mut registry = NodeRegistry::new();
        let err = registry.register("not a url").unwrap_err();
        assert_eq!(err, LedgerError::InvalidAddress("not a url".to_string()));
        assert!(registry.is_empty());
    }

    #[test]
    fn distinct_peers_accumulate() {
        let mut registry = NodeRegistry::new();
        registry.register("127.0.0.1:5000").unwrap();
        registry.register("127.0.0.1:5001").unwrap();
        registry.register("10.0.0.2:5000").unwrap();
        assert_eq!(registry.len(), 3);
    }
}
