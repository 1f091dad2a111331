pub mod constants;
pub mod error;
pub mod ledger;
pub mod net;
pub mod pow;
pub mod validate;

pub use error::{LedgerError, PeerError};
pub use ledger::Ledger;
pub use net::{resolve_conflicts, NodeRegistry, PeerClient, RemoteChain};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

/// Hex-encoded SHA-256 over a block's sorted-key JSON encoding.
///
/// Round-tripping through `serde_json::Value` sorts object keys, so two
/// structurally equal blocks hash identically no matter what order their
/// fields were serialized in. Pure; the only hashing entry point for blocks.
pub fn block_hash(block: &Block) -> String {
    let canonical = serde_json::to_value(block).expect("block serializes to JSON");
    let digest = Sha256::digest(canonical.to_string().as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HASH_HEX_SIZE;

    fn sample_block() -> Block {
        Block {
            index: 1,
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            transactions: vec![Transaction {
                sender: "alice".to_string(),
                recipient: "bob".to_string(),
                amount: 10,
            }],
            proof: 35293,
            previous_hash: "genesis".to_string(),
        }
    }

    #[test]
    fn block_hash_is_lowercase_hex() {
        let hash = block_hash(&sample_block());
        assert_eq!(hash.len(), HASH_HEX_SIZE);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn block_hash_is_deterministic() {
        let block = sample_block();
        assert_eq!(block_hash(&block), block_hash(&block.clone()));
    }

    #[test]
    fn block_hash_ignores_json_field_order() {
        let block = sample_block();
        // Same block, fields deliberately out of order.
        let scrambled: Block = serde_json::from_value(serde_json::json!({
            "proof": 35293,
            "previous_hash": "genesis",
            "transactions": [{"amount": 10, "recipient": "bob", "sender": "alice"}],
            "index": 1,
            "timestamp": "2026-01-01T00:00:00+00:00",
        }))
        .unwrap();
        assert_eq!(block_hash(&block), block_hash(&scrambled));
    }

    #[test]
    fn canonical_encoding_sorts_keys() {
        let value = serde_json::to_value(sample_block()).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn block_hash_changes_with_any_field() {
        let base = sample_block();
        let mut tampered = base.clone();
        tampered.proof += 1;
        assert_ne!(block_hash(&base), block_hash(&tampered));

        let mut tampered = base.clone();
        tampered.transactions[0].amount = 11;
        assert_ne!(block_hash(&base), block_hash(&tampered));

        let mut tampered = base.clone();
        tampered.previous_hash = "0".repeat(HASH_HEX_SIZE);
        assert_ne!(block_hash(&base), block_hash(&tampered));
    }

    #[test]
    fn block_hash_never_collides_with_genesis_sentinel() {
        // The sentinel is 7 chars; a digest is always 64.
        assert_ne!(
            block_hash(&sample_block()),
            crate::constants::GENESIS_PREVIOUS_HASH
        );
    }

    #[test]
    fn transaction_serialization_example() {
        let tx = Transaction {
            sender: "A".to_string(),
            recipient: "B".to_string(),
            amount: 5,
        };
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, r#"{"sender":"A","recipient":"B","amount":5}"#);
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, deserialized);
    }

    #[test]
    fn block_serialization_round_trip() {
        let block = sample_block();
        let json = serde_json::to_string(&block).unwrap();
        let deserialized: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(block, deserialized);
    }
}
