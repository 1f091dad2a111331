use crate::constants::POW_TARGET_BITS;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation for an in-flight proof search. Cloneable; any
/// clone can cancel the search the others are watching.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// True iff sha256("{last_proof}{proof}{last_hash}") carries at least
/// [`POW_TARGET_BITS`] leading zero bits. Stateless; the search and the
/// chain validator share this exact predicate.
pub fn valid_proof(last_proof: u64, proof: u64, last_hash: &str) -> bool {
    let guess = format!("{last_proof}{proof}{last_hash}");
    let digest = Sha256::digest(guess.as_bytes());
    count_leading_zero_bits(&digest) >= POW_TARGET_BITS
}

/// Lowest nonce satisfying [`valid_proof`] against the previous block.
///
/// Unbounded: blocks the calling thread until a proof turns up. The search
/// runs across threads but `find_first` keeps the result the lowest match,
/// so the outcome is identical to a sequential scan from zero.
pub fn find_proof(last_proof: u64, last_hash: &str) -> u64 {
    (0u64..u64::MAX)
        .into_par_iter()
        .find_first(|&proof| valid_proof(last_proof, proof, last_hash))
        .expect("nonce space exhausted (practically impossible)")
}

/// Same search as [`find_proof`], but gives the caller a way out: once
/// `cancel` fires the search winds down and returns `None` unless it
/// already had a satisfying nonce in hand.
pub fn find_proof_cancellable(
    last_proof: u64,
    last_hash: &str,
    cancel: &CancelToken,
) -> Option<u64> {
    let found = (0u64..u64::MAX)
        .into_par_iter()
        .find_first(|&proof| cancel.is_cancelled() || valid_proof(last_proof, proof, last_hash))
        .expect("nonce space exhausted (practically impossible)");
    if valid_proof(last_proof, found, last_hash) {
        Some(found)
    } else {
        None
    }
}

pub fn count_leading_zero_bits(hash: &[u8]) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}
