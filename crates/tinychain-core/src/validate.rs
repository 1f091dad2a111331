use crate::{block_hash, pow, Block};
use rayon::prelude::*;

/// Walks a candidate chain pairwise and confirms hash linkage and
/// proof-of-work for every adjacent pair. A single-block chain is
/// trivially valid; an empty one has no genesis and is rejected.
///
/// Pure; works the same on the local chain and on a fetched candidate.
pub fn is_valid(chain: &[Block]) -> bool {
    if chain.is_empty() {
        return false;
    }
    chain.par_windows(2).all(|pair| {
        let prev_hash = block_hash(&pair[0]);
        pair[1].previous_hash == prev_hash
            && pow::valid_proof(pair[0].proof, pair[1].proof, &prev_hash)
    })
}
