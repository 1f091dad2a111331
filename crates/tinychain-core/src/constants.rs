pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Leading zero bits a proof digest must carry; 16 bits is the classic
/// "first four hex chars are zero" target.
pub const POW_TARGET_BITS: u32 = 16;

pub const GENESIS_PROOF: u64 = 1;
pub const GENESIS_PREVIOUS_HASH: &str = "genesis";
