//! SHA-3 Miner Parameters
//!
//! Sizes and constants shared by the permutation, the sponge and the
//! mining pipeline.

/// Number of Keccak-f[1600] rounds
pub const KECCAK_ROUNDS: usize = 24;

/// Number of 64-bit lanes in the Keccak state
pub const STATE_LANES: usize = 25;

/// Keccak state size in bytes (1600 bits)
pub const STATE_BYTES: usize = STATE_LANES * 8;

/// SHA3-256 digest length in bytes
pub const SHA3_256_DIGEST: usize = 32;

/// SHA3-256 rate in bytes: 200 - 2 * 32
pub const SHA3_256_RATE: usize = STATE_BYTES - 2 * SHA3_256_DIGEST;

/// SHA-3 domain separation suffix, XORed at the current absorb position
pub const SHA3_PAD: u8 = 0x06;

/// Final padding bit, XORed into the last byte of the rate
pub const RATE_END_PAD: u8 = 0x80;

/// Default number of slots in the mining pipeline ring buffer
pub const PIPELINE_DEPTH: usize = 8;
