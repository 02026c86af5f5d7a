//! Nonce hashing and target comparison
//!
//! The mining loop only ever looks at a 32-bit value per nonce. The default
//! hasher places the nonce alone in lane 0 of a zeroed state, pads it the
//! SHA-3 way and runs one permutation: no block header is involved. Use
//! [`HeaderNonceHasher`] to bind a real header into the digest.

use crate::keccak::permute;
use crate::params::{RATE_END_PAD, SHA3_256_RATE, SHA3_PAD, STATE_LANES};
use crate::sponge::Sha3Context;

/// Maps a candidate nonce to the 32-bit value compared against the target
pub trait NonceHasher {
    fn hash(&self, nonce: u32) -> u32;
}

/// Nonce-only SHA3-256 digest, low 32 bits of lane 0
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sha3NonceHasher;

impl NonceHasher for Sha3NonceHasher {
    #[inline]
    fn hash(&self, nonce: u32) -> u32 {
        hash_nonce(nonce)
    }
}

/// Hash a nonce with the nonce-only shortcut
///
/// The nonce occupies bytes 0..4 of the rate, so `0x06` lands in byte 4 of
/// lane 0 and `0x80` in the top byte of the last rate lane. The result equals
/// the first four digest bytes of SHA3-256 over the little-endian nonce.
#[inline]
pub fn hash_nonce(nonce: u32) -> u32 {
    let mut state = [0u64; STATE_LANES];
    state[0] ^= nonce as u64;
    state[0] ^= (SHA3_PAD as u64) << 32;
    state[SHA3_256_RATE / 8 - 1] ^= (RATE_END_PAD as u64) << 56;

    permute(&mut state);

    (state[0] & 0xFFFF_FFFF) as u32
}

/// Unsigned less-than test against the target
#[inline(always)]
pub fn compare(hash_value: u32, target: u32) -> bool {
    hash_value < target
}

/// Digest of `header || nonce_le` through the full sponge
///
/// The header is absorbed once; each hash clones that midstate and absorbs
/// only the four nonce bytes.
#[derive(Clone, Debug)]
pub struct HeaderNonceHasher {
    midstate: Sha3Context,
}

impl HeaderNonceHasher {
    pub fn new(header: &[u8]) -> Self {
        let mut midstate = Sha3Context::sha3_256();
        midstate.update(header);
        Self { midstate }
    }
}

impl NonceHasher for HeaderNonceHasher {
    fn hash(&self, nonce: u32) -> u32 {
        let mut ctx = self.midstate.clone();
        ctx.update(&nonce.to_le_bytes());
        let d = ctx.finalize();
        u32::from_le_bytes([d[0], d[1], d[2], d[3]])
    }
}
