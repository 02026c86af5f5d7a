//! SHA3-256 sponge over Keccak-f[1600]
//!
//! The context keeps a 200-byte buffer that mirrors the permutation state.
//! Input bytes are XORed into the buffer at `pt`; every time `pt` reaches the
//! rate the buffer is loaded into lanes, permuted and stored back. Splitting a
//! message across any number of `absorb` calls gives the same digest.

use crate::error::{Result, Sha3MinerError};
use crate::keccak::{KeccakState, lanes_from_bytes, lanes_to_bytes, permute};
use crate::params::{RATE_END_PAD, SHA3_256_DIGEST, SHA3_PAD, STATE_BYTES, STATE_LANES};

/// Sponge context: state, mirrored byte buffer, absorb position and rate
#[derive(Clone, Debug)]
pub struct Sha3Context {
    state: KeccakState,
    buffer: [u8; STATE_BYTES],
    /// Absorb position inside the rate, `0 <= pt < rsiz`
    pt: usize,
    /// Rate in bytes, `200 - 2 * mdlen`
    rsiz: usize,
    /// Digest length in bytes
    mdlen: usize,
}

impl Sha3Context {
    /// Create a context for a `digest_bytes`-byte digest
    ///
    /// Fails with [`Sha3MinerError::InvalidRate`] when the rate
    /// `200 - 2 * digest_bytes` is not positive or is smaller than the digest
    /// itself (the digest is squeezed straight out of the rate).
    pub fn new(digest_bytes: usize) -> Result<Self> {
        let rsiz = digest_bytes
            .checked_mul(2)
            .and_then(|capacity| STATE_BYTES.checked_sub(capacity))
            .filter(|&r| r > 0 && digest_bytes > 0 && digest_bytes <= r)
            .ok_or(Sha3MinerError::InvalidRate { digest_bytes })?;

        Ok(Self {
            state: [0u64; STATE_LANES],
            buffer: [0u8; STATE_BYTES],
            pt: 0,
            rsiz,
            mdlen: digest_bytes,
        })
    }

    /// SHA3-256 context (136-byte rate)
    pub fn sha3_256() -> Self {
        Self {
            state: [0u64; STATE_LANES],
            buffer: [0u8; STATE_BYTES],
            pt: 0,
            rsiz: STATE_BYTES - 2 * SHA3_256_DIGEST,
            mdlen: SHA3_256_DIGEST,
        }
    }

    /// Clear state and buffer, keeping the digest length
    pub fn reset(&mut self) {
        self.state = [0u64; STATE_LANES];
        self.buffer = [0u8; STATE_BYTES];
        self.pt = 0;
    }

    /// Rate in bytes
    pub fn rate(&self) -> usize {
        self.rsiz
    }

    /// Digest length in bytes
    pub fn digest_len(&self) -> usize {
        self.mdlen
    }

    /// Current absorb position
    pub fn position(&self) -> usize {
        self.pt
    }

    /// Absorb `data`; when `is_final` is set, pad and run the closing permutation
    ///
    /// Padding XORs `0x06` at `pt` and `0x80` at `rsiz - 1`; when the two
    /// positions coincide the byte receives `0x86`. Exactly one permutation
    /// follows the padding even if the buffer was just flushed.
    pub fn absorb(&mut self, data: &[u8], is_final: bool) {
        for &byte in data {
            self.buffer[self.pt] ^= byte;
            self.pt += 1;
            if self.pt == self.rsiz {
                self.permute_buffer();
                self.pt = 0;
            }
        }

        if is_final {
            self.buffer[self.pt] ^= SHA3_PAD;
            self.buffer[self.rsiz - 1] ^= RATE_END_PAD;
            self.permute_buffer();
            self.pt = 0;
        }
    }

    /// Absorb a chunk of a longer message
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.absorb(data, false);
    }

    /// Copy `out.len()` digest bytes from the post-final buffer
    pub fn squeeze(&self, out: &mut [u8]) -> Result<()> {
        if out.len() > self.mdlen {
            return Err(Sha3MinerError::OutputTooLong {
                requested: out.len(),
                digest_bytes: self.mdlen,
            });
        }
        out.copy_from_slice(&self.buffer[..out.len()]);
        Ok(())
    }

    /// Pad, permute and return the 32-byte digest
    ///
    /// Only meaningful for a SHA3-256 context; wider digests are truncated to
    /// their first 32 bytes.
    pub fn finalize(&mut self) -> [u8; SHA3_256_DIGEST] {
        self.absorb(&[], true);
        let mut out = [0u8; SHA3_256_DIGEST];
        let n = self.mdlen.min(SHA3_256_DIGEST);
        out[..n].copy_from_slice(&self.buffer[..n]);
        out
    }

    /// Lanes as of the last permutation
    pub fn state(&self) -> &KeccakState {
        &self.state
    }

    fn permute_buffer(&mut self) {
        self.state = lanes_from_bytes(&self.buffer);
        permute(&mut self.state);
        lanes_to_bytes(&self.state, &mut self.buffer);
    }
}

impl Default for Sha3Context {
    fn default() -> Self {
        Self::sha3_256()
    }
}

/// One-shot SHA3-256
pub fn sha3_256(data: &[u8]) -> [u8; SHA3_256_DIGEST] {
    let mut ctx = Sha3Context::sha3_256();
    ctx.absorb(data, true);
    let mut out = [0u8; SHA3_256_DIGEST];
    out.copy_from_slice(&ctx.buffer[..SHA3_256_DIGEST]);
    out
}

/// Hash consecutive blocks of `input` independently with SHA3-256
///
/// `lengths[i]` is the size of block `i`. Empty blocks and blocks that would
/// run past the end of `input` are skipped and do not advance the offset.
pub fn digest_each(input: &[u8], lengths: &[usize]) -> Vec<[u8; SHA3_256_DIGEST]> {
    let mut offset = 0;
    let mut digests = Vec::with_capacity(lengths.len());
    for &len in lengths {
        if len == 0 || len > input.len() - offset {
            continue;
        }
        digests.push(sha3_256(&input[offset..offset + len]));
        offset += len;
    }
    digests
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sha3::{Digest, Sha3_256};

    const EMPTY_DIGEST: &str = "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a";
    const ABC_DIGEST: &str = "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532";

    fn reference(data: &[u8]) -> [u8; 32] {
        Sha3_256::digest(data).into()
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(hex::encode(sha3_256(b"")), EMPTY_DIGEST);
    }

    #[test]
    fn test_abc() {
        assert_eq!(hex::encode(sha3_256(b"abc")), ABC_DIGEST);
    }

    #[test]
    fn test_rate_boundaries_match_reference() {
        // 135 puts both padding bytes on the same position, 136 flushes a full block
        for len in [1usize, 135, 136, 137, 271, 272, 273, 1000] {
            let msg: Vec<u8> = (0..len).map(|i| (i * 31 + 7) as u8).collect();
            assert_eq!(sha3_256(&msg), reference(&msg), "length {len}");
        }
    }

    #[test]
    fn test_coinciding_padding_byte() {
        let mut ctx = Sha3Context::sha3_256();
        ctx.update(&[0u8; 135]);
        assert_eq!(ctx.position(), 135);
        let digest = ctx.finalize();
        assert_eq!(digest, reference(&[0u8; 135]));
    }

    #[test]
    fn test_init_rate() {
        let ctx = Sha3Context::new(32).unwrap();
        assert_eq!(ctx.rate(), 136);
        assert_eq!(ctx.digest_len(), 32);
        assert_eq!(ctx.position(), 0);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        for digest_bytes in [0usize, 67, 100, 150, usize::MAX / 2 + 1, usize::MAX] {
            assert_eq!(
                Sha3Context::new(digest_bytes).unwrap_err(),
                Sha3MinerError::InvalidRate { digest_bytes }
            );
        }
    }

    #[test]
    fn test_squeeze_bounds() {
        let mut ctx = Sha3Context::sha3_256();
        ctx.absorb(b"abc", true);

        let mut prefix = [0u8; 4];
        ctx.squeeze(&mut prefix).unwrap();
        assert_eq!(hex::encode(prefix), &ABC_DIGEST[..8]);

        let mut too_long = [0u8; 33];
        assert_eq!(
            ctx.squeeze(&mut too_long).unwrap_err(),
            Sha3MinerError::OutputTooLong {
                requested: 33,
                digest_bytes: 32
            }
        );
    }

    #[test]
    fn test_reset_reuses_context() {
        let mut ctx = Sha3Context::sha3_256();
        ctx.update(b"something else entirely");
        ctx.reset();
        ctx.update(b"abc");
        assert_eq!(hex::encode(ctx.finalize()), ABC_DIGEST);
    }

    #[test]
    fn test_digest_each_skips_bad_blocks() {
        let input = b"abcdefgh";
        let digests = digest_each(input, &[3, 0, 2, 10, 3]);
        assert_eq!(
            digests,
            vec![sha3_256(b"abc"), sha3_256(b"de"), sha3_256(b"fgh")]
        );

        let huge = digest_each(b"abc", &[2, usize::MAX, 1]);
        assert_eq!(huge, vec![sha3_256(b"ab"), sha3_256(b"c")]);
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_digest(
            msg in proptest::collection::vec(any::<u8>(), 0..600),
            cuts in proptest::collection::vec(any::<usize>(), 0..8),
        ) {
            let mut points: Vec<usize> = cuts.iter().map(|c| c % (msg.len() + 1)).collect();
            points.sort_unstable();

            let mut ctx = Sha3Context::sha3_256();
            let mut start = 0;
            for p in points {
                ctx.update(&msg[start..p]);
                start = p;
            }
            ctx.update(&msg[start..]);

            prop_assert_eq!(ctx.finalize(), sha3_256(&msg));
            prop_assert_eq!(sha3_256(&msg), reference(&msg));
        }
    }
}
