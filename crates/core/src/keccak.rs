//! Keccak-f[1600] permutation
//!
//! The state is 25 little-endian 64-bit lanes indexed `x + 5 * y`. Each of
//! the 24 rounds applies theta, the combined rho/pi walk, chi and iota in
//! place.

use crate::params::{KECCAK_ROUNDS, STATE_LANES};

/// Keccak state: 25 lanes of 64 bits
pub type KeccakState = [u64; STATE_LANES];

/// Iota round constants
const ROUND_CONSTANTS: [u64; KECCAK_ROUNDS] = [
    0x0000000000000001,
    0x0000000000008082,
    0x800000000000808a,
    0x8000000080008000,
    0x000000000000808b,
    0x0000000080000001,
    0x8000000080008081,
    0x8000000000008009,
    0x000000000000008a,
    0x0000000000000088,
    0x0000000080008009,
    0x000000008000000a,
    0x000000008000808b,
    0x800000000000008b,
    0x8000000000008089,
    0x8000000000008003,
    0x8000000000008002,
    0x8000000000000080,
    0x000000000000800a,
    0x800000008000000a,
    0x8000000080008081,
    0x8000000000008080,
    0x0000000080000001,
    0x8000000080008008,
];

/// Rho rotation applied at each step of the pi walk
const RHO_ROTATIONS: [u32; 24] = [
    1, 3, 6, 10, 15, 21, 28, 36, 45, 55, 2, 14, 27, 41, 56, 8, 25, 43, 62, 18, 39, 61, 20, 44,
];

/// Destination lane for each step of the pi walk, starting from lane 1
const PI_LANES: [usize; 24] = [
    10, 7, 11, 17, 18, 3, 5, 16, 8, 21, 24, 4, 15, 23, 19, 13, 12, 2, 20, 14, 22, 9, 6, 1,
];

/// Apply the full 24-round Keccak-f[1600] permutation in place
#[inline]
pub fn permute(state: &mut KeccakState) {
    for rc in ROUND_CONSTANTS {
        round(state, rc);
    }
}

#[inline(always)]
fn round(state: &mut KeccakState, rc: u64) {
    // Theta
    let mut parity = [0u64; 5];
    for (col, p) in parity.iter_mut().enumerate() {
        *p = state[col] ^ state[col + 5] ^ state[col + 10] ^ state[col + 15] ^ state[col + 20];
    }
    for col in 0..5 {
        let t = parity[(col + 4) % 5] ^ parity[(col + 1) % 5].rotate_left(1);
        for row in (0..STATE_LANES).step_by(5) {
            state[row + col] ^= t;
        }
    }

    // Rho + Pi
    let mut carried = state[1];
    for (&lane, &rot) in PI_LANES.iter().zip(RHO_ROTATIONS.iter()) {
        let next = state[lane];
        state[lane] = carried.rotate_left(rot);
        carried = next;
    }

    // Chi
    for row in (0..STATE_LANES).step_by(5) {
        let r = [
            state[row],
            state[row + 1],
            state[row + 2],
            state[row + 3],
            state[row + 4],
        ];
        for i in 0..5 {
            state[row + i] = r[i] ^ (!r[(i + 1) % 5] & r[(i + 2) % 5]);
        }
    }

    // Iota
    state[0] ^= rc;
}

/// Load up to 200 bytes into lanes, little-endian; missing bytes read as zero
pub fn lanes_from_bytes(bytes: &[u8]) -> KeccakState {
    let mut lanes = [0u64; STATE_LANES];
    for (lane, chunk) in lanes.iter_mut().zip(bytes.chunks(8)) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        *lane = u64::from_le_bytes(word);
    }
    lanes
}

/// Store lanes into `bytes`, little-endian, up to `bytes.len()`
pub fn lanes_to_bytes(lanes: &KeccakState, bytes: &mut [u8]) {
    for (lane, chunk) in lanes.iter().zip(bytes.chunks_mut(8)) {
        let n = chunk.len();
        chunk.copy_from_slice(&lane.to_le_bytes()[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Keccak-f[1600] applied once to the all-zero state
    const ZERO_STATE_PERMUTED: KeccakState = [
        0xF1258F7940E1DDE7,
        0x84D5CCF933C0478A,
        0xD598261EA65AA9EE,
        0xBD1547306F80494D,
        0x8B284E056253D057,
        0xFF97A42D7F8E6FD4,
        0x90FEE5A0A44647C4,
        0x8C5BDA0CD6192E76,
        0xAD30A6F71B19059C,
        0x30935AB7D08FFC64,
        0xEB5AA93F2317D635,
        0xA9A6E6260D712103,
        0x81A57C16DBCF555F,
        0x43B831CD0347C826,
        0x01F22F1A11A5569F,
        0x05E5635A21D9AE61,
        0x64BEFEF28CC970F2,
        0x613670957BC46611,
        0xB87C5A554FD00ECB,
        0x8C3EE88A1CCF32C8,
        0x940C7922AE3A2614,
        0x1841F924A2C509E4,
        0x16F53526E70465C2,
        0x75F644E97F30A13B,
        0xEAF1FF7B5CECA249,
    ];

    #[test]
    fn test_zero_state_golden_vector() {
        let mut state = [0u64; STATE_LANES];
        permute(&mut state);
        assert_eq!(state, ZERO_STATE_PERMUTED);
    }

    #[test]
    fn test_matches_reference_permutation() {
        let mut ours: KeccakState = core::array::from_fn(|i| i as u64);
        let mut reference = ours;

        for _ in 0..4 {
            permute(&mut ours);
            keccak::f1600(&mut reference);
            assert_eq!(ours, reference);
        }
    }

    #[test]
    fn test_lane_byte_conversion() {
        let bytes: [u8; 200] = core::array::from_fn(|i| i as u8);
        let lanes = lanes_from_bytes(&bytes);
        assert_eq!(lanes[0], 0x0706050403020100);
        assert_eq!(lanes[24], u64::from_le_bytes([192, 193, 194, 195, 196, 197, 198, 199]));

        let mut back = [0u8; 200];
        lanes_to_bytes(&lanes, &mut back);
        assert_eq!(back, bytes);
    }

    #[test]
    fn test_partial_lane_load() {
        let lanes = lanes_from_bytes(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(lanes[0], 0x00CCBBAA);
        assert!(lanes[1..].iter().all(|&l| l == 0));
    }
}
