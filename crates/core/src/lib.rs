//! # SHA-3 Miner Core
//!
//! Software model of a SHA3-256 proof-of-work search block: the Keccak
//! permutation, the SHA3-256 sponge, and the register-driven mining engine
//! that searches for a 32-bit nonce whose digest prefix falls below a target.
//!
//! ## Components
//!
//! - **Keccak-f[1600]**: 24-round permutation over 25 lanes ([`permute`])
//! - **SHA3-256 sponge**: absorb/pad/squeeze with chunk-invariant absorb ([`Sha3Context`])
//! - **Nonce hasher**: nonce-only digest, low 32 bits of lane 0 ([`hash_nonce`])
//! - **Pipeline**: 8-slot ring between hasher and comparator ([`MiningPipeline`])
//! - **Controller**: Idle / Running / Found / Stopped state machine behind a
//!   register map ([`MinerController`])
//!
//! ## Example
//!
//! ```rust
//! use sha3_miner_core::{MinerController, MinerStatus, Register, hash_nonce, sha3_256};
//!
//! // One-shot digest
//! let digest = sha3_256(b"abc");
//! assert_eq!(digest[0], 0x3a);
//!
//! // Drive the miner through its registers
//! let mut miner = MinerController::default();
//! miner.write(Register::InitialNonce, 1);
//! miner.write(Register::Target, 0x8000_0000);
//! miner.write(Register::Start, 1);
//! miner.tick();
//!
//! if miner.run(10_000) == MinerStatus::Found {
//!     let nonce = miner.read(Register::ResultNonce);
//!     assert!(hash_nonce(nonce) < 0x8000_0000);
//! }
//! ```
//!
//! ## Nonce digest
//!
//! [`hash_nonce`] digests the 4-byte little-endian nonce and nothing else.
//! That is SHA3-256 of the nonce, not of a block header. Use
//! [`HeaderNonceHasher`] to hash `header || nonce` through the sponge.

mod batch;
mod controller;
mod error;
mod keccak;
mod nonce;
mod params;
mod pipeline;
mod registers;
mod sponge;

pub use batch::{BatchOutcome, batch_search, batch_search_with};
pub use controller::{MinerController, TickOutput};
pub use error::{Result, Sha3MinerError};
pub use keccak::{KeccakState, lanes_from_bytes, lanes_to_bytes, permute};
pub use nonce::{HeaderNonceHasher, NonceHasher, Sha3NonceHasher, compare, hash_nonce};
pub use params::*;
pub use pipeline::{MiningPipeline, PipelineEntry, StepOutcome};
pub use registers::{MinerStatus, Register, RegisterLayout, ctrl};
pub use sponge::{Sha3Context, digest_each, sha3_256};
