//! Error types for the SHA-3 miner core

use thiserror::Error;

use crate::params::STATE_BYTES;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sha3MinerError {
    /// Digest length leaves no usable rate (or a rate too small to squeeze from)
    #[error("invalid rate: a {digest_bytes}-byte digest does not fit a {STATE_BYTES}-byte state")]
    InvalidRate { digest_bytes: usize },

    #[error("requested {requested} output bytes but the digest is {digest_bytes} bytes")]
    OutputTooLong {
        requested: usize,
        digest_bytes: usize,
    },
}

pub type Result<T> = core::result::Result<T, Sha3MinerError>;
