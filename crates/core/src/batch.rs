//! Bounded batch nonce search
//!
//! Hashes `initial_nonce`, `initial_nonce + 1`, ... for at most
//! `max_iterations` candidates and reports the first one whose hash falls
//! below the target. The parallel build splits the range across the rayon
//! pool but still reports the lowest-offset solution, so both builds agree.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::nonce::{NonceHasher, Sha3NonceHasher, compare};

/// Result of a batch search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchOutcome {
    /// First nonce found below the target
    pub solution: Option<u32>,
    /// Candidates examined, including the solution
    pub iterations_completed: u32,
}

/// Search with the nonce-only SHA3 hasher
pub fn batch_search(initial_nonce: u32, target: u32, max_iterations: u32) -> BatchOutcome {
    batch_search_with(&Sha3NonceHasher, initial_nonce, target, max_iterations)
}

/// Search with any hasher (parallel)
#[cfg(feature = "parallel")]
pub fn batch_search_with<H: NonceHasher + Sync>(
    hasher: &H,
    initial_nonce: u32,
    target: u32,
    max_iterations: u32,
) -> BatchOutcome {
    let hit = (0..max_iterations)
        .into_par_iter()
        .find_first(|&i| compare(hasher.hash(initial_nonce.wrapping_add(i)), target));

    outcome(initial_nonce, max_iterations, hit)
}

/// Search with any hasher (sequential fallback)
#[cfg(not(feature = "parallel"))]
pub fn batch_search_with<H: NonceHasher + Sync>(
    hasher: &H,
    initial_nonce: u32,
    target: u32,
    max_iterations: u32,
) -> BatchOutcome {
    let hit = (0..max_iterations)
        .find(|&i| compare(hasher.hash(initial_nonce.wrapping_add(i)), target));

    outcome(initial_nonce, max_iterations, hit)
}

fn outcome(initial_nonce: u32, max_iterations: u32, hit: Option<u32>) -> BatchOutcome {
    match hit {
        Some(i) => BatchOutcome {
            solution: Some(initial_nonce.wrapping_add(i)),
            iterations_completed: i + 1,
        },
        None => BatchOutcome {
            solution: None,
            iterations_completed: max_iterations,
        },
    }
}
