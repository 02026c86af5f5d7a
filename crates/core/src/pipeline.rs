//! Desynchronized hash/compare pipeline
//!
//! A fixed ring of `DEPTH` slots sits between the producer (nonce hasher)
//! and the consumer (comparator). `head` is the next slot to fill, `tail` the
//! next slot to drain. The producer never overwrites a valid slot: when the
//! slot at `head` is still occupied it stalls for that tick and the nonce is
//! not advanced.

use crate::nonce::{NonceHasher, Sha3NonceHasher, compare};
use crate::params::PIPELINE_DEPTH;

/// One produced hash waiting for comparison
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineEntry {
    pub nonce: u32,
    pub hash_value: u32,
    pub valid: bool,
}

/// Result of one pipeline tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Nonce whose hash fell below the target, if any
    pub solution: Option<u32>,
    /// Hashes produced since the last `start`
    pub total_hashes: u64,
}

impl StepOutcome {
    pub fn found(&self) -> bool {
        self.solution.is_some()
    }
}

pub struct MiningPipeline<H = Sha3NonceHasher, const DEPTH: usize = PIPELINE_DEPTH> {
    hasher: H,
    slots: [PipelineEntry; DEPTH],
    head: usize,
    tail: usize,
    current_nonce: u32,
    target: u32,
    total_hashes: u64,
    stalls: u64,
    active: bool,
}

impl<H: NonceHasher, const DEPTH: usize> MiningPipeline<H, DEPTH> {
    /// Create an idle pipeline around `hasher`
    pub fn new(hasher: H) -> Self {
        const { assert!(DEPTH > 0, "pipeline depth must be non-zero") };
        Self {
            hasher,
            slots: [PipelineEntry::default(); DEPTH],
            head: 0,
            tail: 0,
            current_nonce: 0,
            target: 0,
            total_hashes: 0,
            stalls: 0,
            active: false,
        }
    }

    /// Reset counters, invalidate every slot and begin producing from `initial_nonce`
    pub fn start(&mut self, initial_nonce: u32, target: u32) {
        self.current_nonce = initial_nonce;
        self.target = target;
        self.total_hashes = 0;
        self.stalls = 0;
        self.head = 0;
        self.tail = 0;
        for slot in self.slots.iter_mut() {
            slot.valid = false;
        }
        self.active = true;
    }

    /// Stop producing and comparing; counters stay readable
    pub fn halt(&mut self) {
        self.active = false;
    }

    /// One tick: produce one hash, then consume one entry
    pub fn step(&mut self) -> StepOutcome {
        if !self.active {
            return StepOutcome {
                solution: None,
                total_hashes: self.total_hashes,
            };
        }

        self.produce();
        let solution = self.consume();

        StepOutcome {
            solution,
            total_hashes: self.total_hashes,
        }
    }

    /// Producer stage: hash `current_nonce` into the slot at `head`
    ///
    /// Returns `false` when inactive or when the slot is still occupied.
    pub fn produce(&mut self) -> bool {
        if !self.active {
            return false;
        }
        let slot = &mut self.slots[self.head];
        if slot.valid {
            self.stalls += 1;
            return false;
        }

        *slot = PipelineEntry {
            nonce: self.current_nonce,
            hash_value: self.hasher.hash(self.current_nonce),
            valid: true,
        };
        self.head = (self.head + 1) % DEPTH;
        self.current_nonce = self.current_nonce.wrapping_add(1);
        self.total_hashes += 1;
        true
    }

    /// Consumer stage: pop the entry at `tail` and compare it with the target
    ///
    /// A hit halts the pipeline and returns the nonce.
    pub fn consume(&mut self) -> Option<u32> {
        if !self.active {
            return None;
        }
        let slot = &mut self.slots[self.tail];
        if !slot.valid {
            return None;
        }

        let entry = *slot;
        slot.valid = false;
        self.tail = (self.tail + 1) % DEPTH;

        if compare(entry.hash_value, self.target) {
            self.active = false;
            return Some(entry.nonce);
        }
        None
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Next nonce the producer will hash
    pub fn current_nonce(&self) -> u32 {
        self.current_nonce
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn total_hashes(&self) -> u64 {
        self.total_hashes
    }

    /// Ticks on which the producer found its slot occupied
    pub fn stalls(&self) -> u64 {
        self.stalls
    }

    /// Number of produced entries not yet compared
    pub fn occupancy(&self) -> usize {
        self.slots.iter().filter(|s| s.valid).count()
    }

    pub const fn depth(&self) -> usize {
        DEPTH
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

impl Default for MiningPipeline {
    fn default() -> Self {
        Self::new(Sha3NonceHasher)
    }
}
