//! Register-driven miner state machine
//!
//! ```text
//!          START              solution
//!   Idle ────────► Running ────────────► Found
//!    ▲               │ STOP                │
//!    │               ▼                     │
//!    └──────────  Stopped ◄────────────────┘
//!     START and STOP both clear      (latched)
//! ```
//!
//! Each `tick` is one clock of the block. The tick that accepts START only
//! latches the inputs; hashing, and with it `hash_count`, starts on the next
//! tick. START is consumed (cleared) when
//! Idle accepts it, STOP when Running accepts it. Found and Stopped are
//! latched until a tick observes both request flags clear, so a host that
//! still holds START or STOP high keeps the result visible.

use tracing::debug;

use crate::nonce::{NonceHasher, Sha3NonceHasher};
use crate::pipeline::MiningPipeline;
use crate::registers::{MinerStatus, Register, ctrl};

/// Register outputs after a tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutput {
    pub status: MinerStatus,
    /// Meaningful only when `status` is Found
    pub result_nonce: u32,
    pub hash_count_low: u32,
    pub hash_count_high: u32,
}

impl TickOutput {
    pub fn hash_count(&self) -> u64 {
        ((self.hash_count_high as u64) << 32) | self.hash_count_low as u64
    }
}

pub struct MinerController<H = Sha3NonceHasher> {
    pipeline: MiningPipeline<H>,
    status: MinerStatus,
    start_request: bool,
    stop_request: bool,
    auto_restart: bool,
    /// INITIAL_NONCE as last written by the host
    initial_nonce: u32,
    /// TARGET as last written by the host
    target: u32,
    result_nonce: u32,
    hash_count: u64,
}

impl<H: NonceHasher> MinerController<H> {
    pub fn new(hasher: H) -> Self {
        Self {
            pipeline: MiningPipeline::new(hasher),
            status: MinerStatus::Idle,
            start_request: false,
            stop_request: false,
            auto_restart: false,
            initial_nonce: 0,
            target: 0,
            result_nonce: 0,
            hash_count: 0,
        }
    }

    /// Host register write
    ///
    /// START and STOP take any non-zero value as a request and zero as a
    /// release. Writes to read-only registers are ignored.
    pub fn write(&mut self, reg: Register, value: u32) {
        match reg {
            Register::Start => self.start_request = value != 0,
            Register::Stop => self.stop_request = value != 0,
            Register::InitialNonce => self.initial_nonce = value,
            Register::Target => self.target = value,
            Register::Control => {
                self.start_request = value & ctrl::START != 0;
                self.auto_restart = value & ctrl::AUTO_RESTART != 0;
            }
            Register::Status
            | Register::ResultNonce
            | Register::HashCountLow
            | Register::HashCountHigh => {
                debug!(?reg, value, "ignoring write to read-only register");
            }
        }
    }

    /// Host register read
    pub fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::Start => self.start_request as u32,
            Register::Stop => self.stop_request as u32,
            Register::Status => self.status.as_raw(),
            Register::InitialNonce => self.initial_nonce,
            Register::Target => self.target,
            Register::ResultNonce => self.result_nonce,
            Register::HashCountLow => self.hash_count as u32,
            Register::HashCountHigh => (self.hash_count >> 32) as u32,
            Register::Control => self.control_word(),
        }
    }

    /// Advance the block by one clock
    pub fn tick(&mut self) -> TickOutput {
        match self.status {
            MinerStatus::Idle => {
                if self.start_request {
                    let (nonce, target) = (self.initial_nonce, self.target);
                    self.hash_count = 0;
                    self.result_nonce = 0;
                    self.pipeline.start(nonce, target);
                    self.start_request = false;
                    self.status = MinerStatus::Running;
                    debug!(initial_nonce = nonce, target, "miner started");
                } else if self.stop_request {
                    // nothing to stop
                    self.stop_request = false;
                }
            }
            MinerStatus::Running => {
                if self.stop_request {
                    self.pipeline.halt();
                    self.stop_request = false;
                    self.status = MinerStatus::Stopped;
                    debug!(hash_count = self.hash_count, "miner stopped");
                } else {
                    let outcome = self.pipeline.step();
                    self.hash_count = outcome.total_hashes;
                    if let Some(nonce) = outcome.solution {
                        self.pipeline.halt();
                        self.result_nonce = nonce;
                        self.status = MinerStatus::Found;
                        debug!(nonce, hash_count = self.hash_count, "solution found");
                    }
                }
            }
            MinerStatus::Found | MinerStatus::Stopped => {
                if !self.start_request && !self.stop_request {
                    self.status = MinerStatus::Idle;
                }
            }
            MinerStatus::Unknown(_) => self.status = MinerStatus::Idle,
        }

        self.output()
    }

    /// Tick while Running, at most `max_ticks` times; returns the final status
    pub fn run(&mut self, max_ticks: u64) -> MinerStatus {
        for _ in 0..max_ticks {
            if self.status != MinerStatus::Running {
                break;
            }
            self.tick();
        }
        self.status
    }

    /// Current register outputs, without ticking
    pub fn output(&self) -> TickOutput {
        TickOutput {
            status: self.status,
            result_nonce: self.result_nonce,
            hash_count_low: self.hash_count as u32,
            hash_count_high: (self.hash_count >> 32) as u32,
        }
    }

    pub fn status(&self) -> MinerStatus {
        self.status
    }

    pub fn hash_count(&self) -> u64 {
        self.hash_count
    }

    pub fn pipeline(&self) -> &MiningPipeline<H> {
        &self.pipeline
    }

    fn control_word(&self) -> u32 {
        let mut word = 0;
        if self.start_request {
            word |= ctrl::START;
        }
        if self.status.is_latched() {
            word |= ctrl::DONE;
        }
        if self.status == MinerStatus::Idle {
            word |= ctrl::IDLE;
        }
        if self.status != MinerStatus::Running {
            word |= ctrl::READY;
        }
        if self.auto_restart {
            word |= ctrl::AUTO_RESTART;
        }
        word
    }
}

impl Default for MinerController {
    fn default() -> Self {
        Self::new(Sha3NonceHasher)
    }
}
