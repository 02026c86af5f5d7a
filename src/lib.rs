//! SHA-3 Miner Host Library
//!
//! Host-side driver for a SHA3-256 proof-of-work nonce search block.
//!
//! # Overview
//!
//! The miner block exposes a small 32-bit register window. The host
//! programs an initial nonce and a target, pulses START, and polls STATUS
//! until the block latches a nonce whose hash falls below the target, or
//! until it gives up and pulses STOP.
//!
//! # Features
//!
//! - **Software model**: [`algorithm`] re-exports the Keccak/SHA3 core and
//!   the register-level miner controller
//! - **Simulated device**: [`device::SimulatedMiner`] clocks the model on a
//!   background thread behind the [`device::RegisterBank`] trait
//! - **Driver**: [`driver::MiningDriver`] runs the start/poll/acknowledge
//!   protocol with a timeout
//!
//! # Example
//!
//! ```rust,no_run
//! use sha3miner::config::MinerConfig;
//! use sha3miner::device::SimulatedMiner;
//! use sha3miner::driver::MiningDriver;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = MinerConfig::default();
//! let device = SimulatedMiner::new(config.layout, config.ticks_per_slice)?;
//!
//! let report = MiningDriver::new(device, config).run().await?;
//! if let Some(nonce) = report.solution() {
//!     println!("nonce {nonce} after {} hashes", report.hash_count);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export the core algorithm
pub use sha3_miner_core as algorithm;

pub mod config;
pub mod device;
pub mod driver;
pub mod error;

// Convenience re-exports
pub use algorithm::{compare, hash_nonce, sha3_256, MinerStatus, RegisterLayout};
pub use driver::{MiningOutcome, MiningReport};
