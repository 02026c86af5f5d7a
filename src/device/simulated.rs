//! Software-backed miner device
//!
//! The controller lives behind a mutex shared with a clock thread. While the
//! controller is Running the thread ticks it in slices of `ticks_per_slice`,
//! releasing the lock between slices so host reads get through. Otherwise
//! the block is parked and a host write strobes a single tick, which is how
//! START is accepted and how a latched Found/Stopped is acknowledged. Writes
//! that land before the clock gets the lock coalesce into one strobe.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use sha3_miner_core::{MinerController, MinerStatus, NonceHasher, RegisterLayout, Sha3NonceHasher};
use tracing::{debug, warn};

use super::RegisterBank;
use crate::error::DeviceError;

struct Block<H> {
    controller: MinerController<H>,
    /// Host wrote since the last tick
    strobed: bool,
    shutdown: bool,
}

struct Shared<H> {
    block: Mutex<Block<H>>,
    wake: Condvar,
}

/// Miner block modelled in software
pub struct SimulatedMiner<H: NonceHasher + Send + 'static = Sha3NonceHasher> {
    shared: Arc<Shared<H>>,
    layout: RegisterLayout,
    clock: Option<JoinHandle<()>>,
}

impl SimulatedMiner {
    /// Nonce-only SHA3 hasher with the given layout
    pub fn new(layout: RegisterLayout, ticks_per_slice: u32) -> Result<Self, DeviceError> {
        Self::with_hasher(Sha3NonceHasher, layout, ticks_per_slice)
    }
}

impl<H: NonceHasher + Send + 'static> SimulatedMiner<H> {
    /// Build the block around `hasher` and start its clock thread
    pub fn with_hasher(
        hasher: H,
        layout: RegisterLayout,
        ticks_per_slice: u32,
    ) -> Result<Self, DeviceError> {
        let shared = Arc::new(Shared {
            block: Mutex::new(Block {
                controller: MinerController::new(hasher),
                strobed: false,
                shutdown: false,
            }),
            wake: Condvar::new(),
        });

        let clock_shared = Arc::clone(&shared);
        let slice = ticks_per_slice.max(1);
        let clock = thread::Builder::new()
            .name("sha3-miner-clock".into())
            .spawn(move || run_clock(&clock_shared, slice))
            .map_err(|e| DeviceError::Unavailable(format!("failed to start clock thread: {e}")))?;

        debug!(?layout, ticks_per_slice = slice, "simulated miner up");

        Ok(Self {
            shared,
            layout,
            clock: Some(clock),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Block<H>>, DeviceError> {
        self.shared.block.lock().map_err(|_| DeviceError::Poisoned)
    }
}

impl<H: NonceHasher + Send + 'static> RegisterBank for SimulatedMiner<H> {
    fn layout(&self) -> RegisterLayout {
        self.layout
    }

    fn read(&self, offset: u32) -> Result<u32, DeviceError> {
        let register = self.layout.decode(offset).ok_or(DeviceError::UnmappedOffset {
            offset,
            layout: self.layout,
        })?;
        Ok(self.lock()?.controller.read(register))
    }

    fn write(&self, offset: u32, value: u32) -> Result<(), DeviceError> {
        let register = self.layout.decode(offset).ok_or(DeviceError::UnmappedOffset {
            offset,
            layout: self.layout,
        })?;
        let mut block = self.lock()?;
        block.controller.write(register, value);
        block.strobed = true;
        drop(block);
        self.shared.wake.notify_one();
        Ok(())
    }
}

impl<H: NonceHasher + Send + 'static> Drop for SimulatedMiner<H> {
    fn drop(&mut self) {
        if let Ok(mut block) = self.shared.block.lock() {
            block.shutdown = true;
        }
        self.shared.wake.notify_one();
        if let Some(clock) = self.clock.take() {
            let _ = clock.join();
        }
    }
}

fn run_clock<H: NonceHasher>(shared: &Shared<H>, slice: u32) {
    let Ok(mut block) = shared.block.lock() else {
        return;
    };

    loop {
        if block.shutdown {
            return;
        }

        if block.controller.status() == MinerStatus::Running {
            block.strobed = false;
            for _ in 0..slice {
                if block.controller.tick().status != MinerStatus::Running {
                    break;
                }
            }
            drop(block);
            thread::yield_now();
            block = match shared.block.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    warn!("miner block poisoned, clock stopped");
                    return;
                }
            };
        } else if block.strobed {
            block.strobed = false;
            block.controller.tick();
        } else {
            block = match shared.wake.wait(block) {
                Ok(guard) => guard,
                Err(_) => {
                    warn!("miner block poisoned, clock stopped");
                    return;
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha3_miner_core::Register;
    use std::time::{Duration, Instant};

    fn wait_for(miner: &impl RegisterBank, wanted: MinerStatus) -> MinerStatus {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let status = miner.status().unwrap();
            if status == wanted || Instant::now() >= deadline {
                return status;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_start_run_and_acknowledge() {
        let miner = SimulatedMiner::new(RegisterLayout::Canonical, 64).unwrap();
        miner.write_register(Register::InitialNonce, 0).unwrap();
        miner.write_register(Register::Target, 0xFFFF_FFFF).unwrap();
        miner.write_register(Register::Start, 1).unwrap();

        assert_eq!(wait_for(&miner, MinerStatus::Found), MinerStatus::Found);
        assert_eq!(miner.read_register(Register::Start).unwrap(), 0);
        let hashes = miner.hash_count().unwrap();
        assert!(hashes >= 1);

        // Parked while latched: the result stays visible
        thread::sleep(Duration::from_millis(20));
        assert_eq!(miner.status().unwrap(), MinerStatus::Found);

        miner.write_register(Register::Stop, 1).unwrap();
        thread::sleep(Duration::from_millis(5));
        assert_eq!(miner.status().unwrap(), MinerStatus::Found);

        miner.write_register(Register::Stop, 0).unwrap();
        assert_eq!(wait_for(&miner, MinerStatus::Idle), MinerStatus::Idle);
        assert_eq!(miner.hash_count().unwrap(), hashes);
    }

    #[test]
    fn test_stop_while_running() {
        let miner = SimulatedMiner::new(RegisterLayout::Canonical, 256).unwrap();
        miner.write_register(Register::Target, 0).unwrap();
        miner.write_register(Register::Start, 1).unwrap();
        assert_eq!(wait_for(&miner, MinerStatus::Running), MinerStatus::Running);

        thread::sleep(Duration::from_millis(10));
        miner.write_register(Register::Stop, 1).unwrap();
        assert_eq!(wait_for(&miner, MinerStatus::Stopped), MinerStatus::Stopped);

        let frozen = miner.hash_count().unwrap();
        assert!(frozen > 0);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(miner.hash_count().unwrap(), frozen);
    }

    #[test]
    fn test_split_layout_offsets() {
        let miner = SimulatedMiner::new(RegisterLayout::Split, 64).unwrap();
        assert_eq!(miner.read(0x48).unwrap(), 0);
        assert!(matches!(
            miner.read(0x08),
            Err(DeviceError::UnmappedOffset { offset: 0x08, .. })
        ));

        miner.write(0x58, 7).unwrap();
        assert_eq!(miner.read_register(Register::InitialNonce).unwrap(), 7);
    }

    #[test]
    fn test_canonical_has_no_control_word() {
        let miner = SimulatedMiner::new(RegisterLayout::Canonical, 64).unwrap();
        assert!(matches!(
            miner.read_register(Register::Control),
            Err(DeviceError::UnmappedRegister { .. })
        ));
    }
}
