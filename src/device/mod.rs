//! Register-window access to the miner block
//!
//! [`RegisterBank`] is the seam between the host driver and whatever backs
//! the registers. [`SimulatedMiner`] backs it with the software model from
//! `sha3-miner-core`, clocked on its own thread.

mod simulated;

pub use simulated::SimulatedMiner;

use sha3_miner_core::{MinerStatus, Register, RegisterLayout};

use crate::error::DeviceError;

/// 32-bit register window addressed by byte offset
pub trait RegisterBank {
    /// Offset layout this window decodes
    fn layout(&self) -> RegisterLayout;

    fn read(&self, offset: u32) -> Result<u32, DeviceError>;

    fn write(&self, offset: u32, value: u32) -> Result<(), DeviceError>;

    /// Read a logical register through the active layout
    fn read_register(&self, register: Register) -> Result<u32, DeviceError> {
        let offset = offset_of(self.layout(), register)?;
        self.read(offset)
    }

    /// Write a logical register through the active layout
    fn write_register(&self, register: Register, value: u32) -> Result<(), DeviceError> {
        let offset = offset_of(self.layout(), register)?;
        self.write(offset, value)
    }

    fn status(&self) -> Result<MinerStatus, DeviceError> {
        self.read_register(Register::Status)
            .map(MinerStatus::from_raw)
    }

    /// HASH_COUNT_HIGH:HASH_COUNT_LOW
    fn hash_count(&self) -> Result<u64, DeviceError> {
        let low = self.read_register(Register::HashCountLow)? as u64;
        let high = self.read_register(Register::HashCountHigh)? as u64;
        Ok((high << 32) | low)
    }
}

fn offset_of(layout: RegisterLayout, register: Register) -> Result<u32, DeviceError> {
    layout
        .offset(register)
        .ok_or(DeviceError::UnmappedRegister { register, layout })
}

impl<B: RegisterBank + ?Sized> RegisterBank for &B {
    fn layout(&self) -> RegisterLayout {
        (**self).layout()
    }

    fn read(&self, offset: u32) -> Result<u32, DeviceError> {
        (**self).read(offset)
    }

    fn write(&self, offset: u32, value: u32) -> Result<(), DeviceError> {
        (**self).write(offset, value)
    }
}
