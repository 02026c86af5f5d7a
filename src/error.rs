//! Error types for the host-side miner driver

use std::path::PathBuf;

use sha3_miner_core::{Register, RegisterLayout};
use thiserror::Error;

/// Failures reaching or talking to the miner's register window
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Miner device unavailable: {0}")]
    Unavailable(String),

    #[error("No register at offset {offset:#04x} in the {layout:?} layout")]
    UnmappedOffset { offset: u32, layout: RegisterLayout },

    #[error("Register {register:?} is not part of the {layout:?} layout")]
    UnmappedRegister {
        register: Register,
        layout: RegisterLayout,
    },

    #[error("Miner device state poisoned by a panicked clock thread")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
