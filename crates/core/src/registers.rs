//! Register map of the miner block
//!
//! All registers are 32 bits wide. Two offset layouts exist; a device
//! exposes exactly one of them.
//!
//! ```text
//! Canonical           Split
//! 0x00 START          0x00 CTRL (bit0 start, bit1 done, bit2 idle, bit3 ready, bit7 auto-restart)
//! 0x04 STOP           0x28 START
//! 0x08 STATUS         0x38 STOP
//! 0x0C INITIAL_NONCE  0x48 STATUS
//! 0x10 TARGET         0x58 INITIAL_NONCE
//! 0x14 RESULT_NONCE   0x10 TARGET
//! 0x18 HASH_COUNT_LO  0x60 RESULT_NONCE
//! 0x1C HASH_COUNT_HI  0x18 HASH_COUNT_LO
//!                     0x70 HASH_COUNT_HI
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// CTRL word bits (split layout only)
pub mod ctrl {
    pub const START: u32 = 1 << 0;
    pub const DONE: u32 = 1 << 1;
    pub const IDLE: u32 = 1 << 2;
    pub const READY: u32 = 1 << 3;
    pub const AUTO_RESTART: u32 = 1 << 7;
}

/// Logical registers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    /// Auxiliary control word, split layout only
    Control,
    Start,
    Stop,
    Status,
    InitialNonce,
    Target,
    ResultNonce,
    HashCountLow,
    HashCountHigh,
}

impl Register {
    pub const ALL: [Register; 9] = [
        Register::Control,
        Register::Start,
        Register::Stop,
        Register::Status,
        Register::InitialNonce,
        Register::Target,
        Register::ResultNonce,
        Register::HashCountLow,
        Register::HashCountHigh,
    ];

    /// Whether the host may write this register
    pub fn is_writable(self) -> bool {
        matches!(
            self,
            Register::Control
                | Register::Start
                | Register::Stop
                | Register::InitialNonce
                | Register::Target
        )
    }
}

/// Register offset layout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RegisterLayout {
    #[default]
    Canonical,
    Split,
}

impl RegisterLayout {
    /// Byte offset of `reg`, or `None` if this layout does not carry it
    pub const fn offset(self, reg: Register) -> Option<u32> {
        match self {
            RegisterLayout::Canonical => match reg {
                Register::Control => None,
                Register::Start => Some(0x00),
                Register::Stop => Some(0x04),
                Register::Status => Some(0x08),
                Register::InitialNonce => Some(0x0C),
                Register::Target => Some(0x10),
                Register::ResultNonce => Some(0x14),
                Register::HashCountLow => Some(0x18),
                Register::HashCountHigh => Some(0x1C),
            },
            RegisterLayout::Split => match reg {
                Register::Control => Some(0x00),
                Register::Start => Some(0x28),
                Register::Stop => Some(0x38),
                Register::Status => Some(0x48),
                Register::InitialNonce => Some(0x58),
                Register::Target => Some(0x10),
                Register::ResultNonce => Some(0x60),
                Register::HashCountLow => Some(0x18),
                Register::HashCountHigh => Some(0x70),
            },
        }
    }

    /// Register mapped at `offset`
    pub fn decode(self, offset: u32) -> Option<Register> {
        Register::ALL
            .into_iter()
            .find(|&reg| self.offset(reg) == Some(offset))
    }

    /// Size of the register window in bytes
    pub fn window_size(self) -> u32 {
        Register::ALL
            .into_iter()
            .filter_map(|reg| self.offset(reg))
            .max()
            .map_or(0, |last| last + 4)
    }
}

impl core::str::FromStr for RegisterLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canonical" => Ok(RegisterLayout::Canonical),
            "split" => Ok(RegisterLayout::Split),
            other => Err(format!("unknown register layout '{other}'")),
        }
    }
}

/// Value of the STATUS register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MinerStatus {
    #[default]
    Idle,
    Running,
    Found,
    Stopped,
    /// Any other raw value; surfaced as-is
    Unknown(u32),
}

impl MinerStatus {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => MinerStatus::Idle,
            1 => MinerStatus::Running,
            2 => MinerStatus::Found,
            3 => MinerStatus::Stopped,
            other => MinerStatus::Unknown(other),
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            MinerStatus::Idle => 0,
            MinerStatus::Running => 1,
            MinerStatus::Found => 2,
            MinerStatus::Stopped => 3,
            MinerStatus::Unknown(raw) => raw,
        }
    }

    /// Found or Stopped: waiting for the host to acknowledge
    pub fn is_latched(self) -> bool {
        matches!(self, MinerStatus::Found | MinerStatus::Stopped)
    }
}

impl core::fmt::Display for MinerStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MinerStatus::Idle => f.write_str("IDLE"),
            MinerStatus::Running => f.write_str("RUNNING"),
            MinerStatus::Found => f.write_str("FOUND"),
            MinerStatus::Stopped => f.write_str("STOPPED"),
            MinerStatus::Unknown(raw) => write!(f, "UNKNOWN({raw})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_offsets() {
        let layout = RegisterLayout::Canonical;
        assert_eq!(layout.offset(Register::Start), Some(0x00));
        assert_eq!(layout.offset(Register::HashCountHigh), Some(0x1C));
        assert_eq!(layout.offset(Register::Control), None);
        assert_eq!(layout.decode(0x14), Some(Register::ResultNonce));
        assert_eq!(layout.decode(0x20), None);
        assert_eq!(layout.decode(0x02), None);
        assert_eq!(layout.window_size(), 0x20);
    }

    #[test]
    fn test_split_offsets() {
        let layout = RegisterLayout::Split;
        assert_eq!(layout.decode(0x00), Some(Register::Control));
        assert_eq!(layout.decode(0x28), Some(Register::Start));
        assert_eq!(layout.decode(0x10), Some(Register::Target));
        assert_eq!(layout.decode(0x04), None);
        assert_eq!(layout.window_size(), 0x74);
    }

    #[test]
    fn test_layouts_are_bijective() {
        for layout in [RegisterLayout::Canonical, RegisterLayout::Split] {
            for reg in Register::ALL {
                if let Some(offset) = layout.offset(reg) {
                    assert_eq!(layout.decode(offset), Some(reg));
                }
            }
        }
    }

    #[test]
    fn test_status_decoding() {
        for raw in 0..4 {
            assert_eq!(MinerStatus::from_raw(raw).as_raw(), raw);
        }
        assert_eq!(MinerStatus::from_raw(7), MinerStatus::Unknown(7));
        assert_eq!(MinerStatus::from_raw(7).to_string(), "UNKNOWN(7)");
        assert!(MinerStatus::Found.is_latched());
        assert!(!MinerStatus::Running.is_latched());
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("split".parse::<RegisterLayout>(), Ok(RegisterLayout::Split));
        assert!("legacy".parse::<RegisterLayout>().is_err());
    }
}
