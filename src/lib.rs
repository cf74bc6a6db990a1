//! # Honeywell 316/516 CPU Simulator Core
//!
//! An instruction-accurate simulator of the Honeywell 316/516 minicomputer CPU,
//! covering the instruction set, the standard and extended interrupt systems,
//! and the DMA/DMC block-transfer channels.
//!
//! Peripheral device models live outside this crate. They plug into the CPU
//! through the [`IoDevice`] trait and see the machine only through an
//! [`IoContext`]: the core memory array and the shared interrupt and channel
//! request lines.
//!
//! ## Quick Start
//!
//! ```rust
//! use lib316::{CpuConfig, CPU};
//!
//! let mut cpu = CPU::new(CpuConfig::default()).unwrap();
//!
//! // LDA 010 at location 1, data at 010
//! cpu.memory_mut().write(0o1, 0o004010);
//! cpu.memory_mut().write(0o10, 0o123456);
//! cpu.set_pc(0o1);
//!
//! cpu.step().unwrap();
//! assert_eq!(cpu.a(), 0o123456);
//! assert_eq!(cpu.pc(), 0o2);
//! ```
//!
//! ## Modules
//!
//! - `cpu` - Processor state and the fetch-decode-execute loop
//! - `config` - Hardware options and simulator stop toggles
//! - `memory` - Core memory array
//! - `addressing` - Effective-address resolution
//! - `opcodes` - Instruction word fields and class decode
//! - `devices` - I/O device trait, device registry, interrupt and channel lines
//! - `history` - Instruction history and PC change queue
//! - `breakpoints` - Execute and write breakpoints

pub mod addressing;
pub mod breakpoints;
pub mod config;
pub mod cpu;
pub mod devices;
pub mod history;
pub mod memory;
pub mod opcodes;
pub mod wasm;

// Internal instruction implementations (not part of public API)
mod instructions;

// Re-export public API
pub use breakpoints::Breakpoints;
pub use config::{ConfigError, CpuConfig};
pub use cpu::{Registers, CPU};
pub use devices::channels::{Channel, ChannelState};
pub use devices::interrupts::IoLines;
pub use devices::{
    DeviceError, DeviceInfo, DeviceTable, IoContext, IoDevice, IoOp, IoResult,
};
pub use history::{HistoryEntry, PcQueue};
pub use instructions::arith::{add16, add31};
pub use instructions::operate::operate;
pub use memory::{CoreMemory, MemoryError};
pub use opcodes::{InstructionClass, MemoryOp};

/// Reasons the simulator stops executing.
///
/// Every condition the core detects is reported through this type; none of
/// them are process-fatal. Side effects an instruction committed before the
/// stop was detected are not rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Reserved or undefined instruction (or an undefined device function).
    ReservedInstruction,

    /// I/O instruction addressed a device number with no device attached.
    IllegalDevice,

    /// HLT instruction executed.
    Halt,

    /// Execute breakpoint at the given address.
    Breakpoint {
        /// Address of the instruction that was about to be fetched
        address: u16,
    },

    /// Write breakpoint at the given address.
    WriteBreakpoint {
        /// Address that was written
        address: u16,
    },

    /// Indirect address chain exceeded the configured hop limit.
    IndirectLoop {
        /// Last address reached in the chain
        address: u16,
    },

    /// A device refused a DMA/DMC transfer.
    DmaError,

    /// Magnetic tape write attempted on a protected reel.
    TapeWriteProtect,

    /// Disk write overran the track.
    DiskOverrun,

    /// Disk track has an invalid format.
    DiskFormat,

    /// Device-specific stop code, 0..=[`DEVICE_CODE_MAX`].
    ///
    /// In numeric form it is offset by [`DEVICE_CODE_BASE`] so it never
    /// collides with the fixed codes.
    Device(u16),
}

/// First numeric stop code used for [`StopReason::Device`].
pub const DEVICE_CODE_BASE: u16 = 10;

/// Largest numeric stop code; the packed I/O result has 15 bits for it.
pub const STOP_CODE_MAX: u16 = 0o77777;

/// Largest device-specific code [`StopReason::Device`] can carry.
pub const DEVICE_CODE_MAX: u16 = STOP_CODE_MAX - DEVICE_CODE_BASE;

impl StopReason {
    /// Device-specific stop, or None if `code` exceeds [`DEVICE_CODE_MAX`].
    pub fn device(code: u16) -> Option<StopReason> {
        (code <= DEVICE_CODE_MAX).then_some(StopReason::Device(code))
    }

    /// Numeric stop code used by the packed I/O callback encoding.
    ///
    /// Device codes above [`DEVICE_CODE_MAX`] saturate to [`STOP_CODE_MAX`].
    pub fn code(&self) -> u16 {
        match self {
            StopReason::ReservedInstruction => 1,
            StopReason::IllegalDevice => 2,
            StopReason::Halt => 3,
            StopReason::Breakpoint { .. } | StopReason::WriteBreakpoint { .. } => 4,
            StopReason::IndirectLoop { .. } => 5,
            StopReason::DmaError => 6,
            StopReason::TapeWriteProtect => 7,
            StopReason::DiskOverrun => 8,
            StopReason::DiskFormat => 9,
            StopReason::Device(code) => DEVICE_CODE_BASE + (*code).min(DEVICE_CODE_MAX),
        }
    }

    /// Decodes a numeric stop code. Zero means "no stop".
    ///
    /// Breakpoint and loop codes carry no address in numeric form and
    /// decode with address 0.
    pub fn from_code(code: u16) -> Option<StopReason> {
        match code {
            0 => None,
            1 => Some(StopReason::ReservedInstruction),
            2 => Some(StopReason::IllegalDevice),
            3 => Some(StopReason::Halt),
            4 => Some(StopReason::Breakpoint { address: 0 }),
            5 => Some(StopReason::IndirectLoop { address: 0 }),
            6 => Some(StopReason::DmaError),
            7 => Some(StopReason::TapeWriteProtect),
            8 => Some(StopReason::DiskOverrun),
            9 => Some(StopReason::DiskFormat),
            other => Some(StopReason::Device(other - DEVICE_CODE_BASE)),
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StopReason::ReservedInstruction => write!(f, "Reserved instruction"),
            StopReason::IllegalDevice => write!(f, "Non-existent I/O device"),
            StopReason::Halt => write!(f, "HALT instruction"),
            StopReason::Breakpoint { address } => write!(f, "Breakpoint at {:06o}", address),
            StopReason::WriteBreakpoint { address } => {
                write!(f, "Write breakpoint at {:06o}", address)
            }
            StopReason::IndirectLoop { address } => {
                write!(f, "Indirect address loop at {:06o}", address)
            }
            StopReason::DmaError => write!(f, "DMA error"),
            StopReason::TapeWriteProtect => write!(f, "MT write protected"),
            StopReason::DiskOverrun => write!(f, "DP write overrun, track destroyed"),
            StopReason::DiskFormat => write!(f, "DP track format invalid"),
            StopReason::Device(code) => write!(f, "Device stop, code {}", code),
        }
    }
}

impl std::error::Error for StopReason {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_codes_are_stable() {
        assert_eq!(StopReason::ReservedInstruction.code(), 1);
        assert_eq!(StopReason::IllegalDevice.code(), 2);
        assert_eq!(StopReason::Halt.code(), 3);
        assert_eq!(StopReason::WriteBreakpoint { address: 0o100 }.code(), 4);
        assert_eq!(StopReason::DmaError.code(), 6);
        assert_eq!(StopReason::Device(0).code(), 10);
        assert_eq!(StopReason::Device(42).code(), 52);
        assert_eq!(StopReason::Device(u16::MAX).code(), STOP_CODE_MAX);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(StopReason::from_code(0), None);
        assert_eq!(StopReason::from_code(3), Some(StopReason::Halt));
        assert_eq!(StopReason::from_code(7), Some(StopReason::TapeWriteProtect));
        assert_eq!(StopReason::from_code(12), Some(StopReason::Device(2)));
        assert_eq!(
            StopReason::from_code(STOP_CODE_MAX),
            Some(StopReason::Device(DEVICE_CODE_MAX))
        );
    }

    #[test]
    fn test_device_constructor_checks_range() {
        assert_eq!(StopReason::device(0), Some(StopReason::Device(0)));
        assert_eq!(
            StopReason::device(DEVICE_CODE_MAX),
            Some(StopReason::Device(DEVICE_CODE_MAX))
        );
        assert_eq!(StopReason::device(DEVICE_CODE_MAX + 1), None);
    }

    #[test]
    fn test_display_uses_octal_addresses() {
        let msg = StopReason::IndirectLoop { address: 0o1234 }.to_string();
        assert_eq!(msg, "Indirect address loop at 001234");
    }
}
