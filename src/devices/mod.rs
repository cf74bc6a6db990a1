//! I/O device support for the 316/516 CPU.
//!
//! Peripherals are addressed by a six-bit device number carried in every I/O
//! instruction. This module provides the device side of that bus:
//!
//! # Architecture
//!
//! - **IoDevice trait**: Interface a peripheral model implements to answer
//!   OCP/SKS/INA/OTA pulses and channel end-of-range notifications
//! - **DeviceTable**: Routes I/O pulses to registered devices by device number,
//!   and maps DMA/DMC channels to their owning devices
//! - **IoContext**: What a device sees of the machine while it runs: the core
//!   memory array and the shared interrupt and channel request lines
//!
//! # Example
//!
//! ```rust
//! use lib316::{DeviceInfo, DeviceTable, IoContext, IoDevice, IoOp, IoResult};
//!
//! struct Switches(u16);
//!
//! impl IoDevice for Switches {
//!     fn io(&mut self, op: IoOp, _fnc: u8, data: u16, _dev: u8, _ctx: &mut IoContext) -> IoResult {
//!         match op {
//!             IoOp::Ina => IoResult::skip_with_data(self.0),
//!             IoOp::Sks => IoResult::skip(),
//!             _ => IoResult::data(data),
//!         }
//!     }
//! }
//!
//! let mut table = DeviceTable::new();
//! table.attach(DeviceInfo::new(0o35), Box::new(Switches(0o1234))).unwrap();
//!
//! // Device 024 belongs to the CPU's DMA control logic
//! assert!(table.attach(DeviceInfo::new(0o24), Box::new(Switches(0))).is_err());
//! ```

use crate::memory::CoreMemory;
use crate::StopReason;
use log::debug;

pub mod channels;
pub mod interrupts;

use channels::{Channel, CHAN_MAX};
use interrupts::IoLines;

/// Number of device numbers on the I/O bus.
pub const DEV_MAX: usize = 64;

/// Clock and keys: functions the CPU answers itself.
pub const DEV_KEYS: u8 = 0o20;

/// DMA control: handled entirely by the CPU.
pub const DEV_DMA: u8 = 0o24;

/// Bit position of the skip flag in the packed result.
pub const IOT_V_SKIP: u32 = 16;

/// Bit position of the stop code in the packed result.
pub const IOT_V_REASON: u32 = 17;

/// Skip flag in the packed result.
pub const IOT_SKIP: u32 = 1 << IOT_V_SKIP;

/// I/O operation presented to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IoOp {
    /// Output control pulse
    Ocp,
    /// Skip if ready
    Sks,
    /// Input to A (also a DMA/DMC input transfer)
    Ina,
    /// Output from A (also a DMA/DMC output transfer)
    Ota,
    /// Channel end of range
    End,
}

impl IoOp {
    /// Numeric operation code used by the packed callback encoding.
    pub fn code(&self) -> u8 {
        match self {
            IoOp::Ocp => 0,
            IoOp::Sks => 1,
            IoOp::Ina => 2,
            IoOp::Ota => 3,
            IoOp::End => 4,
        }
    }

    /// Decodes a numeric operation code.
    pub fn from_code(code: u8) -> Option<IoOp> {
        match code {
            0 => Some(IoOp::Ocp),
            1 => Some(IoOp::Sks),
            2 => Some(IoOp::Ina),
            3 => Some(IoOp::Ota),
            4 => Some(IoOp::End),
            _ => None,
        }
    }
}

/// Result of one device I/O call.
///
/// # Examples
///
/// ```
/// use lib316::{IoResult, StopReason};
///
/// let result = IoResult::skip_with_data(0o177);
/// assert_eq!(result.pack(), (1 << 16) | 0o177);
///
/// let packed = (2 << 17) | 0o55;
/// let result = IoResult::unpack(packed);
/// assert!(!result.skip);
/// assert_eq!(result.stop, Some(StopReason::IllegalDevice));
/// assert_eq!(result.data, 0o55);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoResult {
    /// Skip the next instruction (or, for channels, transfer accepted)
    pub skip: bool,
    /// Stop the simulator with this reason
    pub stop: Option<StopReason>,
    /// Data word returned to A (INA) or passed through unchanged
    pub data: u16,
}

impl IoResult {
    /// No skip, no stop, data returned as given.
    pub fn data(data: u16) -> Self {
        Self {
            skip: false,
            stop: None,
            data,
        }
    }

    /// Skip with zero data.
    pub fn skip() -> Self {
        Self::skip_with_data(0)
    }

    /// Skip and return data.
    pub fn skip_with_data(data: u16) -> Self {
        Self {
            skip: true,
            stop: None,
            data,
        }
    }

    /// Stop the simulator, passing data through.
    pub fn stop(reason: StopReason, data: u16) -> Self {
        Self {
            skip: false,
            stop: Some(reason),
            data,
        }
    }

    /// Packs into the integer callback form.
    pub fn pack(&self) -> u32 {
        let mut packed = self.data as u32;
        if self.skip {
            packed |= IOT_SKIP;
        }
        if let Some(reason) = self.stop {
            packed |= (reason.code() as u32) << IOT_V_REASON;
        }
        packed
    }

    /// Unpacks from the integer callback form.
    pub fn unpack(packed: u32) -> Self {
        Self {
            skip: packed & IOT_SKIP != 0,
            stop: StopReason::from_code((packed >> IOT_V_REASON) as u16),
            data: packed as u16,
        }
    }
}

/// The parts of the machine a device may touch while it runs.
pub struct IoContext<'a> {
    /// Core memory, accessed directly (no write gate)
    pub memory: &'a mut CoreMemory,
    /// Interrupt and channel request lines
    pub lines: &'a mut IoLines,
}

/// Interface implemented by peripheral device models.
///
/// The CPU calls [`IoDevice::io`] for every I/O instruction addressed to one
/// of the device's numbers, and for channel transfers on the device's
/// DMA/DMC channel. Calls are synchronous; a device that needs time to
/// complete an operation should remember the request and raise an interrupt
/// or channel request later through [`IoContext::lines`].
///
/// `fnc` is the four-bit function code, `dev` the device number the
/// instruction addressed (a device may own several numbers).
pub trait IoDevice {
    /// Answers one I/O operation.
    fn io(&mut self, op: IoOp, fnc: u8, data: u16, dev: u8, ctx: &mut IoContext) -> IoResult;

    /// Returns the device to its power-up state.
    fn reset(&mut self) {}
}

/// Registration record for an attached device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// First device number
    pub number: u8,
    /// Consecutive device numbers occupied
    pub slots: u8,
    /// DMA/DMC channel owned by the device, if any
    pub channel: Option<Channel>,
}

impl DeviceInfo {
    /// A device occupying one device number with no channel.
    pub fn new(number: u8) -> Self {
        Self {
            number,
            slots: 1,
            channel: None,
        }
    }

    /// Occupies `slots` consecutive device numbers.
    pub fn with_slots(mut self, slots: u8) -> Self {
        self.slots = slots;
        self
    }

    /// Owns a DMA/DMC channel.
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }
}

/// Error returned when device registration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Device number already taken by another device.
    DeviceInUse {
        /// Conflicting device number
        number: u8,
    },

    /// Device number is handled by the CPU itself.
    Reserved {
        /// Reserved device number
        number: u8,
    },

    /// Device number beyond the 64 on the bus.
    NumberOutOfRange {
        /// Offending device number
        number: u8,
    },

    /// Channel already owned by another device.
    ChannelInUse {
        /// Conflicting channel
        channel: Channel,
        /// Device number that owns it
        owner: u8,
    },

    /// Channel number out of range or not installed.
    ChannelOutOfRange {
        /// Offending channel
        channel: Channel,
    },
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DeviceError::DeviceInUse { number } => {
                write!(f, "Device number conflict at {:02o}", number)
            }
            DeviceError::Reserved { number } => {
                write!(f, "Device number {:02o} is reserved", number)
            }
            DeviceError::NumberOutOfRange { number } => {
                write!(f, "Device number {:o} out of range", number)
            }
            DeviceError::ChannelInUse { channel, owner } => write!(
                f,
                "Channel {} already assigned to device {:02o}",
                channel, owner
            ),
            DeviceError::ChannelOutOfRange { channel } => {
                write!(f, "Channel {} not installed", channel)
            }
        }
    }
}

impl std::error::Error for DeviceError {}

struct DeviceEntry {
    info: DeviceInfo,
    device: Box<dyn IoDevice>,
}

/// Device registry: routes I/O pulses and channel transfers to devices.
///
/// Every device number without a registered device resolves to the
/// undefined-device stub, which answers with no skip and (when configured)
/// an [`StopReason::IllegalDevice`] stop.
pub struct DeviceTable {
    entries: Vec<Option<DeviceEntry>>,
    by_number: [Option<usize>; DEV_MAX],
    by_channel: [Option<u8>; CHAN_MAX],
}

impl DeviceTable {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_number: [None; DEV_MAX],
            by_channel: [None; CHAN_MAX],
        }
    }

    /// Registers a device.
    ///
    /// Fails without changing the table if any of the device's numbers is out
    /// of range, reserved or taken, or if its channel is invalid or owned.
    pub fn attach(&mut self, info: DeviceInfo, device: Box<dyn IoDevice>) -> Result<(), DeviceError> {
        let slots = info.slots.max(1);
        for offset in 0..slots {
            let number = info.number.wrapping_add(offset);
            if number as usize >= DEV_MAX {
                return Err(DeviceError::NumberOutOfRange { number });
            }
            if number == DEV_DMA {
                return Err(DeviceError::Reserved { number });
            }
            if self.by_number[number as usize].is_some() {
                return Err(DeviceError::DeviceInUse { number });
            }
        }

        let channel_index = match info.channel {
            Some(channel) => {
                let index = channel
                    .index()
                    .ok_or(DeviceError::ChannelOutOfRange { channel })?;
                if let Some(owner) = self.by_channel[index] {
                    return Err(DeviceError::ChannelInUse { channel, owner });
                }
                Some(index)
            }
            None => None,
        };

        let slot = match self.entries.iter().position(Option::is_none) {
            Some(free) => free,
            None => {
                self.entries.push(None);
                self.entries.len() - 1
            }
        };
        for offset in 0..slots {
            self.by_number[(info.number + offset) as usize] = Some(slot);
        }
        if let Some(index) = channel_index {
            self.by_channel[index] = Some(info.number);
        }
        debug!(
            "attached device {:02o} ({} slot(s), channel {:?})",
            info.number, slots, info.channel
        );
        self.entries[slot] = Some(DeviceEntry {
            info: DeviceInfo { slots, ..info },
            device,
        });
        Ok(())
    }

    /// Removes the device registered at `number` (any of its numbers),
    /// releasing its device numbers and channel.
    pub fn detach(&mut self, number: u8) -> Option<Box<dyn IoDevice>> {
        let slot = (*self.by_number.get(number as usize)?)?;
        let entry = self.entries[slot].take()?;
        for offset in 0..entry.info.slots {
            self.by_number[(entry.info.number + offset) as usize] = None;
        }
        if let Some(index) = entry.info.channel.and_then(|c| c.index()) {
            self.by_channel[index] = None;
        }
        debug!("detached device {:02o}", entry.info.number);
        Some(entry.device)
    }

    /// Returns true if a device answers at `number`.
    pub fn is_attached(&self, number: u8) -> bool {
        self.by_number
            .get(number as usize)
            .is_some_and(|slot| slot.is_some())
    }

    /// Returns the device number owning a channel.
    pub fn channel_owner(&self, channel: Channel) -> Option<u8> {
        self.by_channel[channel.index()?]
    }

    pub(crate) fn owner_by_index(&self, index: usize) -> Option<u8> {
        self.by_channel.get(index).copied().flatten()
    }

    /// Calls the device at `dev`, or returns `None` if nothing is attached.
    pub(crate) fn call(
        &mut self,
        dev: u8,
        op: IoOp,
        fnc: u8,
        data: u16,
        ctx: &mut IoContext,
    ) -> Option<IoResult> {
        let slot = (*self.by_number.get(dev as usize)?)?;
        let entry = self.entries[slot].as_mut()?;
        Some(entry.device.io(op, fnc, data, dev, ctx))
    }

    /// Resets every attached device.
    pub fn reset_all(&mut self) {
        for entry in self.entries.iter_mut().flatten() {
            entry.device.reset();
        }
    }
}

impl Default for DeviceTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Stub answering for device numbers with nothing attached.
pub(crate) fn undefined_device(dev: u8, data: u16, stop: bool) -> IoResult {
    debug!("I/O to undefined device {:02o}", dev);
    IoResult {
        skip: false,
        stop: stop.then_some(StopReason::IllegalDevice),
        data,
    }
}
