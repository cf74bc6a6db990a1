//! DMA and DMC block-transfer channels.
//!
//! Both kinds of channel move one word between a device and memory each time
//! the device raises the channel's request line. They differ in where their
//! state lives:
//!
//! - **DMA** (up to 4 channels): address and word count are CPU registers,
//!   loaded through the DMA control device (024). The word count is a
//!   negative 15-bit count; end of range is reached when it counts up to 0.
//! - **DMC** (up to 16 channels): each channel owns a two-word control block
//!   in ordinary memory at `020 + 2*n`, holding the current address and the
//!   last address of the block. Programs may rewrite these words at any time.
//!
//! In both cases bit 15 of the address word selects input (device to memory).

use super::interrupts::IoLines;
use super::{DeviceTable, IoContext, IoOp};
use crate::memory::{CoreMemory, X_AMASK};
use crate::StopReason;
use log::trace;

/// Number of DMA channels.
pub const DMA_MAX: usize = 4;

/// Number of DMC channels.
pub const DMC_MAX: usize = 16;

/// Total channel request lines.
pub const CHAN_MAX: usize = DMA_MAX + DMC_MAX;

/// Base of the DMC control blocks in memory.
pub const DMC_BASE: u16 = 0o20;

/// Input direction flag in an address word.
pub const DMA_IN: u16 = 0o100000;

/// Word count mask.
pub const DMA_WCMASK: u16 = 0o077777;

/// A DMA or DMC channel, numbered from 1 as on the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// DMA channel 1..=4
    Dma(u8),
    /// DMC channel 1..=16
    Dmc(u8),
}

impl Channel {
    /// Request-line index: DMA channels 0..4, DMC channels 4..20.
    pub fn index(&self) -> Option<usize> {
        match *self {
            Channel::Dma(n) if (1..=DMA_MAX as u8).contains(&n) => Some(n as usize - 1),
            Channel::Dmc(n) if (1..=DMC_MAX as u8).contains(&n) => {
                Some(DMA_MAX + n as usize - 1)
            }
            _ => None,
        }
    }

    /// Inverse of [`Channel::index`].
    pub fn from_index(index: usize) -> Option<Channel> {
        if index < DMA_MAX {
            Some(Channel::Dma(index as u8 + 1))
        } else if index < CHAN_MAX {
            Some(Channel::Dmc((index - DMA_MAX) as u8 + 1))
        } else {
            None
        }
    }

    /// Address of this DMC channel's control block.
    pub fn dmc_block(&self) -> Option<u16> {
        match *self {
            Channel::Dmc(n) if (1..=DMC_MAX as u8).contains(&n) => {
                Some(DMC_BASE + ((n as u16 - 1) << 1))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Channel::Dma(n) => write!(f, "DMA{}", n),
            Channel::Dmc(n) => write!(f, "DMC{}", n),
        }
    }
}

/// Register state of one DMA channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelState {
    /// Current address, bit 15 = input
    pub address: u16,
    /// Negative word count (15 bits)
    pub word_count: u16,
    /// End of range reached
    pub end_of_range: bool,
}

impl ChannelState {
    /// Loads the address counter, clearing count and end of range.
    pub(crate) fn load_address(&mut self, address: u16) {
        self.address = address;
        self.word_count = 0;
        self.end_of_range = false;
    }
}

/// Services every channel with a request outstanding, lowest first.
///
/// Each request moves one word. A device that does not answer a transfer with
/// a skip fails the whole step with [`StopReason::DmaError`]; a stop returned
/// by the device is propagated as is.
pub(crate) fn service(
    dma: &mut [ChannelState; DMA_MAX],
    devices: &mut DeviceTable,
    memory: &mut CoreMemory,
    lines: &mut IoLines,
) -> Result<(), StopReason> {
    for index in 0..CHAN_MAX {
        if lines.chan_req == 0 {
            break;
        }
        if lines.chan_req & (1 << index) == 0 {
            continue;
        }
        lines.chan_req &= !(1 << index);

        let dev = devices.owner_by_index(index).ok_or(StopReason::DmaError)?;
        let block = Channel::from_index(index).and_then(|c| c.dmc_block());
        let st = match block {
            Some(block) => memory.read(block),
            None => dma[index].address,
        };
        let ad = st & X_AMASK;

        if st & DMA_IN != 0 {
            let mut ctx = IoContext {
                memory: &mut *memory,
                lines: &mut *lines,
            };
            let result = devices
                .call(dev, IoOp::Ina, 0, 0, &mut ctx)
                .ok_or(StopReason::DmaError)?;
            if !result.skip {
                return Err(StopReason::DmaError);
            }
            if let Some(reason) = result.stop {
                return Err(reason);
            }
            // Channel stores bypass the write gate and write breakpoints
            memory.write(ad, result.data);
            trace!("chan {:02} in  {:06o} <- {:06o}", index, ad, result.data);
        } else {
            let word = memory.read(ad);
            let mut ctx = IoContext {
                memory: &mut *memory,
                lines: &mut *lines,
            };
            let result = devices
                .call(dev, IoOp::Ota, 0, word, &mut ctx)
                .ok_or(StopReason::DmaError)?;
            if !result.skip {
                return Err(StopReason::DmaError);
            }
            if let Some(reason) = result.stop {
                return Err(reason);
            }
            trace!("chan {:02} out {:06o} -> {:06o}", index, ad, word);
        }

        let next = (st & DMA_IN) | (ad.wrapping_add(1) & X_AMASK);
        let done = match block {
            Some(block) => {
                memory.write(block, next);
                ad == memory.read(block + 1)
            }
            None => {
                let state = &mut dma[index];
                state.address = next;
                state.word_count = state.word_count.wrapping_add(1) & DMA_WCMASK;
                if state.word_count == 0 {
                    state.end_of_range = true;
                }
                state.word_count == 0
            }
        };

        if done {
            let mut ctx = IoContext {
                memory: &mut *memory,
                lines: &mut *lines,
            };
            if let Some(reason) = devices
                .call(dev, IoOp::End, 0, 0, &mut ctx)
                .and_then(|result| result.stop)
            {
                return Err(reason);
            }
        }
    }
    Ok(())
}
