//! # CPU Configuration
//!
//! Hardware options installed on the simulated machine and the simulator's
//! stop toggles. A configuration is validated once when the CPU is built;
//! memory size and history length can also be changed later through the CPU.

use crate::devices::channels::DMA_MAX;
use crate::memory::MAX_MEMORY_SIZE;

/// Smallest memory configuration in words.
pub const MIN_MEMORY_SIZE: usize = 4096;

/// Smallest enabled instruction history.
pub const HISTORY_MIN: usize = 64;

/// Largest instruction history.
pub const HISTORY_MAX: usize = 65536;

/// Largest accepted indirect hop limit.
pub const INDIRECT_LIMIT_MAX: u32 = 32;

/// Hardware options and simulator toggles.
///
/// # Examples
///
/// ```
/// use lib316::CpuConfig;
///
/// let config = CpuConfig::default()
///     .with_memory_size(16384)
///     .with_extended_addressing(false)
///     .with_history(256);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuConfig {
    /// Installed memory in 16-bit words (4K..32K in 4K steps).
    pub memory_size: usize,

    /// Extended addressing option (32K addressing, EXA/DXA).
    pub extended_addressing: bool,

    /// High-speed arithmetic option (MPY, DIV, NRM, SCA, SGL/DBL).
    pub high_speed_arithmetic: bool,

    /// DMC channel option.
    pub dmc: bool,

    /// Number of installed DMA channels (0..=4).
    pub dma_channels: u8,

    /// Extended (priority) interrupt option.
    pub extended_interrupts: bool,

    /// Maximum number of indirect hops before an indirect loop stop.
    pub indirect_limit: u32,

    /// Stop on reserved instructions and undefined device functions.
    pub stop_on_illegal_instruction: bool,

    /// Stop on I/O to unattached devices.
    pub stop_on_illegal_device: bool,

    /// Instruction history length (0 disables history).
    pub history_length: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            memory_size: MAX_MEMORY_SIZE,
            extended_addressing: true,
            high_speed_arithmetic: true,
            dmc: true,
            dma_channels: DMA_MAX as u8,
            extended_interrupts: false,
            indirect_limit: 8,
            stop_on_illegal_instruction: true,
            stop_on_illegal_device: true,
            history_length: 0,
        }
    }
}

impl CpuConfig {
    /// Sets the installed memory size in words.
    pub fn with_memory_size(mut self, words: usize) -> Self {
        self.memory_size = words;
        self
    }

    /// Enables or disables the extended addressing option.
    pub fn with_extended_addressing(mut self, enabled: bool) -> Self {
        self.extended_addressing = enabled;
        self
    }

    /// Enables or disables the high-speed arithmetic option.
    pub fn with_high_speed_arithmetic(mut self, enabled: bool) -> Self {
        self.high_speed_arithmetic = enabled;
        self
    }

    /// Enables or disables the DMC option.
    pub fn with_dmc(mut self, enabled: bool) -> Self {
        self.dmc = enabled;
        self
    }

    /// Sets the number of DMA channels.
    pub fn with_dma_channels(mut self, channels: u8) -> Self {
        self.dma_channels = channels;
        self
    }

    /// Enables or disables the extended interrupt option.
    pub fn with_extended_interrupts(mut self, enabled: bool) -> Self {
        self.extended_interrupts = enabled;
        self
    }

    /// Sets the indirect hop limit.
    pub fn with_indirect_limit(mut self, hops: u32) -> Self {
        self.indirect_limit = hops;
        self
    }

    /// Sets whether reserved instructions stop the simulator.
    pub fn with_stop_on_illegal_instruction(mut self, stop: bool) -> Self {
        self.stop_on_illegal_instruction = stop;
        self
    }

    /// Sets whether I/O to unattached devices stops the simulator.
    pub fn with_stop_on_illegal_device(mut self, stop: bool) -> Self {
        self.stop_on_illegal_device = stop;
        self
    }

    /// Sets the instruction history length.
    pub fn with_history(mut self, entries: usize) -> Self {
        self.history_length = entries;
        self
    }

    /// Checks every field against the hardware limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_memory_size(self.memory_size)?;
        if self.dma_channels as usize > DMA_MAX {
            return Err(ConfigError::DmaChannels(self.dma_channels));
        }
        if self.indirect_limit == 0 || self.indirect_limit > INDIRECT_LIMIT_MAX {
            return Err(ConfigError::IndirectLimit(self.indirect_limit));
        }
        validate_history_length(self.history_length)
    }
}

pub(crate) fn validate_memory_size(words: usize) -> Result<(), ConfigError> {
    if words < MIN_MEMORY_SIZE || words > MAX_MEMORY_SIZE || words % MIN_MEMORY_SIZE != 0 {
        return Err(ConfigError::MemorySize(words));
    }
    Ok(())
}

pub(crate) fn validate_history_length(entries: usize) -> Result<(), ConfigError> {
    if entries != 0 && !(HISTORY_MIN..=HISTORY_MAX).contains(&entries) {
        return Err(ConfigError::HistoryLength(entries));
    }
    Ok(())
}

/// Error returned for an invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Memory size is not a multiple of 4K words in 4K..32K.
    MemorySize(usize),

    /// More DMA channels than the hardware supports.
    DmaChannels(u8),

    /// Indirect hop limit outside 1..=32.
    IndirectLimit(u32),

    /// History length is neither 0 nor in 64..=65536.
    HistoryLength(usize),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigError::MemorySize(words) => write!(
                f,
                "Invalid memory size {}: must be a multiple of {} words up to {}",
                words, MIN_MEMORY_SIZE, MAX_MEMORY_SIZE
            ),
            ConfigError::DmaChannels(n) => {
                write!(f, "Invalid DMA channel count {}: at most {}", n, DMA_MAX)
            }
            ConfigError::IndirectLimit(n) => write!(
                f,
                "Invalid indirect limit {}: must be 1..={}",
                n, INDIRECT_LIMIT_MAX
            ),
            ConfigError::HistoryLength(n) => write!(
                f,
                "Invalid history length {}: must be 0 or {}..={}",
                n, HISTORY_MIN, HISTORY_MAX
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
