//! # Core Memory
//!
//! The 316/516 has a single flat array of 16-bit words, up to 32K words. The
//! installed size may be smaller; words beyond it do not exist:
//!
//! - Reads of non-existent memory return zero (the array is zero-filled past
//!   the installed size)
//! - Writes to non-existent memory are silently discarded
//!
//! DMC channel control words and the index register live in ordinary memory
//! cells. Device models and the channel engine access the array directly
//! through [`CoreMemory::read`] and [`CoreMemory::write`]; the CPU's own stores
//! go through the write gate in the CPU, which adds the low-memory protection,
//! index register shadowing and write breakpoints.

use log::warn;

/// Maximum memory size in words.
pub const MAX_MEMORY_SIZE: usize = 32768;

/// Extended-mode address mask (15 bits).
pub const X_AMASK: u16 = (MAX_MEMORY_SIZE - 1) as u16;

/// Non-extended address mask (14 bits, one 16K bank).
pub const NX_AMASK: u16 = ((MAX_MEMORY_SIZE / 2) - 1) as u16;

/// Lowest address the CPU write gate stores to (other than location 0).
pub const PROTECT_LIMIT: u16 = 0o20;

/// Error returned by examine/deposit for non-existent memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Address is beyond the installed memory size.
    NonExistent(u32),
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MemoryError::NonExistent(addr) => write!(f, "Non-existent memory at {:06o}", addr),
        }
    }
}

impl std::error::Error for MemoryError {}

/// The core memory array.
///
/// # Examples
///
/// ```
/// use lib316::CoreMemory;
///
/// let mut mem = CoreMemory::new(8192);
/// mem.write(0o100, 0o177777);
/// assert_eq!(mem.read(0o100), 0o177777);
///
/// // Past the installed size: discarded, reads as zero
/// mem.write(0o20000, 0o1234);
/// assert_eq!(mem.read(0o20000), 0);
/// ```
pub struct CoreMemory {
    words: Box<[u16; MAX_MEMORY_SIZE]>,
    size: usize,
}

impl CoreMemory {
    /// Creates zeroed memory with `size` installed words (clamped to 32K).
    pub fn new(size: usize) -> Self {
        Self {
            words: Box::new([0; MAX_MEMORY_SIZE]),
            size: size.min(MAX_MEMORY_SIZE),
        }
    }

    /// Returns the installed size in words.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if the address is within installed memory.
    pub fn exists(&self, addr: u32) -> bool {
        (addr as usize) < self.size
    }

    /// Reads a word. The address is masked to 15 bits.
    pub fn read(&self, addr: u16) -> u16 {
        self.words[(addr & X_AMASK) as usize]
    }

    /// Writes a word directly, bypassing the CPU write gate.
    ///
    /// Writes beyond the installed size are discarded.
    pub fn write(&mut self, addr: u16, value: u16) {
        if self.exists(addr as u32) {
            self.words[addr as usize] = value;
        }
    }

    /// Store used by the CPU write gate: location 0 and 020 upward only.
    ///
    /// Returns true if the word was stored.
    pub(crate) fn write_gated(&mut self, addr: u16, value: u16) -> bool {
        if (addr == 0 || addr >= PROTECT_LIMIT) && self.exists(addr as u32) {
            self.words[addr as usize] = value;
            return true;
        }
        false
    }

    /// Changes the installed size, zero-filling every word past it.
    ///
    /// Returns the number of non-zero words that were discarded. The caller is
    /// responsible for validating `size`.
    pub(crate) fn resize(&mut self, size: usize) -> usize {
        let size = size.min(MAX_MEMORY_SIZE);
        let discarded = self.words[size..].iter().filter(|&&w| w != 0).count();
        if discarded > 0 {
            warn!(
                "memory resized to {} words, {} non-zero words discarded",
                size, discarded
            );
        }
        self.words[size..].fill(0);
        self.size = size;
        discarded
    }

    /// Examines a word, failing for non-existent memory.
    pub fn examine(&self, addr: u32) -> Result<u16, MemoryError> {
        if !self.exists(addr) {
            return Err(MemoryError::NonExistent(addr));
        }
        Ok(self.words[addr as usize])
    }

    /// Loads a block of words starting at `start`; words past the installed
    /// size are dropped.
    pub fn load(&mut self, start: u16, words: &[u16]) {
        for (i, &word) in words.iter().enumerate() {
            self.write(start.wrapping_add(i as u16), word);
        }
    }
}

impl Default for CoreMemory {
    fn default() -> Self {
        Self::new(MAX_MEMORY_SIZE)
    }
}
