//! # Instruction History and PC Change Queue
//!
//! Two diagnostic records, neither of which affects execution:
//!
//! - `History`: ring buffer of the last N executed instructions with the
//!   registers as they were before each one ran
//! - [`PcQueue`]: the last 64 locations a jump was taken from

use std::collections::VecDeque;
use std::fmt;

/// One executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry {
    /// Location the instruction was fetched from
    pub pc: u16,
    /// Instruction word (synthesized JST* for interrupts)
    pub ir: u16,
    pub a: u16,
    pub b: u16,
    pub x: u16,
    pub c: bool,
    /// Effective address, for memory-reference instructions
    pub ea: Option<u16>,
    /// Word at the effective address when it was resolved
    pub operand: u16,
    /// Cycle was an interrupt being taken
    pub interrupt: bool,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:06o} {} {:06o} {:06o} {:06o} ",
            self.pc, self.c as u8, self.a, self.b, self.x
        )?;
        match self.ea {
            Some(ea) => write!(f, "{:06o} {:06o} ", ea, self.operand)?,
            None => write!(f, "{:14}", "")?,
        }
        write!(f, "{:06o}", self.ir)?;
        if self.interrupt {
            write!(f, " (int)")?;
        }
        Ok(())
    }
}

/// Instruction history ring buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl History {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Changes the length, discarding all recorded entries.
    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        *self = Self::new(capacity);
    }

    pub(crate) fn record(&mut self, entry: HistoryEntry) {
        if !self.is_enabled() {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Adds the effective address to the newest entry.
    pub(crate) fn stamp_operand(&mut self, ea: u16, operand: u16) {
        if let Some(entry) = self.entries.back_mut() {
            entry.ea = Some(ea);
            entry.operand = operand;
        }
    }

    /// Entries oldest first.
    pub(crate) fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }
}

/// Number of PC change queue entries.
pub const PCQ_SIZE: usize = 64;

/// Ring of the locations of the last 64 jumps.
///
/// # Examples
///
/// ```
/// use lib316::PcQueue;
///
/// let mut pcq = PcQueue::default();
/// pcq.record(0o100);
/// pcq.record(0o200);
/// assert_eq!(pcq.iter().collect::<Vec<_>>(), vec![0o200, 0o100]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcQueue {
    entries: [u16; PCQ_SIZE],
    ptr: usize,
    len: usize,
}

impl PcQueue {
    pub fn record(&mut self, pc: u16) {
        self.ptr = (self.ptr + PCQ_SIZE - 1) % PCQ_SIZE;
        self.entries[self.ptr] = pc;
        self.len = (self.len + 1).min(PCQ_SIZE);
    }

    /// Recorded locations, newest first.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.len).map(move |i| self.entries[(self.ptr + i) % PCQ_SIZE])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Zeroes the queue pointer, forgetting every entry.
    pub fn reset(&mut self) {
        self.ptr = 0;
        self.len = 0;
    }
}

impl Default for PcQueue {
    fn default() -> Self {
        Self {
            entries: [0; PCQ_SIZE],
            ptr: 0,
            len: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pc: u16) -> HistoryEntry {
        HistoryEntry {
            pc,
            ..Default::default()
        }
    }

    #[test]
    fn test_history_disabled() {
        let mut history = History::new(0);
        history.record(entry(1));
        assert!(history.entries().is_empty());
    }

    #[test]
    fn test_history_wraps_oldest_first() {
        let mut history = History::new(64);
        for pc in 0..100 {
            history.record(entry(pc));
        }
        let entries = history.entries();
        assert_eq!(entries.len(), 64);
        assert_eq!(entries[0].pc, 36);
        assert_eq!(entries[63].pc, 99);
    }

    #[test]
    fn test_stamp_operand_hits_newest() {
        let mut history = History::new(64);
        history.record(entry(1));
        history.record(entry(2));
        history.stamp_operand(0o1234, 0o7);
        let entries = history.entries();
        assert_eq!(entries[0].ea, None);
        assert_eq!(entries[1].ea, Some(0o1234));
        assert_eq!(entries[1].operand, 0o7);
    }

    #[test]
    fn test_entry_display() {
        let mut e = HistoryEntry {
            pc: 0o1000,
            ir: 0o004010,
            a: 0o123456,
            b: 0,
            x: 0o7,
            c: true,
            ea: Some(0o10),
            operand: 0o123456,
            interrupt: false,
        };
        assert_eq!(
            e.to_string(),
            "001000 1 123456 000000 000007 000010 123456 004010"
        );

        e.ea = None;
        e.ir = 0o120063;
        e.interrupt = true;
        assert_eq!(
            e.to_string(),
            "001000 1 123456 000000 000007               120063 (int)"
        );
    }

    #[test]
    fn test_pc_queue_wraps() {
        let mut pcq = PcQueue::default();
        for pc in 0..70 {
            pcq.record(pc);
        }
        assert_eq!(pcq.len(), PCQ_SIZE);
        assert_eq!(pcq.iter().next(), Some(69));
        assert_eq!(pcq.iter().last(), Some(6));

        pcq.reset();
        assert!(pcq.is_empty());
        assert_eq!(pcq.iter().count(), 0);
    }
}
