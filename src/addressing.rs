//! # Effective Address Resolution
//!
//! A memory-reference instruction names its operand with a 9-bit displacement
//! in sector zero or, with the S bit set, in the sector holding the
//! instruction itself. The address can then be indexed and followed through
//! a chain of indirect words. The rules differ by addressing mode:
//!
//! - **Extended mode** (32K): indirect words are followed first, each one a
//!   full 15-bit address whose own bit 15 continues the chain. Only the
//!   instruction's index bit counts, and X is added after the chain ends.
//! - **Non-extended mode** (16K): X is added before the first indirection.
//!   Each indirect word carries its own index bit, and X is added again
//!   after fetching any word that has it. Address arithmetic wraps inside
//!   the current 16K bank.
//!
//! The chain is cut off after the configured number of hops.

use crate::memory::{NX_AMASK, X_AMASK};
use crate::opcodes::{DISP, IA, IDX, PAGENO, SC};
use crate::{StopReason, CPU};

/// Replaces the in-bank part of `current` with `new`.
///
/// In extended mode the bank is 15 bits wide, otherwise 14: the top bits of
/// `current` survive. This is how the PC and indirect chains stay inside
/// their bank in non-extended mode.
///
/// # Examples
///
/// ```
/// use lib316::addressing::merge_address;
///
/// assert_eq!(merge_address(0o040100, 0o000200, false), 0o040200);
/// assert_eq!(merge_address(0o040100, 0o000200, true), 0o000200);
/// assert_eq!(merge_address(0o037777, 0o040000, false), 0o000000);
/// ```
pub fn merge_address(current: u16, new: u16, extended: bool) -> u16 {
    let mask = if extended { X_AMASK } else { NX_AMASK };
    (current & !mask) | (new & mask)
}

impl CPU {
    /// Resolves the effective address of memory-reference word `ir`.
    ///
    /// Expects the PC to already point past the instruction. Stamps the
    /// current history entry with the address and operand.
    pub(crate) fn effective_address(&mut self, ir: u16) -> Result<u16, StopReason> {
        let limit = self.config.indirect_limit;
        let mut y = ir & (IA | DISP);
        if ir & SC != 0 {
            y |= self.pc.wrapping_sub(1) & PAGENO;
        }

        let mut hops = 0;
        let still_indirect = if self.ext {
            while y & IA != 0 && hops < limit {
                y = self.memory.read(y & X_AMASK);
                hops += 1;
            }
            let pending = y & IA != 0;
            if ir & IDX != 0 {
                y = y.wrapping_add(self.x());
            }
            pending
        } else {
            let index = if ir & IDX != 0 { self.x() } else { 0 };
            y = merge_address(self.pc, y.wrapping_add(index), false);
            let mut word = ir;
            while word & IA != 0 && hops < limit {
                word = self.memory.read(y & X_AMASK);
                let index = if word & IDX != 0 { self.x() } else { 0 };
                y = merge_address(y, word.wrapping_add(index), false);
                hops += 1;
            }
            word & IA != 0
        };

        let ea = y & X_AMASK;
        if still_indirect {
            return Err(StopReason::IndirectLoop { address: ea });
        }
        let operand = self.memory.read(ea);
        self.history.stamp_operand(ea, operand);
        Ok(ea)
    }
}
