//! # Adder Primitives
//!
//! Two's-complement adds with the 316's overflow rule: overflow (C) is set
//! when both operands have the same sign and the sum's sign differs.
//! Subtraction is addition of the negated operand; callers negate.

use crate::opcodes::{DP_SIGN, MMASK, SIGN};

/// 16-bit add. Returns the sum mod 2^16 and the overflow flag.
///
/// # Examples
///
/// ```
/// use lib316::add16;
///
/// assert_eq!(add16(0o000001, 0o000002), (0o000003, false));
/// assert_eq!(add16(0o077777, 0o000001), (0o100000, true));
/// assert_eq!(add16(0o177777, 0o000001), (0o000000, false));
/// ```
pub fn add16(v1: u16, v2: u16) -> (u16, bool) {
    let r = v1.wrapping_add(v2);
    let overflow = (v1 ^ !v2) & (v1 ^ r) & SIGN != 0;
    (r, overflow)
}

/// 31-bit add for double precision. Returns the unmasked sum and the
/// overflow flag, judged on bit 30.
///
/// # Examples
///
/// ```
/// use lib316::add31;
///
/// let (sum, overflow) = add31(0o07777777777, 1);
/// assert_eq!(sum, 0o10000000000);
/// assert!(overflow);
/// ```
pub fn add31(v1: u32, v2: u32) -> (u32, bool) {
    let r = v1.wrapping_add(v2);
    let overflow = (v1 ^ !v2) & (v1 ^ r) & DP_SIGN != 0;
    (r, overflow)
}

/// Two's-complement negation of a 16-bit word.
pub(crate) fn neg16(v: u16) -> u16 {
    v.wrapping_neg()
}

/// Sign-extends a 16-bit word.
pub(crate) fn sext(v: u16) -> i32 {
    v as i16 as i32
}

/// A'B as a 31-bit signed double word (B's sign bit is not part of it).
pub(crate) fn get_dbl_s(high: u16, low: u16) -> u32 {
    ((high as u32) << 15) | (low & MMASK) as u32
}
