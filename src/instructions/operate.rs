//! # Operate Instructions (Generic B)
//!
//! An operate word drives the A register and C through two microcoded
//! phases. The sixteen documented mnemonics are executed directly. Every
//! other operate word is reserved; when reserved instructions do not stop it
//! runs through [`operate`], which evaluates the processor's gate equations
//! bit for bit.

use crate::opcodes::SIGN;
use crate::{StopReason, CPU};

const M7: u16 = 0o001000;
const M8: u16 = 0o000400;
const M9: u16 = 0o000200;
const M10: u16 = 0o000100;
const M11: u16 = 0o000040;
const M12: u16 = 0o000020;
const M13: u16 = 0o000010;
const M14: u16 = 0o000004;
const M15: u16 = 0o000002;
const M16: u16 = 0o000001;

const DMASK: u16 = 0o177777;
const HIGH_BYTE: u16 = 0o177400;
const LOW_BYTE: u16 = 0o000377;

pub(crate) const CHS: u16 = 0o140024;
pub(crate) const CRA: u16 = 0o140040;
pub(crate) const SSP: u16 = 0o140100;
pub(crate) const RCB: u16 = 0o140200;
pub(crate) const CSA: u16 = 0o140320;
pub(crate) const CMA: u16 = 0o140401;
pub(crate) const TCA: u16 = 0o140407;
pub(crate) const SSM: u16 = 0o140500;
pub(crate) const SCB: u16 = 0o140600;
pub(crate) const CAR: u16 = 0o141044;
pub(crate) const CAL: u16 = 0o141050;
pub(crate) const ICL: u16 = 0o141140;
pub(crate) const AOA: u16 = 0o141206;
pub(crate) const ACA: u16 = 0o141216;
pub(crate) const ICR: u16 = 0o141240;
pub(crate) const ICA: u16 = 0o141340;

pub(crate) fn execute(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let (a, c) = match named(ir, cpu.a, cpu.c) {
        Some(result) => result,
        None => {
            cpu.reserved()?;
            // The repeated pass uses the shift counter; its residue is lost
            if ir & (M15 | M16) == M15 | M16 {
                cpu.sc = 0;
            }
            operate(ir, cpu.a, cpu.c)
        }
    };
    cpu.a = a;
    cpu.c = c;
    Ok(())
}

/// The documented operate instructions.
fn named(ir: u16, a: u16, c: bool) -> Option<(u16, bool)> {
    let result = match ir {
        CHS => (a ^ SIGN, c),
        CRA => (0, c),
        SSP => (a & !SIGN, c),
        RCB => (a, false),
        CSA => (a & !SIGN, a & SIGN != 0),
        CMA => (!a, c),
        TCA => (a.wrapping_neg(), c),
        SSM => (a | SIGN, c),
        SCB => (a, true),
        CAR => (a & HIGH_BYTE, c),
        CAL => (a & LOW_BYTE, c),
        ICL => (a >> 8, c),
        AOA => super::arith::add16(a, 1),
        ACA => super::arith::add16(a, c as u16),
        ICR => ((a << 8) & HIGH_BYTE, c),
        ICA => (a.swap_bytes(), c),
        _ => return None,
    };
    Some(result)
}

/// Evaluates an operate word with the processor's gate equations.
///
/// `m7`..`m16` name instruction bits 9..0. Phase one either jams A through
/// optional complement and sign inversion, or adds a carry-in to it; with
/// `m15` and `m16` both set it runs twice, complementing and then adding
/// one. Phase two routes the bytes of the phase-one result back to A and
/// conditions the sign and C.
///
/// Returns the new A and C.
///
/// # Examples
///
/// ```
/// use lib316::operate;
///
/// // TCA
/// assert_eq!(operate(0o140407, 0o000005, false), (0o177773, false));
/// // ICA
/// assert_eq!(operate(0o141340, 0o001377, true), (0o177402, true));
/// ```
pub fn operate(ir: u16, a: u16, c: bool) -> (u16, bool) {
    let bit = |mask: u16| ir & mask != 0;
    let (m7, m8, m9, m10, m11) = (bit(M7), bit(M8), bit(M9), bit(M10), bit(M11));
    let (m12, m13, m14, m15, m16) = (bit(M12), bit(M13), bit(M14), bit(M15), bit(M16));

    // Phase one; with rpt the first pass complements and the second adds one
    let rpt = m15 && m16;
    let jam = !m15 || m16;
    let esl = m16;
    let chs = m12 && m14 && !m15;
    let cin = m14 && (!m13 || c);

    let (d, overflow) = if rpt {
        let once = !a;
        let d = once.wrapping_add(1);
        (d, !once & (once ^ d) & SIGN != 0)
    } else if jam {
        let esl_mask = if esl { DMASK } else { 0 };
        let chs_mask = if chs { SIGN } else { 0 };
        (a ^ esl_mask ^ chs_mask, false)
    } else {
        let d = a.wrapping_add(cin as u16);
        (d, !a & (a ^ d) & SIGN != 0)
    };

    // Phase two
    let hi_straight = !m11 || (m7 && m14);
    let lo_straight = !m11 || (m7 && m13);
    let lo_to_hi = m11 && m7 && m9;
    let hi_to_lo = m11 && m7 && m10;
    let clr_sign = !m11 && m10;
    let set_sign = !m11 && m10 && m8;

    let mut out = 0;
    if hi_straight {
        out |= d & HIGH_BYTE;
    }
    if lo_straight {
        out |= d & LOW_BYTE;
    }
    if lo_to_hi {
        out |= (d << 8) & HIGH_BYTE;
    }
    if hi_to_lo {
        out |= d >> 8;
    }
    if clr_sign {
        out &= !SIGN;
    }
    if set_sign {
        out |= SIGN;
    }

    let mut carry = c;
    let cgate = m9 && !m11;
    if cgate {
        carry = m8 || (m15 && overflow) || (m10 && d & SIGN != 0);
    }
    (out, carry)
}
