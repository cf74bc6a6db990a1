//! # Shift and Rotate Instructions
//!
//! Bits 9..6 select the shift, bits 5..0 hold the two's complement of the
//! count. Double-length shifts work on A'B: logical and rotate shifts use all
//! 32 bits, arithmetic shifts use the 31-bit signed double word (B's sign bit
//! is left alone). C receives the last bit shifted out, or for arithmetic
//! left shifts, whether the sign ever changed.
//!
//! | Code | Mnemonic | Operation |
//! |------|----------|-----------|
//! | 000  | LRL | Long right logical |
//! | 001  | LRS | Long right arithmetic |
//! | 002  | LRR | Long right rotate |
//! | 004  | LGR | A right logical |
//! | 005  | ARS | A right arithmetic |
//! | 006  | ARR | A right rotate |
//! | 010  | LLL | Long left logical |
//! | 011  | LLS | Long left arithmetic |
//! | 012  | LLR | Long left rotate |
//! | 014  | LGL | A left logical |
//! | 015  | ALS | A left arithmetic |
//! | 016  | ALR | A left rotate |
//!
//! Codes 003, 007, 013 and 017 are undocumented. They are reserved, but
//! when reserved instructions do not stop they run the shift the hardware
//! gates produce, one bit at a time.

use super::arith::sext;
use crate::opcodes::{MMASK, SHFMASK, SIGN};
use crate::{StopReason, CPU};

/// 31-bit double word magnitude and sign.
const DP_MASK: u32 = 0o17777777777;

/// Bit 30 of a double word.
const DP_SIGN: u32 = 0o10000000000;

pub(crate) fn execute(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let kind = (ir >> 6) & 0o17;
    let n = (ir.wrapping_neg() & SHFMASK) as u32;

    if kind & 0o3 == 0o3 {
        cpu.reserved()?;
    }
    if n == 0 {
        return Ok(());
    }

    match kind {
        0o00 => {
            let t = long(cpu);
            cpu.c = right_carry(t as u64, n, 32);
            set_long(cpu, if n >= 32 { 0 } else { t >> n });
        }
        0o01 => {
            let t = ((sext(cpu.a) as i64) << 15) | (cpu.b & MMASK) as i64;
            cpu.c = (t >> (n - 1)) & 1 != 0;
            put_dbl_s(cpu, (t >> n) as u32);
        }
        0o02 => {
            let t = long(cpu).rotate_right(n);
            cpu.c = t & 0x8000_0000 != 0;
            set_long(cpu, t);
        }
        0o03 => {
            for _ in 0..n {
                let c = cpu.b & 1;
                cpu.b = (cpu.b & SIGN) | ((cpu.a & 1) << 14) | ((cpu.b & MMASK) >> 1);
                cpu.a = (cpu.a & SIGN) | (c << 15) | (cpu.a >> 1);
                cpu.c = c != 0;
            }
        }
        0o04 => {
            cpu.c = right_carry(cpu.a as u64, n, 16);
            cpu.a = if n >= 16 { 0 } else { cpu.a >> n };
        }
        0o05 => {
            let t = sext(cpu.a) as i64;
            cpu.c = (t >> (n - 1)) & 1 != 0;
            cpu.a = (t >> n) as u16;
        }
        0o06 => {
            cpu.a = cpu.a.rotate_right(n);
            cpu.c = cpu.a & SIGN != 0;
        }
        0o07 => {
            for _ in 0..n {
                let c = cpu.a & 1;
                cpu.a = (cpu.a & SIGN) | (c << 15) | (cpu.a >> 1);
                cpu.c = c != 0;
            }
        }
        0o10 => {
            let t = long(cpu) as u64;
            cpu.c = n <= 32 && (t >> (32 - n)) & 1 != 0;
            set_long(cpu, if n >= 32 { 0 } else { (t << n) as u32 });
        }
        0o11 => {
            let mut t = ((cpu.a as u32) << 15) | (cpu.b & MMASK) as u32;
            let sign = t & DP_SIGN;
            cpu.c = false;
            for _ in 0..n {
                t = (t << 1) & DP_MASK;
                if t & DP_SIGN != sign {
                    cpu.c = true;
                }
            }
            put_dbl_s(cpu, t);
        }
        0o12 => {
            let t = long(cpu).rotate_left(n);
            cpu.c = t & 1 != 0;
            set_long(cpu, t);
        }
        0o13 => {
            for _ in 0..n {
                let a = ((cpu.a as u32) << 1) | ((cpu.b >> 14) & 1) as u32;
                let carry = ((a >> 16) & 1) as u16;
                cpu.b = (cpu.b & SIGN) | ((cpu.b << 1) & MMASK) | carry;
                cpu.c = carry != 0;
                cpu.a = a as u16;
            }
        }
        0o14 => {
            cpu.c = n <= 16 && ((cpu.a as u32) >> (16 - n)) & 1 != 0;
            cpu.a = if n >= 16 { 0 } else { cpu.a << n };
        }
        0o15 => {
            cpu.c = false;
            for _ in 0..n {
                if (cpu.a ^ (cpu.a << 1)) & SIGN != 0 {
                    cpu.c = true;
                }
                cpu.a <<= 1;
            }
        }
        0o16 => {
            cpu.a = cpu.a.rotate_left(n);
            cpu.c = cpu.a & 1 != 0;
        }
        _ => {
            for _ in 0..n {
                if (cpu.a ^ (cpu.a << 1)) & SIGN != 0 {
                    cpu.c = true;
                }
                cpu.a = cpu.a.rotate_left(1);
            }
        }
    }
    Ok(())
}

fn long(cpu: &CPU) -> u32 {
    ((cpu.a as u32) << 16) | cpu.b as u32
}

fn set_long(cpu: &mut CPU, value: u32) {
    cpu.a = (value >> 16) as u16;
    cpu.b = value as u16;
}

fn put_dbl_s(cpu: &mut CPU, value: u32) {
    cpu.a = (value >> 15) as u16;
    cpu.b = (cpu.b & SIGN) | (value as u16 & MMASK);
}

/// Last bit out of a logical right shift of a `width`-bit value.
fn right_carry(value: u64, n: u32, width: u32) -> bool {
    n <= width && (value >> (n - 1)) & 1 != 0
}
