//! # Memory-Reference Instructions
//!
//! JMP, LDA, ANA, STA, ERA, ADD, SUB, JST, CAS, IRS, IMA, STX, LDX, MPY, DIV.
//!
//! In double-precision mode (DBL) LDA, STA, ADD and SUB work on the even/odd
//! word pair holding the effective address, treat A'B as one 31-bit signed
//! number (B's sign bit is not part of it) and clear SC.

use super::arith::{add16, add31, get_dbl_s, neg16, sext};
use crate::addressing::merge_address;
use crate::opcodes::{MemoryOp, IDX, MMASK, SIGN};
use crate::{StopReason, CPU};

pub(crate) fn execute(cpu: &mut CPU, op: MemoryOp, ir: u16) -> Result<(), StopReason> {
    match op {
        MemoryOp::Jmp => execute_jmp(cpu, ir),
        MemoryOp::Lda => execute_lda(cpu, ir),
        MemoryOp::Ana => execute_ana(cpu, ir),
        MemoryOp::Sta => execute_sta(cpu, ir),
        MemoryOp::Era => execute_era(cpu, ir),
        MemoryOp::Add => execute_add(cpu, ir),
        MemoryOp::Sub => execute_sub(cpu, ir),
        MemoryOp::Jst => execute_jst(cpu, ir),
        MemoryOp::Cas => execute_cas(cpu, ir),
        MemoryOp::Irs => execute_irs(cpu, ir),
        MemoryOp::Ima => execute_ima(cpu, ir),
        MemoryOp::Stx => execute_stx(cpu, ir),
        MemoryOp::Ldx => execute_ldx(cpu, ir),
        MemoryOp::Mpy => execute_mpy(cpu, ir),
        MemoryOp::Div => execute_div(cpu, ir),
    }
}

/// Splits a 31-bit double word into A'B, keeping B's sign bit.
fn put_dbl_s(cpu: &mut CPU, value: u32) {
    cpu.a = (value >> 15) as u16;
    cpu.b = (cpu.b & SIGN) | (value as u16 & MMASK);
}

/// JMP: the first JMP after DXA leaves extended mode.
fn execute_jmp(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    cpu.pc_queue.record(cpu.fetch_pc);
    cpu.pc = merge_address(cpu.pc, y, cpu.ext);
    if cpu.extoff_pending {
        cpu.ext = false;
        cpu.extoff_pending = false;
    }
    Ok(())
}

fn execute_lda(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    if cpu.dp {
        cpu.a = cpu.memory.read(y & !1);
        cpu.b = cpu.memory.read(y | 1);
        cpu.sc = 0;
    } else {
        cpu.a = cpu.memory.read(y);
    }
    Ok(())
}

fn execute_ana(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    cpu.a &= cpu.memory.read(y);
    Ok(())
}

/// STA: in double precision an odd address stores B only.
fn execute_sta(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    if cpu.dp {
        if y & 1 == 0 {
            cpu.write(y, cpu.a)?;
        }
        cpu.write(y | 1, cpu.b)?;
        cpu.sc = 0;
    } else {
        cpu.write(y, cpu.a)?;
    }
    Ok(())
}

fn execute_era(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    cpu.a ^= cpu.memory.read(y);
    Ok(())
}

fn execute_add(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    if cpu.dp {
        let t1 = get_dbl_s(cpu.a, cpu.b);
        let t2 = get_dbl_s(cpu.memory.read(y & !1), cpu.memory.read(y | 1));
        let (sum, overflow) = add31(t1, t2);
        cpu.c = overflow;
        put_dbl_s(cpu, sum);
        cpu.sc = 0;
    } else {
        let (sum, overflow) = add16(cpu.a, cpu.memory.read(y));
        cpu.a = sum;
        cpu.c = overflow;
    }
    Ok(())
}

fn execute_sub(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    if cpu.dp {
        let t1 = get_dbl_s(cpu.a, cpu.b);
        let t2 = get_dbl_s(cpu.memory.read(y & !1), cpu.memory.read(y | 1));
        let (diff, overflow) = add31(t1, t2.wrapping_neg());
        cpu.c = overflow;
        put_dbl_s(cpu, diff);
        cpu.sc = 0;
    } else {
        let (diff, overflow) = add16(cpu.a, neg16(cpu.memory.read(y)));
        cpu.a = diff;
        cpu.c = overflow;
    }
    Ok(())
}

/// JST: store the return address into the target's in-bank bits and
/// continue at the following word.
fn execute_jst(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    let link = merge_address(cpu.memory.read(y), cpu.pc, cpu.ext);
    cpu.write(y, link)?;
    cpu.pc_queue.record(cpu.fetch_pc);
    cpu.pc = merge_address(cpu.pc, y.wrapping_add(1), cpu.ext);
    Ok(())
}

/// CAS: skip one if equal, two if A is less (signed).
fn execute_cas(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    let mb = cpu.memory.read(y);
    if cpu.a == mb {
        cpu.skip(1);
    } else if sext(cpu.a) < sext(mb) {
        cpu.skip(2);
    }
    Ok(())
}

fn execute_irs(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    let mb = cpu.memory.read(y).wrapping_add(1);
    cpu.write(y, mb)?;
    if mb == 0 {
        cpu.skip(1);
    }
    Ok(())
}

fn execute_ima(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir)?;
    let mb = cpu.memory.read(y);
    cpu.write(y, cpu.a)?;
    cpu.a = mb;
    Ok(())
}

/// STX and LDX use the index bit as part of the opcode, never for indexing.
fn execute_stx(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir & !IDX)?;
    let x = cpu.x();
    cpu.write(y, x)
}

fn execute_ldx(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let y = cpu.effective_address(ir & !IDX)?;
    let value = cpu.memory.read(y);
    cpu.set_x(value);
    Ok(())
}

/// MPY: signed 16 x 16 product into A'B with B's sign cleared.
fn execute_mpy(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    if !cpu.config.high_speed_arithmetic {
        return cpu.reserved();
    }
    let y = cpu.effective_address(ir)?;
    let product = sext(cpu.a) * sext(cpu.memory.read(y));
    cpu.a = (product >> 15) as u16;
    cpu.b = product as u16 & MMASK;
    cpu.sc = 0;
    Ok(())
}

/// DIV: signed A'B / M. Quotient to A, remainder to B. C reports a
/// quotient that does not fit, or a zero divisor (registers unchanged).
fn execute_div(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    if !cpu.config.high_speed_arithmetic {
        return cpu.reserved();
    }
    let y = cpu.effective_address(ir)?;
    let divisor = sext(cpu.memory.read(y));
    if divisor == 0 {
        cpu.c = true;
        return Ok(());
    }
    let dividend = (sext(cpu.a) << 15) | (cpu.b & MMASK) as i32;
    let quotient = dividend / divisor;
    cpu.b = (dividend % divisor) as u16;
    cpu.a = quotient as u16;
    cpu.c = !(-(SIGN as i32)..=MMASK as i32).contains(&quotient);
    cpu.sc = 0;
    Ok(())
}
