//! # Control Instructions (Generic A)
//!
//! A control word is a bundle of independent single-bit operations. Every
//! operation whose bit is set runs, in the order below, so one word can
//! combine several of them:
//!
//! | Bits     | Mnemonic | Operation |
//! |----------|----------|-----------|
//! | `000001` | (clear)  | HLT |
//! | `000004` | SGL/DBL  | Single/double precision (`000002` selects DBL) |
//! | `000010` | DXA/EXA  | Leave/enter extended mode (`000002` selects EXA) |
//! | `000020` | RMP      | Reset memory parity error |
//! | `000040` | SCA/INK  | Read shift count, or machine keys (`000002`) |
//! | `000100` | NRM      | Normalize A'B |
//! | `000200` | IAB      | Interchange A and B |
//! | `000400` | ENB      | Enable interrupts |
//! | `001000` | INH      | Inhibit interrupts |
//!
//! SCA, NRM and IAB share a priority chain: only the first one set runs.
//! Operations of a missing option are skipped and reported as a reserved
//! instruction after the rest of the word has executed.

use crate::opcodes::{MMASK, SIGN};
use crate::{StopReason, CPU};
use log::debug;

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

/// NRM gives up after this many shifts.
const NRM_LIMIT: u8 = 32;

pub(crate) fn execute(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    if ir & M16 == 0 {
        debug!("HLT at {:06o}", cpu.fetch_pc);
        return Err(StopReason::Halt);
    }

    let mut stop = None;
    let hsa = cpu.config.high_speed_arithmetic;

    if ir & M14 != 0 {
        if hsa {
            cpu.dp = ir & M15 != 0;
        } else {
            missing_option(cpu, &mut stop);
        }
    }

    if ir & M13 != 0 {
        if !cpu.config.extended_addressing {
            missing_option(cpu, &mut stop);
        } else if ir & M15 != 0 {
            cpu.ext = true;
            cpu.extoff_pending = false;
        } else {
            cpu.extoff_pending = true;
        }
    }

    if ir & M12 != 0 {
        cpu.lines.clear_parity_error();
    }

    if ir & M11 != 0 {
        if ir & M15 != 0 {
            execute_ink(cpu);
        } else if hsa {
            cpu.a = (cpu.sc & 0o37) as u16;
        } else {
            missing_option(cpu, &mut stop);
        }
    } else if ir & M10 != 0 {
        if hsa {
            execute_nrm(cpu);
        } else {
            missing_option(cpu, &mut stop);
        }
    } else if ir & M9 != 0 {
        std::mem::swap(&mut cpu.a, &mut cpu.b);
    }

    if ir & M8 != 0 {
        cpu.lines.enable();
    }
    if ir & M7 != 0 {
        cpu.lines.inhibit();
    }

    match stop {
        Some(reason) => Err(reason),
        None => Ok(()),
    }
}

fn missing_option(cpu: &CPU, stop: &mut Option<StopReason>) {
    if let Err(reason) = cpu.reserved() {
        *stop = Some(reason);
    }
}

/// INK: C, DP, the mode before the last interrupt and SC packed into A.
fn execute_ink(cpu: &mut CPU) {
    cpu.a = ((cpu.c as u16) << 15)
        | ((cpu.dp as u16) << 14)
        | ((cpu.pme as u16) << 13)
        | (cpu.sc & 0o37) as u16;
}

/// NRM: shift A'B left until bits 15 and 14 of A differ, counting in SC.
fn execute_nrm(cpu: &mut CPU) {
    cpu.sc = 0;
    while cpu.sc < NRM_LIMIT && (cpu.a & SIGN) == ((cpu.a << 1) & SIGN) {
        cpu.a = (cpu.a & SIGN) | ((cpu.a << 1) & MMASK) | ((cpu.b >> 14) & 1);
        cpu.b = (cpu.b & SIGN) | ((cpu.b << 1) & MMASK);
        cpu.sc += 1;
    }
}
