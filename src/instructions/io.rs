//! # I/O Instructions
//!
//! OCP (output control pulse), SKS (skip if status), INA (input to A) and
//! OTA (output from A). Bits 9..6 carry the function code and bits 5..0 the
//! device number. For INA, function bit 3 clears A before the transfer and
//! is not passed on to the device.
//!
//! Two device numbers are answered by the CPU itself before the device table
//! is consulted:
//!
//! - **020** (clock/keys): SMK, the extended interrupt mask, OTK and the
//!   memory parity skips. Other 020 functions reach a registered clock.
//! - **024** (DMA control): address and range counters of the DMA channels.

use crate::devices::channels::DMA_IN;
use crate::devices::{undefined_device, IoContext, IoOp, IoResult, DEV_DMA, DEV_KEYS};
use crate::opcodes::{function_field, DEVMASK, INCLRA};
use crate::{StopReason, CPU};
use log::trace;

pub(crate) fn execute(cpu: &mut CPU, op: IoOp, ir: u16) -> Result<(), StopReason> {
    let dev = (ir & DEVMASK) as u8;
    let mut fnc = function_field(ir);

    if op == IoOp::Ina {
        if ir & INCLRA != 0 {
            cpu.a = 0;
        }
        fnc &= 0o7;
    }

    let data = cpu.a;
    let result = dispatch(cpu, op, fnc, data, dev);
    trace!(
        "{:?} {:02o} fnc {:02o}: skip {} data {:06o}",
        op,
        dev,
        fnc,
        result.skip,
        result.data
    );

    match op {
        IoOp::Ina => {
            cpu.a = result.data;
            if result.skip {
                cpu.skip(1);
            }
        }
        IoOp::Sks | IoOp::Ota => {
            if result.skip {
                cpu.skip(1);
            }
        }
        _ => {}
    }

    match result.stop {
        Some(reason) => Err(reason),
        None => Ok(()),
    }
}

/// Routes one I/O pulse: CPU functions first, then the device table, then
/// the undefined-device stub.
fn dispatch(cpu: &mut CPU, op: IoOp, fnc: u8, data: u16, dev: u8) -> IoResult {
    if dev == DEV_KEYS {
        if let Some(result) = keys(cpu, op, fnc, data) {
            return result;
        }
    }
    if dev == DEV_DMA {
        return dma_control(cpu, op, fnc, data);
    }

    let mut ctx = IoContext {
        memory: &mut cpu.memory,
        lines: &mut cpu.lines,
    };
    match cpu.devices.call(dev, op, fnc, data, &mut ctx) {
        Some(result) => result,
        None => undefined_device(dev, data, cpu.config.stop_on_illegal_device),
    }
}

/// Device 020 functions implemented by the CPU.
fn keys(cpu: &mut CPU, op: IoOp, fnc: u8, data: u16) -> Option<IoResult> {
    match (op, fnc) {
        (IoOp::Ota, 0o00) => {
            cpu.lines.set_enable_mask(data);
            Some(IoResult::skip_with_data(data))
        }
        (IoOp::Ota, 0o01) if cpu.config.extended_interrupts => {
            cpu.lines.set_extended_mask(data);
            Some(IoResult::skip_with_data(data))
        }
        (IoOp::Ota, 0o10) => {
            execute_otk(cpu, data);
            Some(IoResult::skip_with_data(data))
        }
        (IoOp::Sks, 0o02) => Some(skip_if(!cpu.lines.parity_error(), data)),
        (IoOp::Sks, 0o12) => Some(skip_if(cpu.lines.parity_error(), data)),
        _ => None,
    }
}

/// OTK: restore C, DP, the addressing mode and SC from A.
fn execute_otk(cpu: &mut CPU, data: u16) {
    cpu.c = data & 0o100000 != 0;
    if cpu.config.high_speed_arithmetic {
        cpu.dp = data & 0o040000 != 0;
    }
    if cpu.config.extended_addressing {
        if data & 0o020000 != 0 {
            cpu.ext = true;
            cpu.extoff_pending = false;
        } else {
            cpu.extoff_pending = true;
        }
    }
    cpu.sc = (data & 0o37) as u8;
}

/// Device 024: DMA channel address and range counters.
///
/// Functions 01..04 address channels 1..4 (011..014 for the range counter).
fn dma_control(cpu: &mut CPU, op: IoOp, fnc: u8, data: u16) -> IoResult {
    let channel = (fnc & 0o7) as usize;
    let range = fnc & 0o10 != 0;
    if !(1..=cpu.config.dma_channels as usize).contains(&channel) {
        return reserved_result(cpu, data);
    }
    let state = &mut cpu.dma[channel - 1];

    match (op, range) {
        (IoOp::Ota, false) => {
            state.load_address(data);
            trace!(
                "DMA{} address {:06o} ({})",
                channel,
                data & !DMA_IN,
                if data & DMA_IN != 0 { "in" } else { "out" }
            );
            IoResult::skip_with_data(data)
        }
        (IoOp::Ota, true) => {
            state.word_count = (state.word_count | data) & 0o077777;
            IoResult::skip_with_data(data)
        }
        // The INA clear-A bit is function bit 3, so INA 011..014 arrives here
        // as 01..04.
        (IoOp::Ina, false) => {
            if state.end_of_range {
                IoResult::data(data)
            } else {
                IoResult::skip_with_data(state.word_count)
            }
        }
        (IoOp::Sks, false) => skip_if(!state.end_of_range, data),
        _ => reserved_result(cpu, data),
    }
}

fn skip_if(condition: bool, data: u16) -> IoResult {
    IoResult {
        skip: condition,
        stop: None,
        data,
    }
}

fn reserved_result(cpu: &CPU, data: u16) -> IoResult {
    IoResult {
        skip: false,
        stop: cpu.reserved().err(),
        data,
    }
}
