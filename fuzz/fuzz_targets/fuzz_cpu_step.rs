//! Fuzz target for CPU execution.
//!
//! Builds an arbitrary register state and a short program, runs a bounded
//! number of instructions and checks the invariants that must hold whatever
//! the program did.

#![no_main]

use arbitrary::Arbitrary;
use lib316::{CpuConfig, CPU};
use libfuzzer_sys::fuzz_target;

/// Arbitrary CPU initial state for fuzzing
#[derive(Debug, Arbitrary)]
struct FuzzCpuState {
    a: u16,
    b: u16,
    x: u16,
    pc: u16,
    c: bool,
    ext: bool,
    dp: bool,
    sc: u8,
    switches: u8,
}

/// Machine options for fuzzing
#[derive(Debug, Arbitrary)]
struct FuzzOptions {
    /// Installed memory in 4K banks, 1..=8
    banks: u8,
    extended_addressing: bool,
    high_speed_arithmetic: bool,
    extended_interrupts: bool,
    indirect_limit: u8,
}

/// Complete fuzz input
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    options: FuzzOptions,
    cpu_state: FuzzCpuState,
    /// Words loaded at the PC
    program: [u16; 16],
    /// Words loaded at 0100 for memory-reference operands
    data: [u16; 64],
    /// Interrupt lines to raise before running
    lines: u16,
    steps: u8,
}

fuzz_target!(|input: FuzzInput| {
    let options = &input.options;
    let config = CpuConfig::default()
        .with_memory_size((options.banks as usize % 8 + 1) * 4096)
        .with_extended_addressing(options.extended_addressing)
        .with_high_speed_arithmetic(options.high_speed_arithmetic)
        .with_extended_interrupts(options.extended_interrupts)
        .with_indirect_limit(options.indirect_limit as u32 % 32 + 1)
        .with_history(64);
    let mut cpu = match CPU::new(config) {
        Ok(cpu) => cpu,
        Err(_) => return,
    };

    let state = &input.cpu_state;
    cpu.set_extended_mode(state.ext && options.extended_addressing);
    cpu.set_pc(state.pc);
    cpu.set_a(state.a);
    cpu.set_b(state.b);
    cpu.set_x(state.x);
    cpu.set_c(state.c);
    cpu.set_dp(state.dp);
    cpu.set_sc(state.sc);
    for n in 1..=4u8 {
        cpu.set_sense_switch(n, state.switches & (1 << (n - 1)) != 0);
    }

    let pc = cpu.pc();
    cpu.memory_mut().load(pc, &input.program);
    cpu.memory_mut().load(0o100, &input.data);
    for line in 0..16u8 {
        if input.lines & (1 << line) != 0 {
            cpu.lines_mut().request(line);
        }
    }

    // Stops are fine, panics are not
    let _ = cpu.run(input.steps as u64);

    assert!(cpu.pc() <= 0o077777);
    assert!(cpu.sc() <= 0o77);
    assert!(cpu.history().len() <= 64);
    if !options.extended_addressing {
        assert!(!cpu.extended_mode());
    }
});
