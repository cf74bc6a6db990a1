//! Single-step test vectors.
//!
//! Each JSON vector gives an initial machine state, runs one `step()` and
//! lists the registers and memory words expected afterwards, plus the stop
//! the step must report (if any). Words are written as octal strings.

use lib316::{CpuConfig, StopReason, CPU};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Vector {
    name: String,
    initial: State,
    #[serde(rename = "final")]
    expected: State,
    #[serde(default)]
    stop: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct State {
    a: Option<String>,
    b: Option<String>,
    pc: Option<String>,
    c: Option<bool>,
    ext: Option<bool>,
    dp: Option<bool>,
    sc: Option<u8>,
    ram: Vec<(String, String)>,
}

fn octal(s: &str) -> u16 {
    u16::from_str_radix(s, 8).unwrap_or_else(|_| panic!("bad octal word {:?}", s))
}

fn stop_name(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Halt => "halt",
        StopReason::ReservedInstruction => "reserved",
        StopReason::IllegalDevice => "illegal_device",
        StopReason::IndirectLoop { .. } => "indirect_loop",
        StopReason::Breakpoint { .. } => "breakpoint",
        StopReason::WriteBreakpoint { .. } => "write_breakpoint",
        StopReason::DmaError => "dma_error",
        _ => "device",
    }
}

fn setup(state: &State) -> CPU {
    let mut cpu = CPU::new(CpuConfig::default()).unwrap();
    if let Some(ext) = state.ext {
        cpu.set_extended_mode(ext);
    }
    if let Some(dp) = state.dp {
        cpu.set_dp(dp);
    }
    if let Some(c) = state.c {
        cpu.set_c(c);
    }
    if let Some(sc) = state.sc {
        cpu.set_sc(sc);
    }
    if let Some(a) = &state.a {
        cpu.set_a(octal(a));
    }
    if let Some(b) = &state.b {
        cpu.set_b(octal(b));
    }
    if let Some(pc) = &state.pc {
        cpu.set_pc(octal(pc));
    }
    for (addr, value) in &state.ram {
        cpu.memory_mut().write(octal(addr), octal(value));
    }
    cpu
}

fn check(cpu: &CPU, vector: &Vector) {
    let name = &vector.name;
    let expected = &vector.expected;
    if let Some(a) = &expected.a {
        assert_eq!(cpu.a(), octal(a), "{}: A", name);
    }
    if let Some(b) = &expected.b {
        assert_eq!(cpu.b(), octal(b), "{}: B", name);
    }
    if let Some(pc) = &expected.pc {
        assert_eq!(cpu.pc(), octal(pc), "{}: PC", name);
    }
    if let Some(c) = expected.c {
        assert_eq!(cpu.c(), c, "{}: C", name);
    }
    if let Some(ext) = expected.ext {
        assert_eq!(cpu.extended_mode(), ext, "{}: EXT", name);
    }
    if let Some(dp) = expected.dp {
        assert_eq!(cpu.dp(), dp, "{}: DP", name);
    }
    if let Some(sc) = expected.sc {
        assert_eq!(cpu.sc(), sc, "{}: SC", name);
    }
    for (addr, value) in &expected.ram {
        assert_eq!(
            cpu.memory().read(octal(addr)),
            octal(value),
            "{}: memory {}",
            name,
            addr
        );
    }
}

fn run_vectors(json: &str) {
    let vectors: Vec<Vector> = serde_json::from_str(json).expect("vector file");
    assert!(!vectors.is_empty());
    for vector in &vectors {
        let mut cpu = setup(&vector.initial);
        let result = cpu.step();
        let stop = result.err().map(stop_name);
        assert_eq!(stop, vector.stop.as_deref(), "{}: stop", vector.name);
        check(&cpu, vector);
    }
}

#[test]
fn test_memory_reference_vectors() {
    run_vectors(include_str!("vectors/memref.json"));
}

#[test]
fn test_generic_and_io_vectors() {
    run_vectors(include_str!("vectors/generic.json"));
}
