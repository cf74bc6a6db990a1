//! Integration tests for shift and rotate instructions at their count limits.

use lib316::{CpuConfig, StopReason, CPU};

/// Shift word for `kind` and `count`.
fn shift(kind: u16, count: u16) -> u16 {
    0o040000 | (kind << 6) | (count.wrapping_neg() & 0o77)
}

fn setup_cpu() -> CPU {
    let mut cpu = CPU::new(CpuConfig::default()).unwrap();
    cpu.set_pc(0o1000);
    cpu
}

fn exec(cpu: &mut CPU, ir: u16) -> Result<(), StopReason> {
    let pc = cpu.pc();
    cpu.memory_mut().write(pc, ir);
    cpu.step()
}

#[test]
fn test_lrl_16_moves_a_into_b() {
    let mut cpu = setup_cpu();
    cpu.set_a(0o123456);
    cpu.set_b(0);

    exec(&mut cpu, shift(0o00, 16)).unwrap();

    assert_eq!((cpu.a(), cpu.b()), (0, 0o123456));
    assert!(!cpu.c());
}

#[test]
fn test_lgl_16_clears_a() {
    let mut cpu = setup_cpu();
    cpu.set_a(0o123457);

    exec(&mut cpu, shift(0o14, 16)).unwrap();

    assert_eq!(cpu.a(), 0);
    assert!(cpu.c());
}

#[test]
fn test_lgr_63_clears_a_and_c() {
    let mut cpu = setup_cpu();
    cpu.set_a(0o177777);
    cpu.set_c(true);

    exec(&mut cpu, shift(0o04, 63)).unwrap();

    assert_eq!(cpu.a(), 0);
    assert!(!cpu.c());
}

#[test]
fn test_ars_past_width_fills_with_sign() {
    let mut cpu = setup_cpu();
    cpu.set_a(0o100000);

    exec(&mut cpu, shift(0o05, 20)).unwrap();

    assert_eq!(cpu.a(), 0o177777);
    assert!(cpu.c());
}

#[test]
fn test_lrr_32_is_identity() {
    let mut cpu = setup_cpu();
    cpu.set_a(0o123456);
    cpu.set_b(0o054321);

    exec(&mut cpu, shift(0o02, 32)).unwrap();

    assert_eq!((cpu.a(), cpu.b()), (0o123456, 0o054321));
}

#[test]
fn test_shifts_leave_pc_and_sc() {
    let mut cpu = setup_cpu();
    cpu.set_sc(0o12);
    cpu.set_a(1);

    exec(&mut cpu, shift(0o16, 3)).unwrap();

    assert_eq!(cpu.a(), 0o10);
    assert_eq!(cpu.sc(), 0o12);
    assert_eq!(cpu.pc(), 0o1001);
}

/// CPU that runs the undocumented shift codes instead of stopping
fn setup_permissive_cpu() -> CPU {
    let config = CpuConfig::default().with_stop_on_illegal_instruction(false);
    let mut cpu = CPU::new(config).unwrap();
    cpu.set_pc(0o1000);
    cpu
}

/// Runs shift `kind` by `count` from A, B and C and returns the new A, B, C
fn run_shift(kind: u16, count: u16, a: u16, b: u16, c: bool) -> (u16, u16, bool) {
    let mut cpu = setup_permissive_cpu();
    cpu.set_a(a);
    cpu.set_b(b);
    cpu.set_c(c);
    exec(&mut cpu, shift(kind, count)).unwrap();
    assert_eq!(cpu.pc(), 0o1001);
    (cpu.a(), cpu.b(), cpu.c())
}

#[test]
fn test_undocumented_shifts_stop_by_default() {
    for kind in [0o03, 0o07, 0o13, 0o17] {
        let mut cpu = setup_cpu();
        assert_eq!(
            exec(&mut cpu, shift(kind, 1)),
            Err(StopReason::ReservedInstruction)
        );
    }
}

#[test]
fn test_code_003_long_right_carries_b_into_a_sign() {
    // B bit 0 goes to C and A bit 15, A bit 0 goes to B bit 14
    assert_eq!(
        run_shift(0o03, 1, 0o000001, 0o000001, false),
        (0o100000, 0o040000, true)
    );
    assert_eq!(
        run_shift(0o03, 1, 0o000000, 0o000002, true),
        (0o000000, 0o000001, false)
    );
    // A's sign is kept and also shifts down each pass
    assert_eq!(
        run_shift(0o03, 3, 0o100002, 0o000005, true),
        (0o170000, 0o020000, true)
    );
}

#[test]
fn test_code_013_long_left_keeps_b_sign() {
    // A bit 15 leaves into C and B bit 0, B bit 14 enters A bit 0
    assert_eq!(
        run_shift(0o13, 1, 0o100000, 0o040000, false),
        (0o000001, 0o000001, true)
    );
    assert_eq!(
        run_shift(0o13, 1, 0o000001, 0o000000, true),
        (0o000002, 0o000000, false)
    );
    assert_eq!(
        run_shift(0o13, 2, 0o040001, 0o100003, true),
        (0o000004, 0o100015, true)
    );
}

#[test]
fn test_code_017_rotates_a_and_only_sets_c() {
    assert_eq!(
        run_shift(0o17, 1, 0o040000, 0o7, false),
        (0o100000, 0o7, true)
    );
    // No sign change: C keeps its old value either way
    assert_eq!(run_shift(0o17, 2, 0o000003, 0, true), (0o000014, 0, true));
    assert_eq!(run_shift(0o17, 2, 0o000003, 0, false), (0o000014, 0, false));
    // Sign changes on the second pass only
    assert_eq!(
        run_shift(0o17, 3, 0o140000, 0, false),
        (0o000006, 0, true)
    );
}
