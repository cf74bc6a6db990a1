//! Property-based tests for the adder primitives and the operate evaluator.
//!
//! These tests check the 316 overflow rule against plain integer arithmetic
//! across all operand combinations proptest explores.

use lib316::{add16, add31, operate, CpuConfig, CPU};
use proptest::prelude::*;

const DP_MASK: u32 = 0o17777777777;

/// Sign-extends a 31-bit double word.
fn sext31(v: u32) -> i64 {
    ((v << 1) as i32 >> 1) as i64
}

proptest! {
    /// Property: add16 is the wrapping sum, with C set exactly when the
    /// signed sum leaves the 16-bit range
    #[test]
    fn prop_add16_matches_signed_sum(a in any::<u16>(), b in any::<u16>()) {
        let (sum, overflow) = add16(a, b);
        let exact = a as i16 as i32 + b as i16 as i32;

        prop_assert_eq!(sum, a.wrapping_add(b));
        prop_assert_eq!(overflow, exact != sum as i16 as i32);
    }

    /// Property: add31 overflow is judged on the 31-bit signed range
    #[test]
    fn prop_add31_matches_signed_sum(a in 0..=DP_MASK, b in 0..=DP_MASK) {
        let (sum, overflow) = add31(a, b);
        let exact = sext31(a) + sext31(b);

        prop_assert_eq!(sum & DP_MASK, a.wrapping_add(b) & DP_MASK);
        prop_assert_eq!(overflow, exact != sext31(sum & DP_MASK));
    }

    /// Property: ADD then SUB of the same word restores A
    #[test]
    fn prop_add_sub_round_trip(a in any::<u16>(), m in any::<u16>()) {
        let mut cpu = CPU::new(CpuConfig::default()).unwrap();
        cpu.set_pc(0o1000);
        cpu.set_a(a);
        cpu.memory_mut().write(0o200, m);
        // ADD 0200, SUB 0200
        cpu.memory_mut().load(0o1000, &[0o014200, 0o016200]);

        cpu.run(2).unwrap();

        prop_assert_eq!(cpu.a(), a);
    }

    /// Property: MPY gives the exact signed product in A'B
    #[test]
    fn prop_mpy_exact(a in any::<u16>(), m in any::<u16>()) {
        // -32768 squared does not fit in 31 bits
        prop_assume!(a != 0o100000 || m != 0o100000);
        let mut cpu = CPU::new(CpuConfig::default()).unwrap();
        cpu.set_pc(0o1000);
        cpu.set_a(a);
        cpu.memory_mut().write(0o200, m);
        cpu.memory_mut().write(0o1000, 0o034200);

        cpu.step().unwrap();

        let product = (cpu.a() as i16 as i64) * 32768 + (cpu.b() & 0o077777) as i64;
        prop_assert_eq!(product, a as i16 as i64 * m as i16 as i64);
        prop_assert_eq!(cpu.b() & 0o100000, 0);
    }

    /// Property: CMA twice restores A and never touches C
    #[test]
    fn prop_cma_involution(a in any::<u16>(), c in any::<bool>()) {
        let once = operate(0o140401, a, c);
        prop_assert_eq!(once, (!a, c));
        prop_assert_eq!(operate(0o140401, once.0, once.1), (a, c));
    }

    /// Property: ICA twice restores A
    #[test]
    fn prop_ica_involution(a in any::<u16>(), c in any::<bool>()) {
        let (swapped, c1) = operate(0o141340, a, c);
        prop_assert_eq!(operate(0o141340, swapped, c1), (a, c));
    }
}
