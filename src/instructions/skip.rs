//! # Skip Instructions
//!
//! Bits 8..0 of a skip word select conditions to test. With bit 9 set the
//! next word is skipped if any selected condition holds; with bit 9 clear it
//! is skipped if none does. Selecting nothing gives SKP (`100000`, always
//! skip) and NOP (`101000`, never skip).
//!
//! | Bit      | Condition |
//! |----------|-----------|
//! | `000001` | C set |
//! | `000002` | Sense switch 4 |
//! | `000004` | Sense switch 3 |
//! | `000010` | Sense switch 2 |
//! | `000020` | Sense switch 1 |
//! | `000040` | A non-zero |
//! | `000100` | A odd |
//! | `000200` | Memory parity error pending |
//! | `000400` | A negative |

use crate::opcodes::SIGN;
use crate::CPU;

/// Skip on condition true rather than false.
const SKIP_ON_TRUE: u16 = 0o001000;

pub(crate) fn execute(cpu: &mut CPU, ir: u16) {
    let mut any = false;
    if ir & 0o000001 != 0 && cpu.c {
        any = true;
    }
    for (bit, switch) in [(0o020, 1), (0o010, 2), (0o004, 3), (0o002, 4)] {
        if ir & bit != 0 && cpu.sense_switch(switch) {
            any = true;
        }
    }
    if ir & 0o000040 != 0 && cpu.a != 0 {
        any = true;
    }
    if ir & 0o000100 != 0 && cpu.a & 1 != 0 {
        any = true;
    }
    if ir & 0o000200 != 0 && cpu.lines.parity_error() {
        any = true;
    }
    if ir & 0o000400 != 0 && cpu.a & SIGN != 0 {
        any = true;
    }

    if (ir & SKIP_ON_TRUE != 0) == any {
        cpu.skip(1);
    }
}
