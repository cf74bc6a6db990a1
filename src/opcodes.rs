//! # Instruction Formats
//!
//! A 316/516 instruction is one 16-bit word. The top six bits select the
//! format:
//!
//! | Bits 15..10 | Class |
//! |-------------|-------|
//! | `000`       | Control (generic A) |
//! | `020`       | Shift |
//! | `040`       | Skip |
//! | `060`       | Operate (generic B) |
//! | `x14`       | I/O: OCP, SKS, INA, OTA |
//! | other       | Memory reference |
//!
//! Memory-reference words are laid out as:
//!
//! ```text
//!  15  14  13..10  9   8..0
//! +---+---+------+---+------+
//! | I | X |  op  | S | disp |
//! +---+---+------+---+------+
//! ```
//!
//! The indirect (I) and index (X) bits are part of the six-bit opcode field,
//! so each memory-reference operation appears under four opcode values. STX
//! and LDX reuse the index bit to tell themselves apart.

use crate::devices::IoOp;

/// Indirect address bit.
pub const IA: u16 = 0o100000;

/// Index bit.
pub const IDX: u16 = 0o040000;

/// Current-sector bit.
pub const SC: u16 = 0o001000;

/// Page displacement.
pub const DISP: u16 = 0o000777;

/// Page number bits of an address.
pub const PAGENO: u16 = 0o077000;

/// INA "clear A first" function bit.
pub const INCLRA: u16 = 0o010 << 6;

/// Device number field of an I/O instruction.
pub const DEVMASK: u16 = 0o000077;

/// Shift count field of a shift instruction.
pub const SHFMASK: u16 = 0o000077;

/// Sign bit.
pub const SIGN: u16 = 0o100000;

/// Magnitude bits.
pub const MMASK: u16 = 0o077777;

/// Sign bit of a 31-bit double word.
pub const DP_SIGN: u32 = 0o10000000000;

/// Returns the six-bit opcode field (bits 15..10).
pub fn opcode_field(ir: u16) -> u16 {
    (ir >> 10) & 0o77
}

/// Returns the four-bit function field (bits 9..6).
pub fn function_field(ir: u16) -> u8 {
    ((ir >> 6) & 0o17) as u8
}

/// Memory-reference operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    /// Jump
    Jmp,
    /// Load A
    Lda,
    /// AND to A
    Ana,
    /// Store A
    Sta,
    /// Exclusive OR to A
    Era,
    /// Add
    Add,
    /// Subtract
    Sub,
    /// Jump and store location
    Jst,
    /// Compare and skip
    Cas,
    /// Increment, replace and skip
    Irs,
    /// Interchange memory and A
    Ima,
    /// Store X
    Stx,
    /// Load X
    Ldx,
    /// Multiply (high-speed arithmetic)
    Mpy,
    /// Divide (high-speed arithmetic)
    Div,
}

impl MemoryOp {
    /// Assembler mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            MemoryOp::Jmp => "JMP",
            MemoryOp::Lda => "LDA",
            MemoryOp::Ana => "ANA",
            MemoryOp::Sta => "STA",
            MemoryOp::Era => "ERA",
            MemoryOp::Add => "ADD",
            MemoryOp::Sub => "SUB",
            MemoryOp::Jst => "JST",
            MemoryOp::Cas => "CAS",
            MemoryOp::Irs => "IRS",
            MemoryOp::Ima => "IMA",
            MemoryOp::Stx => "STX",
            MemoryOp::Ldx => "LDX",
            MemoryOp::Mpy => "MPY",
            MemoryOp::Div => "DIV",
        }
    }
}

/// The six instruction formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionClass {
    /// Memory reference
    MemoryReference(MemoryOp),
    /// Control (HLT, SGL/DBL, EXA/DXA, RMP, SCA/INK, NRM, IAB, ENB, INH)
    Control,
    /// Shift and rotate
    Shift,
    /// Skip
    Skip,
    /// Operate
    Operate,
    /// I/O (OCP, SKS, INA, OTA)
    Io(IoOp),
}

/// Decodes the instruction class of a word.
///
/// # Examples
///
/// ```
/// use lib316::{InstructionClass, MemoryOp};
/// use lib316::opcodes::decode;
///
/// assert_eq!(decode(0o004010), InstructionClass::MemoryReference(MemoryOp::Lda));
/// assert_eq!(decode(0o002010), InstructionClass::MemoryReference(MemoryOp::Jmp));
/// assert_eq!(decode(0o120063), InstructionClass::MemoryReference(MemoryOp::Jst));
/// assert_eq!(decode(0o140040), InstructionClass::Operate);
/// ```
pub fn decode(ir: u16) -> InstructionClass {
    let op = opcode_field(ir);
    match op & 0o17 {
        0o00 => match op {
            0o00 => InstructionClass::Control,
            0o20 => InstructionClass::Shift,
            0o40 => InstructionClass::Skip,
            _ => InstructionClass::Operate,
        },
        0o14 => match op {
            0o14 => InstructionClass::Io(IoOp::Ocp),
            0o34 => InstructionClass::Io(IoOp::Sks),
            0o54 => InstructionClass::Io(IoOp::Ina),
            _ => InstructionClass::Io(IoOp::Ota),
        },
        0o15 => {
            if ir & IDX == 0 {
                InstructionClass::MemoryReference(MemoryOp::Stx)
            } else {
                InstructionClass::MemoryReference(MemoryOp::Ldx)
            }
        }
        low => InstructionClass::MemoryReference(match low {
            0o01 => MemoryOp::Jmp,
            0o02 => MemoryOp::Lda,
            0o03 => MemoryOp::Ana,
            0o04 => MemoryOp::Sta,
            0o05 => MemoryOp::Era,
            0o06 => MemoryOp::Add,
            0o07 => MemoryOp::Sub,
            0o10 => MemoryOp::Jst,
            0o11 => MemoryOp::Cas,
            0o12 => MemoryOp::Irs,
            0o13 => MemoryOp::Ima,
            0o16 => MemoryOp::Mpy,
            _ => MemoryOp::Div,
        }),
    }
}
