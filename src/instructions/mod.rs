//! # 316/516 Instruction Implementations
//!
//! One module per instruction format. Each format is executed by a
//! standalone function taking the CPU and the instruction word.
//!
//! ## Categories
//!
//! - **arith**: Adder primitives shared by the formats (16- and 31-bit add)
//! - **memref**: Memory-reference instructions (JMP, LDA, ..., MPY, DIV)
//! - **control**: Generic A control word (HLT, SGL/DBL, EXA/DXA, RMP, SCA,
//!   INK, NRM, IAB, ENB, INH)
//! - **shifts**: Single and double-length shifts and rotates
//! - **skip**: Conditional skips on C, sense switches, A and parity error
//! - **operate**: Generic B microcoded register operations
//! - **io**: OCP, SKS, INA, OTA and the CPU's own devices

pub mod arith;
pub mod control;
pub mod io;
pub mod memref;
pub mod operate;
pub mod shifts;
pub mod skip;
