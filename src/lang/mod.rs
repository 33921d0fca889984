//! # URM program model
//!
//! Instructions, programs, and their human-readable listing.
//!
//! ## Conventions
//!
//! - Registers and instruction addresses are 0-based.
//! - Instructions are written `Z(r)`, `S(r)`, `C(src, dst)` and `J(a, b, target)`.

pub mod disasm;
pub mod instruction;
pub mod program;

pub use instruction::{Address, Instruction, Opcode, Register};
pub use program::{Program, highest_address};
