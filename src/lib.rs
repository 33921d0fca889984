//! # URM
//!
//! A simulator for the Unlimited Register Machine: an unbounded bank of
//! non-negative integer registers driven by four instructions (`Z`, `S`,
//! `C`, `J`).
//!
//! - [`lang`]: instructions, programs and their listing.
//! - [`runtime`]: register bank, the step-bounded engine and its trace.
//! - [`codec`]: the JSON/binary program document and the run-result document.
//! - [`frontend`]: the text listing syntax (`C(2, 0)`).
//! - [`service`]: JSON request handlers for a visualizer backend.
//!
//! ```
//! use urm::lang::Program;
//! use urm::runtime::{HaltReason, RegisterBank, Vm};
//!
//! // r0 := r1 + r2, then bounce between the two jumps until the budget runs out
//! let add = Program::new()
//!     .copy(2, 0)
//!     .zero(2)
//!     .jump(1, 2, 5)
//!     .successor(0)
//!     .successor(2)
//!     .jump(3, 3, 2);
//!
//! let execution = Vm::with_safety_count(100)
//!     .run(&add, RegisterBank::from_values(vec![0, 7, 8]))
//!     .unwrap();
//! assert_eq!(execution.registers.get(0), 15);
//! assert_eq!(execution.halt, HaltReason::StepLimitExceeded);
//! ```

pub mod codec;
pub mod frontend;
pub mod lang;
pub mod runtime;
pub mod service;

pub use codec::{ProgramDocument, RunDocument, decode, encode};
pub use lang::{Instruction, Program, highest_address};
pub use runtime::{Execution, HaltReason, RegisterBank, Vm, VmConfig};
