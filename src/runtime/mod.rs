pub mod registers;
pub mod runtime_error;
pub mod trace;
pub mod vm;

pub use registers::{RegisterBank, Snapshot};
pub use runtime_error::RegisterError;
pub use trace::{NoopRecorder, Recorder, Step, Trace, TraceRecorder};
pub use vm::{DEFAULT_MAX_REGISTERS, DEFAULT_SAFETY_COUNT, Execution, HaltReason, Machine, Outcome, State, Vm, VmConfig};
