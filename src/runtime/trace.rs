//! Step recording for the URM engine.
//!
//! The engine reports every executed step to a [`Recorder`]. [`TraceRecorder`]
//! keeps a full [`Trace`]; [`NoopRecorder`] drops everything, for callers that
//! only want the final registers.

use super::registers::{RegisterBank, Snapshot};
use crate::lang::{Address, Instruction};

/// Callbacks invoked by the engine while a program runs.
#[allow(unused_variables)]
pub trait Recorder {
    /// Called once per executed step, after the instruction's effect has been
    /// applied to `registers`.
    fn record(
        &mut self,
        instruction: Instruction,
        pc_before: Address,
        pc_after: Address,
        registers: &RegisterBank,
    ) {
    }
}

/// A [`Recorder`] that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;
impl Recorder for NoopRecorder {}

/// One executed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub instruction: Instruction,
    /// Registers after the instruction was applied.
    pub registers: Snapshot,
    pub pc_before: Address,
    pub pc_after: Address,
}

/// Replayable history of a run.
///
/// Append-only while the run is in progress; read-only once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    initial: Snapshot,
    steps: Vec<Step>,
    last: Snapshot,
}

impl Trace {
    pub fn initial_registers(&self) -> &Snapshot {
        &self.initial
    }

    pub fn final_registers(&self) -> &Snapshot {
        &self.last
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

/// Collects every step into a [`Trace`].
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    initial: Snapshot,
    steps: Vec<Step>,
}

impl TraceRecorder {
    /// Starts a trace from the registers the run begins with.
    pub fn new(initial: &RegisterBank) -> Self {
        Self {
            initial: initial.snapshot(),
            steps: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn finish(self, registers: &RegisterBank) -> Trace {
        Trace {
            initial: self.initial,
            steps: self.steps,
            last: registers.snapshot(),
        }
    }
}

impl Recorder for TraceRecorder {
    fn record(
        &mut self,
        instruction: Instruction,
        pc_before: Address,
        pc_after: Address,
        registers: &RegisterBank,
    ) {
        self.steps.push(Step {
            instruction,
            registers: registers.snapshot(),
            pc_before,
            pc_after,
        });
    }
}
