use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::registers::RegisterBank;
use super::runtime_error::RegisterError;
use super::trace::{NoopRecorder, Recorder, Trace, TraceRecorder};
use crate::lang::{Address, Instruction, Program};

/// Step ceiling used when neither the caller nor the program document sets one.
pub const DEFAULT_SAFETY_COUNT: u64 = 10_000;

/// Register extent allowed by default. Every trace step copies the whole
/// bank, so this also bounds trace memory to `safety_count * 1024` values.
pub const DEFAULT_MAX_REGISTERS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum number of instructions a single run may execute.
    pub safety_count: u64,
    /// Registers a run may use. Both the program's highest register and the
    /// initial bank must stay below it.
    pub max_registers: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            safety_count: DEFAULT_SAFETY_COUNT,
            max_registers: DEFAULT_MAX_REGISTERS,
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HaltReason {
    /// The program counter left the program. This is how a computation
    /// finishes normally.
    EndOfProgram,
    /// The step ceiling was reached while the program counter was still
    /// inside the program. Self-jump "halts" always end this way.
    StepLimitExceeded,
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::EndOfProgram => write!(f, "end of program"),
            HaltReason::StepLimitExceeded => write!(f, "step limit exceeded"),
        }
    }
}

/// Engine state between two steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running { pc: Address, steps: u64 },
    Halted(HaltReason),
}

// =============================================================================
// MACHINE - one run in progress
// =============================================================================

/// A single run of a program against its own register bank.
#[derive(Debug)]
pub struct Machine<'p> {
    program: &'p Program,
    registers: RegisterBank,
    safety_count: u64,
    pc: Address,
    steps: u64,
    halted: Option<HaltReason>,
}

impl<'p> Machine<'p> {
    /// Prepares a run. The bank is grown to cover every register the program
    /// references before the first step.
    ///
    /// # Errors
    /// - `BeyondLimit` if the program or the initial bank reaches past
    ///   `config.max_registers`. Nothing is allocated in that case.
    pub fn new(
        program: &'p Program,
        mut registers: RegisterBank,
        config: VmConfig,
    ) -> Result<Self, RegisterError> {
        let highest = program
            .highest_address()
            .max(registers.size().saturating_sub(1));
        if highest >= config.max_registers {
            return Err(RegisterError::BeyondLimit {
                index: highest,
                limit: config.max_registers,
            });
        }
        registers.ensure_size(highest + 1);

        Ok(Self {
            program,
            registers,
            safety_count: config.safety_count,
            pc: 0,
            steps: 0,
            halted: None,
        })
    }

    pub fn state(&self) -> State {
        match self.halted {
            Some(reason) => State::Halted(reason),
            None => State::Running {
                pc: self.pc,
                steps: self.steps,
            },
        }
    }

    pub fn registers(&self) -> &RegisterBank {
        &self.registers
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advances by at most one instruction and returns the new state.
    ///
    /// Once halted, further calls leave the machine untouched.
    pub fn step<R>(&mut self, recorder: &mut R) -> State
    where
        R: ?Sized + Recorder,
    {
        if self.halted.is_some() {
            return self.state();
        }

        let pc = self.pc;
        let Some(&instruction) = self.program.get(pc) else {
            self.halted = Some(HaltReason::EndOfProgram);
            return self.state();
        };

        if self.steps == self.safety_count {
            self.halted = Some(HaltReason::StepLimitExceeded);
            return self.state();
        }

        let next = self.execute(pc, instruction);
        trace!(step = self.steps, pc, next, %instruction, "executed");
        recorder.record(instruction, pc, next, &self.registers);

        self.pc = next;
        self.steps += 1;
        self.state()
    }

    /// Runs until the machine halts.
    pub fn run<R>(mut self, recorder: &mut R) -> Outcome
    where
        R: ?Sized + Recorder,
    {
        let halt = loop {
            if let State::Halted(reason) = self.step(recorder) {
                break reason;
            }
        };
        Outcome {
            registers: self.registers,
            halt,
            steps: self.steps,
        }
    }

    /// Applies `instruction` and returns the next program counter.
    fn execute(&mut self, pc: Address, instruction: Instruction) -> Address {
        match instruction {
            Instruction::Zero(r) => {
                self.registers.set(r, 0);
                pc + 1
            }
            Instruction::Successor(r) => {
                let value = self.registers.get(r).saturating_add(1);
                self.registers.set(r, value);
                pc + 1
            }
            Instruction::Copy { src, dst } => {
                let value = self.registers.get(src);
                self.registers.set(dst, value);
                pc + 1
            }
            Instruction::Jump { a, b, target } => {
                if self.registers.get(a) == self.registers.get(b) {
                    target
                } else {
                    pc + 1
                }
            }
        }
    }
}

/// Result of a run without a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub registers: RegisterBank,
    pub halt: HaltReason,
    pub steps: u64,
}

/// Result of a traced run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub registers: RegisterBank,
    pub halt: HaltReason,
    pub trace: Trace,
}

impl Execution {
    pub fn steps(&self) -> usize {
        self.trace.len()
    }

    /// Whether the program ran to completion instead of exhausting its budget.
    pub fn completed(&self) -> bool {
        self.halt == HaltReason::EndOfProgram
    }
}

// =============================================================================
// VM - run entry points
// =============================================================================

/// Runs URM programs under a fixed [`VmConfig`].
///
/// Holds no per-run state: every call builds its own [`Machine`], so one `Vm`
/// can serve any number of runs, including concurrent ones.
#[derive(Debug, Clone, Default)]
pub struct Vm {
    config: VmConfig,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self { config }
    }

    pub fn with_safety_count(safety_count: u64) -> Self {
        Self::with_config(VmConfig {
            safety_count,
            ..VmConfig::default()
        })
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Runs `program` and records the full trace.
    ///
    /// Only the register limit is checked up front; once the first step is
    /// taken the run always produces an [`Execution`].
    pub fn run(&self, program: &Program, registers: RegisterBank) -> Result<Execution, RegisterError> {
        let machine = Machine::new(program, registers, self.config)?;
        let mut recorder = TraceRecorder::new(machine.registers());
        let outcome = self.drive(machine, &mut recorder);
        let trace = recorder.finish(&outcome.registers);
        Ok(Execution {
            registers: outcome.registers,
            halt: outcome.halt,
            trace,
        })
    }

    /// Runs `program`, reporting each step to `recorder`.
    pub fn run_with<R>(
        &self,
        program: &Program,
        registers: RegisterBank,
        recorder: &mut R,
    ) -> Result<Outcome, RegisterError>
    where
        R: ?Sized + Recorder,
    {
        let machine = Machine::new(program, registers, self.config)?;
        Ok(self.drive(machine, recorder))
    }

    /// Runs `program` without keeping a trace.
    pub fn run_untraced(&self, program: &Program, registers: RegisterBank) -> Result<Outcome, RegisterError> {
        self.run_with(program, registers, &mut NoopRecorder)
    }

    #[instrument(level = "debug", skip_all, fields(instructions = machine.program.len(), safety_count = self.config.safety_count))]
    fn drive<R>(&self, machine: Machine<'_>, recorder: &mut R) -> Outcome
    where
        R: ?Sized + Recorder,
    {
        let outcome = machine.run(recorder);
        debug!(halt = ?outcome.halt, steps = outcome.steps, "run finished");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================
    // Test Helpers
    // ============================================================

    fn run(program: &Program, registers: Vec<u64>, safety_count: u64) -> Execution {
        Vm::with_safety_count(safety_count)
            .run(program, RegisterBank::from_values(registers))
            .unwrap()
    }

    #[test]
    fn test_zero() {
        let program = Program::new().zero(0);
        let execution = run(&program, vec![5], 10);
        assert_eq!(execution.registers.get(0), 0);
        assert_eq!(execution.halt, HaltReason::EndOfProgram);
        assert_eq!(execution.steps(), 1);
    }

    #[test]
    fn test_successor() {
        let program = Program::new().successor(1).successor(1);
        let execution = run(&program, vec![0, 3], 10);
        assert_eq!(execution.registers.as_slice(), &[0, 5]);
    }

    #[test]
    fn test_successor_saturates() {
        let program = Program::new().successor(0);
        let execution = run(&program, vec![u64::MAX], 10);
        assert_eq!(execution.registers.get(0), u64::MAX);
    }

    #[test]
    fn test_copy() {
        let program = Program::new().copy(0, 2);
        let execution = run(&program, vec![9], 10);
        assert_eq!(execution.registers.as_slice(), &[9, 0, 9]);
    }

    #[test]
    fn test_jump_taken_and_not_taken() {
        // r0 == r1 -> skip the successor
        let program = Program::new().jump(0, 1, 2).successor(2);
        let taken = run(&program, vec![4, 4], 10);
        assert_eq!(taken.registers.get(2), 0);
        assert_eq!(taken.trace.steps()[0].pc_after, 2);

        let not_taken = run(&program, vec![4, 5], 10);
        assert_eq!(not_taken.registers.get(2), 1);
        assert_eq!(not_taken.trace.steps()[0].pc_after, 1);
    }

    #[test]
    fn test_jump_past_end_halts() {
        let program = Program::new().jump(0, 0, 1_000).successor(0);
        let execution = run(&program, vec![], 10);
        assert_eq!(execution.halt, HaltReason::EndOfProgram);
        assert_eq!(execution.steps(), 1);
        assert_eq!(execution.registers.get(0), 0);
    }

    #[test]
    fn test_self_jump_exhausts_budget() {
        let program = Program::new().jump(0, 0, 0);
        let execution = run(&program, vec![], 25);
        assert_eq!(execution.halt, HaltReason::StepLimitExceeded);
        assert_eq!(execution.steps(), 25);
        assert!(!execution.completed());
    }

    #[test]
    fn test_empty_program_ends_immediately() {
        let execution = run(&Program::new(), vec![1, 2], 10);
        assert_eq!(execution.halt, HaltReason::EndOfProgram);
        assert!(execution.trace.is_empty());
        assert_eq!(execution.registers.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_end_of_program_wins_over_exhausted_budget() {
        // Exactly `safety_count` steps and then the pc leaves the program.
        let program = Program::new().successor(0).successor(0);
        let execution = run(&program, vec![0], 2);
        assert_eq!(execution.halt, HaltReason::EndOfProgram);
        assert_eq!(execution.steps(), 2);
    }

    #[test]
    fn test_zero_budget() {
        let program = Program::new().successor(0);
        let execution = run(&program, vec![0], 0);
        assert_eq!(execution.halt, HaltReason::StepLimitExceeded);
        assert!(execution.trace.is_empty());
        assert_eq!(execution.registers.get(0), 0);
    }

    #[test]
    fn test_registers_grown_to_program_extent() {
        let program = Program::new().successor(4);
        let execution = run(&program, vec![], 10);
        assert_eq!(execution.trace.initial_registers().len(), 5);
        assert_eq!(execution.registers.as_slice(), &[0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_trace_records_post_effect_snapshots() {
        let program = Program::new().successor(0).copy(0, 1).zero(0);
        let execution = run(&program, vec![0, 0], 10);
        let snapshots: Vec<Vec<u64>> = execution
            .trace
            .iter()
            .map(|step| step.registers.to_vec())
            .collect();
        assert_eq!(snapshots, vec![vec![1, 0], vec![1, 1], vec![0, 1]]);

        let pcs: Vec<(usize, usize)> = execution
            .trace
            .iter()
            .map(|step| (step.pc_before, step.pc_after))
            .collect();
        assert_eq!(pcs, vec![(0, 1), (1, 2), (2, 3)]);
        assert_eq!(&**execution.trace.final_registers(), &[0, 1]);
    }

    #[test]
    fn test_machine_step_by_step() {
        let program = Program::new().successor(0);
        let mut machine = Machine::new(&program, RegisterBank::new(), VmConfig::default()).unwrap();
        assert_eq!(machine.state(), State::Running { pc: 0, steps: 0 });
        assert_eq!(
            machine.step(&mut NoopRecorder),
            State::Running { pc: 1, steps: 1 }
        );
        assert_eq!(
            machine.step(&mut NoopRecorder),
            State::Halted(HaltReason::EndOfProgram)
        );
        // halted machines stay halted
        assert_eq!(
            machine.step(&mut NoopRecorder),
            State::Halted(HaltReason::EndOfProgram)
        );
        assert_eq!(machine.steps(), 1);
        assert_eq!(machine.registers().get(0), 1);
    }

    #[test]
    fn test_untraced_run_matches_traced_run() {
        let program = Program::new().jump(0, 1, 4).successor(1).successor(2).jump(0, 0, 0);
        let vm = Vm::with_safety_count(100);
        let traced = vm.run(&program, RegisterBank::from_values(vec![3])).unwrap();
        let untraced = vm
            .run_untraced(&program, RegisterBank::from_values(vec![3]))
            .unwrap();
        assert_eq!(traced.registers, untraced.registers);
        assert_eq!(traced.halt, untraced.halt);
        assert_eq!(traced.steps() as u64, untraced.steps);
    }

    #[test]
    fn test_default_config() {
        assert_eq!(Vm::new().config().safety_count, DEFAULT_SAFETY_COUNT);
        assert_eq!(
            Vm::with_safety_count(5).config().max_registers,
            DEFAULT_MAX_REGISTERS
        );
    }

    #[test]
    fn test_register_beyond_limit_is_rejected_before_allocating() {
        // Growing a bank this far would exhaust memory.
        let program = Program::new().zero(35_184_372_088_832);
        let err = Vm::new().run(&program, RegisterBank::new()).unwrap_err();
        assert_eq!(
            err,
            RegisterError::BeyondLimit {
                index: 35_184_372_088_832,
                limit: DEFAULT_MAX_REGISTERS
            }
        );

        let program = Program::new().successor(usize::MAX);
        assert!(Vm::new().run_untraced(&program, RegisterBank::new()).is_err());
    }

    #[test]
    fn test_initial_bank_counts_against_limit() {
        let vm = Vm::with_config(VmConfig {
            safety_count: 10,
            max_registers: 4,
        });
        let program = Program::new().successor(0);

        let err = vm
            .run(&program, RegisterBank::allocate(5))
            .unwrap_err();
        assert_eq!(err, RegisterError::BeyondLimit { index: 4, limit: 4 });

        let execution = vm.run(&program, RegisterBank::allocate(4)).unwrap();
        assert_eq!(execution.registers.as_slice(), &[1, 0, 0, 0]);
        assert!(vm.run(&Program::new().zero(3), RegisterBank::new()).is_ok());
        assert!(vm.run(&Program::new().zero(4), RegisterBank::new()).is_err());
    }
}
