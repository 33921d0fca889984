use serde::{Deserialize, Serialize};

use super::codec_error::EncodeError;
use crate::lang::Instruction;
use crate::runtime::{DEFAULT_SAFETY_COUNT, Execution, HaltReason};

/// Wire form of a program and its step ceiling.
///
/// ```json
/// { "program": [ {"op": "C", "args": [2, 0]}, ... ], "safety_count": 100 }
/// ```
///
/// The field names used by the browser visualizer (`instructions`,
/// `operator`, `params`, `safetyLimit`) are accepted as aliases.
///
/// All integers are kept signed so that negative values survive
/// deserialization and [`decode`](super::decode) can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDocument {
    #[serde(alias = "instructions")]
    pub program: Vec<InstructionRecord>,

    #[serde(alias = "safetyLimit", default = "default_safety_count")]
    pub safety_count: i64,
}

fn default_safety_count() -> i64 {
    DEFAULT_SAFETY_COUNT as i64
}

/// One instruction on the wire: a mnemonic tag and its operands in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstructionRecord {
    #[serde(alias = "operator")]
    pub op: String,

    #[serde(alias = "params")]
    pub args: Vec<i64>,
}

impl InstructionRecord {
    pub fn new(op: impl Into<String>, args: Vec<i64>) -> Self {
        Self { op: op.into(), args }
    }

    /// Wire form of the instruction at `position`.
    pub fn from_instruction(position: usize, instruction: &Instruction) -> Result<Self, EncodeError> {
        let args = instruction
            .operands()
            .into_iter()
            .map(|value| {
                i64::try_from(value).map_err(|_| EncodeError::OperandTooLarge { position, value })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(instruction.opcode().mnemonic(), args))
    }
}

/// Wire form of a traced run, as consumed by the visualizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDocument {
    pub serialized_program: ProgramDocument,

    /// Register snapshot after each executed step.
    pub registers_from_steps: Vec<Vec<u64>>,

    /// Instruction executed at each step.
    pub ops_from_steps: Vec<InstructionRecord>,

    pub halt_reason: HaltReason,
}

impl RunDocument {
    pub fn new(serialized_program: ProgramDocument, execution: &Execution) -> Result<Self, EncodeError> {
        let trace = &execution.trace;
        let ops_from_steps = trace
            .iter()
            .map(|step| InstructionRecord::from_instruction(step.pc_before, &step.instruction))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            serialized_program,
            registers_from_steps: trace.iter().map(|step| step.registers.to_vec()).collect(),
            ops_from_steps,
            halt_reason: execution.halt,
        })
    }
}
