use thiserror::Error;

/// A structural violation found while decoding a [`ProgramDocument`](super::ProgramDocument).
///
/// `position` is the 0-based index of the offending instruction record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedProgram {
    #[error("instruction {position}: unknown op `{op}` (expected one of Z, S, C, J)")]
    UnknownOp { position: usize, op: String },

    #[error("instruction {position}: `{op}` takes {expected} argument(s), got {found}")]
    WrongArity {
        position: usize,
        op: String,
        expected: usize,
        found: usize,
    },

    #[error("instruction {position}: negative operand {value}")]
    NegativeOperand { position: usize, value: i64 },

    #[error("instruction {position}: operand {value} does not fit a register index")]
    OperandOutOfRange { position: usize, value: i64 },

    #[error("negative safety count {0}")]
    NegativeSafetyCount(i64),
}

impl MalformedProgram {
    /// Index of the offending instruction record, if the violation is tied
    /// to one.
    pub fn position(&self) -> Option<usize> {
        match self {
            MalformedProgram::UnknownOp { position, .. }
            | MalformedProgram::WrongArity { position, .. }
            | MalformedProgram::NegativeOperand { position, .. }
            | MalformedProgram::OperandOutOfRange { position, .. } => Some(*position),
            MalformedProgram::NegativeSafetyCount(_) => None,
        }
    }
}

/// A program that has no wire form.
///
/// Document integers are signed 64-bit, so register indices, jump targets
/// and safety counts above `i64::MAX` cannot be written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("instruction {position}: operand {value} exceeds the document range")]
    OperandTooLarge { position: usize, value: usize },

    #[error("safety count {0} exceeds the document range")]
    SafetyCountTooLarge(u64),
}

/// Any failure converting a program to or from its serialized forms.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed program: {0}")]
    Malformed(#[from] MalformedProgram),

    #[error("cannot encode program: {0}")]
    Encode(#[from] EncodeError),

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid binary document: {0}")]
    Binary(#[from] postcard::Error),
}
