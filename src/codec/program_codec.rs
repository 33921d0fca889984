use super::codec_error::{CodecError, EncodeError, MalformedProgram};
use super::document::{InstructionRecord, ProgramDocument};
use crate::lang::{Instruction, Opcode, Program};

/// Converts a program and its step ceiling into the wire document.
///
/// Fails only for values past `i64::MAX`, which the document cannot hold.
pub fn encode(program: &Program, safety_count: u64) -> Result<ProgramDocument, EncodeError> {
    let safety_count =
        i64::try_from(safety_count).map_err(|_| EncodeError::SafetyCountTooLarge(safety_count))?;
    let program = program
        .iter()
        .enumerate()
        .map(|(position, instruction)| InstructionRecord::from_instruction(position, instruction))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ProgramDocument {
        program,
        safety_count,
    })
}

/// Rebuilds a program from its wire document.
///
/// All-or-nothing: the first bad record aborts decoding and no partial
/// program is returned. Jump targets and register bounds are left to the
/// engine.
pub fn decode(document: &ProgramDocument) -> Result<(Program, u64), MalformedProgram> {
    let program = document
        .program
        .iter()
        .enumerate()
        .map(|(position, record)| decode_record(position, record))
        .collect::<Result<Program, _>>()?;
    let safety_count = u64::try_from(document.safety_count)
        .map_err(|_| MalformedProgram::NegativeSafetyCount(document.safety_count))?;
    Ok((program, safety_count))
}

fn decode_record(position: usize, record: &InstructionRecord) -> Result<Instruction, MalformedProgram> {
    let opcode = Opcode::from_mnemonic(&record.op).ok_or_else(|| MalformedProgram::UnknownOp {
        position,
        op: record.op.clone(),
    })?;

    if record.args.len() != opcode.arity() {
        return Err(MalformedProgram::WrongArity {
            position,
            op: record.op.clone(),
            expected: opcode.arity(),
            found: record.args.len(),
        });
    }

    let operands = record
        .args
        .iter()
        .map(|&value| {
            if value < 0 {
                return Err(MalformedProgram::NegativeOperand { position, value });
            }
            usize::try_from(value).map_err(|_| MalformedProgram::OperandOutOfRange { position, value })
        })
        .collect::<Result<Vec<usize>, _>>()?;

    opcode
        .with_operands(&operands)
        .ok_or_else(|| MalformedProgram::WrongArity {
            position,
            op: record.op.clone(),
            expected: opcode.arity(),
            found: operands.len(),
        })
}

// =============================================================================
// Serialized forms
// =============================================================================

/// Pretty-printed JSON program document.
pub fn to_json(program: &Program, safety_count: u64) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(&encode(program, safety_count)?)?)
}

pub fn from_json(json: &str) -> Result<(Program, u64), CodecError> {
    let document: ProgramDocument = serde_json::from_str(json)?;
    Ok(decode(&document)?)
}

/// Compact binary program document (postcard).
pub fn to_bytes(program: &Program, safety_count: u64) -> Result<Vec<u8>, CodecError> {
    Ok(postcard::to_allocvec(&encode(program, safety_count)?)?)
}

pub fn from_bytes(bytes: &[u8]) -> Result<(Program, u64), CodecError> {
    let document: ProgramDocument = postcard::from_bytes(bytes)?;
    Ok(decode(&document)?)
}
