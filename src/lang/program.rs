use std::ops::Index;

use super::instruction::{Address, Instruction, Register};

/// An ordered URM program.
///
/// Instruction addresses are 0-based positions in the sequence. A program is
/// never mutated while it runs, so a single instance can be shared read-only
/// between any number of concurrent runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    // Builder helpers, e.g. `Program::new().copy(2, 0).zero(2)`

    pub fn zero(self, r: Register) -> Self {
        self.push(Instruction::Zero(r))
    }

    pub fn successor(self, r: Register) -> Self {
        self.push(Instruction::Successor(r))
    }

    pub fn copy(self, src: Register, dst: Register) -> Self {
        self.push(Instruction::Copy { src, dst })
    }

    pub fn jump(self, a: Register, b: Register, target: Address) -> Self {
        self.push(Instruction::Jump { a, b, target })
    }

    pub fn push(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Fetches the instruction at `address`, or `None` past the end.
    pub fn get(&self, address: Address) -> Option<&Instruction> {
        self.instructions.get(address)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Largest register index referenced by any instruction, 0 when the
    /// program references none.
    pub fn highest_address(&self) -> Register {
        self.instructions
            .iter()
            .map(Instruction::highest_register)
            .max()
            .unwrap_or(0)
    }

    /// Registers a run needs, `highest_address + 1`. `None` when the count
    /// overflows `usize`.
    pub fn register_count(&self) -> Option<usize> {
        self.highest_address().checked_add(1)
    }
}

/// Free-function form of [`Program::highest_address`].
///
/// `highest_address(program) + 1` is the register count callers pass to
/// [`RegisterBank::allocate`](crate::runtime::RegisterBank::allocate).
pub fn highest_address(program: &Program) -> Register {
    program.highest_address()
}

impl Index<Address> for Program {
    type Output = Instruction;

    fn index(&self, address: Address) -> &Self::Output {
        &self.instructions[address]
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::from_instructions(instructions)
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}
