use std::fmt;

/// Index of a register in a [`RegisterBank`](crate::runtime::RegisterBank).
pub type Register = usize;

/// Index of an instruction inside a [`Program`](crate::lang::Program).
pub type Address = usize;

// =============================================================================
// INSTRUCTION - the four URM primitives
// =============================================================================

/// A single URM instruction.
///
/// Operands are register indices, except for the jump target which is an
/// instruction address. A jump target past the end of the program halts the
/// machine; a jump to its own address loops until the step ceiling is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `Z(r)`: set register `r` to zero.
    Zero(Register),

    /// `S(r)`: increment register `r` by one.
    Successor(Register),

    /// `C(src, dst)`: copy the value of `src` into `dst`.
    Copy { src: Register, dst: Register },

    /// `J(a, b, target)`: continue at `target` when registers `a` and `b`
    /// hold the same value, otherwise fall through.
    Jump {
        a: Register,
        b: Register,
        target: Address,
    },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Zero(_) => Opcode::Zero,
            Instruction::Successor(_) => Opcode::Successor,
            Instruction::Copy { .. } => Opcode::Copy,
            Instruction::Jump { .. } => Opcode::Jump,
        }
    }

    /// Operands in wire order: `[r]`, `[src, dst]` or `[a, b, target]`.
    pub fn operands(&self) -> Vec<usize> {
        match *self {
            Instruction::Zero(r) | Instruction::Successor(r) => vec![r],
            Instruction::Copy { src, dst } => vec![src, dst],
            Instruction::Jump { a, b, target } => vec![a, b, target],
        }
    }

    /// Largest register index this instruction reads or writes.
    ///
    /// Jump targets are addresses, not registers, and are ignored.
    pub fn highest_register(&self) -> Register {
        match *self {
            Instruction::Zero(r) | Instruction::Successor(r) => r,
            Instruction::Copy { src, dst } => src.max(dst),
            Instruction::Jump { a, b, .. } => a.max(b),
        }
    }

    pub fn jump_target(&self) -> Option<Address> {
        match *self {
            Instruction::Jump { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    /// Formats using the listing syntax, e.g. `C(2, 0)` or `J(1, 2, 6)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Zero(r) => write!(f, "Z({})", r),
            Instruction::Successor(r) => write!(f, "S({})", r),
            Instruction::Copy { src, dst } => write!(f, "C({}, {})", src, dst),
            Instruction::Jump { a, b, target } => write!(f, "J({}, {}, {})", a, b, target),
        }
    }
}

// =============================================================================
// OPCODE - instruction kind without operands
// =============================================================================

/// The kind of an [`Instruction`], as named by its one-letter mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Zero,
    Successor,
    Copy,
    Jump,
}

impl Opcode {
    pub const ALL: [Opcode; 4] = [Opcode::Zero, Opcode::Successor, Opcode::Copy, Opcode::Jump];

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Zero => "Z",
            Opcode::Successor => "S",
            Opcode::Copy => "C",
            Opcode::Jump => "J",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == mnemonic)
    }

    /// Number of operands the instruction takes.
    pub const fn arity(self) -> usize {
        match self {
            Opcode::Zero | Opcode::Successor => 1,
            Opcode::Copy => 2,
            Opcode::Jump => 3,
        }
    }

    /// Builds the instruction from operands in wire order.
    ///
    /// Returns `None` when the operand count does not match [`Opcode::arity`].
    pub fn with_operands(self, operands: &[usize]) -> Option<Instruction> {
        let instruction = match (self, operands) {
            (Opcode::Zero, &[r]) => Instruction::Zero(r),
            (Opcode::Successor, &[r]) => Instruction::Successor(r),
            (Opcode::Copy, &[src, dst]) => Instruction::Copy { src, dst },
            (Opcode::Jump, &[a, b, target]) => Instruction::Jump { a, b, target },
            _ => return None,
        };
        Some(instruction)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_listing_syntax() {
        assert_eq!(Instruction::Zero(2).to_string(), "Z(2)");
        assert_eq!(Instruction::Successor(0).to_string(), "S(0)");
        assert_eq!(Instruction::Copy { src: 2, dst: 0 }.to_string(), "C(2, 0)");
        assert_eq!(
            Instruction::Jump {
                a: 1,
                b: 2,
                target: 6
            }
            .to_string(),
            "J(1, 2, 6)"
        );
    }

    #[test]
    fn test_mnemonic_lookup() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
        assert_eq!(Opcode::from_mnemonic("X"), None);
        assert_eq!(Opcode::from_mnemonic("z"), None);
    }

    #[test]
    fn test_with_operands_checks_arity() {
        assert_eq!(
            Opcode::Copy.with_operands(&[3, 4]),
            Some(Instruction::Copy { src: 3, dst: 4 })
        );
        assert_eq!(Opcode::Copy.with_operands(&[3]), None);
        assert_eq!(Opcode::Zero.with_operands(&[]), None);
        assert_eq!(Opcode::Jump.with_operands(&[0, 0, 0, 0]), None);
    }

    #[test]
    fn test_operands_follow_opcode_arity() {
        let instructions = [
            Instruction::Zero(1),
            Instruction::Successor(4),
            Instruction::Copy { src: 0, dst: 9 },
            Instruction::Jump {
                a: 5,
                b: 7,
                target: 100,
            },
        ];
        for instruction in instructions {
            let operands = instruction.operands();
            assert_eq!(operands.len(), instruction.opcode().arity());
            assert_eq!(
                instruction.opcode().with_operands(&operands),
                Some(instruction)
            );
        }
    }

    #[test]
    fn test_highest_register_ignores_jump_target() {
        let jump = Instruction::Jump {
            a: 1,
            b: 3,
            target: 50,
        };
        assert_eq!(jump.highest_register(), 3);
        assert_eq!(jump.jump_target(), Some(50));
        assert_eq!(Instruction::Copy { src: 7, dst: 2 }.highest_register(), 7);
        assert_eq!(Instruction::Zero(0).jump_target(), None);
    }
}
