//! Text form of URM programs.
//!
//! One instruction per entry in the listing syntax (`Z(0)`, `S(1)`,
//! `C(2, 0)`, `J(1, 2, 6)`); `;` starts a comment that runs to the end of
//! the line.

pub mod lexer;
pub mod parser;
pub mod parser_error;
pub mod token;

use thiserror::Error;

use crate::lang::Program;
use lexer::{Lexer, LexerError};
use parser::Parser;
use parser_error::ParserError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("lexer error: {0}")]
    Lexer(#[from] LexerError),

    #[error("parse error: {0}")]
    Parser(#[from] ParserError),
}

/// Lexes and parses a program listing.
pub fn parse_source(source: &str) -> Result<Program, SourceError> {
    let tokens = Lexer::new(source).tokenize()?;
    Ok(Parser::new(tokens).parse()?)
}

/// Renders a program back into the listing syntax, one instruction per line.
pub fn to_source(program: &Program) -> String {
    program
        .iter()
        .map(|instruction| format!("{}\n", instruction))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_source_parses_back() {
        let program = Program::new().jump(0, 1, 6).successor(2).copy(1, 0).zero(3);
        let source = to_source(&program);
        assert_eq!(source, "J(0, 1, 6)\nS(2)\nC(1, 0)\nZ(3)\n");
        assert_eq!(parse_source(&source), Ok(program));
    }

    #[test]
    fn test_errors_keep_their_stage() {
        assert!(matches!(parse_source("S(-2)"), Err(SourceError::Lexer(_))));
        assert!(matches!(parse_source("Q(2)"), Err(SourceError::Parser(_))));
    }
}
