use super::lexer::{Span, Spanned};
use super::parser_error::ParserError;
use super::token::Token;
use crate::lang::{Instruction, Opcode, Program};

/// Parser for URM program listings.
///
/// The grammar is a flat sequence of instructions:
///
/// ```text
/// program     := instruction*
/// instruction := MNEMONIC "(" operand ("," operand)* ")"
/// ```
///
/// Comments and newlines are filtered out in `Parser::new`, so instructions
/// may share a line or span several.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Span of the most recently consumed token, used for errors at EOF.
    last_span: Option<Span>,
}

impl Parser {
    /// Creates a parser over lexer output.
    ///
    /// Comments and newlines are dropped here. Spans still come from the
    /// original tokens, so error positions are unaffected.
    pub fn new(tokens: Vec<Spanned>) -> Self {
        let tokens: Vec<Spanned> = tokens
            .into_iter()
            .filter(|t| !matches!(t.token, Token::Comment(_) | Token::Newline))
            .collect();
        Parser {
            tokens,
            pos: 0,
            last_span: None,
        }
    }

    /// Returns the current token without consuming it.
    ///
    /// Returns `None` once the position is past the token list.
    fn current(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    /// Peeks the current token kind without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    /// Consumes the current token and returns it.
    ///
    /// Also records its span in `last_span`, so errors raised at end of
    /// input still point at the last instruction.
    fn advance(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if let Some(s) = &token {
            self.last_span = Some(s.span.clone());
        }
        self.pos += 1;
        token
    }

    /// Constructs a `ParserError` at the most relevant location.
    ///
    /// Priority:
    /// 1. The current token's span.
    /// 2. Else `last_span`, once the input is exhausted.
    /// 3. Else (1,1), for empty input.
    fn error(&self, message: impl Into<String>) -> ParserError {
        let span = self
            .current()
            .map(|s| s.span.clone())
            .or_else(|| self.last_span.clone())
            .unwrap_or(Span { line: 1, col: 1 });
        Self::error_at(message, &span)
    }

    /// Constructs a `ParserError` at an explicit span, such as the mnemonic
    /// of the instruction being parsed.
    fn error_at(message: impl Into<String>, span: &Span) -> ParserError {
        ParserError {
            message: message.into(),
            line: span.line,
            col: span.col,
        }
    }

    /// Consumes the current token if it equals `expected`.
    ///
    /// # Errors
    /// - If the current token differs, or the input has ended.
    fn expect(&mut self, expected: Token) -> Result<(), ParserError> {
        match self.peek() {
            Some(token) if *token == expected => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(self.error(format!("expected {}, found {}", expected, token))),
            None => Err(self.error(format!("expected {}, found end of input", expected))),
        }
    }

    /// Parses a complete program. Stops at `Token::Eof`.
    pub fn parse(&mut self) -> Result<Program, ParserError> {
        let mut instructions = Vec::new();

        while let Some(token) = self.peek() {
            if matches!(token, Token::Eof) {
                break;
            }
            instructions.push(self.parse_instruction()?);
        }

        Ok(Program::from_instructions(instructions))
    }

    /// Parses one instruction:
    ///
    /// ```text
    /// J(1, 2, 6)
    /// ```
    ///
    /// # Errors
    /// - If the mnemonic is not one of `Z`, `S`, `C`, `J` (reported at the mnemonic).
    /// - If the operand count does not match the mnemonic's arity.
    fn parse_instruction(&mut self) -> Result<Instruction, ParserError> {
        let Some(Spanned { token, span }) = self.current().cloned() else {
            return Err(self.error("expected an instruction"));
        };

        let Token::Ident(mnemonic) = token else {
            return Err(self.error(format!("expected an instruction, found {}", token)));
        };

        let opcode = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| {
            Self::error_at(
                format!("unknown instruction `{}` (expected one of Z, S, C, J)", mnemonic),
                &span,
            )
        })?;
        self.advance();

        self.expect(Token::LParen)?;
        let operands = self.parse_operands()?;
        self.expect(Token::RParen)?;

        opcode.with_operands(&operands).ok_or_else(|| {
            Self::error_at(
                format!(
                    "`{}` takes {} operand(s), got {}",
                    opcode,
                    opcode.arity(),
                    operands.len()
                ),
                &span,
            )
        })
    }

    /// Parses a comma-separated operand list up to, not including, `)`.
    ///
    /// Arity is checked by the caller, which knows the mnemonic.
    fn parse_operands(&mut self) -> Result<Vec<usize>, ParserError> {
        let mut operands = Vec::new();

        if matches!(self.peek(), Some(Token::RParen)) {
            return Ok(operands);
        }

        loop {
            match self.peek() {
                Some(&Token::Integer(value)) => {
                    let operand = usize::try_from(value)
                        .map_err(|_| self.error(format!("operand {} is too large", value)))?;
                    operands.push(operand);
                    self.advance();
                }
                Some(token) => {
                    return Err(self.error(format!("expected an operand, found {}", token)));
                }
                None => return Err(self.error("expected an operand, found end of input")),
            }

            if matches!(self.peek(), Some(Token::Comma)) {
                self.advance();
            } else {
                return Ok(operands);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    fn parse(source: &str) -> Result<Program, ParserError> {
        let tokens = Lexer::new(source).tokenize().expect("lexing should succeed");
        Parser::new(tokens).parse()
    }

    #[test]
    fn test_parse_add_listing() {
        let source = "\
            ; add r1 to r2, result in r0\n\
            C(2, 0)\n\
            Z(2)\n\
            J(1, 2, 6)  ; done\n\
            S(0)\n\
            S(2)\n\
            J(3, 3, 2)\n";
        let program = parse(source).unwrap();
        assert_eq!(
            program,
            Program::new()
                .copy(2, 0)
                .zero(2)
                .jump(1, 2, 6)
                .successor(0)
                .successor(2)
                .jump(3, 3, 2)
        );
    }

    #[test]
    fn test_instructions_may_share_a_line() {
        let program = parse("Z(0) S(0)   S(0)").unwrap();
        assert_eq!(program, Program::new().zero(0).successor(0).successor(0));
    }

    #[test]
    fn test_empty_source() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("; nothing here\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = parse("Z(0)\nX(1)").unwrap_err();
        assert_eq!((err.line, err.col), (2, 1));
        assert!(err.message.contains("unknown instruction `X`"));
    }

    #[test]
    fn test_wrong_arity() {
        let err = parse("C(1)").unwrap_err();
        assert_eq!(err.to_string(), "1:1: `C` takes 2 operand(s), got 1");
    }

    #[test]
    fn test_missing_paren_at_eof() {
        let err = parse("S(1").unwrap_err();
        assert!(err.message.contains("expected `)`"), "{}", err);
    }

    #[test]
    fn test_trailing_comma() {
        let err = parse("C(1,)").unwrap_err();
        assert!(err.message.contains("expected an operand"), "{}", err);
    }

    #[test]
    fn test_operand_without_instruction() {
        let err = parse("5").unwrap_err();
        assert!(err.message.contains("expected an instruction"), "{}", err);
    }
}
