use thiserror::Error;

use super::token::Token;

/// 1-based source position of a token's first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{col}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

/// Splits a program listing such as `C(2, 0)  ; copy` into tokens.
///
/// Comments and line breaks are kept as tokens; the parser drops them.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// The character after the current one, for two-character lookahead
    /// such as `-1`.
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Consumes one character and keeps `line`/`col` in step with it.
    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn error(&self, message: impl Into<String>, span: &Span) -> LexerError {
        LexerError {
            message: message.into(),
            line: span.line,
            col: span.col,
        }
    }

    /// Consumes characters while `accept` holds and returns them.
    ///
    /// Stops at end of input or at the first rejected character, which is
    /// left in place.
    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(ch) = self.current().filter(|&ch| accept(ch)) {
            taken.push(ch);
            self.advance();
        }
        taken
    }

    /// Skips blanks within a line. Line breaks are tokens of their own.
    fn skip_whitespace(&mut self) {
        self.take_while(|ch| matches!(ch, ' ' | '\t' | '\r'));
    }

    /// Reads a `;` comment up to, not including, the end of the line.
    fn read_comment(&mut self) -> Token {
        self.advance();
        let text = self.take_while(|ch| ch != '\n');
        Token::Comment(text.trim().to_string())
    }

    fn read_number(&mut self) -> Result<Token, LexerError> {
        let start = self.span();
        let digits = self.take_while(|ch| ch.is_ascii_digit());
        let value: u64 = digits
            .parse()
            .map_err(|_| self.error(format!("integer out of range: {}", digits), &start))?;
        Ok(Token::Integer(value))
    }

    fn read_identifier(&mut self) -> Token {
        Token::Ident(self.take_while(|ch| ch.is_alphanumeric() || ch == '_'))
    }

    /// Tokenizes the whole source, ending with `Token::Eof`.
    ///
    /// # Errors
    /// - A `-` directly before a digit: operands are never negative.
    /// - An integer that does not fit in 64 bits.
    /// - Any character outside the listing syntax.
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexerError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let span = self.span();

            let token = match self.current() {
                None => {
                    tokens.push(Spanned {
                        token: Token::Eof,
                        span,
                    });
                    break;
                }
                Some('\n') => {
                    self.advance();
                    Token::Newline
                }
                Some(';') => self.read_comment(),
                Some('(') => {
                    self.advance();
                    Token::LParen
                }
                Some(')') => {
                    self.advance();
                    Token::RParen
                }
                Some(',') => {
                    self.advance();
                    Token::Comma
                }
                Some('-') if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    return Err(self.error(
                        "negative operand: registers and addresses start at 0",
                        &span,
                    ));
                }
                Some(ch) if ch.is_ascii_digit() => self.read_number()?,
                Some(ch) if ch.is_alphabetic() || ch == '_' => self.read_identifier(),
                Some(ch) => {
                    return Err(self.error(format!("unexpected character: '{}'", ch), &span));
                }
            };

            tokens.push(Spanned { token, span });
        }

        Ok(tokens)
    }
}
