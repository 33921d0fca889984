#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Instruction mnemonic (`Z`, `S`, `C`, `J`), or any other word
    Ident(String),

    // Operand
    Integer(u64),

    // Delimiters
    LParen, // (
    RParen, // )
    Comma,  // ,

    // Trivia
    Comment(String),
    Newline,

    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "`{}`", name),
            Token::Integer(n) => write!(f, "{}", n),
            Token::LParen => write!(f, "`(`"),
            Token::RParen => write!(f, "`)`"),
            Token::Comma => write!(f, "`,`"),
            Token::Comment(_) => write!(f, "comment"),
            Token::Newline => write!(f, "newline"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
