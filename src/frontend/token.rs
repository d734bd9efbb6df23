#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Operators and punctuation: `+`, `(`, `<=`, `&&`, `,` ...
    Delimiter,
    Identifier,
    Number,
    HexNumber,
    /// A lexeme no classification rule accepted.
    Unknown,
    /// Past the end of the lexeme stream.
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }

    pub fn finished() -> Self {
        Token::new(TokenKind::Finished, "")
    }

    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    pub fn is_delimiter(&self, text: &str) -> bool {
        self.kind == TokenKind::Delimiter && self.text == text
    }

    pub fn is_finished(&self) -> bool {
        self.kind == TokenKind::Finished
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Finished => write!(f, "<end>"),
            _ => write!(f, "{}", self.text),
        }
    }
}
