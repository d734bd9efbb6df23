use std::sync::OnceLock;

use regex::Regex;

use crate::bytecode::compile_error::CompileError;
use crate::error::ErrorKind;
use crate::frontend::token::{Token, TokenKind};

/// Maximum number of consecutive put-backs allowed at one stream position.
pub const MAX_PUTBACKS: usize = 5;

const LEXEME_PATTERN: &str = concat!(
    r"\(|\)|>=|<=|<>|\|\||&&|!=|==|<<|>>",
    r"|0x[.\da-z]+",
    r"|[&\^|~]|[+><=*/\-!%,]",
    r"|[.\d]+",
    r"|\b\w+\b",
);

fn lexeme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LEXEME_PATTERN).expect("invalid lexeme pattern"))
}

/// Classification rules, tried in order. The first match decides the kind.
fn class_rules() -> &'static [(Regex, TokenKind)] {
    static RULES: OnceLock<Vec<(Regex, TokenKind)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            // relational / logical
            (r"^(<=|>=|==|<>|!=|<|>|\|\||&&|&)$", TokenKind::Delimiter),
            // bit shift
            (r"^(<<|>>)$", TokenKind::Delimiter),
            // general punctuation
            (r"^[+\-*^/%(),!|~=]$", TokenKind::Delimiter),
            (r"^0x[.\da-z]+$", TokenKind::HexNumber),
            (r"^[.\d]*\d[.\d]*$", TokenKind::Number),
            (r"^\w+$", TokenKind::Identifier),
        ]
        .into_iter()
        .map(|(pat, kind)| (Regex::new(pat).expect("invalid token class pattern"), kind))
        .collect()
    })
}

/// Split `text` into lexemes. Whitespace and characters no rule accepts are
/// dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    lexeme_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Classify a single lexeme.
pub fn classify(lexeme: &str) -> Token {
    for (re, kind) in class_rules() {
        if re.is_match(lexeme) {
            return Token::new(*kind, lexeme);
        }
    }
    tracing::debug!(lexeme, "unclassified lexeme");
    Token::new(TokenKind::Unknown, lexeme)
}

/// Cursor over a lexeme sequence with one-step put-back.
#[derive(Debug, Clone)]
pub struct TokenStream {
    lexemes: Vec<String>,
    // lexemes consumed so far, may run one past the end after Finished
    pos: usize,
    putback_at: Option<usize>,
    putback_count: usize,
}

impl TokenStream {
    pub fn new(text: &str) -> Self {
        Self::from_lexemes(tokenize(text))
    }

    pub fn from_lexemes(lexemes: Vec<String>) -> Self {
        TokenStream {
            lexemes,
            pos: 0,
            putback_at: None,
            putback_count: 0,
        }
    }

    /// Start over on a new sequence.
    pub fn reset(&mut self, text: &str) {
        *self = Self::new(text);
    }

    pub fn next_token(&mut self) -> Token {
        let tok = match self.lexemes.get(self.pos) {
            Some(lexeme) => classify(lexeme),
            None => Token::finished(),
        };
        if self.pos <= self.lexemes.len() {
            self.pos += 1;
        }
        tok
    }

    /// Step back one lexeme so the next `next_token` re-reads it.
    pub fn put_back(&mut self) -> Result<(), CompileError> {
        if self.putback_at == Some(self.pos) {
            self.putback_count += 1;
            if self.putback_count > MAX_PUTBACKS {
                return Err(CompileError::new(
                    ErrorKind::Putback,
                    self.detail(ErrorKind::Putback),
                ));
            }
        } else {
            self.putback_at = Some(self.pos);
            self.putback_count = 1;
        }
        self.pos = self.pos.saturating_sub(1);
        Ok(())
    }

    /// Everything consumed so far followed by the error tag.
    pub fn detail(&self, kind: ErrorKind) -> String {
        let end = self.pos.min(self.lexemes.len());
        let mut out = self.lexemes[..end].concat();
        out.push_str(&kind.tag());
        out
    }
}
