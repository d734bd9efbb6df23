use thiserror::Error;

use crate::error::ErrorKind;

/// A failed compile: the catalogue entry plus a detail string that shows how
/// far the compiler got (consumed source followed by `<eNN>`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("compile error e{}: {}: {}", .kind.code(), .kind, .detail)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        CompileError {
            kind,
            detail: detail.into(),
        }
    }

    /// A parameter named after one of the built-in constants.
    pub fn reserved_word(word: &str) -> Self {
        CompileError::new(ErrorKind::ReservedWord, word)
    }

    /// Structural failure in `{|params|expr}`; `seen` is the text matched so far.
    pub fn structure(kind: ErrorKind, seen: &str) -> Self {
        CompileError::new(kind, format!("{}{}", seen, kind.tag()))
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }
}
