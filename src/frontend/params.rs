use crate::bytecode::compile_error::CompileError;
use crate::bytecode::intrinsics::is_reserved;
use crate::error::ErrorKind;
use crate::frontend::lexer::TokenStream;
use crate::frontend::token::TokenKind;

/// Declared parameter names. Position is the variable-memory slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamTable {
    names: Vec<String>,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    /// Slot of the first parameter with this name.
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Build the parameter table from a comma-separated clause like `a, b, c`.
pub fn compile_params(clause: &str) -> Result<ParamTable, CompileError> {
    let mut ts = TokenStream::new(clause);
    let mut table = ParamTable::new();
    // true at the start and after every comma
    let mut want_name = true;

    loop {
        let tok = ts.next_token();
        match tok.kind {
            TokenKind::Finished => {
                if want_name && !table.is_empty() {
                    return Err(CompileError::new(
                        ErrorKind::MissingParam,
                        ts.detail(ErrorKind::MissingParam),
                    ));
                }
                break;
            }
            TokenKind::Identifier => {
                if !want_name {
                    return Err(CompileError::new(
                        ErrorKind::MissingComma,
                        ts.detail(ErrorKind::MissingComma),
                    ));
                }
                if is_reserved(&tok.text) {
                    return Err(CompileError::reserved_word(&tok.text));
                }
                table.push(tok.text);
                want_name = false;
            }
            TokenKind::Delimiter if tok.is(",") => {
                if want_name {
                    return Err(CompileError::new(
                        ErrorKind::MissingParam,
                        ts.detail(ErrorKind::MissingParam),
                    ));
                }
                want_name = true;
            }
            TokenKind::Delimiter => {
                return Err(CompileError::new(
                    ErrorKind::MissingComma,
                    ts.detail(ErrorKind::MissingComma),
                ));
            }
            TokenKind::Number | TokenKind::HexNumber | TokenKind::Unknown => {
                return Err(CompileError::new(
                    ErrorKind::MissingParam,
                    ts.detail(ErrorKind::MissingParam),
                ));
            }
        }
    }

    tracing::trace!(params = ?table.names(), "parameters compiled");
    Ok(table)
}
