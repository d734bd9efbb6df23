use serde::{Deserialize, Serialize};

/// A compiled codeblock.
///
/// `code[0]` is the declared parameter count; the instruction stream starts
/// at `code[1]` and ends with `EndCode`. `LoadConst`/`PushConst` operands
/// index into `constants`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub code: Vec<i32>,
    pub constants: Vec<f64>,
}

impl Program {
    pub fn new(code: Vec<i32>, constants: Vec<f64>) -> Self {
        Self { code, constants }
    }

    /// Declared parameter count from the header word.
    pub fn param_count(&self) -> Option<usize> {
        self.code.first().and_then(|&n| usize::try_from(n).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.code.len() < 2
    }

    /// Encode for an in-memory cache or another process running the same
    /// build. The layout is not versioned.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
