use serde::{Deserialize, Serialize};

/// Catalogue of everything that can go wrong while compiling or running a
/// codeblock. Each kind carries a stable numeric code and a fixed description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorKind {
    #[default]
    None,
    Syntax,
    MissingBracket,
    MissingPipe,
    MissingParen,
    MissingComma,
    MissingArg,
    NotAVar,
    MissingParam,
    MissingExpr,
    ReservedWord,
    TooManyArgs,
    UnbalancedParens,
    Putback,
    UnsupportedOper,

    // execution
    NoCode,
    IllegalCode,
    InsufficientArgs,
    StackOverflow,
    DivideByZero,
    ArgNotNumber,
    IllegalAssignment,
    ConditionalAssignment,
    StackMemoryLeak,

    Other,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 25] = [
        ErrorKind::None,
        ErrorKind::Syntax,
        ErrorKind::MissingBracket,
        ErrorKind::MissingPipe,
        ErrorKind::MissingParen,
        ErrorKind::MissingComma,
        ErrorKind::MissingArg,
        ErrorKind::NotAVar,
        ErrorKind::MissingParam,
        ErrorKind::MissingExpr,
        ErrorKind::ReservedWord,
        ErrorKind::TooManyArgs,
        ErrorKind::UnbalancedParens,
        ErrorKind::Putback,
        ErrorKind::UnsupportedOper,
        ErrorKind::NoCode,
        ErrorKind::IllegalCode,
        ErrorKind::InsufficientArgs,
        ErrorKind::StackOverflow,
        ErrorKind::DivideByZero,
        ErrorKind::ArgNotNumber,
        ErrorKind::IllegalAssignment,
        ErrorKind::ConditionalAssignment,
        ErrorKind::StackMemoryLeak,
        ErrorKind::Other,
    ];

    /// Numeric code reported to hosts. Codes are stable; gaps are reserved.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::None => 0,
            ErrorKind::Syntax => 1,
            ErrorKind::MissingBracket => 2,
            ErrorKind::MissingPipe => 3,
            ErrorKind::MissingParen => 4,
            ErrorKind::MissingComma => 5,
            ErrorKind::MissingArg => 6,
            ErrorKind::NotAVar => 7,
            ErrorKind::MissingParam => 8,
            ErrorKind::MissingExpr => 9,
            ErrorKind::ReservedWord => 10,
            ErrorKind::TooManyArgs => 11,
            ErrorKind::UnbalancedParens => 12,
            ErrorKind::Putback => 13,
            ErrorKind::UnsupportedOper => 14,
            ErrorKind::NoCode => 20,
            ErrorKind::IllegalCode => 21,
            ErrorKind::InsufficientArgs => 22,
            ErrorKind::StackOverflow => 23,
            ErrorKind::DivideByZero => 24,
            ErrorKind::ArgNotNumber => 25,
            ErrorKind::IllegalAssignment => 26,
            ErrorKind::ConditionalAssignment => 27,
            ErrorKind::StackMemoryLeak => 28,
            ErrorKind::Other => 33,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::None => "None",
            ErrorKind::Syntax => "Syntax Error",
            ErrorKind::MissingBracket => "{} bracket not found",
            ErrorKind::MissingPipe => "|| pipe not found",
            ErrorKind::MissingParen => "Missing parenthesis",
            ErrorKind::MissingComma => "Missing comma",
            ErrorKind::MissingArg => "Missing argument",
            ErrorKind::NotAVar => "Unknown parameter",
            ErrorKind::MissingParam => "Missing parameter",
            ErrorKind::MissingExpr => "Missing expression",
            ErrorKind::ReservedWord => "Reserved word",
            ErrorKind::TooManyArgs => "Too many arguments",
            ErrorKind::UnbalancedParens => "Unbalanced parens",
            ErrorKind::Putback => "Internal parser error",
            ErrorKind::UnsupportedOper => "Unsupported operator",
            ErrorKind::NoCode => "No code to execute",
            ErrorKind::IllegalCode => "Illegal instruction",
            ErrorKind::InsufficientArgs => "Insufficient arguments",
            ErrorKind::StackOverflow => "Stack overflow",
            ErrorKind::DivideByZero => "Divide by zero",
            ErrorKind::ArgNotNumber => "Not a number",
            ErrorKind::IllegalAssignment => "Illegal Assignment",
            ErrorKind::ConditionalAssignment => "Assignment in conditional not permitted",
            ErrorKind::StackMemoryLeak => "Stack Memory Leak",
            ErrorKind::Other => "Other error",
        }
    }

    pub fn from_code(code: i32) -> Option<ErrorKind> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }

    /// Tag appended to error details, e.g. `<e12>`.
    pub fn tag(self) -> String {
        format!("<e{}>", self.code())
    }

    pub fn is_none(self) -> bool {
        self == ErrorKind::None
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
