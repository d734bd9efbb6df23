use std::sync::OnceLock;

use regex::Regex;

use crate::bytecode::compile_error::CompileError;
use crate::error::ErrorKind;

fn codeblock_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\{)?(\|)?([^|\}]*)(\|)?([^}]*)(\})?").expect("invalid codeblock pattern")
    })
}

/// The two clauses of a `{|params|body}` codeblock, lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clauses {
    pub params: String,
    pub body: String,
}

/// Split codeblock text into its parameter and body clauses.
///
/// The text is trimmed and lower-cased first. Delimiters are checked left to
/// right and the first one missing decides the error. Anything after the
/// closing brace is ignored.
pub fn extract_clauses(text: &str) -> Result<Clauses, CompileError> {
    let text = text.trim().to_lowercase();

    let caps = codeblock_regex()
        .captures(&text)
        .ok_or_else(|| CompileError::structure(ErrorKind::MissingBracket, ""))?;
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

    let mut seen = String::new();

    if group(1) != "{" {
        return Err(CompileError::structure(ErrorKind::MissingBracket, &seen));
    }
    seen.push_str(group(1));

    if group(2) != "|" {
        return Err(CompileError::structure(ErrorKind::MissingPipe, &seen));
    }
    seen.push_str(group(2));
    seen.push_str(group(3));

    if group(4) != "|" {
        return Err(CompileError::structure(ErrorKind::MissingPipe, &seen));
    }
    seen.push_str(group(4));

    if group(5).trim().is_empty() {
        return Err(CompileError::structure(ErrorKind::MissingExpr, &seen));
    }
    seen.push_str(group(5));

    if group(6) != "}" {
        return Err(CompileError::structure(ErrorKind::MissingExpr, &seen));
    }

    Ok(Clauses {
        params: group(3).to_string(),
        body: group(5).to_string(),
    })
}
