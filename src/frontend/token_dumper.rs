use crate::frontend::lexer::classify;
use crate::frontend::token::{Token, TokenKind};

pub struct TokenDumper {
    pub color: bool,
    pub show_debug_repr: bool, // if false, prints just the lexeme text
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self {
            color: true,
            show_debug_repr: true,
        }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const RED: &'static str = "\x1b[31m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.show_debug_repr = false;
        self
    }

    pub fn dump(&self, lexemes: &[String]) {
        for line in self.render(lexemes) {
            println!("{}", line);
        }
    }

    pub fn render(&self, lexemes: &[String]) -> Vec<String> {
        lexemes
            .iter()
            .enumerate()
            .map(|(i, lexeme)| self.render_one(i, &classify(lexeme)))
            .collect()
    }

    fn render_one(&self, index: usize, tok: &Token) -> String {
        let colr = if self.color { self.color(tok.kind) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };
        let kind = Self::kind(tok.kind);

        if self.show_debug_repr {
            format!("[{:02}] {}{:<8} {:?}{}", index, colr, kind, tok.text, reset)
        } else {
            format!("[{:02}] {}{:<8} {}{}", index, colr, kind, tok.text, reset)
        }
    }

    fn kind(kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::Delimiter => "DELIM",
            TokenKind::Identifier => "IDENT",
            TokenKind::Number => "NUMBER",
            TokenKind::HexNumber => "HEX",
            TokenKind::Unknown => "UNKNOWN",
            TokenKind::Finished => "END",
        }
    }

    fn color(&self, kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::Delimiter => Self::MAG,
            TokenKind::Identifier => Self::YEL,
            TokenKind::Number | TokenKind::HexNumber => Self::CYN,
            TokenKind::Unknown => Self::RED,
            TokenKind::Finished => Self::DIM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;

    #[test]
    fn test_render_plain() {
        let lines = TokenDumper::new().no_color().pretty().render(&tokenize("a+0x1f"));
        assert_eq!(
            lines,
            vec![
                "[00] IDENT    a",
                "[01] DELIM    +",
                "[02] HEX      0x1f",
            ]
        );
    }

    #[test]
    fn test_render_debug_quotes_text() {
        let lines = TokenDumper::new().no_color().render(&tokenize("."));
        assert_eq!(lines, vec!["[00] UNKNOWN  \".\""]);
    }

    #[test]
    fn test_render_colored_has_reset() {
        let lines = TokenDumper::new().render(&tokenize("5"));
        assert!(lines[0].contains("\x1b[36m"));
        assert!(lines[0].ends_with("\x1b[0m"));
    }
}
