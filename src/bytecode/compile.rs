use crate::{
    bytecode::{
        compile_error::CompileError,
        emit::Emitter,
        intrinsics::{self, Intrinsic},
        ir::Program,
        op::Pcode,
        stack_check::check_program,
    },
    error::ErrorKind,
    frontend::{
        extract::extract_clauses,
        lexer::TokenStream,
        params::{ParamTable, compile_params},
        token::{Token, TokenKind},
    },
};

/// Switches that change what the compiler accepts or emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Fuse load+push pairs.
    pub optimize: bool,
    /// Allow `=` inside the condition argument of `iif`.
    pub allow_conditional_assignment: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            optimize: true,
            allow_conditional_assignment: false,
        }
    }
}

impl CompileOptions {
    pub fn optimize(mut self, on: bool) -> Self {
        self.optimize = on;
        self
    }

    pub fn allow_conditional_assignment(mut self, on: bool) -> Self {
        self.allow_conditional_assignment = on;
        self
    }
}

/// Compile codeblock text with the given options.
/// Deepest expression nesting accepted; deeper input fails with `Syntax`.
pub const MAX_NESTING: usize = 128;

pub fn compile(text: &str, options: CompileOptions) -> Result<Program, CompileError> {
    Compiler::new(options).compile(text)
}

/// Single-pass compiler. One value per compile; all parse and emit state
/// lives here.
pub struct Compiler {
    options: CompileOptions,
    stream: TokenStream,
    /// One-token look-ahead.
    tok: Token,
    params: ParamTable,
    emitter: Emitter,
    paren_depth: usize,
    iif_depth: usize,
    /// Open expression levels: subexpressions, arguments and unary operators.
    nesting: usize,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            stream: TokenStream::from_lexemes(Vec::new()),
            tok: Token::finished(),
            params: ParamTable::new(),
            emitter: Emitter::new(options.optimize),
            paren_depth: 0,
            iif_depth: 0,
            nesting: 0,
        }
    }

    #[tracing::instrument(level = "debug", skip(self), err(level = "debug"))]
    pub fn compile(mut self, text: &str) -> Result<Program, CompileError> {
        let clauses = extract_clauses(text)?;
        self.params = compile_params(&clauses.params)?;
        self.stream.reset(&clauses.body);

        self.emitter.emit_header(self.params.len());
        self.advance();
        self.assignment()?;

        if !self.tok.is_finished() {
            let kind = match self.tok.kind {
                TokenKind::Delimiter if self.tok.is(")") => ErrorKind::UnbalancedParens,
                TokenKind::Delimiter => ErrorKind::UnsupportedOper,
                TokenKind::Unknown => ErrorKind::Other,
                _ => ErrorKind::Syntax,
            };
            return Err(self.fail(kind));
        }

        let program = self.emitter.finish()?;

        match check_program(&program) {
            Ok(depth) => tracing::debug!(
                words = program.code.len(),
                constants = program.constants.len(),
                max_stack = depth,
                "compiled"
            ),
            Err(e) => tracing::warn!(error = %e, "generated code failed the stack check"),
        }

        Ok(program)
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn advance(&mut self) {
        self.tok = self.stream.next_token();
        tracing::trace!(token = %self.tok, "next");
    }

    fn fail(&self, kind: ErrorKind) -> CompileError {
        CompileError::new(kind, self.stream.detail(kind))
    }

    fn enter(&mut self) -> Result<(), CompileError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.fail(ErrorKind::Syntax));
        }
        self.nesting += 1;
        Ok(())
    }

    /// Run `level` one nesting level deeper.
    fn nested(
        &mut self,
        level: fn(&mut Self) -> Result<(), CompileError>,
    ) -> Result<(), CompileError> {
        self.enter()?;
        let result = level(self);
        self.nesting -= 1;
        result
    }

    fn at(&self, delim: &str) -> bool {
        self.tok.is_delimiter(delim)
    }

    /// Opcode for the current token if it is one of `ops`.
    fn binary_op(&self, ops: &[(&str, Pcode)]) -> Option<Pcode> {
        if self.tok.kind != TokenKind::Delimiter {
            return None;
        }
        ops.iter()
            .find(|(text, _)| self.tok.is(text))
            .map(|&(_, op)| op)
    }

    // =========================================================================
    // Precedence levels, lowest first
    // =========================================================================

    fn assignment(&mut self) -> Result<(), CompileError> {
        self.nested(Self::assignment_level)
    }

    /// `param = expr`, right associative; otherwise a plain expression.
    fn assignment_level(&mut self) -> Result<(), CompileError> {
        let slot = match self.tok.kind {
            TokenKind::Identifier => self.params.slot(&self.tok.text),
            _ => None,
        };

        if let Some(slot) = slot {
            let saved = self.tok.clone();
            self.advance();

            if self.at("=") {
                if self.iif_depth > 0 && !self.options.allow_conditional_assignment {
                    return Err(self.fail(ErrorKind::ConditionalAssignment));
                }
                self.advance();
                self.assignment()?;
                self.emitter.store_var(slot);
                return Ok(());
            }

            self.stream.put_back()?;
            self.tok = saved;
        }

        self.logical_or()?;

        if self.at("=") {
            return Err(self.fail(ErrorKind::IllegalAssignment));
        }
        Ok(())
    }

    fn logical_or(&mut self) -> Result<(), CompileError> {
        self.logical_and()?;

        while self.at("||") {
            self.emitter.push();
            let done = self.emitter.new_label();
            self.emitter.branch(Pcode::JumpTrue, done);
            self.advance();
            self.logical_and()?;
            self.emitter.post_label(done);
            self.emitter.emit_short(Pcode::LogicalOr);
        }
        Ok(())
    }

    fn logical_and(&mut self) -> Result<(), CompileError> {
        self.bitwise()?;

        while self.at("&&") {
            self.emitter.push();
            let done = self.emitter.new_label();
            self.emitter.branch(Pcode::JumpFalse, done);
            self.advance();
            self.bitwise()?;
            self.emitter.post_label(done);
            self.emitter.emit_short(Pcode::LogicalAnd);
        }
        Ok(())
    }

    fn bitwise(&mut self) -> Result<(), CompileError> {
        const OPS: &[(&str, Pcode)] = &[
            ("&", Pcode::BitAnd),
            ("|", Pcode::BitOr),
            ("^", Pcode::BitXor),
        ];
        self.relational()?;

        while let Some(op) = self.binary_op(OPS) {
            self.emitter.push();
            self.advance();
            self.relational()?;
            self.emitter.emit_short(op);
        }
        Ok(())
    }

    fn relational(&mut self) -> Result<(), CompileError> {
        const OPS: &[(&str, Pcode)] = &[
            ("<", Pcode::LessThan),
            ("<=", Pcode::LessEqual),
            (">", Pcode::GreaterThan),
            (">=", Pcode::GreaterEqual),
            ("==", Pcode::Equal),
            ("!=", Pcode::NotEqual),
            ("<>", Pcode::NotEqual),
        ];
        self.shift()?;

        while let Some(op) = self.binary_op(OPS) {
            self.emitter.push();
            self.advance();
            self.shift()?;
            self.emitter.emit_short(op);
        }
        Ok(())
    }

    fn shift(&mut self) -> Result<(), CompileError> {
        const OPS: &[(&str, Pcode)] = &[
            ("<<", Pcode::BitShiftLeft),
            (">>", Pcode::BitShiftRight),
        ];
        self.add_sub()?;

        while let Some(op) = self.binary_op(OPS) {
            self.emitter.push();
            self.advance();
            self.add_sub()?;
            self.emitter.emit_short(op);
        }
        Ok(())
    }

    fn add_sub(&mut self) -> Result<(), CompileError> {
        const OPS: &[(&str, Pcode)] = &[("+", Pcode::Add), ("-", Pcode::Subtract)];
        self.factor()?;

        while let Some(op) = self.binary_op(OPS) {
            self.emitter.push();
            self.advance();
            self.factor()?;
            self.emitter.emit_short(op);
        }
        Ok(())
    }

    fn factor(&mut self) -> Result<(), CompileError> {
        const OPS: &[(&str, Pcode)] = &[
            ("*", Pcode::Multiply),
            ("/", Pcode::Divide),
            ("%", Pcode::Modulo),
        ];
        self.unary()?;

        while let Some(op) = self.binary_op(OPS) {
            self.emitter.push();
            self.advance();
            self.unary()?;
            self.emitter.emit_short(op);
        }
        Ok(())
    }

    fn unary(&mut self) -> Result<(), CompileError> {
        self.nested(Self::unary_level)
    }

    fn unary_level(&mut self) -> Result<(), CompileError> {
        const OPS: &[(&str, Pcode)] = &[
            ("-", Pcode::Neg),
            ("!", Pcode::LogicalNot),
            ("~", Pcode::BitNot),
        ];

        if self.at("+") {
            self.advance();
            return self.unary();
        }
        if let Some(op) = self.binary_op(OPS) {
            self.advance();
            self.unary()?;
            self.emitter.emit_short(op);
            return Ok(());
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<(), CompileError> {
        match self.tok.kind {
            TokenKind::Delimiter if self.at("(") => self.paren(),
            TokenKind::Delimiter if self.at(")") && self.paren_depth == 0 => {
                Err(self.fail(ErrorKind::UnbalancedParens))
            }
            TokenKind::Delimiter | TokenKind::Finished => Err(self.fail(ErrorKind::MissingArg)),
            TokenKind::Unknown => Err(self.fail(ErrorKind::Other)),
            TokenKind::Identifier => self.identifier(),
            TokenKind::Number => {
                let value = self.tok.text.parse::<f64>().unwrap_or(0.0);
                self.emitter.load_const(value);
                self.advance();
                Ok(())
            }
            TokenKind::HexNumber => {
                let value = parse_hex(&self.tok.text);
                self.emitter.load_const(value);
                self.advance();
                Ok(())
            }
        }
    }

    /// `( e1, e2, ... )`; the value is the last expression's.
    fn paren(&mut self) -> Result<(), CompileError> {
        self.paren_depth += 1;
        self.advance();

        loop {
            self.assignment()?;
            if !self.at(",") {
                break;
            }
            self.advance();
        }

        if !self.at(")") {
            return Err(self.fail(ErrorKind::MissingParen));
        }
        self.paren_depth -= 1;
        self.advance();
        Ok(())
    }

    fn identifier(&mut self) -> Result<(), CompileError> {
        let name = self.tok.text.clone();

        if let Some(f) = intrinsics::lookup(&name) {
            if f.pcode == Pcode::FuncIif {
                self.conditional()?;
            } else {
                self.call(f)?;
            }
        } else if let Some(value) = intrinsics::constant(&name) {
            self.emitter.load_const(value);
        } else if let Some(slot) = self.params.slot(&name) {
            self.emitter.load_var(slot);
        } else {
            return Err(self.fail(ErrorKind::NotAVar));
        }

        self.advance();
        Ok(())
    }

    /// Intrinsic call. Each argument is pushed; the opcode pops them.
    /// Leaves the closing paren as the current token.
    fn call(&mut self, f: &Intrinsic) -> Result<(), CompileError> {
        self.advance();
        if !self.at("(") {
            return Err(self.fail(ErrorKind::MissingParen));
        }
        self.paren_depth += 1;
        self.advance();

        if self.at(")") {
            if f.arity > 0 {
                return Err(self.fail(ErrorKind::InsufficientArgs));
            }
        } else {
            let mut count = 0;
            loop {
                self.assignment()?;
                count += 1;
                if count > f.arity {
                    return Err(self.fail(ErrorKind::TooManyArgs));
                }
                self.emitter.push();
                if !self.at(",") {
                    break;
                }
                self.advance();
            }
            if count < f.arity {
                return Err(self.fail(ErrorKind::InsufficientArgs));
            }
            if !self.at(")") {
                return Err(self.fail(ErrorKind::MissingParen));
            }
        }

        self.paren_depth -= 1;
        self.emitter.emit_short(f.pcode);
        Ok(())
    }

    /// `iif(cond, then, else)` compiled to jumps:
    ///
    /// ```text
    ///     cond
    ///     jumpf F
    ///     then
    ///     jump  E
    /// F:  else
    /// E:
    /// ```
    ///
    /// Leaves the closing paren as the current token.
    fn conditional(&mut self) -> Result<(), CompileError> {
        self.advance();
        if !self.at("(") {
            return Err(self.fail(ErrorKind::MissingParen));
        }
        self.paren_depth += 1;
        self.advance();

        self.iif_depth += 1;
        let cond = self.assignment();
        self.iif_depth -= 1;
        cond?;
        self.expect_comma()?;

        let on_false = self.emitter.new_label();
        self.emitter.branch(Pcode::JumpFalse, on_false);
        self.advance();
        self.assignment()?;
        self.expect_comma()?;

        let end = self.emitter.new_label();
        self.emitter.branch(Pcode::JumpAlways, end);
        self.emitter.post_label(on_false);
        self.advance();
        self.assignment()?;

        if self.at(",") {
            return Err(self.fail(ErrorKind::TooManyArgs));
        }
        if !self.at(")") {
            return Err(self.fail(ErrorKind::MissingParen));
        }
        self.emitter.post_label(end);
        self.paren_depth -= 1;
        Ok(())
    }

    fn expect_comma(&self) -> Result<(), CompileError> {
        if self.at(",") {
            Ok(())
        } else if self.at(")") {
            Err(self.fail(ErrorKind::InsufficientArgs))
        } else {
            Err(self.fail(ErrorKind::MissingComma))
        }
    }
}

/// `0x..` literal as a 32-bit pattern. Malformed text reads as zero.
fn parse_hex(text: &str) -> f64 {
    text.strip_prefix("0x")
        .and_then(|digits| u32::from_str_radix(digits, 16).ok())
        .map_or(0.0, |bits| bits as i32 as f64)
}
