use crate::bytecode::compile::{CompileOptions, compile};
use crate::bytecode::compile_error::CompileError;
use crate::bytecode::disasm::disassemble;
use crate::bytecode::ir::Program;
use crate::error::ErrorKind;
use crate::runtime::runtime_error::{RuntimeError, no_code};
use crate::runtime::vm::{Execution, Vm, VmConfig};

/// A compiled formula and the outcome of the last operation on it.
///
/// ```
/// use codeblock::Codeblock;
///
/// let mut cb = Codeblock::new();
/// cb.compile("{|length,width|length*width}").unwrap();
/// assert_eq!(cb.eval(&[3.0, 17.0]), 51.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Codeblock {
    text: String,
    program: Option<Program>,
    error: ErrorKind,
    detail: String,
    options: CompileOptions,
    vm: Vm,
}

impl Codeblock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn with_vm_config(mut self, config: VmConfig) -> Self {
        self.vm = Vm::with_config(config);
        self
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// Takes effect on the next `compile`.
    pub fn set_optimize(&mut self, on: bool) {
        self.options.optimize = on;
    }

    /// Takes effect on the next `compile`.
    pub fn set_allow_conditional_assignment(&mut self, on: bool) {
        self.options.allow_conditional_assignment = on;
    }

    /// Compile `text`, replacing any previous program. On failure the unit is
    /// left without a program and the error is recorded.
    pub fn compile(&mut self, text: &str) -> Result<(), CompileError> {
        self.text = text.to_string();
        self.program = None;
        self.clear_error();

        match compile(text, self.options) {
            Ok(program) => {
                self.program = Some(program);
                Ok(())
            }
            Err(e) => {
                self.record(e.kind, &e.detail);
                Err(e)
            }
        }
    }

    /// Run the program. Errors are recorded and yield `0`; a stack leak is
    /// recorded but the computed value is returned.
    pub fn eval(&mut self, args: &[f64]) -> f64 {
        self.clear_error();

        match self.try_eval(args) {
            Ok(Execution { value, leak }) => {
                if let Some(leak) = leak {
                    self.record(leak.kind, &leak.detail);
                }
                value
            }
            Err(e) => {
                tracing::debug!(error = %e, "evaluation failed");
                self.record(e.kind, &e.detail);
                0.0
            }
        }
    }

    /// Run the program without touching recorded state.
    pub fn try_eval(&self, args: &[f64]) -> Result<Execution, RuntimeError> {
        let program = self.program.as_ref().ok_or_else(no_code)?;
        self.vm.execute(program, args)
    }

    pub fn disassemble(&self) -> Vec<String> {
        match &self.program {
            Some(program) => disassemble(program),
            None => disassemble(&Program::default()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn is_compiled(&self) -> bool {
        self.program.is_some()
    }

    pub fn last_error(&self) -> ErrorKind {
        self.error
    }

    pub fn error_code(&self) -> i32 {
        self.error.code()
    }

    pub fn error_detail(&self) -> &str {
        &self.detail
    }

    fn record(&mut self, kind: ErrorKind, detail: &str) {
        self.error = kind;
        self.detail = detail.to_string();
    }

    fn clear_error(&mut self) {
        self.record(ErrorKind::None, "");
    }
}
