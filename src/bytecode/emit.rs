use crate::bytecode::compile_error::CompileError;
use crate::bytecode::ir::Program;
use crate::bytecode::op::Pcode;
use crate::error::ErrorKind;

/// Handle for a jump target allocated during one compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Clone, Copy)]
struct JumpRecord {
    at: usize,
    label: Label,
}

/// Bytecode buffer for a single compile: instruction words, the constant
/// pool, and the label/jump bookkeeping resolved by [`Emitter::finish`].
#[derive(Debug)]
pub struct Emitter {
    code: Vec<i32>,
    // parallel to `code`; false for the header and operand words
    is_opcode: Vec<bool>,
    constants: Vec<f64>,
    labels: Vec<Option<usize>>,
    jumps: Vec<JumpRecord>,
    last_label_at: Option<usize>,
    optimize: bool,
}

impl Emitter {
    pub fn new(optimize: bool) -> Self {
        Self {
            code: Vec::new(),
            is_opcode: Vec::new(),
            constants: Vec::new(),
            labels: Vec::new(),
            jumps: Vec::new(),
            last_label_at: None,
            optimize,
        }
    }

    pub fn code(&self) -> &[i32] {
        &self.code
    }

    /// Position the next word will be written to.
    pub fn here(&self) -> usize {
        self.code.len()
    }

    pub fn emit_header(&mut self, param_count: usize) {
        self.code.push(param_count as i32);
        self.is_opcode.push(false);
    }

    pub fn emit_short(&mut self, op: Pcode) {
        self.code.push(op.word());
        self.is_opcode.push(true);
    }

    pub fn emit_long(&mut self, op: Pcode, operand: i32) {
        self.emit_short(op);
        self.code.push(operand);
        self.is_opcode.push(false);
    }

    /// Append to the constant pool. Repeated values get their own slots.
    pub fn add_constant(&mut self, value: f64) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    pub fn load_const(&mut self, value: f64) {
        let index = self.add_constant(value);
        self.emit_long(Pcode::LoadConst, index as i32);
    }

    pub fn load_var(&mut self, slot: usize) {
        self.emit_long(Pcode::LoadVar, slot as i32);
    }

    pub fn store_var(&mut self, slot: usize) {
        self.emit_long(Pcode::StoreVar, slot as i32);
    }

    /// Push the accumulator. With optimisation on, a load written directly
    /// before this point is rewritten into the fused push form instead.
    pub fn push(&mut self) {
        if self.optimize && self.try_fuse_push() {
            return;
        }
        self.emit_short(Pcode::Push);
    }

    fn try_fuse_push(&mut self) -> bool {
        let here = self.here();
        // other paths join here without running the load
        if self.last_label_at == Some(here) || here < 2 {
            return false;
        }
        let at = here - 2;
        if !self.is_opcode[at] {
            return false;
        }
        let fused = match Pcode::from_word(self.code[at]) {
            Some(Pcode::LoadVar) => Pcode::PushVar,
            Some(Pcode::LoadConst) => Pcode::PushConst,
            _ => return false,
        };
        self.code[at] = fused.word();
        true
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the current position.
    pub fn post_label(&mut self, label: Label) {
        let here = self.here();
        self.labels[label.0] = Some(here);
        self.last_label_at = Some(here);
    }

    /// Emit a jump to `label`; the offset is patched in `finish`.
    pub fn branch(&mut self, op: Pcode, label: Label) {
        debug_assert!(op.is_jump());
        self.jumps.push(JumpRecord {
            at: self.here(),
            label,
        });
        self.emit_long(op, 0);
    }

    /// Terminate the program and resolve every recorded jump.
    pub fn finish(mut self) -> Result<Program, CompileError> {
        self.emit_short(Pcode::EndCode);

        for jump in &self.jumps {
            let target = self.labels[jump.label.0].ok_or_else(|| {
                CompileError::new(
                    ErrorKind::Other,
                    format!("label {} never posted{}", jump.label.0, ErrorKind::Other.tag()),
                )
            })?;
            self.code[jump.at + 1] = target as i32 - jump.at as i32 - 1;
        }

        Ok(Program::new(self.code, self.constants))
    }
}
