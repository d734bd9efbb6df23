use thiserror::Error;

use crate::bytecode::intrinsics;
use crate::bytecode::ir::Program;
use crate::bytecode::op::Pcode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stack-check error: {message}")]
pub struct StackCheckError {
    pub message: String,
}

impl StackCheckError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Returns (pops, pushes) on the operand stack, or None for opcodes that may
/// not appear in a program.
fn effect(op: Pcode) -> Option<(usize, usize)> {
    use Pcode::*;
    Some(match op {
        Push | PushVar | PushConst => (0, 1),
        LoadConst | LoadVar | StoreVar => (0, 0),

        Neg | LogicalNot | BitNot => (0, 0),
        Add | Subtract | Multiply | Divide | Modulo => (1, 0),
        LogicalOr | LogicalAnd => (1, 0),
        Equal | NotEqual | LessThan | LessEqual | GreaterThan | GreaterEqual => (1, 0),
        BitAnd | BitOr | BitXor | BitShiftLeft | BitShiftRight => (1, 0),

        // Jumps test the accumulator
        JumpAlways | JumpFalse | JumpTrue => (0, 0),

        EndCode => (0, 0),

        None | FuncIif => return Option::None,
        func => (intrinsics::by_pcode(func)?.arity, 0),
    })
}

/// Linear scan of the instruction stream.
///
/// Every expression the compiler emits has a net stack effect of zero, so
/// both arms of a conditional and both paths around a short-circuit leave
/// the same height and a straight scan is exact. Returns the maximum stack
/// depth reached.
pub fn check_program(program: &Program) -> Result<usize, StackCheckError> {
    let code = &program.code;
    if code.is_empty() {
        return Err(StackCheckError::new("missing header"));
    }

    let mut height: usize = 0;
    let mut max_height: usize = 0;
    let mut ip = 1;

    while ip < code.len() {
        let op = Pcode::from_word(code[ip])
            .ok_or_else(|| StackCheckError::new(format!("bad opcode {} at ip={}", code[ip], ip)))?;
        let (pops, pushes) = effect(op)
            .ok_or_else(|| StackCheckError::new(format!("{:?} not allowed at ip={}", op, ip)))?;

        height = height.checked_sub(pops).ok_or_else(|| {
            StackCheckError::new(format!(
                "stack underflow at ip={}, op={:?}, needed {} items",
                ip, op, pops
            ))
        })?;
        height += pushes;
        max_height = max_height.max(height);

        if op == Pcode::EndCode {
            if height != 0 {
                return Err(StackCheckError::new(format!(
                    "unbalanced stack at end: {} items left",
                    height
                )));
            }
            return Ok(max_height);
        }

        ip += 1 + op.operand_count();
        if ip > code.len() {
            return Err(StackCheckError::new(format!(
                "truncated operand for {:?}",
                op
            )));
        }
    }

    Err(StackCheckError::new("no EndCode"))
}
