use crate::bytecode::ir::Program;
use crate::bytecode::op::Pcode;
use crate::runtime::runtime_error::{
    RuntimeError, divide_by_zero, illegal_code, insufficient_args, no_code, stack_leak,
    stack_overflow, too_many_args,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Operand stack capacity.
    pub stack_size: usize,
    /// Variable memory slots; also the maximum parameter count.
    pub memory_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            stack_size: 50,
            memory_size: 20,
        }
    }
}

/// Result of a completed run. `leak` is set when the stack was not empty at
/// `EndCode`; the value is still the accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub value: f64,
    pub leak: Option<RuntimeError>,
}

/// Stateless executor. Each call to [`Vm::execute`] gets its own registers,
/// stack and memory, so one program can be run from many threads.
#[derive(Debug, Clone, Default)]
pub struct Vm {
    config: VmConfig,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn execute(&self, program: &Program, args: &[f64]) -> Result<Execution, RuntimeError> {
        if program.is_empty() {
            return Err(no_code());
        }
        let declared = program
            .param_count()
            .ok_or_else(|| illegal_code(format!("Header={}", program.code[0])))?;

        if declared > args.len() {
            return Err(insufficient_args(declared));
        }
        if declared > self.config.memory_size {
            return Err(too_many_args(self.config.memory_size, declared));
        }

        let mut memory = vec![0.0; self.config.memory_size];
        memory[..declared].copy_from_slice(&args[..declared]);

        let mut machine = Machine {
            code: &program.code,
            constants: &program.constants,
            stack: Vec::with_capacity(self.config.stack_size),
            stack_size: self.config.stack_size,
            memory,
            ax: 0.0,
            ip: 1,
        };
        machine.run()
    }
}

/// Registers and storage for one run.
struct Machine<'a> {
    code: &'a [i32],
    constants: &'a [f64],
    stack: Vec<f64>,
    stack_size: usize,
    memory: Vec<f64>,
    ax: f64,
    ip: usize,
}

impl Machine<'_> {
    fn run(&mut self) -> Result<Execution, RuntimeError> {
        loop {
            let word = *self
                .code
                .get(self.ip)
                .ok_or_else(|| illegal_code(format!("IP={} past end of code", self.ip)))?;
            let op = Pcode::from_word(word).ok_or_else(|| illegal_code(format!("Pcode={}", word)))?;

            tracing::trace!(ip = self.ip, ?op, ax = self.ax, sp = self.stack.len(), "step");

            match op {
                // Data movement
                Pcode::Push => self.push(self.ax)?,
                Pcode::PushVar => {
                    self.ax = self.var()?;
                    self.push(self.ax)?;
                }
                Pcode::PushConst => {
                    self.ax = self.constant()?;
                    self.push(self.ax)?;
                }
                Pcode::LoadConst => self.ax = self.constant()?,
                Pcode::LoadVar => self.ax = self.var()?,
                Pcode::StoreVar => {
                    let slot = self.slot()?;
                    self.memory[slot] = self.ax;
                }

                // Arithmetic
                Pcode::Neg => self.ax = -self.ax,
                Pcode::Add => self.binary(|a, b| a + b)?,
                Pcode::Subtract => self.binary(|a, b| a - b)?,
                Pcode::Multiply => self.binary(|a, b| a * b)?,
                Pcode::Divide => {
                    if self.ax == 0.0 {
                        return Err(self.divide_by_zero());
                    }
                    self.binary(|a, b| a / b)?;
                }
                Pcode::Modulo => {
                    if to_int(self.ax) == 0 {
                        return Err(self.divide_by_zero());
                    }
                    self.int_binary(|a, b| a.wrapping_rem(b))?;
                }

                // Logic
                Pcode::LogicalOr => self.binary(|a, b| bool_value(truthy(a) || truthy(b)))?,
                Pcode::LogicalAnd => self.binary(|a, b| bool_value(truthy(a) && truthy(b)))?,
                Pcode::LogicalNot => self.ax = bool_value(!truthy(self.ax)),

                // Comparison
                Pcode::Equal => self.binary(|a, b| bool_value(a == b))?,
                Pcode::NotEqual => self.binary(|a, b| bool_value(a != b))?,
                Pcode::LessThan => self.binary(|a, b| bool_value(a < b))?,
                Pcode::LessEqual => self.binary(|a, b| bool_value(a <= b))?,
                Pcode::GreaterThan => self.binary(|a, b| bool_value(a > b))?,
                Pcode::GreaterEqual => self.binary(|a, b| bool_value(a >= b))?,

                // Bitwise
                Pcode::BitAnd => self.int_binary(|a, b| a & b)?,
                Pcode::BitOr => self.int_binary(|a, b| a | b)?,
                Pcode::BitXor => self.int_binary(|a, b| a ^ b)?,
                Pcode::BitNot => self.ax = f64::from(!to_int(self.ax)),
                Pcode::BitShiftLeft => self.int_binary(|a, b| a.wrapping_shl(b as u32))?,
                Pcode::BitShiftRight => self.int_binary(|a, b| a.wrapping_shr(b as u32))?,

                // Jumps
                Pcode::JumpAlways => {
                    self.ip = self.jump_target()?;
                    continue;
                }
                Pcode::JumpFalse => {
                    if !truthy(self.ax) {
                        self.ip = self.jump_target()?;
                        continue;
                    }
                }
                Pcode::JumpTrue => {
                    if truthy(self.ax) {
                        self.ip = self.jump_target()?;
                        continue;
                    }
                }

                // Intrinsics
                Pcode::FuncAbs => self.unary_fn(f64::abs)?,
                Pcode::FuncSqrt => self.unary_fn(f64::sqrt)?,
                Pcode::FuncRound => self.unary_fn(f64::round_ties_even)?,
                Pcode::FuncFloor => self.unary_fn(f64::floor)?,
                Pcode::FuncCeil => self.unary_fn(f64::ceil)?,
                Pcode::FuncCos => self.unary_fn(f64::cos)?,
                Pcode::FuncCosD => self.unary_fn(|x| x.to_radians().cos())?,
                Pcode::FuncSin => self.unary_fn(f64::sin)?,
                Pcode::FuncSinD => self.unary_fn(|x| x.to_radians().sin())?,
                Pcode::FuncTan => self.unary_fn(f64::tan)?,
                Pcode::FuncTanD => self.unary_fn(|x| x.to_radians().tan())?,
                Pcode::FuncAcos => self.unary_fn(f64::acos)?,
                Pcode::FuncAcosD => self.unary_fn(|x| x.acos().to_degrees())?,
                Pcode::FuncAsin => self.unary_fn(f64::asin)?,
                Pcode::FuncAsinD => self.unary_fn(|x| x.asin().to_degrees())?,
                Pcode::FuncAtan => self.unary_fn(f64::atan)?,
                Pcode::FuncAtanD => self.unary_fn(|x| x.atan().to_degrees())?,
                Pcode::FuncMax => self.binary_fn(f64::max)?,
                Pcode::FuncMin => self.binary_fn(f64::min)?,
                Pcode::FuncPower => self.binary_fn(f64::powf)?,
                Pcode::FuncAvg => self.binary_fn(|a, b| (a + b) / 2.0)?,
                Pcode::FuncNumberFormat => {
                    let max_frac = self.pop()?;
                    let min_int = self.pop()?;
                    let value = self.pop()?;
                    self.ax = number_format(value, min_int, max_frac);
                }

                Pcode::EndCode => {
                    let leak = if self.stack.is_empty() {
                        None
                    } else {
                        let e = stack_leak(self.ip, self.ax, self.stack.len());
                        tracing::warn!(detail = %e.detail, "stack not empty at end of code");
                        Some(e)
                    };
                    return Ok(Execution {
                        value: self.ax,
                        leak,
                    });
                }

                Pcode::None | Pcode::FuncIif => {
                    return Err(illegal_code(format!("Pcode={}", word)));
                }
            }

            self.ip += 1 + op.operand_count();
        }
    }

    // =========================================================================
    // Stack and operands
    // =========================================================================

    fn push(&mut self, value: f64) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.stack_size {
            return Err(stack_overflow(self.ip, self.ax, self.stack.len()));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<f64, RuntimeError> {
        self.stack
            .pop()
            .ok_or_else(|| illegal_code(format!("stack underflow at IP={}", self.ip)))
    }

    fn operand(&self) -> Result<i32, RuntimeError> {
        self.code
            .get(self.ip + 1)
            .copied()
            .ok_or_else(|| illegal_code(format!("missing operand at IP={}", self.ip)))
    }

    fn slot(&self) -> Result<usize, RuntimeError> {
        let n = self.operand()?;
        usize::try_from(n)
            .ok()
            .filter(|&i| i < self.memory.len())
            .ok_or_else(|| illegal_code(format!("varmem[{}] out of range at IP={}", n, self.ip)))
    }

    fn var(&self) -> Result<f64, RuntimeError> {
        Ok(self.memory[self.slot()?])
    }

    fn constant(&self) -> Result<f64, RuntimeError> {
        let n = self.operand()?;
        usize::try_from(n)
            .ok()
            .and_then(|i| self.constants.get(i))
            .copied()
            .ok_or_else(|| illegal_code(format!("const[{}] out of range at IP={}", n, self.ip)))
    }

    /// Forward-only: generated code never jumps backwards, which also keeps
    /// every run finite.
    fn jump_target(&self) -> Result<usize, RuntimeError> {
        let offset = self.operand()?;
        usize::try_from(offset)
            .ok()
            .map(|off| self.ip + off + 1)
            .filter(|&target| target < self.code.len())
            .ok_or_else(|| {
                illegal_code(format!("jump offset {} out of range at IP={}", offset, self.ip))
            })
    }

    fn divide_by_zero(&self) -> RuntimeError {
        divide_by_zero(self.ip, self.ax, self.stack.len())
    }

    // =========================================================================
    // Operator shapes
    // =========================================================================

    /// left = top of stack, right = ax
    fn binary(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let left = self.pop()?;
        self.ax = f(left, self.ax);
        Ok(())
    }

    fn int_binary(&mut self, f: impl Fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        self.binary(|a, b| f64::from(f(to_int(a), to_int(b))))
    }

    fn unary_fn(&mut self, f: impl Fn(f64) -> f64) -> Result<(), RuntimeError> {
        let x = self.pop()?;
        self.ax = f(x);
        Ok(())
    }

    fn binary_fn(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.ax = f(a, b);
        Ok(())
    }
}

fn truthy(x: f64) -> bool {
    x > 0.0
}

fn bool_value(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Truncate toward zero; out-of-range values saturate, NaN is 0.
fn to_int(x: f64) -> i32 {
    x as i32
}

const MAX_FRACTION_DIGITS: usize = 15;
const MAX_INTEGER_DIGITS: usize = 32;

fn digit_count(x: f64, max: usize) -> usize {
    if x.is_nan() || x <= 0.0 {
        0
    } else {
        (x as usize).min(max)
    }
}

/// Round half away from zero at `frac` decimal places.
fn round_half_away(value: f64, frac: usize) -> f64 {
    let scale = 10f64.powi(frac as i32);
    let scaled = value * scale;
    if scaled.is_finite() { scaled.round() / scale } else { value }
}

/// Fixed-point text with a zero-padded integer part, e.g.
/// `format_fixed(3.14159, 3, 2) == "003.14"`. Midpoints round away from zero.
pub fn format_fixed(value: f64, min_int: usize, frac: usize) -> String {
    let body = format!("{:.*}", frac, round_half_away(value.abs(), frac));
    let int_len = body.find('.').unwrap_or(body.len());
    let pad = "0".repeat(min_int.saturating_sub(int_len));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, pad, body)
}

/// Round `value` through its formatted text.
fn number_format(value: f64, min_int: f64, max_frac: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let text = format_fixed(
        value,
        digit_count(min_int, MAX_INTEGER_DIGITS),
        digit_count(max_frac, MAX_FRACTION_DIGITS),
    );
    text.parse().unwrap_or(0.0)
}
