use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("runtime error e{}: {}: {}", .kind.code(), .kind, .detail)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            detail: detail.into(),
        }
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }
}

pub fn no_code() -> RuntimeError {
    RuntimeError::new(ErrorKind::NoCode, "Check compile error.")
}

pub fn insufficient_args(expected: usize) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::InsufficientArgs,
        format!("Expecting {} arguments.", expected),
    )
}

pub fn too_many_args(max: usize, count: usize) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::TooManyArgs,
        format!("Max arguments={}, argcount={}", max, count),
    )
}

pub fn illegal_code(detail: impl Into<String>) -> RuntimeError {
    RuntimeError::new(ErrorKind::IllegalCode, detail)
}

/// Register dump used by the machine-state errors.
pub fn vcpu_state(ip: usize, ax: f64, sp: usize) -> String {
    format!("IP={}, AX={}, SP={}", ip, ax, sp)
}

pub fn stack_overflow(ip: usize, ax: f64, sp: usize) -> RuntimeError {
    RuntimeError::new(ErrorKind::StackOverflow, vcpu_state(ip, ax, sp))
}

pub fn divide_by_zero(ip: usize, ax: f64, sp: usize) -> RuntimeError {
    RuntimeError::new(ErrorKind::DivideByZero, vcpu_state(ip, ax, sp))
}

pub fn stack_leak(ip: usize, ax: f64, sp: usize) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::StackMemoryLeak,
        format!("VCPU state: {}", vcpu_state(ip, ax, sp)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_pick_kind() {
        assert_eq!(no_code().kind, ErrorKind::NoCode);
        assert_eq!(insufficient_args(2).detail, "Expecting 2 arguments.");
        assert_eq!(too_many_args(20, 21).detail, "Max arguments=20, argcount=21");
        assert_eq!(illegal_code("Pcode=99").kind, ErrorKind::IllegalCode);
    }

    #[test]
    fn test_state_details() {
        assert_eq!(divide_by_zero(5, 0.0, 1).detail, "IP=5, AX=0, SP=1");
        assert_eq!(stack_leak(9, 1.5, 2).detail, "VCPU state: IP=9, AX=1.5, SP=2");
    }

    #[test]
    fn test_display() {
        let e = stack_overflow(3, 2.0, 50);
        assert_eq!(e.to_string(), "runtime error e23: Stack overflow: IP=3, AX=2, SP=50");
        assert_eq!(e.code(), 23);
    }
}
