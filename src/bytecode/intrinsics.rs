use std::collections::HashMap;
use std::sync::OnceLock;

use crate::bytecode::op::Pcode;

/// A built-in function: name, the opcode it compiles to, and its fixed arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intrinsic {
    pub name: &'static str,
    pub pcode: Pcode,
    pub arity: usize,
}

const fn intrinsic(name: &'static str, pcode: Pcode, arity: usize) -> Intrinsic {
    Intrinsic { name, pcode, arity }
}

const INTRINSICS: &[Intrinsic] = &[
    intrinsic("abs", Pcode::FuncAbs, 1),
    intrinsic("iif", Pcode::FuncIif, 3),
    intrinsic("if", Pcode::FuncIif, 3),
    intrinsic("min", Pcode::FuncMin, 2),
    intrinsic("max", Pcode::FuncMax, 2),
    intrinsic("sqrt", Pcode::FuncSqrt, 1),
    intrinsic("power", Pcode::FuncPower, 2),
    intrinsic("round", Pcode::FuncRound, 1),
    intrinsic("floor", Pcode::FuncFloor, 1),
    intrinsic("ceil", Pcode::FuncCeil, 1),
    intrinsic("cos", Pcode::FuncCos, 1),
    intrinsic("cosd", Pcode::FuncCosD, 1),
    intrinsic("sin", Pcode::FuncSin, 1),
    intrinsic("sind", Pcode::FuncSinD, 1),
    intrinsic("tan", Pcode::FuncTan, 1),
    intrinsic("tand", Pcode::FuncTanD, 1),
    intrinsic("acos", Pcode::FuncAcos, 1),
    intrinsic("acosd", Pcode::FuncAcosD, 1),
    intrinsic("asin", Pcode::FuncAsin, 1),
    intrinsic("asind", Pcode::FuncAsinD, 1),
    intrinsic("atan", Pcode::FuncAtan, 1),
    intrinsic("atand", Pcode::FuncAtanD, 1),
    intrinsic("avg", Pcode::FuncAvg, 2),
    intrinsic("numberformat", Pcode::FuncNumberFormat, 3),
];

/// Built-in constants. Their names cannot be used as parameters.
pub const CONSTANTS: &[(&str, f64)] = &[
    ("ce", std::f64::consts::E),
    ("cpi", std::f64::consts::PI),
];

fn table() -> &'static HashMap<&'static str, Intrinsic> {
    static TABLE: OnceLock<HashMap<&'static str, Intrinsic>> = OnceLock::new();
    TABLE.get_or_init(|| INTRINSICS.iter().map(|f| (f.name, *f)).collect())
}

pub fn lookup(name: &str) -> Option<&'static Intrinsic> {
    table().get(name)
}

/// Catalogue entry for an opcode; the first name wins for aliased opcodes.
pub fn by_pcode(pcode: Pcode) -> Option<&'static Intrinsic> {
    INTRINSICS.iter().find(|f| f.pcode == pcode)
}

pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS.iter().find(|(n, _)| *n == name).map(|&(_, v)| v)
}

pub fn is_reserved(name: &str) -> bool {
    constant(name).is_some()
}
