// =============================================================================
// PCODE - Bytecode instructions
// =============================================================================

/// One instruction word. Binary operators take the left operand from the top
/// of the stack and the right operand from the accumulator (`ax`), pop, and
/// leave the result in `ax`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pcode {
    None = 0,

    // data movement
    /// push ax
    Push,
    /// push varmem[n] (and load it into ax)
    PushVar,
    /// push const[n] (and load it into ax)
    PushConst,
    /// ax = const[n]
    LoadConst,
    /// ax = varmem[n]
    LoadVar,
    /// varmem[n] = ax
    StoreVar,

    // arithmetic
    Neg,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // logic, normalised to 0/1
    LogicalOr,
    LogicalAnd,
    LogicalNot,

    // comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // 32-bit integer ops
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    BitShiftLeft,
    BitShiftRight,

    // ==========================================================================
    // Jumps. The operand is a signed offset from the jump's own position:
    // target = ip + offset + 1.
    // ==========================================================================
    JumpAlways,
    /// Jump when ax is not > 0.
    JumpFalse,
    /// Jump when ax > 0.
    JumpTrue,

    // intrinsics; arguments are on the stack in declaration order
    FuncAbs,
    /// Catalogue marker for `iif`; compiled to jumps, never emitted.
    FuncIif,
    FuncMax,
    FuncMin,
    FuncSqrt,
    FuncPower,
    FuncRound,
    FuncFloor,
    FuncCeil,
    FuncCos,
    FuncCosD,
    FuncSin,
    FuncSinD,
    FuncTan,
    FuncTanD,
    FuncAcos,
    FuncAcosD,
    FuncAsin,
    FuncAsinD,
    FuncAtan,
    FuncAtanD,
    FuncNumberFormat,
    FuncAvg,

    EndCode,
}

impl Pcode {
    pub const ALL: [Pcode; 55] = [
        Pcode::None,
        Pcode::Push,
        Pcode::PushVar,
        Pcode::PushConst,
        Pcode::LoadConst,
        Pcode::LoadVar,
        Pcode::StoreVar,
        Pcode::Neg,
        Pcode::Add,
        Pcode::Subtract,
        Pcode::Multiply,
        Pcode::Divide,
        Pcode::Modulo,
        Pcode::LogicalOr,
        Pcode::LogicalAnd,
        Pcode::LogicalNot,
        Pcode::Equal,
        Pcode::NotEqual,
        Pcode::LessThan,
        Pcode::LessEqual,
        Pcode::GreaterThan,
        Pcode::GreaterEqual,
        Pcode::BitAnd,
        Pcode::BitOr,
        Pcode::BitXor,
        Pcode::BitNot,
        Pcode::BitShiftLeft,
        Pcode::BitShiftRight,
        Pcode::JumpAlways,
        Pcode::JumpFalse,
        Pcode::JumpTrue,
        Pcode::FuncAbs,
        Pcode::FuncIif,
        Pcode::FuncMax,
        Pcode::FuncMin,
        Pcode::FuncSqrt,
        Pcode::FuncPower,
        Pcode::FuncRound,
        Pcode::FuncFloor,
        Pcode::FuncCeil,
        Pcode::FuncCos,
        Pcode::FuncCosD,
        Pcode::FuncSin,
        Pcode::FuncSinD,
        Pcode::FuncTan,
        Pcode::FuncTanD,
        Pcode::FuncAcos,
        Pcode::FuncAcosD,
        Pcode::FuncAsin,
        Pcode::FuncAsinD,
        Pcode::FuncAtan,
        Pcode::FuncAtanD,
        Pcode::FuncNumberFormat,
        Pcode::FuncAvg,
        Pcode::EndCode,
    ];

    /// Decode an instruction word.
    pub fn from_word(word: i32) -> Option<Pcode> {
        usize::try_from(word)
            .ok()
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    pub fn word(self) -> i32 {
        self as i32
    }

    /// Number of inline operand words following the opcode.
    pub fn operand_count(self) -> usize {
        match self {
            Pcode::PushVar
            | Pcode::PushConst
            | Pcode::LoadConst
            | Pcode::LoadVar
            | Pcode::StoreVar
            | Pcode::JumpAlways
            | Pcode::JumpFalse
            | Pcode::JumpTrue => 1,
            _ => 0,
        }
    }

    pub fn is_jump(self) -> bool {
        matches!(self, Pcode::JumpAlways | Pcode::JumpFalse | Pcode::JumpTrue)
    }

    /// Mnemonic used by the disassembler.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Pcode::None => "none",
            Pcode::Push => "push",
            Pcode::PushVar => "pushv",
            Pcode::PushConst => "pushc",
            Pcode::LoadConst => "loadc",
            Pcode::LoadVar => "loadv",
            Pcode::StoreVar => "storev",
            Pcode::Neg => "neg",
            Pcode::Add => "add",
            Pcode::Subtract => "sub",
            Pcode::Multiply => "mul",
            Pcode::Divide => "div",
            Pcode::Modulo => "mod",
            Pcode::LogicalOr => "or",
            Pcode::LogicalAnd => "and",
            Pcode::LogicalNot => "not",
            Pcode::Equal => "eq",
            Pcode::NotEqual => "neq",
            Pcode::LessThan => "lt",
            Pcode::LessEqual => "le",
            Pcode::GreaterThan => "gt",
            Pcode::GreaterEqual => "ge",
            Pcode::BitAnd => "bitand",
            Pcode::BitOr => "bitor",
            Pcode::BitXor => "bitxor",
            Pcode::BitNot => "bitnot",
            Pcode::BitShiftLeft => "bitlft",
            Pcode::BitShiftRight => "bitrgt",
            Pcode::JumpAlways => "jump",
            Pcode::JumpFalse => "jumpf",
            Pcode::JumpTrue => "jumpt",
            Pcode::EndCode => "end",
            _ => "call",
        }
    }
}
