pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod emit;
pub mod intrinsics;
pub mod ir;
pub mod op;
pub mod stack_check;

pub use ir::Program;
pub use op::Pcode;
