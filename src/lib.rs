//! Compiler and virtual machine for codeblocks: small numeric formulas of the
//! form `{|params|expression}` compiled once to bytecode and evaluated many
//! times against different arguments.

pub mod bytecode;
pub mod codeblock;
pub mod error;
pub mod frontend;
pub mod runtime;

pub use bytecode::compile::CompileOptions;
pub use bytecode::compile_error::CompileError;
pub use bytecode::ir::Program;
pub use codeblock::Codeblock;
pub use error::ErrorKind;
pub use runtime::runtime_error::RuntimeError;
pub use runtime::vm::{Execution, Vm, VmConfig};
