//! NeoVM code generator.
//!
//! This crate compiles the stack-machine program model of `neoc-data` into
//! NeoVM bytecode plus a contract ABI. The translation is deliberately
//! NeoVM-specific and leans on what the target gives it:
//!
//! - Integers are unbounded, so every source integer width shares one set
//!   of arithmetic opcodes and numeric casts disappear.
//! - Objects are arrays indexed by flattened field position; byte arrays
//!   are buffers; strings are byte strings.
//! - Branches always use the four-byte offset forms, filled in once all
//!   instruction addresses are known.
//!
//! The top-level entry point is [`compile`], or [`Compiler`] when the
//! caller wants the finalized [`Module`] instead of serialized bytes.

mod abi;
mod error;
mod instruction;
mod method;
mod module;
mod opcode;
mod translator;

#[cfg(test)]
mod tests;

pub use abi::{AbiEvent, AbiMethod, AbiParam, ContractAbi, ParamType};
pub use error::{CompilerError, Result};
pub use instruction::Instruction;
pub use method::Method;
pub use module::{EventDef, MethodToken, Module};
pub use opcode::{interop, interop_hash, Opcode, SlotFamily, StackItemType};
pub use translator::{compile, CompilationUnit, Compiler, INITIALIZE_METHOD};
