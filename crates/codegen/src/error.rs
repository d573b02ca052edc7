//! Error types for compilation.

use crate::opcode::Opcode;
use std::fmt;

/// Error type for the compiler. All variants are fatal; the first error
/// aborts the compilation.
#[derive(Debug)]
pub enum CompilerError {
    /// A source instruction the target VM cannot express.
    UnsupportedInstruction { insn: String, method: String },
    /// An exception type other than the base exception class.
    UnsupportedExceptionType { ty: String, method: String },
    /// A structural limit of the target format was exceeded.
    LimitExceeded { what: &'static str, limit: usize, got: usize },
    /// A call target could not be resolved in the type registry.
    MethodNotFound { owner: String, name: String },
    /// A method was registered as a call target but never compiled.
    UnresolvedCallTarget { id: String },
    /// An internal consistency rule was broken.
    InvariantViolation { message: String },
    /// More than one method is marked as the entry point.
    MultipleEntryPoints { first: String, second: String },
    /// No method is marked as the entry point.
    NoEntryPoint { class: String },
    /// An operand does not fit the opcode's operand specification.
    Encoding { opcode: Opcode, message: String },
}

impl CompilerError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        CompilerError::InvariantViolation { message: message.into() }
    }

    pub(crate) fn unsupported(insn: impl Into<String>, method: impl Into<String>) -> Self {
        CompilerError::UnsupportedInstruction { insn: insn.into(), method: method.into() }
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilerError::UnsupportedInstruction { insn, method } => {
                write!(f, "instruction {insn} in {method} is not supported on the target VM")
            }
            CompilerError::UnsupportedExceptionType { ty, method } => {
                write!(f, "exception type {ty} in {method}: only the base exception class can be caught or thrown")
            }
            CompilerError::LimitExceeded { what, limit, got } => {
                write!(f, "too many {what}: {got} exceeds the limit of {limit}")
            }
            CompilerError::MethodNotFound { owner, name } => {
                write!(f, "method {owner}.{name} was not found")
            }
            CompilerError::UnresolvedCallTarget { id } => {
                write!(f, "call target {id} was registered but never compiled")
            }
            CompilerError::InvariantViolation { message } => {
                write!(f, "invariant violated: {message}")
            }
            CompilerError::MultipleEntryPoints { first, second } => {
                write!(f, "both {first} and {second} are marked as the entry point")
            }
            CompilerError::NoEntryPoint { class } => {
                write!(f, "{class} has no entry point method")
            }
            CompilerError::Encoding { opcode, message } => {
                write!(f, "cannot encode {opcode:?}: {message}")
            }
        }
    }
}

impl std::error::Error for CompilerError {}

/// Shorthand for [`CompilerError::InvariantViolation`], the error every
/// internal consistency check raises.
pub(crate) fn invariant(message: impl Into<String>) -> CompilerError {
    CompilerError::invariant(message)
}

/// Result type for compilation operations.
pub type Result<T> = std::result::Result<T, CompilerError>;
