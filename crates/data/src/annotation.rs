//! The closed annotation model.
//!
//! Front ends translate source annotations into these variants; the
//! compiler never inspects annotation nodes by name.

/// One entry of an instruction-annotation list: either a raw target opcode
/// with its operand bytes, or an interop service call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstructionPattern {
    Opcode { opcode: u8, prefix: Vec<u8>, operand: Vec<u8> },
    Syscall { service: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Annotation {
    /// Method body is replaced by this fixed instruction sequence.
    Instructions(Vec<InstructionPattern>),
    /// Class represents an already-deployed contract with this script hash
    /// (big-endian, as written in source).
    ContractHash([u8; 20]),
    /// Marks the contract's entry point method.
    EntryPoint,
    /// Overrides the name exposed in the ABI (methods) or the notification
    /// name (events).
    DisplayName(String),
    /// Marks a method as read-only in the ABI.
    Safe,
}

pub fn instruction_patterns(annotations: &[Annotation]) -> Option<&[InstructionPattern]> {
    annotations.iter().find_map(|a| match a {
        Annotation::Instructions(patterns) => Some(patterns.as_slice()),
        _ => None,
    })
}

pub fn contract_hash(annotations: &[Annotation]) -> Option<[u8; 20]> {
    annotations.iter().find_map(|a| match a {
        Annotation::ContractHash(hash) => Some(*hash),
        _ => None,
    })
}

pub fn display_name(annotations: &[Annotation]) -> Option<&str> {
    annotations.iter().find_map(|a| match a {
        Annotation::DisplayName(name) => Some(name.as_str()),
        _ => None,
    })
}

pub fn is_entry_point(annotations: &[Annotation]) -> bool {
    annotations.iter().any(|a| matches!(a, Annotation::EntryPoint))
}

pub fn is_safe(annotations: &[Annotation]) -> bool {
    annotations.iter().any(|a| matches!(a, Annotation::Safe))
}
