//! The target instruction container.

use crate::error::{CompilerError, Result};
use crate::opcode::{Opcode, OperandSpec};
use neoc_data::{LabelId, MethodId};

/// Unresolved branch targets of a TRY marker. Absent handlers encode as a
/// zero offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TryTargets {
    pub catch: Option<LabelId>,
    pub finally: Option<LabelId>,
}

/// One target instruction: an opcode, its encoded operand (with length
/// prefix where the opcode requires one), and resolution state for
/// branches and cross-method calls.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    prefix: Vec<u8>,
    operand: Vec<u8>,
    /// Method-relative byte address; assigned by the owning method.
    pub(crate) address: u32,
    pub line: Option<u32>,
    /// Intra-method branch target, patched during finalization.
    pub jump_target: Option<LabelId>,
    /// TRY handler labels, patched during finalization.
    pub try_targets: Option<TryTargets>,
    /// Callee of a CALL instruction, patched during module finalization.
    pub call_target: Option<MethodId>,
}

impl Instruction {
    /// An instruction without operand bytes. Only valid for opcodes whose
    /// operand specification is `None`.
    pub fn new(opcode: Opcode) -> Self {
        debug_assert_eq!(opcode.operand_spec(), OperandSpec::None);
        Self {
            opcode,
            prefix: vec![],
            operand: vec![],
            address: 0,
            line: None,
            jump_target: None,
            try_targets: None,
            call_target: None,
        }
    }

    /// An instruction with a fixed-size operand, validated against the
    /// opcode's operand specification.
    pub fn with_operand(opcode: Opcode, operand: Vec<u8>) -> Result<Self> {
        match opcode.operand_spec() {
            OperandSpec::Fixed(n) if operand.len() == n => {}
            OperandSpec::None if operand.is_empty() => {}
            spec => {
                return Err(CompilerError::Encoding {
                    opcode,
                    message: format!("{} operand bytes do not fit {spec:?}", operand.len()),
                });
            }
        }
        Ok(Self { operand, ..Self::raw(opcode) })
    }

    /// A data-push instruction; computes the little-endian length prefix
    /// required by the opcode.
    pub fn with_data(opcode: Opcode, data: Vec<u8>) -> Result<Self> {
        let OperandSpec::Prefixed(prefix_len) = opcode.operand_spec() else {
            return Err(CompilerError::Encoding {
                opcode,
                message: "opcode does not take a length-prefixed operand".into(),
            });
        };
        let max = match prefix_len {
            1 => 0xFF,
            2 => 0xFFFF,
            _ => u32::MAX as usize,
        };
        if data.len() > max {
            return Err(CompilerError::Encoding {
                opcode,
                message: format!("{} data bytes exceed the {prefix_len}-byte prefix", data.len()),
            });
        }
        let prefix = (data.len() as u32).to_le_bytes()[..prefix_len].to_vec();
        Ok(Self { prefix, operand: data, ..Self::raw(opcode) })
    }

    /// A branch with an unresolved target; the operand is zeroed until
    /// finalization.
    pub fn jump(opcode: Opcode, target: LabelId) -> Self {
        let OperandSpec::Fixed(n) = opcode.operand_spec() else {
            unreachable!("branch opcodes carry a fixed-width offset");
        };
        Self { operand: vec![0; n], jump_target: Some(target), ..Self::raw(opcode) }
    }

    /// A wide TRY marker with unresolved handler offsets.
    pub fn try_marker(catch: Option<LabelId>, finally: Option<LabelId>) -> Self {
        Self {
            operand: vec![0; 8],
            try_targets: Some(TryTargets { catch, finally }),
            ..Self::raw(Opcode::TryL)
        }
    }

    /// A wide CALL to another method of the module; the offset is patched
    /// once both methods have start addresses.
    pub fn call(target: MethodId) -> Self {
        Self { operand: vec![0; 4], call_target: Some(target), ..Self::raw(Opcode::CallL) }
    }

    /// A SYSCALL with the interop service's call hash.
    pub fn syscall(hash: [u8; 4]) -> Self {
        Self { operand: hash.to_vec(), ..Self::raw(Opcode::Syscall) }
    }

    fn raw(opcode: Opcode) -> Self {
        Self {
            opcode,
            prefix: vec![],
            operand: vec![],
            address: 0,
            line: None,
            jump_target: None,
            try_targets: None,
            call_target: None,
        }
    }

    pub fn with_line(mut self, line: Option<u32>) -> Self {
        self.line = line;
        self
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn operand(&self) -> &[u8] {
        &self.operand
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Overwrites the operand during finalization. The replacement must
    /// keep the instruction's size.
    pub(crate) fn patch_operand(&mut self, operand: Vec<u8>) -> Result<()> {
        if operand.len() != self.operand.len() {
            return Err(CompilerError::Encoding {
                opcode: self.opcode,
                message: format!(
                    "patch of {} bytes for a {}-byte operand",
                    operand.len(),
                    self.operand.len()
                ),
            });
        }
        self.operand = operand;
        Ok(())
    }

    /// Encoded size in bytes.
    pub fn byte_len(&self) -> u32 {
        1 + self.prefix.len() as u32 + self.operand.len() as u32
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.opcode.byte());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(&self.operand);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len() as usize);
        self.write_to(&mut out);
        out
    }
}
