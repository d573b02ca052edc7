//! Constant pushes.
//!
//! Integers take the shortest encoding NeoVM offers: a dedicated opcode for
//! -1 through 16, otherwise the narrowest PUSHINT variant whose two's
//! complement range holds the value. Byte strings use the PUSHDATA family
//! with a length prefix sized to the payload.

use crate::error::{invariant, Result};
use crate::instruction::Instruction;
use crate::opcode::Opcode;

use super::MethodContext;

impl MethodContext<'_> {
    pub(crate) fn push_int(&mut self, value: i64) -> Result<()> {
        self.method.add(encode_push_int(value)?);
        Ok(())
    }

    pub(crate) fn push_data(&mut self, data: Vec<u8>) -> Result<()> {
        self.method.add(encode_push_data(data)?);
        Ok(())
    }
}

pub(crate) fn encode_push_int(value: i64) -> Result<Instruction> {
    if let Some(opcode) = Opcode::push_small_int(value) {
        return Ok(Instruction::new(opcode));
    }
    if let Ok(v) = i8::try_from(value) {
        Instruction::with_operand(Opcode::PushInt8, v.to_le_bytes().to_vec())
    } else if let Ok(v) = i16::try_from(value) {
        Instruction::with_operand(Opcode::PushInt16, v.to_le_bytes().to_vec())
    } else if let Ok(v) = i32::try_from(value) {
        Instruction::with_operand(Opcode::PushInt32, v.to_le_bytes().to_vec())
    } else {
        Instruction::with_operand(Opcode::PushInt64, value.to_le_bytes().to_vec())
    }
}

pub(crate) fn encode_push_data(data: Vec<u8>) -> Result<Instruction> {
    let opcode = if data.len() < 0x100 {
        Opcode::PushData1
    } else if data.len() < 0x1_0000 {
        Opcode::PushData2
    } else {
        Opcode::PushData4
    };
    Instruction::with_data(opcode, data)
}

/// Reads the value back out of a constant-integer instruction. Returns
/// `None` for anything that is not a PUSHM1/PUSH0-16/PUSHINT*.
pub(crate) fn decode_push_int(insn: &Instruction) -> Option<i64> {
    let byte = insn.opcode.byte();
    if byte == Opcode::PushM1.byte() {
        return Some(-1);
    }
    if (Opcode::Push0.byte()..=Opcode::Push16.byte()).contains(&byte) {
        return Some((byte - Opcode::Push0.byte()) as i64);
    }
    let operand = insn.operand();
    match insn.opcode {
        Opcode::PushInt8 => Some(i8::from_le_bytes([operand[0]]) as i64),
        Opcode::PushInt16 => {
            let mut b = [0; 2];
            b.copy_from_slice(operand);
            Some(i16::from_le_bytes(b) as i64)
        }
        Opcode::PushInt32 => {
            let mut b = [0; 4];
            b.copy_from_slice(operand);
            Some(i32::from_le_bytes(b) as i64)
        }
        Opcode::PushInt64 => {
            let mut b = [0; 8];
            b.copy_from_slice(operand);
            Some(i64::from_le_bytes(b))
        }
        _ => None,
    }
}

/// Extracts the payload of a PUSHDATA instruction, or errors when the last
/// emitted instruction is something else. Used by the literal-converter
/// rewrites, which demand a compile-time constant operand.
pub(crate) fn take_pushed_data(ctx: &mut MethodContext<'_>) -> Result<Vec<u8>> {
    let is_data = matches!(
        ctx.method.last().map(|i| i.opcode),
        Some(Opcode::PushData1 | Opcode::PushData2 | Opcode::PushData4)
    );
    if !is_data {
        return Err(invariant(
            "literal conversion requires a constant string operand",
        ));
    }
    let insn = ctx.method.remove_last()?;
    Ok(insn.operand().to_vec())
}
