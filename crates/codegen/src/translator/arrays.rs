//! Array allocation and element access.
//!
//! Reference and integer arrays become NeoVM arrays; byte and boolean
//! arrays become buffers, which support MEMCPY and conversion to byte
//! strings. A byte array built entirely from constants collapses into a
//! single PUSHDATA at compile time.

use neoc_data::{ArrayElem, SourceInsn};

use crate::error::Result;
use crate::instruction::Instruction;
use crate::opcode::{Opcode, StackItemType};

use super::{constants, Compiler, MethodContext};

impl<'a> Compiler<'a> {
    pub(crate) fn handle_new_array(
        &mut self,
        ctx: &mut MethodContext<'a>,
        elem: ArrayElem,
    ) -> Result<()> {
        match elem {
            ArrayElem::Float | ArrayElem::Double => {
                Err(ctx.unsupported("floating point array allocation"))
            }
            ArrayElem::Byte | ArrayElem::Boolean => self.convert_buffer_alloc(ctx),
            _ => {
                // An empty allocation has its own opcode.
                if ctx.method.last().map(|i| i.opcode) == Some(Opcode::Push0) {
                    ctx.method.replace_last(Instruction::new(Opcode::NewArray0))?;
                } else {
                    ctx.emit_op(Opcode::NewArray);
                }
                Ok(())
            }
        }
    }

    /// Byte and boolean arrays. When the length is a compile-time constant
    /// and the source immediately fills the array with constant stores, the
    /// whole construction folds into PUSHDATA plus a buffer conversion.
    /// Everything else allocates a zeroed buffer at run time.
    fn convert_buffer_alloc(&mut self, ctx: &mut MethodContext<'a>) -> Result<()> {
        let length = ctx.method.last().and_then(constants::decode_push_int);
        let Some(length) = length.filter(|&n| (0..=u16::MAX as i64).contains(&n)) else {
            ctx.emit_op(Opcode::NewBuffer);
            return Ok(());
        };
        let mut buffer = vec![0u8; length as usize];
        let mut filled = false;
        loop {
            match constant_store(ctx, ctx.pc) {
                Some((index, value)) if (index as usize) < buffer.len() => {
                    buffer[index as usize] = value as u8;
                    filled = true;
                    ctx.pc += 4;
                }
                _ => break,
            }
        }
        if !filled && length > 0 {
            // No literal fill; keep the dynamic allocation.
            ctx.emit_op(Opcode::NewBuffer);
            return Ok(());
        }
        ctx.method.remove_last()?;
        ctx.push_data(buffer)?;
        ctx.emit(Instruction::with_operand(
            Opcode::Convert,
            vec![StackItemType::Buffer.byte()],
        )?);
        Ok(())
    }

    pub(crate) fn handle_array_load(
        &mut self,
        ctx: &mut MethodContext<'a>,
        elem: ArrayElem,
    ) -> Result<()> {
        if matches!(elem, ArrayElem::Float | ArrayElem::Double) {
            return Err(ctx.unsupported("floating point array access"));
        }
        ctx.emit_op(Opcode::PickItem);
        Ok(())
    }

    pub(crate) fn handle_array_store(
        &mut self,
        ctx: &mut MethodContext<'a>,
        elem: ArrayElem,
    ) -> Result<()> {
        if matches!(elem, ArrayElem::Float | ArrayElem::Double) {
            return Err(ctx.unsupported("floating point array access"));
        }
        ctx.emit_op(Opcode::SetItem);
        Ok(())
    }
}

/// Matches the `dup, push index, push value, store` quad javac emits for
/// each constant element of an array literal.
fn constant_store(ctx: &MethodContext<'_>, pos: usize) -> Option<(i64, i64)> {
    let body = &ctx.def.body;
    if !matches!(body.get(pos)?, SourceInsn::Dup) {
        return None;
    }
    let index = match body.get(pos + 1)? {
        SourceInsn::PushInt(i) => *i,
        _ => return None,
    };
    let value = match body.get(pos + 2)? {
        SourceInsn::PushInt(v) => *v,
        _ => return None,
    };
    match body.get(pos + 3)? {
        SourceInsn::ArrayStore {
            elem: ArrayElem::Byte | ArrayElem::Boolean,
        } => Some((index, value)),
        _ => None,
    }
}
