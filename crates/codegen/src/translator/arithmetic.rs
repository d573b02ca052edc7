//! Arithmetic, bitwise, and conversion instructions.
//!
//! NeoVM integers are unbounded, so every integer width of the source maps
//! to the same opcodes and numeric casts between integer widths vanish.

use neoc_data::{ArithOp, ValueKind};

use crate::error::Result;
use crate::opcode::Opcode;

use super::{reject_float, Compiler, MethodContext};

impl<'a> Compiler<'a> {
    pub(crate) fn handle_arith(
        &mut self,
        ctx: &mut MethodContext<'a>,
        op: ArithOp,
        kind: ValueKind,
    ) -> Result<()> {
        reject_float(ctx, kind, mnemonic(op))?;
        let opcode = match op {
            ArithOp::Add => Opcode::Add,
            ArithOp::Sub => Opcode::Sub,
            ArithOp::Mul => Opcode::Mul,
            ArithOp::Div => Opcode::Div,
            ArithOp::Rem => Opcode::Mod,
            ArithOp::Neg => Opcode::Negate,
            ArithOp::Shl => Opcode::Shl,
            ArithOp::Shr => Opcode::Shr,
            ArithOp::And => Opcode::And,
            ArithOp::Or => Opcode::Or,
            ArithOp::Xor => Opcode::Xor,
            // Unbounded integers have no bit width to shift zeros into.
            ArithOp::UnsignedShr => return Err(ctx.unsupported(mnemonic(op))),
        };
        ctx.emit_op(opcode);
        Ok(())
    }

    pub(crate) fn handle_cast(
        &mut self,
        ctx: &mut MethodContext<'a>,
        from: ValueKind,
        to: ValueKind,
    ) -> Result<()> {
        if from.is_float() || to.is_float() {
            return Err(ctx.unsupported("floating point conversion"));
        }
        // Integer narrowing and widening are identities on NeoVM.
        Ok(())
    }
}

fn mnemonic(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "add",
        ArithOp::Sub => "sub",
        ArithOp::Mul => "mul",
        ArithOp::Div => "div",
        ArithOp::Rem => "rem",
        ArithOp::Neg => "neg",
        ArithOp::Shl => "shl",
        ArithOp::Shr => "shr",
        ArithOp::UnsignedShr => "ushr",
        ArithOp::And => "and",
        ArithOp::Or => "or",
        ArithOp::Xor => "xor",
    }
}
