//! Stack manipulation instructions.
//!
//! Source stack shuffles address slots by value category (the `2` variants
//! touch two one-slot values); NeoVM shuffles address items by position.
//! The multi-slot shuffles expand into short DUP/PICK/ROLL sequences that
//! produce the same item order. Wide values occupy a single NeoVM item, so
//! the `2` variants here assume the operands are two separate values, which
//! is the shape javac emits them in for reference and int pairs.

use neoc_data::SourceInsn;

use crate::error::Result;
use crate::opcode::Opcode;

use super::{Compiler, MethodContext};

impl<'a> Compiler<'a> {
    pub(crate) fn handle_stack_shuffle(
        &mut self,
        ctx: &mut MethodContext<'a>,
        insn: &SourceInsn,
    ) -> Result<()> {
        use Opcode::*;
        let sequence: &[Opcode] = match insn {
            SourceInsn::Dup => &[Dup],
            SourceInsn::Pop => &[Drop],
            SourceInsn::Swap => &[Swap],
            SourceInsn::Nop => &[Nop],
            SourceInsn::DupX1 => &[Tuck],
            SourceInsn::Dup2 => &[Over, Over],
            SourceInsn::Pop2 => &[Drop, Drop],
            // [a b c] -> [c a b c]
            SourceInsn::DupX2 => &[Rot, Rot, Push2, Pick],
            // [a b c] -> [b c a b c]
            SourceInsn::Dup2X1 => &[Rot, Push2, Pick, Push2, Pick],
            // [a b c d] -> [c d a b c d]
            SourceInsn::Dup2X2 => &[Rot, Push3, Roll, Swap, Push3, Pick, Push3, Pick],
            other => return Err(ctx.unsupported(other.mnemonic())),
        };
        for &opcode in sequence {
            ctx.emit_op(opcode);
        }
        Ok(())
    }
}
