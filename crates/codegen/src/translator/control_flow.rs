//! Branches, switches, and returns.
//!
//! Every emitted branch uses the four-byte offset form; offsets are filled
//! in during finalization once instruction addresses are known. Compare-
//! with-zero branches materialize the zero, two-operand compares map onto
//! NeoVM's fused compare-and-jump opcodes directly.

use neoc_data::{JumpCond, LabelId, SourceInsn, ValueKind};

use crate::error::Result;
use crate::instruction::Instruction;
use crate::opcode::Opcode;

use super::{reject_float, Compiler, MethodContext};

impl<'a> Compiler<'a> {
    pub(crate) fn handle_jump(
        &mut self,
        ctx: &mut MethodContext<'a>,
        cond: JumpCond,
        target: LabelId,
    ) -> Result<()> {
        use JumpCond::*;
        let opcode = match cond {
            Always => Opcode::JmpL,
            IfEq => Opcode::JmpIfNotL,
            IfNe => Opcode::JmpIfL,
            IfLt | IfGe | IfGt | IfLe => {
                ctx.push_int(0)?;
                compare_jump(cond)
            }
            IfICmpEq | IfICmpNe | IfICmpLt | IfICmpGe | IfICmpGt | IfICmpLe => compare_jump(cond),
            IfACmpEq => {
                ctx.emit_op(Opcode::Equal);
                Opcode::JmpIfL
            }
            IfACmpNe => {
                ctx.emit_op(Opcode::NotEqual);
                Opcode::JmpIfL
            }
            IfNull => {
                ctx.emit_op(Opcode::IsNull);
                Opcode::JmpIfL
            }
            IfNonNull => {
                ctx.emit_op(Opcode::IsNull);
                Opcode::JmpIfNotL
            }
        };
        ctx.emit(Instruction::jump(opcode, target));
        Ok(())
    }

    /// `lcmp` pushes -1/0/1 and is always followed by a compare-with-zero
    /// branch. The pair fuses into one two-operand compare-and-jump.
    pub(crate) fn handle_lcmp(&mut self, ctx: &mut MethodContext<'a>) -> Result<()> {
        match ctx.peek() {
            Some(SourceInsn::Jump { cond, target }) if cond.compares_with_zero() => {
                let opcode = match cond {
                    JumpCond::IfEq => Opcode::JmpEqL,
                    JumpCond::IfNe => Opcode::JmpNeL,
                    JumpCond::IfLt => Opcode::JmpLtL,
                    JumpCond::IfGe => Opcode::JmpGeL,
                    JumpCond::IfGt => Opcode::JmpGtL,
                    JumpCond::IfLe => Opcode::JmpLeL,
                    _ => unreachable!("compares_with_zero filtered"),
                };
                ctx.pc += 1;
                ctx.emit(Instruction::jump(opcode, *target));
                Ok(())
            }
            _ => Err(ctx.unsupported("lcmp without a following comparison branch")),
        }
    }

    /// Lowers a switch over integers to a chain of key tests. Each case but
    /// the last duplicates the scrutinee, compares, and falls through to the
    /// next test on mismatch.
    pub(crate) fn handle_switch(
        &mut self,
        ctx: &mut MethodContext<'a>,
        cases: &[(i64, LabelId)],
        default: LabelId,
    ) -> Result<()> {
        if cases.is_empty() {
            ctx.emit_op(Opcode::Drop);
            ctx.emit(Instruction::jump(Opcode::JmpL, default));
            return Ok(());
        }
        let last = cases.len() - 1;
        for (i, &(key, target)) in cases.iter().enumerate() {
            if i < last {
                ctx.emit_op(Opcode::Dup);
                let miss = ctx.labels.fresh();
                ctx.push_int(key)?;
                ctx.emit(Instruction::jump(Opcode::JmpNeL, miss));
                ctx.emit_op(Opcode::Drop);
                ctx.emit(Instruction::jump(Opcode::JmpL, target));
                ctx.method.set_current_label(miss);
            } else {
                ctx.push_int(key)?;
                ctx.emit(Instruction::jump(Opcode::JmpNeL, default));
                ctx.emit(Instruction::jump(Opcode::JmpL, target));
            }
        }
        Ok(())
    }

    pub(crate) fn handle_return(
        &mut self,
        ctx: &mut MethodContext<'a>,
        kind: Option<ValueKind>,
    ) -> Result<()> {
        if let Some(kind) = kind {
            reject_float(ctx, kind, "return")?;
        }
        ctx.emit_op(Opcode::Ret);
        Ok(())
    }
}

fn compare_jump(cond: JumpCond) -> Opcode {
    use JumpCond::*;
    match cond {
        IfEq | IfICmpEq => Opcode::JmpEqL,
        IfNe | IfICmpNe => Opcode::JmpNeL,
        IfLt | IfICmpLt => Opcode::JmpLtL,
        IfGe | IfICmpGe => Opcode::JmpGeL,
        IfGt | IfICmpGt => Opcode::JmpGtL,
        IfLe | IfICmpLe => Opcode::JmpLeL,
        _ => unreachable!("not a comparison condition"),
    }
}
