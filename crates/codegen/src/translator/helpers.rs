//! Small utilities shared by the instruction handlers.

use neoc_data::{LabelId, MethodDef, SourceInsn};

use crate::error::Result;
use crate::opcode::Opcode;

use super::MethodContext;

/// Hands out labels that do not collide with any label of the source body.
/// Lowerings that need intermediate jump targets (switch chains) draw from
/// here.
pub(crate) struct LabelAllocator {
    next: LabelId,
}

impl LabelAllocator {
    /// Seeds the allocator past the highest label the method mentions,
    /// whether declared, jumped to, or named by a try region.
    pub fn for_method(def: &MethodDef) -> Self {
        let mut max = 0;
        let mut see = |label: LabelId| max = max.max(label.get());
        for insn in &def.body {
            match insn {
                SourceInsn::Label(l) => see(*l),
                SourceInsn::Jump { target, .. } => see(*target),
                SourceInsn::Jsr { target } => see(*target),
                SourceInsn::Switch { cases, default } => {
                    for (_, l) in cases {
                        see(*l);
                    }
                    see(*default);
                }
                _ => {}
            }
        }
        for region in &def.try_regions {
            see(region.start);
            see(region.end);
            see(region.handler);
        }
        LabelAllocator {
            next: LabelId::new(max + 1),
        }
    }

    pub fn fresh(&mut self) -> LabelId {
        self.next.get_and_inc()
    }
}

/// Reverses the top `count` stack items. Arguments are pushed left to right
/// by the source but consumed first-on-top by NeoVM calls and syscalls.
pub(crate) fn emit_reverse(ctx: &mut MethodContext<'_>, count: usize) -> Result<()> {
    match count {
        0 | 1 => {}
        2 => ctx.emit_op(Opcode::Swap),
        3 => ctx.emit_op(Opcode::Reverse3),
        4 => ctx.emit_op(Opcode::Reverse4),
        n => {
            ctx.push_int(n as i64)?;
            ctx.emit_op(Opcode::ReverseN);
        }
    }
    Ok(())
}
