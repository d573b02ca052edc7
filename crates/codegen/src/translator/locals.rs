//! Local variable access.
//!
//! Source slots are mapped to NeoVM argument or local slots by
//! [`Method::resolve_slot`](crate::method::Method); the opcode families have
//! compact forms for indices 0 through 6 and a one-byte operand beyond that.

use neoc_data::ValueKind;

use crate::error::Result;
use crate::opcode::Opcode;

use super::{reject_float, Compiler, MethodContext};

impl<'a> Compiler<'a> {
    pub(crate) fn handle_load(
        &mut self,
        ctx: &mut MethodContext<'a>,
        slot: u16,
        kind: ValueKind,
    ) -> Result<()> {
        reject_float(ctx, kind, "load")?;
        let slot = ctx.method.resolve_slot(slot)?;
        let (opcode, wide) = slot.family.load_op(slot.index);
        ctx.emit_slot(opcode, wide)
    }

    pub(crate) fn handle_store(
        &mut self,
        ctx: &mut MethodContext<'a>,
        slot: u16,
        kind: ValueKind,
    ) -> Result<()> {
        reject_float(ctx, kind, "store")?;
        let slot = ctx.method.resolve_slot(slot)?;
        let (opcode, wide) = slot.family.store_op(slot.index);
        ctx.emit_slot(opcode, wide)
    }

    /// `iinc` is load, adjust, store. Steps of one use INC/DEC.
    pub(crate) fn handle_iinc(
        &mut self,
        ctx: &mut MethodContext<'a>,
        slot: u16,
        amount: i32,
    ) -> Result<()> {
        self.handle_load(ctx, slot, ValueKind::Int)?;
        match amount {
            1 => ctx.emit_op(Opcode::Inc),
            -1 => ctx.emit_op(Opcode::Dec),
            n if n >= 0 => {
                ctx.push_int(n as i64)?;
                ctx.emit_op(Opcode::Add);
            }
            n => {
                ctx.push_int(-(n as i64))?;
                ctx.emit_op(Opcode::Sub);
            }
        }
        self.handle_store(ctx, slot, ValueKind::Int)
    }
}
