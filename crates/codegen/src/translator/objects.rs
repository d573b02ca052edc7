//! Object allocation, field access, and events.
//!
//! Objects are NeoVM arrays indexed by flattened field position, superclass
//! fields first. Exceptions and string builders never materialize: an
//! exception is its message string, a builder is a running concatenation.

use neoc_data::{FieldRef, JavaType, MethodSig, SourceInsn};

use crate::error::{invariant, CompilerError, Result};
use crate::instruction::Instruction;
use crate::opcode::{Opcode, SlotFamily, StackItemType};

use super::helpers::emit_reverse;
use super::{known, Compiler, MethodContext};

impl<'a> Compiler<'a> {
    pub(crate) fn handle_new(&mut self, ctx: &mut MethodContext<'a>, class: &str) -> Result<()> {
        if class == known::STRING_BUILDER {
            return self.convert_string_concat(ctx);
        }
        if class == known::EXCEPTION {
            // Nothing is allocated; the constructor call leaves the message
            // (or a placeholder) as the value.
            consume_dup(ctx);
            return Ok(());
        }
        if self.registry().is_subclass_of(class, known::EXCEPTION) {
            return Err(CompilerError::UnsupportedExceptionType {
                ty: class.to_string(),
                method: ctx.method.id.clone(),
            });
        }
        let def = self
            .registry()
            .class(class)
            .ok_or_else(|| invariant(format!("allocation of unregistered class {class}")))?;
        // Constructors replaced by instruction annotations build their own
        // value; no backing array exists for them.
        let annotated_ctor = def
            .methods
            .iter()
            .any(|m| m.name == "<init>" && m.instruction_patterns().is_some());
        consume_dup(ctx);
        if annotated_ctor {
            return Ok(());
        }
        let fields = self.registry().instance_field_count(class);
        ctx.push_int(fields as i64)?;
        ctx.emit_op(Opcode::NewArray);
        ctx.emit_op(Opcode::Dup);
        Ok(())
    }

    /// `invokespecial <init>`. By this point the allocation handler has
    /// left a duplicated backing array (or nothing, for exceptions and
    /// annotated types) under the arguments.
    pub(crate) fn handle_ctor_invoke(
        &mut self,
        ctx: &mut MethodContext<'a>,
        owner: &str,
        sig: &MethodSig,
    ) -> Result<()> {
        if owner == known::EXCEPTION {
            return self.convert_exception_ctor(ctx, sig);
        }
        if owner == neoc_data::OBJECT_CLASS {
            return Ok(());
        }
        let registry = self.registry();
        let (class, def) = registry.resolve_method(owner, "<init>", sig).ok_or_else(|| {
            CompilerError::MethodNotFound {
                owner: owner.to_string(),
                name: "<init>".to_string(),
            }
        })?;
        if let Some(patterns) = def.instruction_patterns() {
            return self.convert_intrinsic(ctx, patterns, sig.params.len());
        }
        // A constructor that only forwards to its superclass leaves the
        // backing array untouched. The call vanishes, and the duplicate
        // reference the allocation handler left behind goes with it.
        if sig.params.is_empty() && ctor_is_empty(def) {
            if ctx.method.last().map(|i| i.opcode) == Some(Opcode::Dup) {
                ctx.method.remove_last()?;
            }
            return Ok(());
        }
        emit_reverse(ctx, sig.params.len() + 1)?;
        let target = self.compile_method(class, def)?;
        ctx.emit(Instruction::call(target));
        Ok(())
    }

    fn convert_exception_ctor(
        &mut self,
        ctx: &mut MethodContext<'a>,
        sig: &MethodSig,
    ) -> Result<()> {
        match sig.params.as_slice() {
            [] => ctx.push_data(known::DEFAULT_EXCEPTION_MESSAGE.into()),
            [ty] if *ty == JavaType::string() => Ok(()),
            _ => Err(ctx.unsupported("exception constructor with non-string arguments")),
        }
    }

    /// A `new StringBuilder` introduces a concatenation region: appends
    /// become CAT, `toString` converts the buffer and ends the region.
    /// Instructions in between (the appended expressions) are translated
    /// recursively.
    fn convert_string_concat(&mut self, ctx: &mut MethodContext<'a>) -> Result<()> {
        consume_dup(ctx);
        match ctx.peek() {
            Some(SourceInsn::Invoke { owner, name, sig, .. })
                if owner == known::STRING_BUILDER && name == "<init>" && sig.params.is_empty() =>
            {
                ctx.pc += 1;
            }
            _ => return Err(ctx.unsupported("StringBuilder constructor with arguments")),
        }
        let mut appended = 0usize;
        loop {
            match ctx.peek() {
                Some(SourceInsn::Invoke { owner, name, .. })
                    if owner == known::STRING_BUILDER =>
                {
                    ctx.pc += 1;
                    match name.as_str() {
                        "append" => {
                            appended += 1;
                            if appended > 1 {
                                ctx.emit_op(Opcode::Cat);
                            }
                        }
                        "toString" => {
                            ctx.emit(Instruction::with_operand(
                                Opcode::Convert,
                                vec![StackItemType::ByteString.byte()],
                            )?);
                            return Ok(());
                        }
                        other => {
                            return Err(ctx.unsupported(format!("StringBuilder.{other}")));
                        }
                    }
                }
                Some(_) => self.handle_insn(ctx)?,
                None => {
                    return Err(invariant("string concatenation is never finished"));
                }
            }
        }
    }

    pub(crate) fn handle_get_field(
        &mut self,
        ctx: &mut MethodContext<'a>,
        field: &FieldRef,
    ) -> Result<()> {
        let index = self.instance_index(ctx, field)?;
        ctx.push_int(index as i64)?;
        ctx.emit_op(Opcode::PickItem);
        Ok(())
    }

    pub(crate) fn handle_put_field(
        &mut self,
        ctx: &mut MethodContext<'a>,
        field: &FieldRef,
    ) -> Result<()> {
        let index = self.instance_index(ctx, field)?;
        ctx.push_int(index as i64)?;
        ctx.emit_op(Opcode::Swap);
        ctx.emit_op(Opcode::SetItem);
        Ok(())
    }

    fn instance_index(&self, ctx: &MethodContext<'a>, field: &FieldRef) -> Result<usize> {
        self.registry()
            .instance_field_index(&field.owner, &field.name)
            .ok_or_else(|| {
                invariant(format!(
                    "unknown instance field {}.{} in {}",
                    field.owner, field.name, ctx.method.id
                ))
            })
    }

    pub(crate) fn handle_get_static(
        &mut self,
        ctx: &mut MethodContext<'a>,
        field: &FieldRef,
    ) -> Result<()> {
        let class = self.static_owner(ctx, field)?;
        if let Some(event) = class.event_field(&field.name) {
            let sig = event
                .event
                .clone()
                .ok_or_else(|| invariant("event field lost its signature"))?;
            self.module
                .add_event(event.display_name(), sig.params.clone())?;
            ctx.pending_event = Some((event.display_name().to_string(), sig));
            return Ok(());
        }
        let index = self.static_index(ctx, field)?;
        let (opcode, wide) = SlotFamily::Static.load_op(index);
        ctx.emit_slot(opcode, wide)
    }

    pub(crate) fn handle_put_static(
        &mut self,
        ctx: &mut MethodContext<'a>,
        field: &FieldRef,
    ) -> Result<()> {
        let class = self.static_owner(ctx, field)?;
        if class.event_field(&field.name).is_some() {
            return Err(ctx.unsupported("assignment to an event field"));
        }
        let index = self.static_index(ctx, field)?;
        let (opcode, wide) = SlotFamily::Static.store_op(index);
        ctx.emit_slot(opcode, wide)
    }

    /// Static slots live on the contract class alone; a foreign `getstatic`
    /// has no slot to map to.
    fn static_owner(&self, ctx: &MethodContext<'a>, field: &FieldRef) -> Result<&'a neoc_data::ClassDef> {
        if field.owner != self.contract {
            return Err(ctx.unsupported(format!(
                "static field access on foreign class {}",
                field.owner
            )));
        }
        self.registry()
            .class(&field.owner)
            .ok_or_else(|| invariant(format!("static field on unregistered class {}", field.owner)))
    }

    fn static_index(&self, ctx: &MethodContext<'a>, field: &FieldRef) -> Result<u8> {
        let class = self.static_owner(ctx, field)?;
        let index = class.static_field_index(&field.name).ok_or_else(|| {
            invariant(format!(
                "unknown static field {}.{}",
                field.owner, field.name
            ))
        })?;
        u8::try_from(index).map_err(|_| CompilerError::LimitExceeded {
            what: "static fields",
            limit: crate::method::MAX_SLOTS,
            got: index + 1,
        })
    }
}

/// Constructors in a method body are always `new` followed by `dup`; the
/// translation supplies its own duplication, so the source `dup` is
/// swallowed here.
fn consume_dup(ctx: &mut MethodContext<'_>) {
    if matches!(ctx.peek(), Some(SourceInsn::Dup)) {
        ctx.pc += 1;
    }
}

/// True when a constructor does nothing beyond calling its superclass
/// constructor: no field stores, no other effects, just the return.
fn ctor_is_empty(def: &neoc_data::MethodDef) -> bool {
    let mut body = def.body.iter();
    let mut found_super = false;
    for insn in body.by_ref() {
        if let SourceInsn::Invoke {
            kind: neoc_data::InvokeKind::Special,
            name,
            ..
        } = insn
        {
            if name == "<init>" {
                found_super = true;
                break;
            }
        }
    }
    found_super
        && body.all(|insn| insn.is_pseudo() || matches!(insn, SourceInsn::Return { kind: None }))
}

/// A constructor body opens with plumbing up to and including the
/// superclass constructor call, which has no NeoVM counterpart. Skip it.
pub(crate) fn skip_to_super_ctor(ctx: &mut MethodContext<'_>) -> Result<()> {
    let def = ctx.def;
    for (pos, insn) in def.body.iter().enumerate().skip(ctx.pc) {
        if let SourceInsn::Invoke {
            kind: neoc_data::InvokeKind::Special,
            name,
            ..
        } = insn
        {
            if name == "<init>" {
                ctx.pc = pos + 1;
                return Ok(());
            }
        }
    }
    Err(invariant(format!(
        "constructor {} never calls its superclass constructor",
        ctx.method.id
    )))
}
