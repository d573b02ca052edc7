//! Method invocations.
//!
//! A call site is classified before anything is emitted: instruction
//! annotations inline fixed sequences, `ContractHash` classes become CALLT
//! method tokens, a handful of `java/lang` methods have dedicated
//! renditions, and everything else compiles the callee on demand and emits
//! a CALL patched during module finalization.

use neoc_data::{InstructionPattern, InvokeKind, MethodSig, SourceInsn};

use crate::error::{invariant, Result};
use crate::instruction::Instruction;
use crate::module::{call_flags, MethodToken};
use crate::opcode::{interop_hash, Opcode, OperandSpec};

use super::helpers::emit_reverse;
use super::{constants, known, Compiler, MethodContext};

impl<'a> Compiler<'a> {
    pub(crate) fn handle_invoke(
        &mut self,
        ctx: &mut MethodContext<'a>,
        kind: InvokeKind,
        owner: &str,
        name: &str,
        sig: &MethodSig,
    ) -> Result<()> {
        if matches!(kind, InvokeKind::Interface | InvokeKind::Dynamic) {
            return Err(ctx.unsupported(format!("{kind:?} dispatch")));
        }
        if ctx.pending_event.is_some() && name == "fire" {
            return self.convert_event_fire(ctx);
        }
        if name == "<init>" {
            return self.handle_ctor_invoke(ctx, owner, sig);
        }
        match owner {
            known::STRING => return self.convert_string_method(ctx, name, sig),
            known::STRING_BUILDER => {
                // Reached only outside a recognized concatenation.
                return Err(ctx.unsupported(format!("StringBuilder.{name}")));
            }
            known::EXCEPTION => {
                if name == "getMessage" {
                    // Exceptions are their message on NeoVM.
                    return Ok(());
                }
                return Err(ctx.unsupported(format!("Exception.{name}")));
            }
            known::STRING_LITERALS => return self.convert_literal(ctx, name),
            _ if known::WRAPPERS.contains(&owner) && is_wrapper_identity(name) => {
                return Ok(());
            }
            _ => {}
        }

        let registry = self.registry();
        let (class, def) = registry
            .resolve_method(owner, name, sig)
            .ok_or_else(|| crate::error::CompilerError::MethodNotFound {
                owner: owner.to_string(),
                name: name.to_string(),
            })?;
        let arity = sig.params.len() + usize::from(!def.is_static);

        if let Some(patterns) = def.instruction_patterns() {
            return self.convert_intrinsic(ctx, patterns, arity);
        }
        if let Some(hash) = class.contract_hash() {
            return self.convert_contract_call(ctx, hash, name, sig, def.display_name());
        }

        emit_reverse(ctx, arity)?;
        let target = self.compile_method(class, def)?;
        ctx.emit(Instruction::call(target));
        Ok(())
    }

    /// Inlines an instruction-annotated method. A lone syscall behaves like
    /// a call and gets its arguments reversed; an explicit opcode sequence
    /// is emitted verbatim.
    pub(crate) fn convert_intrinsic(
        &mut self,
        ctx: &mut MethodContext<'a>,
        patterns: &[InstructionPattern],
        arity: usize,
    ) -> Result<()> {
        if let [InstructionPattern::Syscall { service }] = patterns {
            emit_reverse(ctx, arity)?;
            ctx.emit(Instruction::syscall(interop_hash(service)));
            return Ok(());
        }
        for pattern in patterns {
            match pattern {
                InstructionPattern::Syscall { service } => {
                    ctx.emit(Instruction::syscall(interop_hash(service)));
                }
                InstructionPattern::Opcode {
                    opcode,
                    prefix,
                    operand,
                } => {
                    let opcode = Opcode::from_byte(*opcode).ok_or_else(|| {
                        invariant(format!(
                            "instruction annotation names unknown opcode {opcode:#04x}"
                        ))
                    })?;
                    let insn = match opcode.operand_spec() {
                        OperandSpec::Prefixed(_) => {
                            let insn = Instruction::with_data(opcode, operand.clone())?;
                            if !prefix.is_empty() && insn.prefix() != prefix.as_slice() {
                                return Err(invariant(format!(
                                    "instruction annotation prefix disagrees with {} operand length",
                                    operand.len()
                                )));
                            }
                            insn
                        }
                        _ => Instruction::with_operand(opcode, operand.clone())?,
                    };
                    ctx.emit(insn);
                }
            }
        }
        Ok(())
    }

    /// Calls into an already-deployed contract through a method token. The
    /// pseudo-method `getHash` instead pushes the script hash itself.
    fn convert_contract_call(
        &mut self,
        ctx: &mut MethodContext<'a>,
        hash: [u8; 20],
        name: &str,
        sig: &MethodSig,
        display_name: &str,
    ) -> Result<()> {
        // Script hashes are little-endian on the wire; annotations carry
        // them big-endian as written.
        let mut hash = hash;
        hash.reverse();
        if name == "getHash" {
            return ctx.push_data(hash.to_vec());
        }
        emit_reverse(ctx, sig.params.len())?;
        let token = MethodToken {
            hash,
            method: display_name.to_string(),
            param_count: sig.params.len() as u16,
            has_return: sig.returns_value(),
            call_flags: call_flags::ALL,
        };
        let index = self.module.add_token(token)?;
        ctx.emit(Instruction::with_operand(
            Opcode::CallT,
            index.to_le_bytes().to_vec(),
        )?);
        Ok(())
    }

    /// `getstatic` of the event field has already recorded the pending
    /// event; the `fire` call packs the arguments and notifies.
    fn convert_event_fire(&mut self, ctx: &mut MethodContext<'a>) -> Result<()> {
        let (name, sig) = match ctx.pending_event.take() {
            Some(pending) => pending,
            None => return Err(invariant("event fire without a pending event")),
        };
        let count = sig.params.len();
        emit_reverse(ctx, count)?;
        ctx.push_int(count as i64)?;
        ctx.emit_op(Opcode::Pack);
        ctx.push_data(name.into_bytes())?;
        ctx.emit(Instruction::syscall(interop_hash(
            crate::opcode::interop::RUNTIME_NOTIFY,
        )));
        Ok(())
    }

    /// Compile-time literal conversions. The argument must be a constant
    /// string push, which gets rewritten in place.
    fn convert_literal(&mut self, ctx: &mut MethodContext<'a>, name: &str) -> Result<()> {
        match name {
            "hexToBytes" => {
                let data = constants::take_pushed_data(ctx)?;
                let text = String::from_utf8(data)
                    .map_err(|_| invariant("hex literal is not valid UTF-8"))?;
                let text = text.strip_prefix("0x").unwrap_or(&text);
                let bytes = hex::decode(text)
                    .map_err(|e| invariant(format!("invalid hex literal: {e}")))?;
                ctx.push_data(bytes)
            }
            "stringToInt" => {
                let data = constants::take_pushed_data(ctx)?;
                let text = String::from_utf8(data)
                    .map_err(|_| invariant("integer literal is not valid UTF-8"))?;
                let value: i64 = text
                    .trim()
                    .parse()
                    .map_err(|e| invariant(format!("invalid integer literal: {e}")))?;
                ctx.push_int(value)
            }
            other => Err(ctx.unsupported(format!("literal conversion {other}"))),
        }
    }

    fn convert_string_method(
        &mut self,
        ctx: &mut MethodContext<'a>,
        name: &str,
        sig: &MethodSig,
    ) -> Result<()> {
        match name {
            "equals" => {
                ctx.emit_op(Opcode::Equal);
                Ok(())
            }
            "length" => {
                ctx.emit_op(Opcode::Size);
                Ok(())
            }
            "hashCode" => {
                if matches!(ctx.peek(), Some(SourceInsn::Switch { .. })) {
                    return self.convert_string_switch(ctx);
                }
                Err(ctx.unsupported("String.hashCode outside a switch"))
            }
            "valueOf" if sig.params.len() == 1 => {
                // String.valueOf of a byte string is the value itself.
                Ok(())
            }
            other => Err(ctx.unsupported(format!("String.{other}"))),
        }
    }
}

impl<'a> Compiler<'a> {
    /// Rewrites the two-switch shape javac emits for a switch over strings.
    ///
    /// The source first switches on `hashCode`, each hash arm confirming the
    /// key with `equals` and storing a dense case index, then switches on
    /// that index. Byte string equality is cheap on NeoVM, so the whole
    /// construct collapses into one chain of EQUAL tests jumping straight
    /// to the final case bodies.
    fn convert_string_switch(&mut self, ctx: &mut MethodContext<'a>) -> Result<()> {
        let def = ctx.def;
        let (hash_default, switch_end) = match &def.body[ctx.pc] {
            SourceInsn::Switch { default, .. } => (*default, ctx.pc + 1),
            _ => return Err(invariant("string switch lost its hash switch")),
        };

        // The generated tail is LDLOC tmp over [STLOC tmp, PUSHM1,
        // STLOC index]; drop everything but the store that defines tmp.
        ctx.method.remove_last()?;
        ctx.method.remove_last()?;
        ctx.method.remove_last()?;
        let tmp_slot = ctx
            .method
            .last()
            .and_then(local_store_index)
            .ok_or_else(|| ctx.unsupported("string switch without a scrutinee store"))?;

        // Collect (key, case index) pairs from the hash arms, which run up
        // to the label the hash switch defaults to.
        let mut keys: Vec<(String, i64)> = Vec::new();
        let mut pos = switch_end;
        while !matches!(def.body.get(pos), Some(SourceInsn::Label(l)) if *l == hash_default) {
            let Some(insn) = def.body.get(pos) else {
                return Err(ctx.unsupported("string switch hash arms are unterminated"));
            };
            if insn.is_pseudo() {
                pos += 1;
                continue;
            }
            let arm = parse_equals_arm(&def.body, pos)
                .ok_or_else(|| ctx.unsupported("unrecognized string switch arm"))?;
            keys.push((arm.key, arm.case_index));
            pos = arm.next;
        }

        // Past the default label sits the index switch with the real
        // targets.
        pos += 1;
        while matches!(def.body.get(pos), Some(i) if i.is_pseudo()) {
            pos += 1;
        }
        if !matches!(def.body.get(pos), Some(SourceInsn::Load { .. })) {
            return Err(ctx.unsupported("string switch without an index load"));
        }
        pos += 1;
        let (cases, default) = match def.body.get(pos) {
            Some(SourceInsn::Switch { cases, default }) => (cases, *default),
            _ => return Err(ctx.unsupported("string switch without an index switch")),
        };
        ctx.pc = pos + 1;

        let (load_op, wide) = crate::opcode::SlotFamily::Local.load_op(tmp_slot);
        for (key, case_index) in keys {
            let target = cases
                .iter()
                .find(|(k, _)| *k == case_index)
                .map(|(_, t)| *t)
                .unwrap_or(default);
            ctx.emit_slot(load_op, wide)?;
            ctx.push_data(key.into_bytes())?;
            ctx.emit_op(Opcode::Equal);
            ctx.emit(Instruction::jump(Opcode::JmpIfL, target));
        }
        ctx.emit(Instruction::jump(Opcode::JmpL, default));
        Ok(())
    }
}

struct EqualsArm {
    key: String,
    case_index: i64,
    /// Body position just past the arm.
    next: usize,
}

/// Matches one hash arm: load the scrutinee, push the candidate key, call
/// `equals`, branch away on mismatch, then store the dense case index and
/// jump to the index switch. Pseudo-instructions may appear between steps.
fn parse_equals_arm(body: &[SourceInsn], mut pos: usize) -> Option<EqualsArm> {
    let mut next = || {
        while body.get(pos)?.is_pseudo() {
            pos += 1;
        }
        let insn = body.get(pos)?;
        pos += 1;
        Some(insn)
    };

    if !matches!(next()?, SourceInsn::Load { .. }) {
        return None;
    }
    let key = match next()? {
        SourceInsn::PushString(s) => s.clone(),
        _ => return None,
    };
    match next()? {
        SourceInsn::Invoke { owner, name, .. }
            if owner == known::STRING && name == "equals" => {}
        _ => return None,
    }
    if !matches!(
        next()?,
        SourceInsn::Jump {
            cond: neoc_data::JumpCond::IfEq,
            ..
        }
    ) {
        return None;
    }
    let case_index = match next()? {
        SourceInsn::PushInt(i) => *i,
        _ => return None,
    };
    if !matches!(next()?, SourceInsn::Store { .. }) {
        return None;
    }
    if !matches!(
        next()?,
        SourceInsn::Jump {
            cond: neoc_data::JumpCond::Always,
            ..
        }
    ) {
        return None;
    }
    Some(EqualsArm {
        key,
        case_index,
        next: pos,
    })
}

/// NeoVM local index a store instruction writes to, if it is one.
fn local_store_index(insn: &Instruction) -> Option<u8> {
    let byte = insn.opcode.byte();
    let first = Opcode::StLoc0.byte();
    if (first..=first + 6).contains(&byte) {
        return Some(byte - first);
    }
    if insn.opcode == Opcode::StLoc {
        return insn.operand().first().copied();
    }
    None
}

fn is_wrapper_identity(name: &str) -> bool {
    matches!(
        name,
        "valueOf"
            | "intValue"
            | "longValue"
            | "shortValue"
            | "byteValue"
            | "charValue"
            | "booleanValue"
    )
}
