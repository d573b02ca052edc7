//! The per-method instruction container.
//!
//! Instructions live in an arena indexed by [`InsnId`]; emission order and
//! method-relative addresses are tracked separately so markers can be
//! inserted after body conversion without invalidating branch bookkeeping.

use std::collections::HashMap;

use crate::error::{CompilerError, Result};
use crate::instruction::Instruction;
use crate::opcode::{Opcode, SlotFamily};
use neoc_data::{ClassDef, IndexVec, InsnId, JavaType, LabelId, MethodDef, TryRegion};

/// Slot capacity of each of a method's parameter and local spaces.
pub const MAX_SLOTS: usize = 255;

/// The only exception class the target VM can represent.
pub const BASE_EXCEPTION: &str = "java/lang/Exception";

/// Metadata of one target slot. Slots synthesized for undeclared source
/// variables carry no metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotInfo {
    pub name: Option<String>,
    pub ty: Option<JavaType>,
}

/// Where a source variable slot landed in the target frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SlotRef {
    pub family: SlotFamily,
    pub index: u8,
}

/// A try block awaiting marker insertion.
#[derive(Clone, Copy, Debug)]
struct PendingTry {
    start: LabelId,
    catch: Option<LabelId>,
    finally: Option<LabelId>,
}

pub struct Method {
    /// Module-wide identity (`owner.name(descriptor)`).
    pub id: String,
    /// Name exposed in the ABI.
    pub name: String,
    pub owner: String,
    insns: IndexVec<InsnId, Instruction>,
    order: Vec<InsnId>,
    next_address: u32,
    jump_targets: HashMap<LabelId, InsnId>,
    pending_labels: Vec<LabelId>,
    current_line: Option<u32>,
    pub params: Vec<SlotInfo>,
    pub locals: Vec<SlotInfo>,
    slot_map: HashMap<u16, SlotRef>,
    slots_initialized: bool,
    pub is_entry_point: bool,
    pub is_public_interface: bool,
    pub is_safe: bool,
    /// Declared return type, for the ABI summary.
    pub return_type: Option<JavaType>,
    /// Module-relative start address, assigned during finalization.
    pub start_address: u32,
    pending_tries: Vec<PendingTry>,
}

impl Method {
    pub fn new(owner: &str, id: String, name: String) -> Self {
        Self {
            id,
            name,
            owner: owner.to_string(),
            insns: IndexVec::new(),
            order: Vec::new(),
            next_address: 0,
            jump_targets: HashMap::new(),
            pending_labels: Vec::new(),
            current_line: None,
            params: Vec::new(),
            locals: Vec::new(),
            slot_map: HashMap::new(),
            slots_initialized: false,
            is_entry_point: false,
            is_public_interface: false,
            is_safe: false,
            return_type: None,
            start_address: 0,
            pending_tries: Vec::new(),
        }
    }

    /// Appends an instruction, assigning the next free address and
    /// attaching any pending labels and the current source line.
    pub fn add(&mut self, mut insn: Instruction) -> InsnId {
        insn.address = self.next_address;
        if insn.line.is_none() {
            insn.line = self.current_line;
        }
        self.next_address += insn.byte_len();
        let id = self.insns.push(insn);
        self.order.push(id);
        for label in self.pending_labels.drain(..) {
            self.jump_targets.insert(label, id);
        }
        id
    }

    /// Marks the next added instruction as the target of `label`.
    pub fn set_current_label(&mut self, label: LabelId) {
        self.pending_labels.push(label);
    }

    pub fn set_current_line(&mut self, line: u32) {
        self.current_line = Some(line);
    }

    pub fn last(&self) -> Option<&Instruction> {
        self.order.last().map(|&id| &self.insns[id])
    }

    fn is_jump_target(&self, id: InsnId) -> bool {
        self.jump_targets.values().any(|&t| t == id)
    }

    /// Removes the last instruction. Refuses when it is a jump target,
    /// since a branch would be left dangling.
    pub fn remove_last(&mut self) -> Result<Instruction> {
        let id = *self.order.last().ok_or_else(|| {
            CompilerError::invariant(format!("{}: no instruction to remove", self.id))
        })?;
        if self.is_jump_target(id) {
            return Err(CompilerError::invariant(format!(
                "{}: cannot remove a jump target instruction",
                self.id
            )));
        }
        self.order.pop();
        let insn = self.insns[id].clone();
        self.next_address -= insn.byte_len();
        Ok(insn)
    }

    /// Replaces the last instruction in place. Jump-target registrations
    /// and the source line carry over to the replacement.
    pub fn replace_last(&mut self, mut insn: Instruction) -> Result<()> {
        let id = *self.order.last().ok_or_else(|| {
            CompilerError::invariant(format!("{}: no instruction to replace", self.id))
        })?;
        let old = &self.insns[id];
        insn.address = old.address;
        if insn.line.is_none() {
            insn.line = old.line;
        }
        self.next_address = old.address + insn.byte_len();
        self.insns[id] = insn;
        Ok(())
    }

    pub fn insn(&self, id: InsnId) -> &Instruction {
        &self.insns[id]
    }

    /// Instructions in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.order.iter().map(move |&id| &self.insns[id])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Encoded size of the method body in bytes.
    pub fn byte_len(&self) -> u32 {
        self.next_address
    }

    pub(crate) fn resolve_slot(&self, slot: u16) -> Result<SlotRef> {
        self.slot_map.get(&slot).copied().ok_or_else(|| {
            CompilerError::invariant(format!("{}: source slot {slot} is not mapped", self.id))
        })
    }

    /// Classifies the source variable slots of `def` into target parameter
    /// and local slots and prepends the frame initialization instruction.
    /// Idempotent.
    pub fn initialize_slots(&mut self, def: &MethodDef, owner: &ClassDef) -> Result<()> {
        if self.slots_initialized {
            return Ok(());
        }
        self.slots_initialized = true;

        let mut source_slot: u16 = 0;
        if !def.is_static {
            self.slot_map.insert(0, SlotRef { family: SlotFamily::Argument, index: 0 });
            self.params.push(SlotInfo {
                name: Some("this".into()),
                ty: Some(JavaType::object(owner.name.clone())),
            });
            source_slot = 1;
        }
        for param_ty in &def.sig.params {
            let index = u8::try_from(self.params.len()).map_err(|_| slot_overflow("parameters"))?;
            self.slot_map.insert(source_slot, SlotRef { family: SlotFamily::Argument, index });
            self.params.push(SlotInfo {
                name: def.variable_at(source_slot).map(|v| v.name.clone()),
                ty: Some(param_ty.clone()),
            });
            source_slot += if param_ty.is_wide() { 2 } else { 1 };
        }
        if self.params.len() > MAX_SLOTS {
            return Err(slot_overflow_with("parameters", self.params.len()));
        }

        let mut slot = source_slot;
        while slot < def.max_locals {
            let index = u8::try_from(self.locals.len())
                .map_err(|_| slot_overflow("local variables"))?;
            self.slot_map.insert(slot, SlotRef { family: SlotFamily::Local, index });
            match def.variable_at(slot) {
                Some(v) => {
                    let wide = v.ty.is_wide();
                    self.locals
                        .push(SlotInfo { name: Some(v.name.clone()), ty: Some(v.ty.clone()) });
                    slot += if wide { 2 } else { 1 };
                }
                None => {
                    self.locals.push(SlotInfo { name: None, ty: None });
                    slot += 1;
                }
            }
        }
        if self.locals.len() > MAX_SLOTS {
            return Err(slot_overflow_with("local variables", self.locals.len()));
        }

        if !self.params.is_empty() || !self.locals.is_empty() {
            let operand = vec![self.locals.len() as u8, self.params.len() as u8];
            self.add(Instruction::with_operand(Opcode::InitSlot, operand)?);
        }
        Ok(())
    }

    /// Records the method's try blocks from the source exception table,
    /// grouping catch and finally entries that share a start label.
    pub fn collect_try_regions(&mut self, regions: &[TryRegion]) -> Result<()> {
        for region in regions {
            match &region.exception_type {
                Some(ty) if ty != BASE_EXCEPTION => {
                    return Err(CompilerError::UnsupportedExceptionType {
                        ty: ty.clone(),
                        method: self.id.clone(),
                    });
                }
                // A catch-all entry starting at its own handler is compiler
                // plumbing, not a finally block.
                None if region.start == region.handler => continue,
                _ => {}
            }
            let entry = self.pending_tries.iter_mut().find(|t| t.start == region.start);
            let entry = match entry {
                Some(entry) => entry,
                None => {
                    self.pending_tries.push(PendingTry {
                        start: region.start,
                        catch: None,
                        finally: None,
                    });
                    self.pending_tries.last_mut().unwrap()
                }
            };
            let handler_slot = if region.exception_type.is_some() {
                &mut entry.catch
            } else {
                &mut entry.finally
            };
            if handler_slot.is_some() {
                return Err(CompilerError::invariant(format!(
                    "{}: more than one handler of the same kind for one try block",
                    self.id
                )));
            }
            *handler_slot = Some(region.handler);
        }
        Ok(())
    }

    /// Inserts a TRY marker at each recorded try-start address, shifting
    /// the addresses of everything after it. Call after body conversion.
    pub fn insert_try_markers(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending_tries);
        for entry in pending {
            let start_id = *self.jump_targets.get(&entry.start).ok_or_else(|| {
                CompilerError::invariant(format!(
                    "{}: try block starts at an unplaced label",
                    self.id
                ))
            })?;
            let position = self
                .order
                .iter()
                .position(|&id| id == start_id)
                .ok_or_else(|| {
                    CompilerError::invariant(format!(
                        "{}: try start instruction was removed",
                        self.id
                    ))
                })?;
            let mut marker = Instruction::try_marker(entry.catch, entry.finally);
            marker.line = self.insns[start_id].line;
            let marker_id = self.insns.push(marker);
            self.order.insert(position, marker_id);
            // Entering the block must pass through the marker, so labels
            // that resolved to the old first instruction move to it.
            for target in self.jump_targets.values_mut() {
                if *target == start_id {
                    *target = marker_id;
                }
            }
            self.reindex_addresses();
        }
        Ok(())
    }

    fn reindex_addresses(&mut self) {
        let mut address = 0;
        for &id in &self.order {
            self.insns[id].address = address;
            address += self.insns[id].byte_len();
        }
        self.next_address = address;
    }

    /// Resolves every branch and try operand to a method-relative signed
    /// offset. Addresses are final after this.
    pub fn finalize_offsets(&mut self) -> Result<()> {
        for &id in &self.order {
            let insn = &self.insns[id];
            if let Some(label) = insn.jump_target {
                let offset = self.label_offset(label, insn.address(), insn.opcode)?;
                self.insns[id].patch_operand(offset.to_le_bytes().to_vec())?;
            } else if let Some(targets) = insn.try_targets {
                let address = insn.address();
                let opcode = insn.opcode;
                let catch = match targets.catch {
                    Some(label) => self.label_offset(label, address, opcode)?,
                    None => 0,
                };
                let finally = match targets.finally {
                    Some(label) => self.label_offset(label, address, opcode)?,
                    None => 0,
                };
                let mut operand = catch.to_le_bytes().to_vec();
                operand.extend_from_slice(&finally.to_le_bytes());
                self.insns[id].patch_operand(operand)?;
            }
        }
        Ok(())
    }

    fn label_offset(&self, label: LabelId, from: u32, opcode: Opcode) -> Result<i32> {
        let target = *self.jump_targets.get(&label).ok_or_else(|| {
            CompilerError::invariant(format!("{}: branch to an unplaced label {label}", self.id))
        })?;
        let delta = i64::from(self.insns[target].address) - i64::from(from);
        i32::try_from(delta).map_err(|_| CompilerError::Encoding {
            opcode,
            message: format!("branch offset {delta} does not fit in four bytes"),
        })
    }

    /// Patches every cross-method call operand against the module layout.
    /// `start_of` maps a callee to its module-relative start address.
    pub(crate) fn patch_call_targets<F>(&mut self, mut start_of: F) -> Result<()>
    where
        F: FnMut(neoc_data::MethodId) -> u32,
    {
        for &id in &self.order {
            let Some(target) = self.insns[id].call_target else { continue };
            let from = i64::from(self.start_address) + i64::from(self.insns[id].address);
            let delta = i64::from(start_of(target)) - from;
            let offset = i32::try_from(delta).map_err(|_| CompilerError::Encoding {
                opcode: self.insns[id].opcode,
                message: format!("call offset {delta} does not fit in four bytes"),
            })?;
            self.insns[id].patch_operand(offset.to_le_bytes().to_vec())?;
        }
        Ok(())
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        for insn in self.iter() {
            insn.write_to(out);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len() as usize);
        self.write_to(&mut out);
        out
    }
}

fn slot_overflow(what: &'static str) -> CompilerError {
    CompilerError::LimitExceeded { what, limit: MAX_SLOTS, got: MAX_SLOTS + 1 }
}

fn slot_overflow_with(what: &'static str, got: usize) -> CompilerError {
    CompilerError::LimitExceeded { what, limit: MAX_SLOTS, got }
}
