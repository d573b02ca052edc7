//! The translation engine.
//!
//! [`Compiler`] walks every reachable method of a contract class and lowers
//! its stack-machine body into NeoVM instructions, one source instruction at
//! a time. Most source instructions map to a short fixed sequence; the
//! interesting cases (calls, object allocation, switches over strings) look
//! ahead in the source body and consume several instructions at once.

mod arithmetic;
mod arrays;
mod calls;
pub(crate) mod constants;
mod control_flow;
mod helpers;
mod locals;
mod objects;
mod stack;

use neoc_data::{ClassDef, EventSig, MethodDef, SourceInsn, TypeRegistry, ValueKind};

use crate::abi::ContractAbi;
use crate::error::{invariant, CompilerError, Result};
use crate::instruction::Instruction;
use crate::method::Method;
use crate::module::Module;
use crate::opcode::Opcode;

pub(crate) use helpers::LabelAllocator;

/// Class names with baked-in translation rules.
pub(crate) mod known {
    pub const STRING: &str = "java/lang/String";
    pub const STRING_BUILDER: &str = "java/lang/StringBuilder";
    pub const EXCEPTION: &str = "java/lang/Exception";
    pub const STRING_LITERALS: &str = "neo/devkit/StringLiterals";
    pub const DEFAULT_EXCEPTION_MESSAGE: &str = "error";

    /// Boxed primitive wrappers whose conversion methods are identity
    /// operations on the NeoVM stack.
    pub const WRAPPERS: [&str; 6] = [
        "java/lang/Integer",
        "java/lang/Long",
        "java/lang/Short",
        "java/lang/Byte",
        "java/lang/Character",
        "java/lang/Boolean",
    ];
}

/// Name under which the static initializer is exposed in the manifest.
pub const INITIALIZE_METHOD: &str = "_initialize";

/// The output of a full contract compilation: the executable script plus the
/// ABI describing its public surface.
pub struct CompilationUnit {
    pub script: Vec<u8>,
    pub abi: ContractAbi,
}

/// Compile the class `class_name` registered in `registry` into a deployable
/// unit. Convenience wrapper around [`Compiler`].
pub fn compile(registry: &TypeRegistry, class_name: &str) -> Result<CompilationUnit> {
    Compiler::new(registry).compile_contract(class_name)
}

/// Per-method translation state. Holds the source body cursor and the target
/// [`Method`] being filled.
pub(crate) struct MethodContext<'a> {
    pub class: &'a ClassDef,
    pub def: &'a MethodDef,
    pub method: Method,
    /// Index of the next unconsumed source instruction.
    pub pc: usize,
    pub labels: LabelAllocator,
    /// Set when a `getstatic` of an event field has been seen and the
    /// matching `fire` invocation is still ahead.
    pub pending_event: Option<(String, EventSig)>,
}

impl<'a> MethodContext<'a> {
    pub(crate) fn emit(&mut self, insn: Instruction) {
        self.method.add(insn);
    }

    pub(crate) fn emit_op(&mut self, opcode: Opcode) {
        self.method.add(Instruction::new(opcode));
    }

    pub(crate) fn emit_slot(&mut self, opcode: Opcode, wide_index: Option<u8>) -> Result<()> {
        let insn = match wide_index {
            None => Instruction::new(opcode),
            Some(index) => Instruction::with_operand(opcode, vec![index])?,
        };
        self.method.add(insn);
        Ok(())
    }

    /// The next unconsumed source instruction, if any.
    pub(crate) fn peek(&self) -> Option<&'a SourceInsn> {
        self.def.body.get(self.pc)
    }

    pub(crate) fn unsupported(&self, what: impl Into<String>) -> CompilerError {
        CompilerError::unsupported(what, self.method.id.clone())
    }
}

/// Translates a contract class and everything it reaches into a [`Module`].
pub struct Compiler<'a> {
    registry: &'a TypeRegistry,
    module: Module,
    /// Name of the contract class; static slot access is only legal on it.
    contract: String,
}

impl<'a> Compiler<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Compiler {
            registry,
            module: Module::new(),
            contract: String::new(),
        }
    }

    /// Compile the contract and serialize it. The returned unit holds the
    /// final script bytes and the ABI.
    pub fn compile_contract(self, class_name: &str) -> Result<CompilationUnit> {
        let module = self.compile_to_module(class_name)?;
        let abi = module.abi();
        Ok(CompilationUnit {
            script: module.to_bytes(),
            abi,
        })
    }

    /// Compile the contract but stop short of serialization, returning the
    /// finalized module for inspection.
    pub fn compile_to_module(mut self, class_name: &str) -> Result<Module> {
        let registry = self.registry;
        let class = registry
            .class(class_name)
            .ok_or_else(|| invariant(format!("contract class {class_name} is not registered")))?;
        self.contract = class.name.clone();
        log::debug!("compiling contract {class_name}");

        let entry = find_entry_point(class)?;
        self.compile_method(class, entry)?;

        if let Some(clinit) = class.methods.iter().find(|m| m.name == "<clinit>") {
            self.compile_initializer(class, clinit)?;
        }

        for def in &class.methods {
            if !def.is_public || !def.is_static || std::ptr::eq(def, entry) {
                continue;
            }
            if matches!(def.name.as_str(), "<init>" | "<clinit>") {
                continue;
            }
            // Methods backed by instruction annotations have no compilable
            // body; they are inlined at their call sites.
            if def.instruction_patterns().is_some() {
                continue;
            }
            self.compile_method(class, def)?;
        }

        self.module.finalize()?;
        Ok(self.module)
    }

    /// Compile `def` if it has not been compiled yet, returning its id.
    /// The id is reserved before the body is walked so that recursive calls
    /// resolve to the reservation instead of looping.
    pub(crate) fn compile_method(
        &mut self,
        class: &'a ClassDef,
        def: &'a MethodDef,
    ) -> Result<neoc_data::MethodId> {
        let identity = def.identity(&class.name);
        if let Some(id) = self.module.lookup(&identity) {
            return Ok(id);
        }
        let id = self.module.reserve(&identity)?;
        log::debug!("compiling method {identity}");

        let mut method = self.new_method(class, def, def.display_name().to_string());
        method.initialize_slots(def, class)?;
        method.collect_try_regions(&def.try_regions)?;

        let mut ctx = MethodContext {
            class,
            def,
            method,
            pc: 0,
            labels: LabelAllocator::for_method(def),
            pending_event: None,
        };
        if def.name == "<init>" {
            objects::skip_to_super_ctor(&mut ctx)?;
        }
        while ctx.pc < ctx.def.body.len() {
            self.handle_insn(&mut ctx)?;
        }
        ctx.method.insert_try_markers()?;
        self.module.fill(id, ctx.method)?;
        Ok(id)
    }

    /// Lower `<clinit>` into the `_initialize` method. It opens with an
    /// INITSSLOT covering every static slot of the contract class.
    fn compile_initializer(&mut self, class: &'a ClassDef, def: &'a MethodDef) -> Result<()> {
        let identity = def.identity(&class.name);
        let id = self.module.reserve(&identity)?;

        let slot_count = class.static_fields().count();
        if slot_count > crate::method::MAX_SLOTS {
            return Err(CompilerError::LimitExceeded {
                what: "static fields",
                limit: crate::method::MAX_SLOTS,
                got: slot_count,
            });
        }

        let mut method = self.new_method(class, def, INITIALIZE_METHOD.to_string());
        method.is_public_interface = true;
        if slot_count > 0 {
            method.add(Instruction::with_operand(
                Opcode::InitSSlot,
                vec![slot_count as u8],
            )?);
        }

        let mut ctx = MethodContext {
            class,
            def,
            method,
            pc: 0,
            labels: LabelAllocator::for_method(def),
            pending_event: None,
        };
        while ctx.pc < ctx.def.body.len() {
            self.handle_insn(&mut ctx)?;
        }
        ctx.method.insert_try_markers()?;
        self.module.fill(id, ctx.method)?;
        Ok(())
    }

    fn new_method(&self, class: &ClassDef, def: &MethodDef, name: String) -> Method {
        let mut method = Method::new(&class.name, def.identity(&class.name), name);
        method.is_entry_point = def.is_entry_point();
        // Only the contract class exposes methods; lazily compiled helpers
        // on other registered classes stay out of the manifest.
        method.is_public_interface = class.name == self.contract
            && def.is_public
            && def.is_static
            && !matches!(def.name.as_str(), "<init>" | "<clinit>");
        method.is_safe = def.is_safe();
        method.return_type = Some(def.sig.ret.clone());
        method
    }

    /// Translate the source instruction at `ctx.pc` and advance past it.
    /// Handlers that fuse with later instructions advance the cursor further.
    pub(crate) fn handle_insn(&mut self, ctx: &mut MethodContext<'a>) -> Result<()> {
        let def = ctx.def;
        let insn = &def.body[ctx.pc];
        ctx.pc += 1;
        match insn {
            SourceInsn::Label(label) => {
                ctx.method.set_current_label(*label);
                Ok(())
            }
            SourceInsn::Line(line) => {
                ctx.method.set_current_line(*line);
                Ok(())
            }

            SourceInsn::PushNull => {
                ctx.emit_op(Opcode::PushNull);
                Ok(())
            }
            SourceInsn::PushInt(value) => ctx.push_int(*value),
            SourceInsn::PushString(s) => ctx.push_data(s.clone().into_bytes()),
            SourceInsn::PushFloat(_) => Err(ctx.unsupported(insn.mnemonic())),

            SourceInsn::Load { slot, kind } => self.handle_load(ctx, *slot, *kind),
            SourceInsn::Store { slot, kind } => self.handle_store(ctx, *slot, *kind),
            SourceInsn::Iinc { slot, amount } => self.handle_iinc(ctx, *slot, *amount),

            SourceInsn::Arith { op, kind } => self.handle_arith(ctx, *op, *kind),
            SourceInsn::Cast { from, to } => self.handle_cast(ctx, *from, *to),
            SourceInsn::CheckCast { .. } => Ok(()),
            SourceInsn::InstanceOf { .. } => Err(ctx.unsupported(insn.mnemonic())),
            SourceInsn::Lcmp => self.handle_lcmp(ctx),
            SourceInsn::FloatCmp => Err(ctx.unsupported(insn.mnemonic())),

            SourceInsn::Dup
            | SourceInsn::DupX1
            | SourceInsn::DupX2
            | SourceInsn::Dup2
            | SourceInsn::Dup2X1
            | SourceInsn::Dup2X2
            | SourceInsn::Pop
            | SourceInsn::Pop2
            | SourceInsn::Swap
            | SourceInsn::Nop => self.handle_stack_shuffle(ctx, insn),

            SourceInsn::Jump { cond, target } => self.handle_jump(ctx, *cond, *target),
            SourceInsn::Switch { cases, default } => self.handle_switch(ctx, cases, *default),
            SourceInsn::Return { kind } => self.handle_return(ctx, *kind),
            SourceInsn::Throw => {
                ctx.emit_op(Opcode::Throw);
                Ok(())
            }

            SourceInsn::GetField(field) => self.handle_get_field(ctx, field),
            SourceInsn::PutField(field) => self.handle_put_field(ctx, field),
            SourceInsn::GetStatic(field) => self.handle_get_static(ctx, field),
            SourceInsn::PutStatic(field) => self.handle_put_static(ctx, field),

            SourceInsn::Invoke {
                kind,
                owner,
                name,
                sig,
            } => self.handle_invoke(ctx, *kind, owner, name, sig),
            SourceInsn::New { class } => self.handle_new(ctx, class),

            SourceInsn::NewArray { elem } => self.handle_new_array(ctx, *elem),
            SourceInsn::MultiNewArray { .. } => Err(ctx.unsupported(insn.mnemonic())),
            SourceInsn::ArrayLoad { elem } => self.handle_array_load(ctx, *elem),
            SourceInsn::ArrayStore { elem } => self.handle_array_store(ctx, *elem),
            SourceInsn::ArrayLength => {
                ctx.emit_op(Opcode::Size);
                Ok(())
            }

            SourceInsn::MonitorEnter
            | SourceInsn::MonitorExit
            | SourceInsn::Jsr { .. }
            | SourceInsn::RetAddr { .. } => Err(ctx.unsupported(insn.mnemonic())),
        }
    }

    pub(crate) fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }
}

fn find_entry_point(class: &ClassDef) -> Result<&MethodDef> {
    let mut entry: Option<&MethodDef> = None;
    for def in class.methods.iter().filter(|m| m.is_entry_point()) {
        if !def.is_public || !def.is_static {
            return Err(invariant(format!(
                "entry point {} must be public and static",
                def.name
            )));
        }
        if let Some(first) = entry {
            return Err(CompilerError::MultipleEntryPoints {
                first: first.identity(&class.name),
                second: def.identity(&class.name),
            });
        }
        entry = Some(def);
    }
    entry.ok_or_else(|| CompilerError::NoEntryPoint {
        class: class.name.clone(),
    })
}

/// Instructions with a floating point value kind have no NeoVM rendition.
pub(crate) fn reject_float(ctx: &MethodContext<'_>, kind: ValueKind, what: &str) -> Result<()> {
    if kind.is_float() {
        return Err(ctx.unsupported(format!("{what} on a floating point value")));
    }
    Ok(())
}
