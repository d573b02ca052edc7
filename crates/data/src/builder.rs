//! Fluent construction of class definitions.
//!
//! Used by tests and by front ends that assemble the object graph by hand.
//! Configuration methods chain by value; emission methods borrow, so label
//! allocation composes with straight-line emission.

use crate::index::LabelId;
use crate::insn::{ArithOp, InvokeKind, JumpCond, SourceInsn, ValueKind};
use crate::types::{JavaType, MethodSig};
use crate::{Annotation, ClassDef, EventSig, FieldDef, MethodDef, TryRegion, VariableDef};

pub struct ClassBuilder {
    class: ClassDef,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            class: ClassDef {
                name: name.into(),
                superclass: Some(crate::OBJECT_CLASS.into()),
                annotations: vec![],
                fields: vec![],
                methods: vec![],
            },
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.class.superclass = Some(superclass.into());
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.class.annotations.push(annotation);
        self
    }

    pub fn contract_hash(self, hash: [u8; 20]) -> Self {
        self.annotation(Annotation::ContractHash(hash))
    }

    pub fn static_field(mut self, name: impl Into<String>, ty: JavaType) -> Self {
        self.class.fields.push(FieldDef {
            name: name.into(),
            ty,
            is_static: true,
            annotations: vec![],
            event: None,
        });
        self
    }

    pub fn instance_field(mut self, name: impl Into<String>, ty: JavaType) -> Self {
        self.class.fields.push(FieldDef {
            name: name.into(),
            ty,
            is_static: false,
            annotations: vec![],
            event: None,
        });
        self
    }

    /// Declares a notification event field.
    pub fn event(mut self, name: impl Into<String>, params: Vec<JavaType>) -> Self {
        let name = name.into();
        self.class.fields.push(FieldDef {
            name: name.clone(),
            ty: JavaType::object(format!("events/Event{}", params.len())),
            is_static: true,
            annotations: vec![],
            event: Some(EventSig { params }),
        });
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.class.methods.push(method);
        self
    }

    pub fn build(self) -> ClassDef {
        self.class
    }
}

pub struct MethodBuilder {
    def: MethodDef,
    next_label: LabelId,
}

impl MethodBuilder {
    /// A public static method, the shape contract interface methods have.
    pub fn new(name: impl Into<String>, sig: MethodSig) -> Self {
        Self {
            def: MethodDef {
                name: name.into(),
                sig,
                is_static: true,
                is_public: true,
                annotations: vec![],
                max_locals: 0,
                variables: vec![],
                body: vec![],
                try_regions: vec![],
            },
            next_label: LabelId::new(0),
        }
    }

    /// An instance constructor.
    pub fn ctor(sig: MethodSig) -> Self {
        Self::new("<init>", sig).instance()
    }

    /// The static initializer.
    pub fn clinit() -> Self {
        Self::new("<clinit>", MethodSig::void()).private()
    }

    pub fn instance(mut self) -> Self {
        self.def.is_static = false;
        self
    }

    pub fn private(mut self) -> Self {
        self.def.is_public = false;
        self
    }

    pub fn entry_point(mut self) -> Self {
        self.def.annotations.push(Annotation::EntryPoint);
        self
    }

    pub fn safe(mut self) -> Self {
        self.def.annotations.push(Annotation::Safe);
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.def.annotations.push(Annotation::DisplayName(name.into()));
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.def.annotations.push(annotation);
        self
    }

    pub fn max_locals(mut self, n: u16) -> Self {
        self.def.max_locals = n;
        self
    }

    pub fn variable(mut self, slot: u16, name: impl Into<String>, ty: JavaType) -> Self {
        self.def.variables.push(VariableDef { slot, name: name.into(), ty });
        self
    }

    pub fn try_region(
        mut self,
        start: LabelId,
        end: LabelId,
        handler: LabelId,
        exception_type: Option<&str>,
    ) -> Self {
        self.def.try_regions.push(TryRegion {
            start,
            end,
            handler,
            exception_type: exception_type.map(Into::into),
        });
        self
    }

    pub fn fresh_label(&mut self) -> LabelId {
        self.next_label.get_and_inc()
    }

    pub fn emit(&mut self, insn: SourceInsn) -> &mut Self {
        self.def.body.push(insn);
        self
    }

    pub fn label(&mut self, label: LabelId) -> &mut Self {
        self.emit(SourceInsn::Label(label))
    }

    pub fn line(&mut self, line: u32) -> &mut Self {
        self.emit(SourceInsn::Line(line))
    }

    pub fn push_int(&mut self, value: i64) -> &mut Self {
        self.emit(SourceInsn::PushInt(value))
    }

    pub fn push_str(&mut self, value: impl Into<String>) -> &mut Self {
        self.emit(SourceInsn::PushString(value.into()))
    }

    pub fn push_null(&mut self) -> &mut Self {
        self.emit(SourceInsn::PushNull)
    }

    pub fn load(&mut self, slot: u16, kind: ValueKind) -> &mut Self {
        self.emit(SourceInsn::Load { slot, kind })
    }

    pub fn store(&mut self, slot: u16, kind: ValueKind) -> &mut Self {
        self.emit(SourceInsn::Store { slot, kind })
    }

    pub fn arith(&mut self, op: ArithOp, kind: ValueKind) -> &mut Self {
        self.emit(SourceInsn::Arith { op, kind })
    }

    pub fn jump(&mut self, cond: JumpCond, target: LabelId) -> &mut Self {
        self.emit(SourceInsn::Jump { cond, target })
    }

    pub fn invoke(
        &mut self,
        kind: InvokeKind,
        owner: impl Into<String>,
        name: impl Into<String>,
        sig: MethodSig,
    ) -> &mut Self {
        self.emit(SourceInsn::Invoke { kind, owner: owner.into(), name: name.into(), sig })
    }

    pub fn invoke_static(
        &mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        sig: MethodSig,
    ) -> &mut Self {
        self.invoke(InvokeKind::Static, owner, name, sig)
    }

    pub fn invoke_virtual(
        &mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        sig: MethodSig,
    ) -> &mut Self {
        self.invoke(InvokeKind::Virtual, owner, name, sig)
    }

    pub fn invoke_special(
        &mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        sig: MethodSig,
    ) -> &mut Self {
        self.invoke(InvokeKind::Special, owner, name, sig)
    }

    pub fn ret(&mut self) -> &mut Self {
        self.emit(SourceInsn::Return { kind: None })
    }

    pub fn ret_value(&mut self, kind: ValueKind) -> &mut Self {
        self.emit(SourceInsn::Return { kind: Some(kind) })
    }

    pub fn build(self) -> MethodDef {
        self.def
    }
}
