//! Source-side program representation for the NeoVM compiler.
//!
//! A front end (class-file reader, test builder) produces [`ClassDef`]
//! object graphs and registers them in a [`TypeRegistry`]; the codegen
//! crate walks them. Nothing here knows about the target instruction set.

pub mod annotation;
pub mod builder;
pub mod index;
pub mod insn;
pub mod types;

use std::collections::HashMap;

pub use annotation::{Annotation, InstructionPattern};
pub use builder::{ClassBuilder, MethodBuilder};
pub use index::{Idx, IndexLinearSet, IndexSlice, IndexVec, InsnId, LabelId, MethodId, TokenId};
pub use insn::{ArithOp, ArrayElem, FieldRef, InvokeKind, JumpCond, SourceInsn, ValueKind};
pub use types::{JavaType, MethodSig};

/// The internal name every reference type ultimately extends.
pub const OBJECT_CLASS: &str = "java/lang/Object";

/// Parameter signature of an event declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSig {
    pub params: Vec<JavaType>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: JavaType,
    pub is_static: bool,
    pub annotations: Vec<Annotation>,
    /// Present when this field declares a notification event rather than a
    /// storable value.
    pub event: Option<EventSig>,
}

impl FieldDef {
    /// The name this field exposes externally (events use it as the
    /// notification name).
    pub fn display_name(&self) -> &str {
        annotation::display_name(&self.annotations).unwrap_or(&self.name)
    }
}

/// Declared metadata for one source variable slot.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDef {
    pub slot: u16,
    pub name: String,
    pub ty: JavaType,
}

/// One entry of a method's exception table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryRegion {
    pub start: LabelId,
    pub end: LabelId,
    pub handler: LabelId,
    /// `None` for catch-all entries (finally blocks, compiler plumbing).
    pub exception_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub sig: MethodSig,
    pub is_static: bool,
    pub is_public: bool,
    pub annotations: Vec<Annotation>,
    /// Number of source variable slots, parameters included.
    pub max_locals: u16,
    pub variables: Vec<VariableDef>,
    pub body: Vec<SourceInsn>,
    pub try_regions: Vec<TryRegion>,
}

impl MethodDef {
    /// The module-wide identity of this method.
    pub fn identity(&self, owner: &str) -> String {
        format!("{}.{}{}", owner, self.name, self.sig.descriptor())
    }

    pub fn instruction_patterns(&self) -> Option<&[InstructionPattern]> {
        annotation::instruction_patterns(&self.annotations)
    }

    pub fn is_entry_point(&self) -> bool {
        annotation::is_entry_point(&self.annotations)
    }

    pub fn is_safe(&self) -> bool {
        annotation::is_safe(&self.annotations)
    }

    /// The name this method exposes in the ABI.
    pub fn display_name(&self) -> &str {
        annotation::display_name(&self.annotations).unwrap_or(&self.name)
    }

    /// Finds the declared variable occupying the given source slot.
    pub fn variable_at(&self, slot: u16) -> Option<&VariableDef> {
        self.variables.iter().find(|v| v.slot == slot)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    /// Internal name, e.g. `com/example/Token`.
    pub name: String,
    pub superclass: Option<String>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn method(&self, name: &str, sig: &MethodSig) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name && &m.sig == sig)
    }

    pub fn contract_hash(&self) -> Option<[u8; 20]> {
        annotation::contract_hash(&self.annotations)
    }

    pub fn static_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_static && f.event.is_none())
    }

    pub fn instance_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.is_static)
    }

    /// Index of a static field among this class's static declarations.
    pub fn static_field_index(&self, name: &str) -> Option<usize> {
        self.static_fields().position(|f| f.name == name)
    }

    pub fn event_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name && f.event.is_some())
    }
}

/// All classes known to a compilation, keyed by internal name.
#[derive(Default)]
pub struct TypeRegistry {
    classes: HashMap<String, ClassDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassDef) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// Resolves a call target in `owner` or the nearest superclass that
    /// declares it. Returns the declaring class alongside the method.
    pub fn resolve_method(
        &self,
        owner: &str,
        name: &str,
        sig: &MethodSig,
    ) -> Option<(&ClassDef, &MethodDef)> {
        let mut current = self.class(owner)?;
        loop {
            if let Some(m) = current.method(name, sig) {
                return Some((current, m));
            }
            current = self.class(current.superclass.as_deref()?)?;
        }
    }

    /// Walks the superclass chain of `name` from the root down, yielding
    /// each class. Stops at classes not present in the registry
    /// (`java/lang/Object` is normally absent).
    fn hierarchy(&self, name: &str) -> Vec<&ClassDef> {
        let mut chain = Vec::new();
        let mut current = self.class(name);
        while let Some(class) = current {
            chain.push(class);
            current = class.superclass.as_deref().and_then(|s| self.class(s));
        }
        chain.reverse();
        chain
    }

    /// Total number of instance fields of `name`, inherited ones included.
    pub fn instance_field_count(&self, name: &str) -> usize {
        self.hierarchy(name).iter().map(|c| c.instance_fields().count()).sum()
    }

    /// Index of an instance field in the flattened object layout
    /// (superclass fields first, declaration order within each class).
    pub fn instance_field_index(&self, owner: &str, field: &str) -> Option<usize> {
        let mut index = 0;
        for class in self.hierarchy(owner) {
            for f in class.instance_fields() {
                if f.name == field {
                    return Some(index);
                }
                index += 1;
            }
        }
        None
    }

    /// Whether `name` is `class` or one of its subclasses in the registry.
    pub fn is_subclass_of(&self, name: &str, class: &str) -> bool {
        if name == class {
            return true;
        }
        let mut current = self.class(name);
        while let Some(c) = current {
            match c.superclass.as_deref() {
                Some(s) if s == class => return true,
                Some(s) => current = self.class(s),
                None => return false,
            }
        }
        false
    }
}
