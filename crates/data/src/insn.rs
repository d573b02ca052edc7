//! The source instruction set the compiler walks.
//!
//! One closed enum covering the stack-machine instructions a class-file
//! front end produces. Labels and line numbers appear in the stream as
//! pseudo-instructions, the way a bytecode visitor reports them.

use crate::index::LabelId;
use crate::types::{JavaType, MethodSig};

/// Which value family an instruction operates on. Float families exist only
/// so the compiler can reject them with a precise diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Ref,
}

impl ValueKind {
    pub fn is_float(self) -> bool {
        matches!(self, ValueKind::Float | ValueKind::Double)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    Shl,
    Shr,
    UnsignedShr,
    And,
    Or,
    Xor,
}

/// Conditions for conditional and unconditional branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpCond {
    Always,
    /// Top of stack compared with zero.
    IfEq,
    IfNe,
    IfLt,
    IfGe,
    IfGt,
    IfLe,
    /// Two integers compared with each other.
    IfICmpEq,
    IfICmpNe,
    IfICmpLt,
    IfICmpGe,
    IfICmpGt,
    IfICmpLe,
    /// Two references compared with each other.
    IfACmpEq,
    IfACmpNe,
    IfNull,
    IfNonNull,
}

impl JumpCond {
    /// Whether this is a compare-with-zero condition (the family `LCMP`
    /// fuses with).
    pub fn compares_with_zero(self) -> bool {
        use JumpCond::*;
        matches!(self, IfEq | IfNe | IfLt | IfGe | IfGt | IfLe)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvokeKind {
    Static,
    Virtual,
    Special,
    Interface,
    Dynamic,
}

/// Element type of a one-dimensional array allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayElem {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Ref,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub ty: JavaType,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SourceInsn {
    /// Marks the position the given label refers to.
    Label(LabelId),
    /// Source line number for subsequent instructions.
    Line(u32),

    PushNull,
    PushInt(i64),
    PushFloat(f64),
    PushString(String),

    Load { slot: u16, kind: ValueKind },
    Store { slot: u16, kind: ValueKind },
    Iinc { slot: u16, amount: i32 },

    Arith { op: ArithOp, kind: ValueKind },
    /// Numeric conversion between value families.
    Cast { from: ValueKind, to: ValueKind },
    CheckCast { class: String },
    InstanceOf { class: String },
    /// Long comparison producing -1/0/1; always fused with the following
    /// compare-with-zero branch.
    Lcmp,
    FloatCmp,

    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Pop,
    Pop2,
    Swap,
    Nop,

    Jump { cond: JumpCond, target: LabelId },
    /// Normalized table/lookup switch: sorted `(key, target)` cases plus a
    /// default target.
    Switch { cases: Vec<(i64, LabelId)>, default: LabelId },
    Return { kind: Option<ValueKind> },
    Throw,

    GetField(FieldRef),
    PutField(FieldRef),
    GetStatic(FieldRef),
    PutStatic(FieldRef),

    Invoke { kind: InvokeKind, owner: String, name: String, sig: MethodSig },
    New { class: String },

    NewArray { elem: ArrayElem },
    MultiNewArray { ty: JavaType, dims: u8 },
    ArrayLoad { elem: ArrayElem },
    ArrayStore { elem: ArrayElem },
    ArrayLength,

    MonitorEnter,
    MonitorExit,
    Jsr { target: LabelId },
    RetAddr { slot: u16 },
}

impl SourceInsn {
    /// A short mnemonic for diagnostics.
    pub fn mnemonic(&self) -> &'static str {
        use SourceInsn::*;
        match self {
            Label(_) => "label",
            Line(_) => "line",
            PushNull => "aconst_null",
            PushInt(_) => "push_int",
            PushFloat(_) => "push_float",
            PushString(_) => "ldc_string",
            Load { .. } => "load",
            Store { .. } => "store",
            Iinc { .. } => "iinc",
            Arith { .. } => "arith",
            Cast { .. } => "cast",
            CheckCast { .. } => "checkcast",
            InstanceOf { .. } => "instanceof",
            Lcmp => "lcmp",
            FloatCmp => "fcmp",
            Dup => "dup",
            DupX1 => "dup_x1",
            DupX2 => "dup_x2",
            Dup2 => "dup2",
            Dup2X1 => "dup2_x1",
            Dup2X2 => "dup2_x2",
            Pop => "pop",
            Pop2 => "pop2",
            Swap => "swap",
            Nop => "nop",
            Jump { .. } => "jump",
            Switch { .. } => "switch",
            Return { .. } => "return",
            Throw => "athrow",
            GetField(_) => "getfield",
            PutField(_) => "putfield",
            GetStatic(_) => "getstatic",
            PutStatic(_) => "putstatic",
            Invoke { .. } => "invoke",
            New { .. } => "new",
            NewArray { .. } => "newarray",
            MultiNewArray { .. } => "multianewarray",
            ArrayLoad { .. } => "array_load",
            ArrayStore { .. } => "array_store",
            ArrayLength => "arraylength",
            MonitorEnter => "monitorenter",
            MonitorExit => "monitorexit",
            Jsr { .. } => "jsr",
            RetAddr { .. } => "ret",
        }
    }

    /// Whether this is a pseudo-instruction that produces no code.
    pub fn is_pseudo(&self) -> bool {
        matches!(self, SourceInsn::Label(_) | SourceInsn::Line(_))
    }
}
