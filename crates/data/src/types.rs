//! Structured source-side value types and method signatures.
//!
//! The compiler never parses descriptor strings; front ends hand it
//! structured types and the descriptor rendering here only exists to give
//! methods a stable identity string.

use std::fmt;

/// A source-level value type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JavaType {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Array(Box<JavaType>),
    /// A reference type, by internal name (e.g. `java/lang/String`).
    Object(String),
}

impl JavaType {
    pub fn object(name: impl Into<String>) -> Self {
        JavaType::Object(name.into())
    }

    pub fn array(elem: JavaType) -> Self {
        JavaType::Array(Box::new(elem))
    }

    pub fn string() -> Self {
        JavaType::object("java/lang/String")
    }

    /// Whether values of this type occupy two source variable slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, JavaType::Long | JavaType::Double)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, JavaType::Float | JavaType::Double)
    }

    /// The JVM descriptor for this type.
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            JavaType::Void => out.push('V'),
            JavaType::Boolean => out.push('Z'),
            JavaType::Byte => out.push('B'),
            JavaType::Char => out.push('C'),
            JavaType::Short => out.push('S'),
            JavaType::Int => out.push('I'),
            JavaType::Long => out.push('J'),
            JavaType::Float => out.push('F'),
            JavaType::Double => out.push('D'),
            JavaType::Array(elem) => {
                out.push('[');
                elem.write_descriptor(out);
            }
            JavaType::Object(name) => {
                out.push('L');
                out.push_str(name);
                out.push(';');
            }
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

/// A method signature: parameter types and return type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodSig {
    pub params: Vec<JavaType>,
    pub ret: JavaType,
}

impl MethodSig {
    pub fn new(params: Vec<JavaType>, ret: JavaType) -> Self {
        Self { params, ret }
    }

    /// A signature with no parameters and no return value.
    pub fn void() -> Self {
        Self::new(vec![], JavaType::Void)
    }

    pub fn returns_value(&self) -> bool {
        self.ret != JavaType::Void
    }

    /// The JVM descriptor, e.g. `(ILjava/lang/String;)V`.
    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for p in &self.params {
            p.write_descriptor(&mut out);
        }
        out.push(')');
        self.ret.write_descriptor(&mut out);
        out
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}
