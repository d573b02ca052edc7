//! The public interface summary of a compiled module.

use crate::module::Module;
use neoc_data::JavaType;

/// Contract parameter types of the target platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    Any,
    Boolean,
    Integer,
    ByteArray,
    String,
    Array,
    Void,
}

/// Maps a source type onto the contract parameter type it is represented
/// as. Integers of every width share one representation.
pub fn param_type(ty: &JavaType) -> ParamType {
    match ty {
        JavaType::Void => ParamType::Void,
        JavaType::Boolean => ParamType::Boolean,
        JavaType::Byte
        | JavaType::Char
        | JavaType::Short
        | JavaType::Int
        | JavaType::Long => ParamType::Integer,
        JavaType::Float | JavaType::Double => ParamType::Any,
        JavaType::Array(elem) if **elem == JavaType::Byte => ParamType::ByteArray,
        JavaType::Array(_) => ParamType::Array,
        JavaType::Object(name) if name == "java/lang/String" => ParamType::String,
        JavaType::Object(_) => ParamType::Any,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AbiParam {
    pub name: Option<String>,
    pub ty: ParamType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AbiMethod {
    pub name: String,
    /// Byte offset of the method in the emitted script.
    pub offset: u32,
    pub safe: bool,
    pub params: Vec<AbiParam>,
    pub returns: ParamType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AbiEvent {
    pub name: String,
    pub params: Vec<ParamType>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContractAbi {
    pub methods: Vec<AbiMethod>,
    pub events: Vec<AbiEvent>,
}

impl Module {
    /// The ABI of the finalized module: every public interface method with
    /// its layout offset, plus the registered events.
    pub fn abi(&self) -> ContractAbi {
        let methods = self
            .methods()
            .filter(|m| m.is_public_interface)
            .map(|m| AbiMethod {
                name: m.name.clone(),
                offset: m.start_address,
                safe: m.is_safe,
                params: m
                    .params
                    .iter()
                    .filter(|p| p.name.as_deref() != Some("this"))
                    .map(|p| AbiParam {
                        name: p.name.clone(),
                        ty: p.ty.as_ref().map_or(ParamType::Any, param_type),
                    })
                    .collect(),
                returns: m.return_type.as_ref().map_or(ParamType::Void, param_type),
            })
            .collect();
        let events = self
            .events()
            .iter()
            .map(|e| AbiEvent {
                name: e.name.clone(),
                params: e.params.iter().map(param_type).collect(),
            })
            .collect();
        ContractAbi { methods, events }
    }
}
