//! The output module: compiled methods, events and method tokens.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CompilerError, Result};
use crate::method::Method;
use neoc_data::{Idx, IndexLinearSet, IndexVec, JavaType, MethodId, TokenId};

/// Maximum number of method tokens a script can reference (CALLT carries a
/// two-byte index).
pub const MAX_TOKENS: usize = 0xFFFF;

/// Call permission bits recorded in a method token.
pub mod call_flags {
    pub const ALL: u8 = 0x0F;
}

/// A reference to a method of an already-deployed contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodToken {
    /// Script hash, little-endian.
    pub hash: [u8; 20],
    pub method: String,
    pub param_count: u16,
    pub has_return: bool,
    pub call_flags: u8,
}

/// A notification event of the compiled contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDef {
    pub name: String,
    pub params: Vec<JavaType>,
}

/// The compiled contract. Methods keep their insertion order, which is
/// also their layout order in the emitted script.
#[derive(Default)]
pub struct Module {
    methods: IndexVec<MethodId, Option<Method>>,
    by_id: HashMap<String, MethodId>,
    events: Vec<EventDef>,
    tokens: IndexLinearSet<TokenId, MethodToken>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves an identity before its body exists, so recursive call
    /// chains resolve to a stable id.
    pub fn reserve(&mut self, id: &str) -> Result<MethodId> {
        if self.by_id.contains_key(id) {
            return Err(CompilerError::invariant(format!("method {id} registered twice")));
        }
        let mid = self.methods.push(None);
        self.by_id.insert(id.to_string(), mid);
        Ok(mid)
    }

    /// Fills a reservation with the compiled method.
    pub fn fill(&mut self, mid: MethodId, method: Method) -> Result<()> {
        match &self.methods[mid] {
            Some(_) => Err(CompilerError::invariant(format!("method {} filled twice", method.id))),
            None => {
                self.methods[mid] = Some(method);
                Ok(())
            }
        }
    }

    pub fn add_method(&mut self, method: Method) -> Result<MethodId> {
        let mid = self.reserve(&method.id)?;
        self.fill(mid, method)?;
        Ok(mid)
    }

    pub fn lookup(&self, id: &str) -> Option<MethodId> {
        self.by_id.get(id).copied()
    }

    pub fn method(&self, mid: MethodId) -> Option<&Method> {
        self.methods[mid].as_ref()
    }

    /// Compiled methods in insertion order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter_map(|m| m.as_ref())
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Registers an event, deduplicating by name. The same name with a
    /// different signature is a conflict.
    pub fn add_event(&mut self, name: &str, params: Vec<JavaType>) -> Result<()> {
        match self.events.iter().find(|e| e.name == name) {
            Some(existing) if existing.params == params => Ok(()),
            Some(_) => Err(CompilerError::invariant(format!(
                "event {name} declared twice with different signatures"
            ))),
            None => {
                self.events.push(EventDef { name: name.to_string(), params });
                Ok(())
            }
        }
    }

    pub fn events(&self) -> &[EventDef] {
        &self.events
    }

    /// Registers a method token and returns its CALLT index. Equal tokens
    /// share one entry.
    pub fn add_token(&mut self, token: MethodToken) -> Result<u16> {
        let id = match self.tokens.add(token) {
            Ok(id) | Err(id) => id,
        };
        if id.index() > MAX_TOKENS {
            return Err(CompilerError::LimitExceeded {
                what: "method tokens",
                limit: MAX_TOKENS,
                got: id.index() + 1,
            });
        }
        Ok(id.index() as u16)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &MethodToken> {
        self.tokens.iter()
    }

    /// Two-phase finalization. Phase A lays methods out back to back in
    /// insertion order and resolves their intra-method offsets; phase B
    /// patches cross-method call operands against the final layout.
    pub fn finalize(&mut self) -> Result<()> {
        for (mid, slot) in self.methods.iter().enumerate() {
            if slot.is_none() {
                let id = self
                    .by_id
                    .iter()
                    .find(|(_, &m)| m.index() == mid)
                    .map(|(id, _)| id.clone())
                    .unwrap_or_default();
                return Err(CompilerError::UnresolvedCallTarget { id });
            }
        }

        let mut start = 0u32;
        let mut starts: Vec<u32> = Vec::with_capacity(self.methods.len());
        for slot in self.methods.iter_mut() {
            let method = slot.as_mut().unwrap();
            method.start_address = start;
            method.finalize_offsets()?;
            starts.push(start);
            start += method.byte_len();
        }

        for slot in self.methods.iter_mut() {
            let method = slot.as_mut().unwrap();
            method.patch_call_targets(|target| starts[target.index()])?;
        }

        log::debug!(
            "finalized module: {} methods, {} tokens, {} bytes",
            self.methods.len(),
            self.tokens.len(),
            start
        );
        Ok(())
    }

    pub fn byte_len(&self) -> u32 {
        self.methods().map(|m| m.byte_len()).sum()
    }

    /// The emitted script: method bodies concatenated in insertion order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len() as usize);
        for method in self.methods() {
            method.write_to(&mut out);
        }
        out
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("methods", &self.method_count())
            .field("events", &self.events.len())
            .field("tokens", &self.tokens.len())
            .field("bytes", &self.byte_len())
            .finish()
    }
}
