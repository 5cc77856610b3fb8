use std::collections::HashMap;

use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;

/// Reserved key under which `Return` parks the pending return value.
pub const RETURN_VALUE: &str = "return_val";

/// Reserved key for the method receiver.
pub const SELF: &str = "self";

/// Mapping from identifier to value handle.
///
/// Doubles as a function activation record and as an instance's field set.
/// Lookups never fall back to an outer scope: MyLang has no lexical capture.
/// The only entry permitted to hold a non-owning handle is [`SELF`].
#[derive(Debug, Default)]
pub struct Scope {
    slots: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        // Only the reserved receiver entry may hold a non-owning handle.
        let value = if name == SELF { value } else { value.into_owned() };
        self.slots.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        self.try_get(name).ok_or_else(|| RuntimeError::UndefinedVariable {
            name: name.to_string(),
        })
    }

    pub fn try_get(&self, name: &str) -> Option<Value> {
        self.slots.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}
