use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::runtime::class::{Class, Instance};
use crate::runtime::context::Context;
use crate::runtime::error::RuntimeError;

const STR_METHOD: &str = "__str__";

/// A runtime value handle.
///
/// Cloning a `Value` clones the handle, never the underlying object:
/// primitives copy, classes and instances alias. Language-level equality
/// (with `__eq__` dispatch) lives in [`crate::runtime::ops`]; the
/// `PartialEq` impl below is handle identity for objects and structural
/// equality for primitives.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Number(i64),
    Bool(bool),
    String(String),
    Class(Rc<Class>),
    Instance(InstanceRef),
}

/// Handle to a class instance.
///
/// `Owned` participates in the instance's reference count. `Shared` observes
/// the instance without owning it; it exists only for the reserved `self`
/// entry of the instance's own field scope, which would otherwise keep the
/// instance alive forever.
#[derive(Debug, Clone)]
pub enum InstanceRef {
    Owned(Rc<RefCell<Instance>>),
    Shared(Weak<RefCell<Instance>>),
}

impl InstanceRef {
    /// An owning handle to the underlying instance.
    pub fn strong(&self) -> Rc<RefCell<Instance>> {
        match self {
            InstanceRef::Owned(instance) => Rc::clone(instance),
            InstanceRef::Shared(weak) => weak
                .upgrade()
                .expect("a self handle must not outlive its instance"),
        }
    }

    pub fn ptr_eq(&self, other: &InstanceRef) -> bool {
        std::ptr::eq(self.as_ptr(), other.as_ptr())
    }

    fn as_ptr(&self) -> *const RefCell<Instance> {
        match self {
            InstanceRef::Owned(instance) => Rc::as_ptr(instance),
            InstanceRef::Shared(weak) => weak.as_ptr(),
        }
    }
}

impl Value {
    /// Converts a non-owning instance handle into an owning one.
    ///
    /// Scopes call this on every store except the reserved `self` entry, so
    /// a `self` handle that escapes its method (returned, or assigned to a
    /// field) starts owning the instance instead of dangling once the
    /// original owner lets go.
    pub fn into_owned(self) -> Value {
        match self {
            Value::Instance(handle) => Value::Instance(InstanceRef::Owned(handle.strong())),
            other => other,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Number(_) => "int",
            Value::Bool(_) => "bool",
            Value::String(_) => "str",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    /// Truthiness as used by `if`, `and`, `or`, and `not`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Number(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Class(_) | Value::Instance(_) => false,
        }
    }

    /// Renders this value into `out`.
    ///
    /// An instance whose class declares `__str__` delegates to it; the sink
    /// is always a caller-owned buffer, never the context's own output
    /// stream, so nested rendering cannot alias it.
    pub fn print(&self, out: &mut String, ctx: &mut Context) -> Result<(), RuntimeError> {
        match self {
            Value::None => out.push_str("None"),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::Bool(b) => out.push_str(if *b { "True" } else { "False" }),
            Value::String(s) => out.push_str(s),
            Value::Class(class) => {
                out.push_str("Class ");
                out.push_str(class.name());
            }
            Value::Instance(handle) => {
                let instance = handle.strong();
                let class = instance.borrow().class();
                if class.lookup(STR_METHOD).is_some() {
                    let rendered = handle.call(STR_METHOD, vec![], ctx)?;
                    rendered.print(out, ctx)?;
                } else {
                    out.push_str(&format!(
                        "<{} object at {:p}>",
                        class.name(),
                        handle.as_ptr()
                    ));
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Class(l), Value::Class(r)) => Rc::ptr_eq(l, r),
            (Value::Instance(l), Value::Instance(r)) => l.ptr_eq(r),
            _ => false,
        }
    }
}
