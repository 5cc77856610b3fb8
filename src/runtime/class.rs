use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::Statement;
use crate::runtime::context::Context;
use crate::runtime::error::RuntimeError;
use crate::runtime::scope::{self, Scope};
use crate::runtime::value::{InstanceRef, Value};

/// A named method: its formal parameter list plus a shared AST body.
#[derive(Debug)]
pub struct Method {
    pub name: String,
    pub formal_params: Vec<String>,
    pub body: Statement,
}

/// Immutable class descriptor: an ordered method table and an optional base
/// class. Descriptors are built once by the parser and never mutated.
#[derive(Debug)]
pub struct Class {
    name: String,
    methods: Vec<Method>,
    parent: Option<Rc<Class>>,
}

impl Class {
    pub fn new(
        name: impl Into<String>,
        methods: Vec<Method>,
        parent: Option<Rc<Class>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            methods,
            parent,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First method with a matching name, searching this class before its
    /// base. Resolution is linear and single-inheritance.
    pub fn lookup(&self, name: &str) -> Option<&Method> {
        if let Some(method) = self.methods.iter().find(|method| method.name == name) {
            return Some(method);
        }
        self.parent.as_deref().and_then(|parent| parent.lookup(name))
    }

    /// True when `lookup(name)` resolves to a method of exactly `arity`
    /// formal parameters. A derived method shadows a base method of the
    /// same name even when only the base arity matches.
    pub fn has_method(&self, name: &str, arity: usize) -> bool {
        self.lookup(name)
            .is_some_and(|method| method.formal_params.len() == arity)
    }
}

/// A runtime object: its class plus a mutable field scope.
#[derive(Debug)]
pub struct Instance {
    class: Rc<Class>,
    fields: Scope,
}

impl Instance {
    /// Allocates an instance whose field scope carries the reserved
    /// non-owning `self` handle from the start; a strong handle there would
    /// cycle with the instance itself.
    pub fn new(class: Rc<Class>) -> Rc<RefCell<Instance>> {
        Rc::new_cyclic(|weak| {
            let mut fields = Scope::new();
            fields.set(
                scope::SELF,
                Value::Instance(InstanceRef::Shared(weak.clone())),
            );
            RefCell::new(Instance { class, fields })
        })
    }

    pub fn class(&self) -> Rc<Class> {
        Rc::clone(&self.class)
    }

    pub fn fields(&self) -> &Scope {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Scope {
        &mut self.fields
    }
}

impl InstanceRef {
    pub fn has_method(&self, method: &str, arity: usize) -> bool {
        let instance = self.strong();
        let class = instance.borrow().class();
        class.has_method(method, arity)
    }

    /// Invokes `method` with positionally bound arguments.
    ///
    /// The activation scope holds exactly the formal parameters and the
    /// receiver under `self`; method bodies cannot see the caller's scope.
    pub fn call(
        &self,
        method: &str,
        actual_args: Vec<Value>,
        ctx: &mut Context,
    ) -> Result<Value, RuntimeError> {
        let instance = self.strong();
        let class = instance.borrow().class();
        if !class.has_method(method, actual_args.len()) {
            return Err(RuntimeError::UnknownMethod {
                method: method.to_string(),
                class: class.name().to_string(),
            });
        }
        let resolved = class
            .lookup(method)
            .expect("has_method implies a successful lookup");

        let mut activation = Scope::new();
        for (param, value) in resolved.formal_params.iter().zip(actual_args) {
            activation.set(param.clone(), value);
        }
        activation.set(
            scope::SELF,
            Value::Instance(InstanceRef::Shared(Rc::downgrade(&instance))),
        );
        resolved.body.execute(&mut activation, ctx)
    }
}
