use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::value::Value;

/// Host function signature.  Errors are plain messages; the interpreter
/// attaches the call site before surfacing them.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// A function implemented in Rust and registered into the global scope.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: impl Into<String>, arity: usize, func: NativeFn) -> Self {
        Self {
            name: name.into(),
            arity,
            func,
        }
    }

    pub fn call(&self, arguments: &[Value]) -> Result<Value, String> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(arguments)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<native fn>")
    }
}

/// A user function: its declaration plus the scope it closed over.
///
/// The closure is held by reference, never copied, so two functions created
/// in the same scope see each other's writes to shared variables.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn declaration(&self) -> &FunctionDecl {
        &self.declaration
    }

    pub fn closure(&self) -> &EnvRef {
        &self.closure
    }

    pub fn name(&self) -> Option<&str> {
        self.declaration.name.as_ref().map(|t| t.lexeme.as_str())
    }

    pub fn arity(&self) -> usize {
        self.declaration.arity()
    }

    /// `true` for a class's `init` method, whose calls always yield `this`.
    pub fn is_initializer(&self) -> bool {
        self.is_initializer
    }

    /// Returns a copy of this method whose closure defines `this` as
    /// `instance`.  Done at every lookup, so each instance gets its own view
    /// of the one shared body.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        debug!("Binding method '{}'", self.name().unwrap_or("<anonymous>"));

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment.into_ref(),
            is_initializer: self.is_initializer,
        }
    }
}

// The closure is left out: it can reach this function again through an
// instance field, and printing it would never terminate.
impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<fn {}>", name),
            None => f.write_str("<fn>"),
        }
    }
}
