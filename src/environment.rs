use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Child scopes and closures each hold one, so a
/// scope lives as long as its longest‑lived holder.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root (global) scope.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps `self` into a shareable handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Binds `name` in this scope, replacing any earlier binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Rebinds an existing `name` somewhere along the chain; never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Reads `name` exactly `distance` scopes up the chain.
    ///
    /// # Panics
    ///
    /// If the chain is shorter than `distance` or the target scope lacks the
    /// binding.  The resolver guarantees both, so a miss means its scope
    /// nesting and the interpreter's have drifted apart.
    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        if distance == 0 {
            match self.values.get(name) {
                Some(value) => value.clone(),
                None => desync(name, "read"),
            }
        } else {
            match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get_at(distance - 1, name),
                None => desync(name, "read"),
            }
        }
    }

    /// Overwrites `name` exactly `distance` scopes up the chain.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Environment::get_at`].
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) {
        if distance == 0 {
            match self.values.get_mut(name) {
                Some(slot) => *slot = value,
                None => desync(name, "assignment"),
            }
        } else {
            match &self.enclosing {
                Some(enclosing) => enclosing
                    .borrow_mut()
                    .assign_at(distance - 1, name, value),
                None => desync(name, "assignment"),
            }
        }
    }
}

fn undefined(name: &Token) -> LoxError {
    debug!("Undefined variable '{}' at line {}", name.lexeme, name.line);

    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cold]
fn desync(name: &str, access: &str) -> ! {
    panic!(
        "resolved {} of '{}' found no binding at its recorded depth; \
         resolver and interpreter scopes are out of sync",
        access, name
    )
}
