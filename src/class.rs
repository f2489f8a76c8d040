use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::token::Token;
use crate::value::Value;

/// Name of the method run on instantiation.
pub const INITIALIZER: &str = "init";

/// A class: a name and its unbound methods.
#[derive(Debug)]
pub struct LoxClass {
    name: String,
    methods: HashMap<String, LoxFunction>,
}

impl LoxClass {
    pub fn new(name: impl Into<String>, methods: HashMap<String, LoxFunction>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_method(&self, name: &str) -> Option<&LoxFunction> {
        self.methods.get(name)
    }

    /// Calling a class takes as many arguments as its initializer, or none.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, LoxFunction::arity)
    }
}

impl fmt::Display for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An object created by calling a class.  Fields are not declared anywhere;
/// a `set` simply adds or replaces an entry.
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property lookup: fields shadow methods; a method comes back bound to
    /// `instance`.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(&name.lexeme) {
            debug!("Property '{}' resolved to a method", name.lexeme);

            let bound = method.bind(Rc::clone(instance));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(LoxError::runtime(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

// Field values may point back at this instance; print names only.
impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();

        f.debug_struct("LoxInstance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}
