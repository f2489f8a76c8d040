use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::class::{LoxClass, LoxInstance};
use crate::function::{LoxFunction, NativeFunction};

/// A runtime value.  Scalars are held inline; everything with identity sits
/// behind an `Rc` so copies of the value share the one object.
#[derive(Debug, Clone)]
pub enum Value {
    NativeFunction(Rc<NativeFunction>),

    Function(Rc<LoxFunction>),

    Class(Rc<LoxClass>),

    /// Instances are the only mutable objects: their field map changes in place.
    Instance(Rc<RefCell<LoxInstance>>),

    Number(f64),

    String(String),

    Bool(bool),

    Nil,
}

/// Value equality: `nil` equals only itself, scalars compare by value
/// (IEEE rules, so `NaN != NaN`), objects compare by identity, and values
/// of different kinds are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::NativeFunction(native) => write!(f, "{}", native),

            Value::Function(function) => write!(f, "{}", function),

            Value::Class(class) => write!(f, "{}", class),

            Value::Instance(instance) => write!(f, "{}", instance.borrow()),

            Value::Number(n) => {
                // Integral values print without a fraction: 3.0 → "3".
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    if *n == 0.0 && n.is_sign_negative() {
                        f.write_str("-0")
                    } else {
                        let mut buf = itoa::Buffer::new();
                        f.write_str(buf.format(*n as i64))
                    }
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "nil"),
        }
    }
}
