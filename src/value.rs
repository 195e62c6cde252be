use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::{Callable, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::function::LoxFunction;

/// Runtime value domain of Lox.
///
/// Scalars are held inline; functions, classes and instances are shared
/// handles compared by identity.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),

    /// User closure: named function, method, lambda or getter.
    Function(Rc<LoxFunction>),

    /// Host‑provided primitive.
    Native(Rc<NativeFunction>),

    Class(Rc<LoxClass>),

    Instance(Rc<RefCell<LoxInstance>>),
}

impl Value {
    /// `nil` and `false` are falsy; everything else, `0` and `""` included,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// The call contract of this value, if it has one.
    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::Function(f) => Some(f.as_ref()),
            Value::Native(n) => Some(n.as_ref()),
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Human‑readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
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
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            // 6.0 → "6", 6.5 → "6.5"
            Value::Number(n) => write!(f, "{}", n),

            Value::String(s) => write!(f, "{}", s),

            Value::Function(func) => write!(f, "{}", func),

            Value::Native(native) => write!(f, "<native fn {}>", native.name),

            Value::Class(class) => write!(f, "<Class {}>", class.name),

            Value::Instance(instance) => {
                write!(f, "<{} instance>", instance.borrow().class().name)
            }
        }
    }
}
