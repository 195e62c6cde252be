//! The call contract shared by closures, classes and native functions.

use std::fmt;

use log::debug;

use crate::error::RuntimeError;
use crate::interpreter::{IResult, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear on the left of `( … )`.
///
/// The evaluator checks `arguments.len() == arity()` before calling, so
/// implementations may assume the count is right.
pub trait Callable {
    fn arity(&self) -> usize;

    /// `site` is the token the call is attributed to in errors: the closing
    /// paren of a call expression, or the property name of a getter access.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        site: &Token,
    ) -> IResult<Value>;
}

/// Signature of a host primitive.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// Host‑provided function installed in the global frame.
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
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}/{}>", self.name, self.arity)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        site: &Token,
    ) -> IResult<Value> {
        debug!("Calling native function '{}'", self.name);

        let result = (self.func)(&arguments).map_err(|message| RuntimeError::Native {
            message,
            line: site.line,
        })?;

        debug!("Native function '{}' returned: {}", self.name, result);
        Ok(result)
    }
}

/// `clock()`: seconds since the Unix epoch.
pub fn clock(_args: &[Value]) -> Result<Value, String> {
    let micros = chrono::Utc::now().timestamp_micros();
    Ok(Value::Number(micros as f64 / 1_000_000.0))
}
