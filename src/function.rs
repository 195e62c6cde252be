//! User closures: named functions, methods, lambdas and getters.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::callable::Callable;
use crate::environment::Environment;
use crate::interpreter::{Completion, IResult, Interpreter};
use crate::token::Token;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// `fun name(...)`, class methods and static methods.
    Function,
    /// `fun (...) { ... }` expression.
    Lambda,
    /// Zero‑argument member invoked on bare property access.
    Getter,
}

/// A declaration paired with the frame that was current where it was
/// evaluated.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    kind: FunctionKind,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        kind: FunctionKind,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            kind,
            is_initializer,
        }
    }

    pub fn is_getter(&self) -> bool {
        self.kind == FunctionKind::Getter
    }

    pub fn name(&self) -> Option<&str> {
        self.declaration.name()
    }

    /// New closure over a fresh frame defining `this`. The receiver is left
    /// untouched and can be bound again to other instances.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let environment = Environment::new_child(&self.closure);
        environment.borrow_mut().define("this", instance);

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            kind: self.kind,
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        match self.kind {
            FunctionKind::Getter => 0,
            FunctionKind::Function | FunctionKind::Lambda => self.declaration.params.len(),
        }
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _site: &Token,
    ) -> IResult<Value> {
        debug!("Calling {}", self);

        let environment = Environment::new_child(&self.closure);
        {
            let mut frame = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                frame.define(&param.lexeme, argument);
            }
        }

        let completion = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            let this = Token::identifier("this", self.declaration.line);
            return Ok(Environment::get_at(&self.closure, 0, &this)?);
        }

        Ok(match completion {
            Completion::Return(value) => value,
            Completion::Normal => Value::Nil,
        })
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.name()) {
            (FunctionKind::Getter, Some(name)) => write!(f, "<getter {}>", name),
            (_, Some(name)) => write!(f, "<fn {}>", name),
            (_, None) => write!(f, "<lambda>"),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("kind", &self.kind)
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}
