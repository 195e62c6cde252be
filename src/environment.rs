//! Lexical scope frames.
//!
//! A frame maps names to values and links to exactly one enclosing frame
//! (none for the global frame). Frames are shared and mutable: every closure
//! created inside a frame keeps it alive and observes later assignments to
//! it.
//!
//! Two lookup paths exist. [`Environment::get`] / [`Environment::assign`]
//! walk the chain by name and are used only for references the resolver
//! left unresolved. [`Environment::get_at`] / [`Environment::assign_at`]
//! jump straight to the frame `distance` links up, trusting the resolver's
//! scope count to match the evaluator's frame pushes exactly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{trace, warn};

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// A declared binding is `None` until its first assignment.
type Slot = Option<Value>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Slot>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// The global (root) frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Allocate a fresh shared child frame of `parent`.
    ///
    /// This is the only place a non‑global frame is created.
    pub fn new_child(parent: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(parent))))
    }

    pub fn enclosing(&self) -> Option<&Rc<RefCell<Environment>>> {
        self.enclosing.as_ref()
    }

    /// Insert or overwrite a binding in this frame only.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), Some(value));
    }

    /// Declare `name` without a value. Reading it fails until it is assigned.
    pub fn declare(&mut self, name: &str) {
        trace!("declare '{}' (uninitialized)", name);
        self.values.insert(name.to_string(), None);
    }

    /// Dynamic lookup: this frame, then each enclosing frame in turn.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        match self.values.get(&name.lexeme) {
            Some(slot) => read_slot(slot, name),
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name),
                None => Err(undefined_variable(name)),
            },
        }
    }

    /// Dynamic assignment. Never creates a binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = Some(value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined_variable(name))
        }
    }

    /// Walk exactly `distance` enclosing links. Distance 0 is `env` itself.
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut frame = Rc::clone(env);

        for _ in 0..distance {
            let next = frame.borrow().enclosing.clone()?;
            frame = next;
        }

        Some(frame)
    }

    /// Static read in the frame `distance` links above `env`.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
    ) -> Result<Value, RuntimeError> {
        let frame = Self::ancestor(env, distance).ok_or_else(|| {
            warn!(
                "Resolved distance {} for '{}' runs past the global frame",
                distance, name.lexeme
            );
            undefined_variable(name)
        })?;
        let frame = frame.borrow();

        match frame.values.get(&name.lexeme) {
            Some(slot) => read_slot(slot, name),
            None => Err(undefined_variable(name)),
        }
    }

    /// Static write in the frame `distance` links above `env`.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let frame = Self::ancestor(env, distance).ok_or_else(|| {
            warn!(
                "Resolved distance {} for '{}' runs past the global frame",
                distance, name.lexeme
            );
            undefined_variable(name)
        })?;

        frame
            .borrow_mut()
            .values
            .insert(name.lexeme.clone(), Some(value));
        Ok(())
    }
}

fn read_slot(slot: &Slot, name: &Token) -> Result<Value, RuntimeError> {
    slot.clone()
        .ok_or_else(|| RuntimeError::UninitializedVariable {
            name: name.lexeme.clone(),
            line: name.line,
        })
}

fn undefined_variable(name: &Token) -> RuntimeError {
    RuntimeError::UndefinedVariable {
        name: name.lexeme.clone(),
        line: name.line,
    }
}
