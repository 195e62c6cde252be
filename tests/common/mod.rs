//! Shared harness: runs source through the whole pipeline with captured
//! output and a collecting error reporter.
#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::{ErrorReporter, LoxError, RuntimeError};
use rox::interpreter::{Interpreter, Outcome};

#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct CollectingReporter(Rc<RefCell<Vec<RuntimeError>>>);

impl ErrorReporter for CollectingReporter {
    fn report(&mut self, error: &RuntimeError) {
        self.0.borrow_mut().push(error.clone());
    }
}

pub struct Session {
    pub interpreter: Interpreter,
    output: SharedBuffer,
    errors: CollectingReporter,
}

impl Session {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        let output = SharedBuffer::default();
        let errors = CollectingReporter::default();
        let interpreter = interpreter
            .with_output(Box::new(output.clone()))
            .with_reporter(Box::new(errors.clone()));

        Self {
            interpreter,
            output,
            errors,
        }
    }

    pub fn run(&mut self, source: &str) -> Result<Outcome, LoxError> {
        rox::run_source(&mut self.interpreter, source.as_bytes())
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.output.0.borrow())
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn errors(&self) -> Vec<RuntimeError> {
        self.errors.0.borrow().clone()
    }
}

/// Runs a program that must complete cleanly; returns its printed lines.
pub fn run_ok(source: &str) -> Vec<String> {
    let mut session = Session::new();
    let outcome = session.run(source).expect("static error");
    assert_eq!(
        outcome,
        Outcome::Completed,
        "unexpected runtime errors: {:?}",
        session.errors()
    );
    session.lines()
}

/// Runs a program that must abort with exactly one runtime error.
pub fn run_err(source: &str) -> RuntimeError {
    let mut session = Session::new();
    let outcome = session.run(source).expect("static error");
    assert_eq!(outcome, Outcome::Aborted);

    let mut errors = session.errors();
    assert_eq!(errors.len(), 1, "errors: {:?}", errors);
    errors.remove(0)
}
