//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here. Runtime
//! failures have their own taxonomy, [`RuntimeError`], because they are
//! recoverable at the `interpret` boundary and are handed to an
//! [`ErrorReporter`] rather than returned.
//!
//! The module **does not** print diagnostics itself, with the single
//! exception of [`StderrReporter`], the default sink used by the binary.

use std::io;
use thiserror::Error;

use log::{error, info};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error that escaped to a caller.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Call depth exhausted. Fatal: the session must not continue.
    #[error("Stack overflow: call depth exceeded {limit}.")]
    StackOverflow { limit: usize },

    /// Wrapper around `std::io::Error` (transparent). Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve { message, line }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Recoverable failures raised while evaluating a program.
///
/// Every variant carries the line of the token that triggered it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: usize },

    #[error("Trying to access uninitialized variable '{name}'.")]
    UninitializedVariable { name: String, line: usize },

    #[error("Undefined property '{name}'.")]
    UndefinedProperty { name: String, line: usize },

    #[error("{message}")]
    TypeMismatch { message: String, line: usize },

    #[error("Division by zero.")]
    DivisionByZero { line: usize },

    #[error("Expected {expected} arguments but got {actual}.")]
    ArityMismatch {
        expected: usize,
        actual: usize,
        line: usize,
    },

    #[error("Can only call functions and classes.")]
    NotCallable { line: usize },

    #[error("{message}")]
    NotAnObject { message: String, line: usize },

    #[error("Assertion error: {repr} is not truthy.")]
    AssertionFailed { repr: String, line: usize },

    /// Failure reported by a host‑provided native function.
    #[error("{message}")]
    Native { message: String, line: usize },
}

impl RuntimeError {
    /// Source line the error is attributed to.
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::UninitializedVariable { line, .. }
            | RuntimeError::UndefinedProperty { line, .. }
            | RuntimeError::TypeMismatch { line, .. }
            | RuntimeError::DivisionByZero { line }
            | RuntimeError::ArityMismatch { line, .. }
            | RuntimeError::NotCallable { line }
            | RuntimeError::NotAnObject { line, .. }
            | RuntimeError::AssertionFailed { line, .. }
            | RuntimeError::Native { line, .. } => *line,
        }
    }

    pub(crate) fn type_mismatch<S: Into<String>>(line: usize, msg: S) -> Self {
        RuntimeError::TypeMismatch {
            message: msg.into(),
            line,
        }
    }

    pub(crate) fn not_an_object<S: Into<String>>(line: usize, msg: S) -> Self {
        RuntimeError::NotAnObject {
            message: msg.into(),
            line,
        }
    }
}

/// Destination for runtime errors caught at the `interpret` boundary.
pub trait ErrorReporter {
    fn report(&mut self, error: &RuntimeError);
}

/// Default sink: `<message>\n[line N]` on stderr.
#[derive(Debug, Default)]
pub struct StderrReporter;

impl ErrorReporter for StderrReporter {
    fn report(&mut self, err: &RuntimeError) {
        error!("Runtime error on line {}: {}", err.line(), err);

        eprintln!("{}\n[line {}]", err, err.line());
    }
}
