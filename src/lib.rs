pub mod ast;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use log::debug;

use crate::error::Result;
use crate::interpreter::{Interpreter, Outcome};
use crate::parser::Parser;
use crate::resolver::Resolver;

/// Scan, parse, resolve and execute `source` against `interpreter`.
///
/// Static errors (lexing, parsing, resolution) are returned before anything
/// runs. Runtime errors go to the interpreter's reporter and yield
/// [`Outcome::Aborted`].
pub fn run_source(interpreter: &mut Interpreter, source: &[u8]) -> Result<Outcome> {
    let tokens = scanner::scan(source)?;
    debug!("Scanned {} tokens", tokens.len());

    let statements = Parser::new(&tokens).parse()?;
    Resolver::new(interpreter).resolve(&statements)?;

    interpreter.interpret(&statements)
}
