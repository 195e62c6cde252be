//! Tree‑walking evaluator.
//!
//! The interpreter owns the global frame and a cursor to the current frame.
//! Blocks and calls swap the cursor to a fresh child frame and always swap it
//! back, whether the body completes, returns or fails.
//!
//! Variable references are looked up through the distance table filled in by
//! the resolver: a recorded distance selects the frame directly, a missing
//! entry means the name is a global.
//!
//! `return` is not an error. Statement execution yields a [`Completion`]
//! that blocks pass upward unchanged until a call frame consumes it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, error, info, trace, warn};
use thiserror::Error;

use crate::ast::{ClassDecl, Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::callable::{clock, Callable, NativeFn, NativeFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{ErrorReporter, LoxError, RuntimeError, StderrReporter};
use crate::function::{FunctionKind, LoxFunction};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Default bound on nested calls before the session is declared overflowed.
pub const MAX_CALL_DEPTH: usize = 4096;

/// Minimum stack space to keep available before entering a call.
const RED_ZONE: usize = 100 * 1024;

/// Stack space allocated each time the stack has to grow.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Why evaluation stopped early.
#[derive(Error, Debug)]
pub enum InterpretError {
    /// Recoverable; reported at the `interpret` boundary.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Fatal; ends the session.
    #[error("Stack overflow: call depth exceeded {limit}.")]
    StackOverflow { limit: usize },

    /// Writing program output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, InterpretError>;

/// How a statement finished.
#[derive(Debug)]
pub enum Completion {
    Normal,
    Return(Value),
}

/// Result of one [`Interpreter::interpret`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every statement ran.
    Completed,
    /// A runtime error was reported and the remaining statements skipped.
    Aborted,
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    last_value: Option<String>,
    out: Box<dyn Write>,
    reporter: Box<dyn ErrorReporter>,
    depth: usize,
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter writing to stdout, reporting to stderr, with
    /// the `clock` native installed.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            last_value: None,
            out: Box::new(io::stdout()),
            reporter: Box::new(StderrReporter),
            depth: 0,
            max_depth: MAX_CALL_DEPTH,
        };

        interpreter.define_native("clock", 0, clock);
        interpreter
    }

    /// Redirect `print` output.
    pub fn with_output(mut self, out: Box<dyn Write>) -> Self {
        self.out = out;
        self
    }

    /// Replace the runtime error sink.
    pub fn with_reporter(mut self, reporter: Box<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_max_call_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Install a host function in the global frame.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        debug!("Defining native function '{}'", name);

        let native = NativeFunction::new(name, arity, func);
        self.define_global(name, Value::Native(Rc::new(native)));
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().define(name, value);
    }

    /// Resolver callback: `id` refers to a binding `depth` frames up.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        trace!("Noting {:?} at depth {}", id, depth);
        self.locals.insert(id, depth);
    }

    pub fn local_distance(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Stringified value of the last top‑level expression statement, if the
    /// last statement executed was one.
    pub fn last_value(&self) -> Option<&str> {
        self.last_value.as_deref()
    }

    /// Interprets a list of statements (a "program").
    ///
    /// Globals persist across calls. The first runtime error is handed to the
    /// reporter and the remaining statements are skipped. Stack overflow and
    /// output failures are returned as errors instead.
    pub fn interpret(&mut self, statements: &[Stmt]) -> crate::error::Result<Outcome> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.last_value = None;

            let result = match stmt {
                Stmt::Expression(expr) => self.evaluate(expr).map(|value| {
                    self.last_value = Some(value.to_string());
                    Completion::Normal
                }),
                _ => self.execute(stmt),
            };

            match result {
                Ok(Completion::Normal) => {}

                Ok(Completion::Return(_)) => {
                    warn!("Top-level return reached the interpreter; stopping");
                    break;
                }

                Err(InterpretError::Runtime(e)) => {
                    debug!("Runtime error: {}", e);
                    self.reset_cursor();
                    self.reporter.report(&e);
                    return Ok(Outcome::Aborted);
                }

                Err(InterpretError::StackOverflow { limit }) => {
                    error!("Stack overflow at call depth {}", limit);
                    self.reset_cursor();
                    return Err(LoxError::StackOverflow { limit });
                }

                Err(InterpretError::Io(e)) => {
                    self.reset_cursor();
                    return Err(LoxError::Io(e));
                }
            }
        }

        info!("Interpretation completed successfully");
        Ok(Outcome::Completed)
    }

    fn reset_cursor(&mut self) {
        self.environment = Rc::clone(&self.globals);
        self.depth = 0;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Completion> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Assert {
                keyword,
                expression,
            } => {
                let value = self.evaluate(expression)?;
                if !value.is_truthy() {
                    return Err(RuntimeError::AssertionFailed {
                        repr: value.to_string(),
                        line: keyword.line,
                    }
                    .into());
                }
            }

            Stmt::Var { name, initializer } => {
                debug!("Defining variable '{}'", name.lexeme);
                match initializer {
                    Some(expr) => {
                        let value = self.evaluate(expr)?;
                        self.environment.borrow_mut().define(&name.lexeme, value);
                    }
                    None => self.environment.borrow_mut().declare(&name.lexeme),
                }
            }

            Stmt::Block(statements) => {
                let frame = Environment::new_child(&self.environment);
                return self.execute_block(statements, frame);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Completion::Return(value) = self.execute(body)? {
                        return Ok(Completion::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                let function = self.closure(declaration, FunctionKind::Function);
                if let Some(name) = declaration.name() {
                    debug!("Defining function '{}'", name);
                    self.environment.borrow_mut().define(name, function);
                }
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(e) => self.evaluate(e)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                return Ok(Completion::Return(value));
            }

            Stmt::Class(declaration) => self.declare_class(declaration)?,
        }

        Ok(Completion::Normal)
    }

    /// Run `statements` with `environment` as the current frame, restoring
    /// the previous frame on every exit path.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> IResult<Completion> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.run_statements(statements);
        self.environment = previous;
        result
    }

    fn run_statements(&mut self, statements: &[Stmt]) -> IResult<Completion> {
        for stmt in statements {
            if let Completion::Return(value) = self.execute(stmt)? {
                return Ok(Completion::Return(value));
            }
        }
        Ok(Completion::Normal)
    }

    /// Bind the name first so methods can refer to their own class, then
    /// build the member tables and store the finished class.
    fn declare_class(&mut self, declaration: &ClassDecl) -> IResult<()> {
        let name = &declaration.name;
        debug!("Declaring class '{}'", name.lexeme);

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let mut methods = HashMap::new();
        for method in &declaration.methods {
            let is_initializer = method.name() == Some("init");
            let function = LoxFunction::new(
                Rc::clone(method),
                Rc::clone(&self.environment),
                FunctionKind::Function,
                is_initializer,
            );
            methods.insert(member_name(method), Rc::new(function));
        }

        let mut getters = HashMap::new();
        for getter in &declaration.getters {
            let function = LoxFunction::new(
                Rc::clone(getter),
                Rc::clone(&self.environment),
                FunctionKind::Getter,
                false,
            );
            getters.insert(member_name(getter), Rc::new(function));
        }

        // Statics close over the global frame, wherever the class is declared.
        let mut statics = HashMap::new();
        for method in &declaration.statics {
            let function = LoxFunction::new(
                Rc::clone(method),
                Rc::clone(&self.globals),
                FunctionKind::Function,
                false,
            );
            statics.insert(member_name(method), Rc::new(function));
        }

        let class = LoxClass::new(name.lexeme.clone(), methods, statics, getters);
        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        info!("Class '{}' defined", name.lexeme);
        Ok(())
    }

    fn closure(&self, declaration: &Rc<FunctionDecl>, kind: FunctionKind) -> Value {
        Value::Function(Rc::new(LoxFunction::new(
            Rc::clone(declaration),
            Rc::clone(&self.environment),
            kind,
            false,
        )))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        trace!("Evaluating expression: {:?}", expr);

        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.local_distance(*id) {
                    Some(distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self
                        .environment
                        .borrow_mut()
                        .assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                let callable = callee
                    .as_callable()
                    .ok_or(RuntimeError::NotCallable { line: paren.line })?;

                if arg_values.len() != callable.arity() {
                    return Err(RuntimeError::ArityMismatch {
                        expected: callable.arity(),
                        actual: arg_values.len(),
                        line: paren.line,
                    }
                    .into());
                }

                self.invoke(callable, arg_values, paren)
            }

            Expr::Get { object, name } => {
                let value = match self.evaluate(object)? {
                    Value::Instance(instance) => LoxInstance::get(&instance, name)?,
                    Value::Class(class) => class.get_static(name)?,
                    other => {
                        return Err(RuntimeError::not_an_object(
                            name.line,
                            format!("Only instances have properties, got {}.", other.type_name()),
                        )
                        .into())
                    }
                };

                match &value {
                    Value::Function(getter) if getter.is_getter() => {
                        self.invoke(getter.as_ref(), Vec::new(), name)
                    }
                    _ => Ok(value),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::not_an_object(
                        name.line,
                        "Only instances have fields.",
                    )
                    .into());
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::Lambda(declaration) => Ok(self.closure(declaration, FunctionKind::Lambda)),
        }
    }

    /// Call `callable` with already‑checked arguments, guarding call depth.
    pub fn invoke(
        &mut self,
        callable: &dyn Callable,
        arguments: Vec<Value>,
        site: &Token,
    ) -> IResult<Value> {
        if self.depth >= self.max_depth {
            return Err(InterpretError::StackOverflow {
                limit: self.max_depth,
            });
        }

        self.depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            callable.call(self, arguments, site)
        });
        self.depth -= 1;

        result
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        let value = match self.local_distance(id) {
            Some(distance) => Environment::get_at(&self.environment, distance, name)?,
            None => self.globals.borrow().get(name)?,
        };
        trace!("Variable '{}' evaluated to: {}", name.lexeme, value);
        Ok(value)
    }

    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> IResult<Value> {
        let right_val = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::type_mismatch(op.line, "Operand must be a number.").into()),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(RuntimeError::type_mismatch(
                op.line,
                format!("Invalid unary operator '{}'.", op.lexeme),
            )
            .into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> IResult<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;
        trace!("Left operand: {}, Right operand: {}", left_val, right_val);

        let value = match op.token_type {
            TokenType::COMMA => right_val,

            TokenType::EQUAL_EQUAL => Value::Bool(left_val == right_val),
            TokenType::BANG_EQUAL => Value::Bool(left_val != right_val),

            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (Value::String(a), Value::String(b)) => Value::String(a + &b),
                // Concatenation keeps the float form: "n=" + 3 is "n=3.0".
                (Value::String(a), Value::Number(n)) => Value::String(format!("{}{:?}", a, n)),
                (Value::Number(n), Value::String(b)) => Value::String(format!("{:?}{}", n, b)),
                _ => {
                    return Err(RuntimeError::type_mismatch(
                        op.line,
                        "Operands must be two numbers, or one of them must be a string.",
                    )
                    .into())
                }
            },

            _ => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;

                match op.token_type {
                    TokenType::MINUS => Value::Number(a - b),
                    TokenType::STAR => Value::Number(a * b),
                    TokenType::SLASH => {
                        if b == 0.0 {
                            return Err(RuntimeError::DivisionByZero { line: op.line }.into());
                        }
                        Value::Number(a / b)
                    }
                    TokenType::GREATER => Value::Bool(a > b),
                    TokenType::GREATER_EQUAL => Value::Bool(a >= b),
                    TokenType::LESS => Value::Bool(a < b),
                    TokenType::LESS_EQUAL => Value::Bool(a <= b),
                    _ => {
                        return Err(RuntimeError::type_mismatch(
                            op.line,
                            format!("Invalid binary operator '{}'.", op.lexeme),
                        )
                        .into())
                    }
                }
            }
        };

        Ok(value)
    }
}

fn number_operands(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::type_mismatch(
            op.line,
            "Operands must be numbers.",
        )),
    }
}

fn member_name(declaration: &FunctionDecl) -> String {
    declaration.name().unwrap_or_default().to_string()
}
