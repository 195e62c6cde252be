//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, forward‑read in initializer,
//!    `return` outside a function, `this` outside a class or in a static).
//! 3. Tell the interpreter, for *each* variable occurrence, how many frames
//!    up its binding lives. Globals are left unrecorded.
//!
//! One scope is pushed for every frame the interpreter will push, in the same
//! nesting order: a block, a call (parameters and body share it), and the
//! `this` frame that binding a method or getter creates. Static methods
//! close over the global frame, so they are resolved with an empty stack.

use std::collections::HashMap;

use log::{debug, info};

use crate::ast::{ClassDecl, Expr, ExprId, FunctionDecl, Stmt};
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// What kind of body are we in? Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Lambda,
    Method,
    Initializer,
    Getter,
    Static,
}

/// Are we inside a class body where `this` is bound?
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'a, 'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, 'interp> Resolver<'a, 'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &'a [Stmt]) -> Result<()> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'a Stmt) -> Result<()> {
        match stmt {
            Stmt::Class(class) => self.resolve_class(class)?,

            Stmt::Block(statements) => {
                self.begin_scope();
                let result = self.resolve_all(statements);
                self.end_scope();
                result?;
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name)?;
                if let Some(expr) = initializer {
                    self.resolve_expr(expr)?;
                }
                self.define(name);
            }

            Stmt::Function(function) => {
                // the name is visible *inside* its own body
                if let Some(name) = &function.name {
                    self.declare(name)?;
                    self.define(name);
                }
                self.resolve_function(function, FunctionType::Function)?;
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr)?,

            Stmt::Assert { expression, .. } => self.resolve_expr(expression)?,

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb)?;
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(body)?;
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    return Err(LoxError::resolve(
                        keyword.line,
                        "'return' used outside of function",
                    ));
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_all(&mut self, statements: &'a [Stmt]) -> Result<()> {
        for s in statements {
            self.resolve_stmt(s)?;
        }
        Ok(())
    }

    fn resolve_class(&mut self, class: &'a ClassDecl) -> Result<()> {
        debug!("Resolving class '{}'", class.name.lexeme);

        self.declare(&class.name)?;
        self.define(&class.name);

        let enclosing_class = self.current_class;

        // Statics see only the globals and have no `this`.
        self.current_class = ClassType::None;
        let saved_scopes = std::mem::take(&mut self.scopes);
        let statics = class
            .statics
            .iter()
            .try_for_each(|method| self.resolve_function(method, FunctionType::Static));
        self.scopes = saved_scopes;
        self.current_class = enclosing_class;
        statics?;

        self.current_class = ClassType::Class;
        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert("this", true);
        }

        let members = class
            .methods
            .iter()
            .map(|method| {
                let kind = if method.name() == Some("init") {
                    FunctionType::Initializer
                } else {
                    FunctionType::Method
                };
                (method, kind)
            })
            .chain(class.getters.iter().map(|g| (g, FunctionType::Getter)))
            .try_for_each(|(member, kind)| self.resolve_function(member, kind));

        self.end_scope();
        self.current_class = enclosing_class;
        members
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'a Expr) -> Result<()> {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner)?,

            Expr::Unary { right, .. } => self.resolve_expr(right)?,

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition)?;
                self.resolve_expr(then_branch)?;
                self.resolve_expr(else_branch)?;
            }

            Expr::Variable { id, name } => {
                // Cannot read in own initializer
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme.as_str()) == Some(&false) {
                        return Err(LoxError::resolve(
                            name.line,
                            "Cannot read local variable in its own initializer",
                        ));
                    }
                }
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value)?;
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;
                for arg in arguments {
                    self.resolve_expr(arg)?;
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object)?,

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(value)?;
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    return Err(LoxError::resolve(
                        keyword.line,
                        "Cannot use 'this' outside of a class method",
                    ));
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Lambda(function) => self.resolve_function(function, FunctionType::Lambda)?,
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, function: &'a FunctionDecl, kind: FunctionType) -> Result<()> {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        let result = self.resolve_params_and_body(function);
        self.end_scope();

        self.current_function = enclosing;
        result
    }

    fn resolve_params_and_body(&mut self, function: &'a FunctionDecl) -> Result<()> {
        for param in &function.params {
            self.declare(param)?;
            self.define(param);
        }
        self.resolve_all(&function.body)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &'a Token) -> Result<()> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name.lexeme.as_str()) {
                return Err(LoxError::resolve(
                    name.line,
                    "Variable already declared in this scope",
                ));
            }
            scope.insert(&name.lexeme, false);
        }
        Ok(())
    }

    fn define(&mut self, name: &'a Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(&name.lexeme, true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as a local at depth `d`, or leave it
    /// unrecorded (global) if no enclosing scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme.as_str()) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
