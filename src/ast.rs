//! Abstract syntax tree consumed by the resolver and the evaluator.
//!
//! Nodes own their tokens, and function declarations are shared behind an
//! [`Rc`], so a closure created from a declaration can keep pointing at it
//! for as long as the closure lives, independently of the source buffer or
//! of the statement list the declaration came from.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a variable‑referencing expression node.
///
/// The resolver keys the distance table by this id. Ids are unique for the
/// lifetime of the process so tables built for separate parses (one per
/// REPL line) can be merged into the same interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// Every kind of *expression* in Lox.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),

    /// Prefix unary operator expression: `!ready`, `-42`.
    Unary { operator: Token, right: Box<Expr> },

    /// Infix binary operator expression, including the comma operator.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Grouping(Box<Expr>),

    Variable { id: ExprId, name: Token },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        question: Token,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This { id: ExprId, keyword: Token },

    /// Anonymous function: `fun (a, b) { ... }`.
    Lambda(Rc<FunctionDecl>),
}

impl Expr {
    pub fn variable(name: Token) -> Self {
        Expr::Variable {
            id: ExprId::fresh(),
            name,
        }
    }
}

/// A function, method, getter or lambda declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// `None` for lambdas.
    pub name: Option<Token>,

    /// Parameter name tokens (arity ≤ 255). Empty for getters.
    pub params: Vec<Token>,

    /// Body, executed directly in the call frame.
    pub body: Vec<Stmt>,

    /// Line of the declaration, used when no name token exists.
    pub line: usize,
}

impl FunctionDecl {
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|t| t.lexeme.as_str())
    }
}

/// Members of a `class` body, split by kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Token,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub statics: Vec<Rc<FunctionDecl>>,
    pub getters: Vec<Rc<FunctionDecl>>,
}

/// Complete executable constructs. A program is a sequence of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    /// `assert expr;` fails at runtime when `expr` is falsy.
    Assert { keyword: Token, expression: Expr },

    /// `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope; the only statement that opens a frame by itself.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop. `for` loops are desugared into this by the parser.
    While { condition: Expr, body: Box<Stmt> },

    Function(Rc<FunctionDecl>),

    Return { keyword: Token, value: Option<Expr> },

    Class(ClassDecl),
}
