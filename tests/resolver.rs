use rox::ast::{Expr, Stmt};
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver::Resolver;
use rox::scanner::scan;

fn parse(source: &str) -> Vec<Stmt> {
    let tokens = scan(source.as_bytes()).unwrap();
    Parser::new(&tokens).parse().unwrap()
}

fn resolve(source: &str) -> (Interpreter, Vec<Stmt>, Result<(), LoxError>) {
    let statements = parse(source);
    let mut interpreter = Interpreter::new();
    let result = Resolver::new(&mut interpreter).resolve(&statements);
    (interpreter, statements, result)
}

fn resolve_err(source: &str) -> String {
    let (_, _, result) = resolve(source);
    match result {
        Err(e @ LoxError::Resolve { .. }) => e.to_string(),
        other => panic!("expected resolve error, got {:?}", other),
    }
}

/// Every `Variable` in `stmt` with its recorded distance, in source order.
fn variable_distances(interpreter: &Interpreter, stmt: &Stmt, out: &mut Vec<(String, Option<usize>)>) {
    fn walk_expr(interpreter: &Interpreter, expr: &Expr, out: &mut Vec<(String, Option<usize>)>) {
        match expr {
            Expr::Variable { id, name } => out.push((name.lexeme.clone(), interpreter.local_distance(*id))),
            Expr::This { id, keyword } => {
                out.push((keyword.lexeme.clone(), interpreter.local_distance(*id)))
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                walk_expr(interpreter, left, out);
                walk_expr(interpreter, right, out);
            }
            Expr::Call { callee, arguments, .. } => {
                walk_expr(interpreter, callee, out);
                arguments.iter().for_each(|a| walk_expr(interpreter, a, out));
            }
            Expr::Get { object, .. } => walk_expr(interpreter, object, out),
            Expr::Grouping(inner) | Expr::Unary { right: inner, .. } => walk_expr(interpreter, inner, out),
            Expr::Lambda(f) => f.body.iter().for_each(|s| variable_distances(interpreter, s, out)),
            _ => {}
        }
    }

    match stmt {
        Stmt::Expression(e) | Stmt::Print(e) => walk_expr(interpreter, e, out),
        Stmt::Var { initializer: Some(e), .. } => walk_expr(interpreter, e, out),
        Stmt::Return { value: Some(e), .. } => walk_expr(interpreter, e, out),
        Stmt::Block(body) => body.iter().for_each(|s| variable_distances(interpreter, s, out)),
        Stmt::Function(f) => f.body.iter().for_each(|s| variable_distances(interpreter, s, out)),
        Stmt::Class(c) => c
            .methods
            .iter()
            .chain(&c.statics)
            .chain(&c.getters)
            .flat_map(|m| m.body.iter())
            .for_each(|s| variable_distances(interpreter, s, out)),
        _ => {}
    }
}

fn distances(source: &str) -> Vec<(String, Option<usize>)> {
    let (interpreter, statements, result) = resolve(source);
    result.unwrap();

    let mut out = Vec::new();
    for stmt in &statements {
        variable_distances(&interpreter, stmt, &mut out);
    }
    out
}

fn entry(name: &str, distance: Option<usize>) -> (String, Option<usize>) {
    (name.to_string(), distance)
}

#[test]
fn globals_are_left_unrecorded() {
    assert_eq!(distances("var a = 1; print a;"), vec![entry("a", None)]);
}

#[test]
fn block_locals_count_frames_outward() {
    let found = distances("{ var a = 1; { var b = 2; print a + b; } }");

    assert_eq!(found, vec![entry("a", Some(1)), entry("b", Some(0))]);
}

#[test]
fn parameters_and_body_share_one_frame() {
    let found = distances("fun f(x) { var y = x; print y; }");

    assert_eq!(found, vec![entry("x", Some(0)), entry("y", Some(0))]);
}

#[test]
fn closures_see_enclosing_call_frame() {
    let found = distances(
        "fun outer() { var n = 0; return fun () { n = n + 1; return n; }; }",
    );

    // The lambda's own frame is 0, `outer`'s frame is 1.
    assert_eq!(found, vec![entry("n", Some(1))]);
}

#[test]
fn methods_see_this_one_frame_up() {
    let found = distances(
        "class A { show() { print this; } getter g { return this; } }",
    );

    assert_eq!(found, vec![entry("this", Some(1)), entry("this", Some(1))]);
}

#[test]
fn statics_resolve_against_globals_only() {
    let found = distances(
        "{ var hidden = 1; class A { static peek() { return hidden; } } }",
    );

    assert_eq!(found, vec![entry("hidden", None)]);
}

#[test]
fn redeclaration_in_same_scope() {
    assert!(resolve_err("{ var a = 1; var a = 2; }").contains("already declared"));
}

#[test]
fn global_redeclaration_is_allowed() {
    let (_, _, result) = resolve("var a = 1; var a = 2;");
    assert!(result.is_ok());
}

#[test]
fn read_in_own_initializer() {
    assert!(resolve_err("{ var a = a; }").contains("own initializer"));
}

#[test]
fn top_level_return() {
    assert!(resolve_err("return 1;").contains("outside of function"));
}

#[test]
fn this_outside_class() {
    assert!(resolve_err("print this;").contains("'this'"));
    assert!(resolve_err("fun f() { return this; }").contains("'this'"));
}

#[test]
fn this_inside_static() {
    assert!(resolve_err("class A { static s() { return this; } }").contains("'this'"));
}
