mod common;

use common::{run_err, run_ok, Session};
use rox::error::{LoxError, RuntimeError};
use rox::interpreter::{Interpreter, Outcome};
use rox::value::Value;

#[test]
fn arithmetic_and_stringification() {
    let out = run_ok(
        "print 1 + 2;
         print 7 / 2;
         print -3 * 2;
         print 2 - 0.5;
         print \"a\" + \"b\";
         print \"n=\" + 3;
         print 3 + \"!\";
         print nil;
         print !nil;",
    );

    assert_eq!(out, vec!["3", "3.5", "-6", "1.5", "ab", "n=3.0", "3.0!", "nil", "true"]);
}

#[test]
fn concatenation_keeps_float_form() {
    let out = run_ok(
        "print \"n=\" + 3;
         print \"n=\" + 2.5;
         print 7 + \" days\";
         print 3;",
    );

    assert_eq!(out, vec!["n=3.0", "n=2.5", "7.0 days", "3"]);
}

#[test]
fn large_integral_numbers_print_shortest_digits() {
    let out = run_ok("print 1000000000000000 * 1000000000000000;");

    assert_eq!(out, vec!["1000000000000000000000000000000"]);
}

#[test]
fn comparison_and_equality() {
    let out = run_ok(
        "print 1 < 2;
         print 2 <= 1;
         print 1 == 1;
         print \"a\" == \"a\";
         print nil == false;
         print 1 != \"1\";",
    );

    assert_eq!(out, vec!["true", "false", "true", "true", "false", "true"]);
}

#[test]
fn truthiness() {
    let out = run_ok(
        "if (0) print \"zero\";
         if (\"\") print \"empty\";
         if (nil) print \"nil\"; else print \"falsy\";",
    );

    assert_eq!(out, vec!["zero", "empty", "falsy"]);
}

#[test]
fn logical_operators_short_circuit_and_yield_operands() {
    let out = run_ok(
        "var called = false;
         fun touch() { called = true; return 1; }
         print nil or \"fallback\";
         print false and touch();
         print called;
         print 1 and 2;",
    );

    assert_eq!(out, vec!["fallback", "false", "false", "2"]);
}

#[test]
fn ternary_evaluates_one_branch() {
    let out = run_ok(
        "var hits = 0;
         fun hit() { hits = hits + 1; return hits; }
         print true ? \"yes\" : hit();
         print nil ? hit() : \"no\";
         print hits;",
    );

    assert_eq!(out, vec!["yes", "no", "0"]);
}

#[test]
fn comma_yields_right_operand() {
    assert_eq!(run_ok("var a = (1, 2, 3); print a;"), vec!["3"]);
}

#[test]
fn block_scoping_and_shadowing() {
    let out = run_ok(
        "var a = \"global\";
         {
           var a = \"outer\";
           {
             var a = \"inner\";
             print a;
           }
           print a;
         }
         print a;",
    );

    assert_eq!(out, vec!["inner", "outer", "global"]);
}

#[test]
fn closure_binding_is_fixed_at_resolution() {
    let out = run_ok(
        "var a = \"global\";
         {
           fun show() { print a; }
           show();
           var a = \"block\";
           show();
         }",
    );

    assert_eq!(out, vec!["global", "global"]);
}

#[test]
fn unresolved_assignment_walks_from_current_frame() {
    let out = run_ok(
        "var a = \"global\";
         {
           fun set() { a = \"assigned\"; }
           var a = \"block\";
           set();
           print a;
         }
         print a;",
    );

    assert_eq!(out, vec!["assigned", "global"]);
}

#[test]
fn closures_share_captured_frame() {
    let out = run_ok(
        "fun makeCounter() {
           var i = 0;
           fun count() { i = i + 1; return i; }
           return count;
         }
         var a = makeCounter();
         var b = makeCounter();
         print a();
         print a();
         print b();",
    );

    assert_eq!(out, vec!["1", "2", "1"]);
}

#[test]
fn lambdas_capture_like_functions() {
    let out = run_ok(
        "fun adder(n) { return fun (x) { return x + n; }; }
         var add2 = adder(2);
         print add2(5);
         print fun () {};",
    );

    assert_eq!(out, vec!["7", "<lambda>"]);
}

#[test]
fn loops() {
    let out = run_ok(
        "var i = 0;
         while (i < 3) { print i; i = i + 1; }
         for (var j = 0; j < 2; j = j + 1) print j * 10;",
    );

    assert_eq!(out, vec!["0", "1", "2", "0", "10"]);
}

#[test]
fn return_unwinds_through_loops_and_blocks() {
    let out = run_ok(
        "fun find() {
           for (var i = 0; ; i = i + 1) {
             { if (i == 3) return i; }
           }
         }
         print find();
         fun nothing() { return; }
         print nothing();",
    );

    assert_eq!(out, vec!["3", "nil"]);
}

#[test]
fn recursion() {
    let out = run_ok(
        "fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
         print fib(15);",
    );

    assert_eq!(out, vec!["610"]);
}

#[test]
fn callable_display() {
    let out = run_ok("fun f() {} print f; print clock;");

    assert_eq!(out, vec!["<fn f>", "<native fn clock>"]);
}

#[test]
fn clock_is_a_positive_number() {
    assert_eq!(run_ok("print clock() > 0;"), vec!["true"]);
}

#[test]
fn custom_natives() {
    fn double(args: &[Value]) -> Result<Value, String> {
        match args {
            [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
            _ => Err("double() expects a number.".to_string()),
        }
    }

    let mut interpreter = Interpreter::new();
    interpreter.define_native("double", 1, double);
    let mut session = Session::with_interpreter(interpreter);

    assert_eq!(session.run("print double(21);").unwrap(), Outcome::Completed);
    assert_eq!(session.run("double(\"x\");").unwrap(), Outcome::Aborted);

    assert_eq!(session.lines(), vec!["42"]);
    assert_eq!(
        session.errors(),
        vec![RuntimeError::Native {
            message: "double() expects a number.".into(),
            line: 1
        }]
    );
}

#[test]
fn uninitialized_variable() {
    let err = run_err("var x;\nprint x;");

    assert_eq!(
        err,
        RuntimeError::UninitializedVariable {
            name: "x".into(),
            line: 2
        }
    );
}

#[test]
fn uninitialized_local_and_later_assignment() {
    let out = run_ok("{ var x; x = 5; print x; }");
    assert_eq!(out, vec!["5"]);

    let err = run_err("{ var y; print y; }");
    assert!(matches!(err, RuntimeError::UninitializedVariable { .. }));
}

#[test]
fn undefined_variable() {
    let err = run_err("print missing;");
    assert_eq!(err.to_string(), "Undefined variable 'missing'.");

    let err = run_err("missing = 1;");
    assert!(matches!(err, RuntimeError::UndefinedVariable { .. }));
}

#[test]
fn division_by_zero() {
    assert_eq!(run_err("print 1 / 0;"), RuntimeError::DivisionByZero { line: 1 });
    assert_eq!(
        run_err("print 1 / 0.0;"),
        RuntimeError::DivisionByZero { line: 1 }
    );
}

#[test]
fn operand_type_errors() {
    assert_eq!(run_err("-\"a\";").to_string(), "Operand must be a number.");
    assert_eq!(run_err("1 < \"a\";").to_string(), "Operands must be numbers.");
    assert!(matches!(run_err("nil + 1;"), RuntimeError::TypeMismatch { .. }));
}

#[test]
fn calling_non_callables_and_wrong_arity() {
    assert_eq!(
        run_err("\"str\"();"),
        RuntimeError::NotCallable { line: 1 }
    );

    let err = run_err("fun f(a, b) {}\nf(1);");
    assert_eq!(
        err,
        RuntimeError::ArityMismatch {
            expected: 2,
            actual: 1,
            line: 2
        }
    );
    assert_eq!(err.to_string(), "Expected 2 arguments but got 1.");
}

#[test]
fn assertions() {
    assert_eq!(run_ok("assert 1; assert \"\"; print \"ok\";"), vec!["ok"]);

    let err = run_err("assert nil;");
    assert_eq!(err.to_string(), "Assertion error: nil is not truthy.");
}

#[test]
fn runtime_error_stops_the_program() {
    let mut session = Session::new();

    let outcome = session
        .run("print \"before\";\nprint 1 / 0;\nprint \"after\";")
        .unwrap();

    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(session.lines(), vec!["before"]);
    assert_eq!(session.errors()[0].line(), 2);
}

#[test]
fn error_inside_call_restores_the_global_frame() {
    let mut session = Session::new();

    session
        .run("var a = \"global\"; fun boom() { var a = \"local\"; return 1 / 0; } boom();")
        .unwrap();
    session.run("print a;").unwrap();

    assert_eq!(session.lines(), vec!["global"]);
}

#[test]
fn globals_persist_between_runs() {
    let mut session = Session::new();

    session.run("var count = 1; fun bump() { count = count + 1; }").unwrap();
    session.run("bump(); bump();").unwrap();
    session.run("print count;").unwrap();

    assert_eq!(session.lines(), vec!["3"]);
}

#[test]
fn last_value_tracks_top_level_expressions() {
    let mut session = Session::new();

    session.run("1 + 2;").unwrap();
    assert_eq!(session.interpreter.last_value(), Some("3"));

    session.run("\"a\" + \"b\";").unwrap();
    assert_eq!(session.interpreter.last_value(), Some("ab"));

    session.run("var x = 1;").unwrap();
    assert_eq!(session.interpreter.last_value(), None);

    session.run("print 5;").unwrap();
    assert_eq!(session.interpreter.last_value(), None);
}

#[test]
fn static_errors_run_nothing() {
    let mut session = Session::new();

    let err = session.run("print \"never\";\nvar = 1;").unwrap_err();

    assert!(matches!(err, LoxError::Parse { line: 2, .. }));
    assert!(session.lines().is_empty());

    let err = session.run("print \"never\"; return 1;").unwrap_err();
    assert!(matches!(err, LoxError::Resolve { .. }));
    assert!(session.lines().is_empty());
}

#[test]
fn unbounded_recursion_is_fatal() {
    let interpreter = Interpreter::new().with_max_call_depth(64);
    let mut session = Session::with_interpreter(interpreter);

    let err = session.run("fun down(n) { return down(n + 1); } down(0);").unwrap_err();

    assert!(matches!(err, LoxError::StackOverflow { limit: 64 }));
    assert!(session.errors().is_empty());
}

#[test]
fn recursion_within_the_limit_succeeds() {
    let interpreter = Interpreter::new().with_max_call_depth(64);
    let mut session = Session::with_interpreter(interpreter);

    session
        .run("fun depth(n) { return n == 0 ? 0 : 1 + depth(n - 1); } print depth(60);")
        .unwrap();

    assert_eq!(session.lines(), vec!["60"]);
}
