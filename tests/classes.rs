mod common;

use common::{run_err, run_ok, Session};
use rox::error::RuntimeError;

#[test]
fn construct_and_read_fields() {
    let out = run_ok(
        "class Point {
           init(x, y) { this.x = x; this.y = y; }
           sum() { return this.x + this.y; }
         }
         var p = Point(1, 2);
         print p.x;
         print p.sum();
         print p;
         print Point;",
    );

    assert_eq!(out, vec!["1", "3", "<Point instance>", "<Class Point>"]);
}

#[test]
fn class_without_init_takes_no_arguments() {
    assert_eq!(run_ok("class Empty {} print Empty();"), vec!["<Empty instance>"]);

    let err = run_err("class Empty {} Empty(1);");
    assert_eq!(
        err,
        RuntimeError::ArityMismatch {
            expected: 0,
            actual: 1,
            line: 1
        }
    );
}

#[test]
fn initializer_arity_is_enforced() {
    let err = run_err("class P { init(a) {} } P();");

    assert_eq!(err.to_string(), "Expected 1 arguments but got 0.");
}

#[test]
fn initializer_always_yields_the_instance() {
    let out = run_ok(
        "class Box {
           init(v) { this.v = v; return; }
         }
         var b = Box(1);
         var again = b.init(7);
         print again == b;
         print b.v;",
    );

    assert_eq!(out, vec!["true", "7"]);
}

#[test]
fn initializer_discards_an_explicit_return_value() {
    let out = run_ok(
        "class A {
           init() { this.x = 1; return 5; }
         }
         var a = A();
         print a.x;
         print a.init() == a;",
    );

    assert_eq!(out, vec!["1", "true"]);
}

#[test]
fn fields_shadow_methods() {
    let out = run_ok(
        "class A { greet() { return \"method\"; } }
         var a = A();
         print a.greet();
         a.greet = \"field\";
         print a.greet;",
    );

    assert_eq!(out, vec!["method", "field"]);
}

#[test]
fn bound_methods_remember_their_receiver() {
    let out = run_ok(
        "class Named {
           init(name) { this.name = name; }
           say() { return this.name; }
         }
         var a = Named(\"a\");
         var b = Named(\"b\");
         var sayA = a.say;
         b.say2 = a.say;
         print sayA();
         print b.say2();
         print b.say();",
    );

    assert_eq!(out, vec!["a", "a", "b"]);
}

#[test]
fn getters_run_on_access() {
    let out = run_ok(
        "class Circle {
           init(r) { this.r = r; }
           getter diameter { return this.r * 2; }
         }
         var c = Circle(3);
         print c.diameter;
         c.r = 5;
         print c.diameter;",
    );

    assert_eq!(out, vec!["6", "10"]);
}

#[test]
fn getters_are_bound_per_instance() {
    let out = run_ok(
        "class Tag {
           init(t) { this.t = t; }
           getter label { return \"<\" + this.t + \">\"; }
         }
         var x = Tag(\"x\");
         var y = Tag(\"y\");
         print x.label;
         print y.label;",
    );

    assert_eq!(out, vec!["<x>", "<y>"]);
}

#[test]
fn getters_are_not_available_inside_init() {
    let err = run_err(
        "class G {
           init() { print this.g; }
           getter g { return 1; }
         }
         G();",
    );

    assert!(matches!(err, RuntimeError::UndefinedProperty { line: 2, .. }));
}

#[test]
fn static_methods_live_on_the_class() {
    let out = run_ok(
        "class Math {
           static square(n) { return n * n; }
           twice(n) { return n * 2; }
         }
         print Math.square(4);
         print Math.square;",
    );

    assert_eq!(out, vec!["16", "<fn square>"]);

    let err = run_err("class Math { twice(n) { return n * 2; } } Math.twice(1);");
    assert_eq!(err.to_string(), "Undefined property 'twice'.");

    let err = run_err("class Math { static s() { return 1; } } Math().s();");
    assert!(matches!(err, RuntimeError::UndefinedProperty { .. }));
}

#[test]
fn statics_see_globals_only() {
    let out = run_ok(
        "var where = \"global\";
         {
           var where = \"block\";
           class C { static show() { return where; } }
           print C.show();
         }",
    );

    assert_eq!(out, vec!["global"]);
}

#[test]
fn class_name_is_visible_to_its_members() {
    let out = run_ok(
        "class Node {
           init(next) { this.next = next; }
           static chain() { return Node(Node(nil)); }
           depth() { return this.next == nil ? 1 : 1 + this.next.depth(); }
         }
         print Node.chain().depth();",
    );

    assert_eq!(out, vec!["2"]);
}

#[test]
fn classes_in_local_scope() {
    let out = run_ok(
        "fun make() {
           class Local { hi() { return \"hi\"; } }
           return Local();
         }
         print make().hi();",
    );

    assert_eq!(out, vec!["hi"]);
}

#[test]
fn methods_close_over_the_declaring_frame() {
    let out = run_ok(
        "fun withPrefix(prefix) {
           class P { tag(s) { return prefix + s; } }
           return P();
         }
         print withPrefix(\">\").tag(\"x\");",
    );

    assert_eq!(out, vec![">x"]);
}

#[test]
fn instances_compare_by_identity() {
    let out = run_ok(
        "class A {}
         var a = A();
         var b = a;
         print a == b;
         print a == A();",
    );

    assert_eq!(out, vec!["true", "false"]);
}

#[test]
fn property_errors() {
    assert_eq!(
        run_err("class A {} print A().missing;"),
        RuntimeError::UndefinedProperty {
            name: "missing".into(),
            line: 1
        }
    );

    let err = run_err("var n = 1; print n.field;");
    assert!(matches!(err, RuntimeError::NotAnObject { .. }));

    let err = run_err("class A {} A.field = 1;");
    assert_eq!(err.to_string(), "Only instances have fields.");

    let err = run_err("\"s\".length = 3;");
    assert!(matches!(err, RuntimeError::NotAnObject { .. }));
}

#[test]
fn this_survives_being_stored_in_a_closure() {
    let mut session = Session::new();

    session
        .run(
            "class Counter {
               init() { this.n = 0; }
               incrementer() { return fun () { this.n = this.n + 1; return this.n; }; }
             }
             var c = Counter();
             var inc = c.incrementer();",
        )
        .unwrap();
    session.run("inc(); inc();").unwrap();
    session.run("print c.n;").unwrap();

    assert_eq!(session.lines(), vec!["2"]);
}
