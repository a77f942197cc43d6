use beanscript::ast::build::*;
use beanscript::ast::{AssignOp, BinaryOp, Modifiers};
use beanscript::{Config, Interpreter, Primitive, PrimitiveType, Value};

#[ctor::ctor]
fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

fn run(interp: &mut Interpreter, body: Vec<beanscript::ast::Statement>) -> Value {
    interp.eval(&program(body)).unwrap()
}

#[test]
fn compound_assignment_reads_the_target_first() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("i"), int(1))),
            expr(assign_op(AssignOp::AddAssign, name("i"), post_inc(name("i")))),
            expr(name("i")),
        ],
    );
    assert!(v.same(&Value::int(2)));
}

#[test]
fn typed_variables_coerce_representable_values() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            var(prim(PrimitiveType::Long), "l", Some(int(5))),
            expr(name("l")),
        ],
    );
    assert!(v.same(&Value::long(5)));
    let b = run(
        &mut interp,
        vec![
            var(prim(PrimitiveType::Byte), "b", Some(int(10))),
            expr(name("b")),
        ],
    );
    assert!(b.same(&Value::Primitive(Primitive::Byte(10))));
}

#[test]
fn typed_variables_reject_unrepresentable_values() {
    let mut interp = Interpreter::new();
    let err = interp
        .eval(&program(vec![var(prim(PrimitiveType::Byte), "b", Some(int(300)))]))
        .unwrap_err();
    assert!(!err.is_target());
    let err = interp
        .eval(&program(vec![var(int_type(), "n", Some(string("seven")))]))
        .unwrap_err();
    assert!(err.message().contains("n"));
}

#[test]
fn final_variables_accept_one_assignment() {
    let mut interp = Interpreter::new();
    let err = interp
        .eval(&program(vec![
            var_with(Modifiers::FINAL, Some(int_type()), "x", Some(int(1))),
            expr(assign(name("x"), int(1))),
        ]))
        .unwrap_err();
    assert!(err.message().contains("final"));
}

#[test]
fn short_circuit_operators_skip_the_right_operand() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("hits"), int(0))),
            function(
                "touch",
                &[],
                vec![
                    expr(post_inc(name("hits"))),
                    ret(Some(boolean(true))),
                ],
            ),
            expr(and(boolean(false), call("touch", vec![]))),
            expr(or(boolean(true), call("touch", vec![]))),
            expr(name("hits")),
        ],
    );
    assert!(v.same(&Value::int(0)));
}

#[test]
fn null_is_never_an_instance() {
    let mut interp = Interpreter::new();
    for ty in ["Object", "String", "beanscript.Primitive"] {
        let v = run(&mut interp, vec![expr(instance_of(null(), named(ty)))]);
        assert!(v.same(&Value::boolean(false)), "null instanceof {ty}");
    }
    let v = run(&mut interp, vec![expr(instance_of(int(3), named("beanscript.Primitive")))]);
    assert!(v.same(&Value::boolean(true)));
}

#[test]
fn boxed_equality_is_identity() {
    let mut interp = Interpreter::new();
    let core = interp.core();
    interp.set("a", core.boxed(Primitive::Int(1000))).unwrap();
    interp.set("b", core.boxed(Primitive::Int(1000))).unwrap();
    let v = run(&mut interp, vec![expr(eq(name("a"), name("b")))]);
    assert!(v.same(&Value::boolean(false)));
    let v = run(&mut interp, vec![expr(eq(name("a"), name("a")))]);
    assert!(v.same(&Value::boolean(true)));
}

#[test]
fn loop_bodies_reset_typed_locals_and_share_untyped_assignment() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("i"), int(0))),
            expr(assign(name("seen"), int(0))),
            while_loop(
                lt(name("i"), int(3)),
                block(vec![
                    var(int_type(), "fresh", None),
                    expr(assign_op(AssignOp::AddAssign, name("seen"), name("fresh"))),
                    expr(assign(name("fresh"), int(10))),
                    expr(post_inc(name("i"))),
                ]),
            ),
            expr(add(name("seen"), name("i"))),
        ],
    );
    assert!(v.same(&Value::int(3)));
    assert!(interp.get("fresh").unwrap().is_none());
}

#[test]
fn strict_mode_rejects_undeclared_names() {
    let mut interp = Interpreter::with_config(Config::default().strict_java(true));
    assert!(interp.eval(&program(vec![expr(assign(name("x"), int(1)))])).is_err());
    assert!(interp.eval(&program(vec![expr(name("nothing"))])).is_err());
    let v = run(
        &mut interp,
        vec![
            var(int_type(), "x", Some(int(2))),
            expr(binary(BinaryOp::Mul, name("x"), int(21))),
        ],
    );
    assert!(v.same(&Value::int(42)));
}

#[test]
fn void_never_comes_to_rest() {
    let mut interp = Interpreter::new();
    let err = interp
        .eval(&program(vec![
            function("nothing", &[], vec![]),
            expr(assign(name("x"), call("nothing", vec![]))),
        ]))
        .unwrap_err();
    assert!(err.message().to_lowercase().contains("void"));
}

#[test]
fn compound_assignment_narrows_only_declared_primitive_targets() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("x"), int(1))),
            expr(assign_op(AssignOp::AddAssign, name("x"), double(0.5))),
            expr(name("x")),
        ],
    );
    assert!(v.same(&Value::double(1.5)));

    let v = run(
        &mut interp,
        vec![
            var(int_type(), "n", Some(int(1))),
            expr(assign_op(AssignOp::AddAssign, name("n"), double(0.5))),
            expr(name("n")),
        ],
    );
    assert!(v.same(&Value::int(1)));

    let v = run(
        &mut interp,
        vec![
            var(prim(PrimitiveType::Byte), "b", Some(int(127))),
            expr(assign_op(AssignOp::AddAssign, name("b"), int(1))),
            expr(name("b")),
        ],
    );
    assert!(v.same(&Value::Primitive(Primitive::Byte(-128))));

    let v = run(
        &mut interp,
        vec![
            var(int_type().array(), "a", Some(array(vec![int(1)]))),
            expr(assign_op(AssignOp::AddAssign, index(name("a"), int(0)), double(2.5))),
            expr(index(name("a"), int(0))),
        ],
    );
    assert!(v.same(&Value::int(3)));
}
