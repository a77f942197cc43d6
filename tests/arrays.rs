use beanscript::ast::build::*;
use beanscript::ast::{AssignOp, Statement};
use beanscript::{Interpreter, PrimitiveType, Value};

#[ctor::ctor]
fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

fn run(interp: &mut Interpreter, body: Vec<Statement>) -> Value {
    interp.eval(&program(body)).unwrap()
}

fn type_name(value: &Value) -> String {
    value.as_object().unwrap().runtime_type().name()
}

#[test]
fn nested_literals_become_multidimensional_arrays() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(
                name("grid"),
                array(vec![array(vec![int(1), int(2)]), array(vec![int(3)])]),
            )),
            expr(name("grid")),
        ],
    );
    assert_eq!(type_name(&v), "int[][]");
    let v = run(&mut interp, vec![expr(index(index(name("grid"), int(0)), int(1)))]);
    assert!(v.same(&Value::int(2)));
    let v = run(&mut interp, vec![expr(field(index(name("grid"), int(1)), "length"))]);
    assert!(v.same(&Value::int(1)));
}

#[test]
fn negative_indices_read_and_write_from_the_end() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            var(int_type().array(), "a", Some(array(vec![int(10), int(20), int(30)]))),
            expr(assign(index(name("a"), int(-1)), int(99))),
            expr(add(index(name("a"), int(-3)), index(name("a"), int(2)))),
        ],
    );
    assert!(v.same(&Value::int(109)));
}

#[test]
fn indices_past_either_end_throw() {
    let mut interp = Interpreter::new();
    run(
        &mut interp,
        vec![var(int_type().array(), "a", Some(array(vec![int(1), int(2)])))],
    );
    for i in [2, -3] {
        let err = interp
            .eval(&program(vec![expr(index(name("a"), int(i)))]))
            .unwrap_err();
        assert_eq!(
            err.thrown().unwrap().class_name(),
            "java.lang.ArrayIndexOutOfBoundsException",
            "index {i}"
        );
    }
}

#[test]
fn slices_are_read_only() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("a"), array(vec![int(1), int(2), int(3), int(4)]))),
            expr(slice(name("a"), Some(int(1)), Some(int(-1)))),
        ],
    );
    let items = v.as_object().unwrap().elements().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0].same(&Value::int(2)));
    let err = interp
        .eval(&program(vec![expr(assign(
            slice(name("a"), Some(int(0)), Some(int(2))),
            array(vec![int(0)]),
        ))]))
        .unwrap_err();
    assert!(!err.is_target());
}

#[test]
fn element_stores_are_coerced_to_the_component_type() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("d"), new_array(prim(PrimitiveType::Double), vec![int(2)], 0))),
            expr(assign(index(name("d"), int(0)), int(3))),
            expr(index(name("d"), int(0))),
        ],
    );
    assert!(v.same(&Value::double(3.0)));
    let err = interp
        .eval(&program(vec![expr(assign(index(name("d"), int(1)), string("x")))]))
        .unwrap_err();
    assert!(err.message().contains("Array element"));
}

#[test]
fn new_arrays_start_with_default_elements() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("total"), int(0))),
            for_each(
                Some(int_type()),
                "x",
                new_array(int_type(), vec![int(3)], 0),
                expr(assign_op(AssignOp::AddAssign, name("total"), add(name("x"), int(1)))),
            ),
            expr(name("total")),
        ],
    );
    assert!(v.same(&Value::int(3)));
    let v = run(
        &mut interp,
        vec![expr(index(new_array(named("String"), vec![int(1)], 0), int(0)))],
    );
    assert!(v.is_null());
}

#[test]
fn strings_index_by_utf16_code_unit() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("s"), string("a😀b"))),
            expr(method(name("s"), "length", vec![])),
        ],
    );
    assert!(v.same(&Value::int(4)));
    let v = run(&mut interp, vec![expr(index(name("s"), int(1)))]);
    assert!(v.same(&Value::char_unit(0xD83D)));
    let v = run(&mut interp, vec![expr(index(name("s"), int(-1)))]);
    assert!(v.same(&Value::char('b')));
    let v = run(
        &mut interp,
        vec![expr(method(name("s"), "substring", vec![int(1), int(3)]))],
    );
    assert_eq!(v.as_object().and_then(|o| o.string_value()).as_deref(), Some("😀"));
}
