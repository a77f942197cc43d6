use beanscript::ast::build::*;
use beanscript::ast::{AssignOp, BinaryOp, Member, Modifiers, ReturnType, Statement};
use beanscript::{ClassDef, Interpreter, SecurityGuard, Value};

#[ctor::ctor]
fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

fn run(interp: &mut Interpreter, body: Vec<Statement>) -> Value {
    interp.eval(&program(body)).unwrap()
}

fn text(value: &Value) -> String {
    value
        .as_object()
        .and_then(|o| o.string_value())
        .unwrap_or_else(|| format!("{value:?}"))
}

fn shapes() -> Vec<Statement> {
    let area = |body: beanscript::ast::Expression| {
        method_member(method_decl(
            "area",
            Modifiers::PUBLIC,
            ReturnType::Typed(int_type()),
            vec![],
            Some(vec![ret(Some(body))]),
        ))
    };
    vec![
        class_stmt(interface_decl(
            "Shape",
            &[],
            vec![method_member(method_decl(
                "area",
                Modifiers::NONE,
                ReturnType::Typed(int_type()),
                vec![],
                None,
            ))],
        )),
        class_stmt(class_decl(
            "Square",
            None,
            &["Shape"],
            vec![
                field_member(Modifiers::NONE, Some(int_type()), "side", None),
                constructor(
                    vec![param("s")],
                    vec![expr(assign(field(name("this"), "side"), name("s")))],
                ),
                area(binary(BinaryOp::Mul, name("side"), name("side"))),
            ],
        )),
        class_stmt(class_decl(
            "Rect",
            Some("Square"),
            &[],
            vec![
                field_member(Modifiers::NONE, Some(int_type()), "h", None),
                constructor(
                    vec![param("w"), param("h")],
                    vec![
                        expr(call("super", vec![name("w")])),
                        expr(assign(field(name("this"), "h"), name("h"))),
                    ],
                ),
                area(binary(BinaryOp::Mul, name("side"), name("h"))),
            ],
        )),
    ]
}

#[test]
fn generated_classes_dispatch_through_interfaces() {
    let mut interp = Interpreter::new();
    let mut body = shapes();
    body.extend([
        expr(assign(name("total"), int(0))),
        for_each(
            Some(named("Shape")),
            "s",
            array(vec![
                new_object("Square", vec![int(3)]),
                new_object("Rect", vec![int(2), int(5)]),
            ]),
            expr(assign_op(
                AssignOp::AddAssign,
                name("total"),
                method(name("s"), "area", vec![]),
            )),
        ),
        expr(name("total")),
    ]);
    let v = run(&mut interp, body);
    assert!(v.same(&Value::int(19)));
}

#[test]
fn instanceof_follows_the_generated_hierarchy() {
    let mut interp = Interpreter::new();
    let mut body = shapes();
    body.push(expr(assign(name("r"), new_object("Rect", vec![int(1), int(1)]))));
    run(&mut interp, body);
    for (ty, expected) in [("Shape", true), ("Square", true), ("Rect", true), ("String", false)] {
        let v = run(&mut interp, vec![expr(instance_of(name("r"), named(ty)))]);
        assert!(v.same(&Value::boolean(expected)), "Rect instanceof {ty}");
    }
    let v = run(
        &mut interp,
        vec![expr(method(method(name("r"), "getClass", vec![]), "getName", vec![]))],
    );
    assert_eq!(text(&v), "Rect");
}

#[test]
fn interfaces_cannot_be_constructed() {
    let mut interp = Interpreter::new();
    let mut body = shapes();
    body.push(expr(new_object("Shape", vec![])));
    let err = interp.eval(&program(body)).unwrap_err();
    assert!(err.message().contains("Shape"));
}

#[test]
fn inner_classes_are_named_after_their_outer_class() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            class_stmt(class_decl(
                "Outer",
                None,
                &[],
                vec![Member::Class(class_decl(
                    "Inner",
                    None,
                    &[],
                    vec![method_member(method_decl(
                        "hello",
                        Modifiers::NONE,
                        ReturnType::Loose,
                        vec![],
                        Some(vec![ret(Some(string("inner")))]),
                    ))],
                ))],
            )),
            expr(method(new_object("Outer.Inner", vec![]), "hello", vec![])),
        ],
    );
    assert_eq!(text(&v), "inner");
    assert!(interp.registry().borrow().get("Outer$Inner").is_some());
}

#[test]
fn anonymous_subclasses_get_distinct_names() {
    let mut interp = Interpreter::new();
    let mut body = shapes();
    let anon = || {
        new_anonymous(
            "Square",
            vec![int(2)],
            vec![method_member(method_decl(
                "area",
                Modifiers::PUBLIC,
                ReturnType::Typed(int_type()),
                vec![],
                Some(vec![ret(Some(int(-1)))]),
            ))],
        )
    };
    body.extend([
        expr(assign(name("a"), anon())),
        expr(assign(name("b"), anon())),
    ]);
    run(&mut interp, body);
    let class_of = |interp: &mut Interpreter, var: &str| {
        let v = run(
            interp,
            vec![expr(method(method(name(var), "getClass", vec![]), "getName", vec![]))],
        );
        text(&v)
    };
    let a = class_of(&mut interp, "a");
    let b = class_of(&mut interp, "b");
    assert_ne!(a, b);
    assert!(a.starts_with("global$"));
    let v = run(&mut interp, vec![expr(method(name("a"), "area", vec![]))]);
    assert!(v.same(&Value::int(-1)));
    let v = run(&mut interp, vec![expr(field(name("b"), "side"))]);
    assert!(v.same(&Value::int(2)));
}

struct NoSubclassing(&'static str);

impl SecurityGuard for NoSubclassing {
    fn can_extend(&self, superclass: &ClassDef) -> bool {
        superclass.name != self.0
    }
}

#[test]
fn guards_can_veto_subclassing() {
    let mut interp = Interpreter::new();
    interp.add_guard(NoSubclassing("Square"));
    let err = interp.eval(&program(shapes())).unwrap_err();
    assert!(err.is_security());
    assert!(interp.registry().borrow().get("Rect").is_none());
}

#[test]
fn static_members_are_shared_across_instances() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            class_stmt(class_decl(
                "Counter",
                None,
                &[],
                vec![
                    field_member(Modifiers::STATIC, Some(int_type()), "made", Some(int(0))),
                    initializer(false, vec![expr(post_inc(name("made")))]),
                    method_member(method_decl(
                        "total",
                        Modifiers::STATIC,
                        ReturnType::Typed(int_type()),
                        vec![],
                        Some(vec![ret(Some(name("made")))]),
                    )),
                ],
            )),
            expr(new_object("Counter", vec![])),
            expr(new_object("Counter", vec![])),
            expr(call("Counter.total", vec![])),
        ],
    );
    assert!(v.same(&Value::int(2)));
}

#[test]
fn redefining_a_class_replaces_its_members() {
    let mut interp = Interpreter::new();
    let getter = |name: &str, body: beanscript::ast::Expression| {
        method_member(method_decl(
            name,
            Modifiers::NONE,
            ReturnType::Typed(int_type()),
            vec![],
            Some(vec![ret(Some(body))]),
        ))
    };
    run(
        &mut interp,
        vec![class_stmt(class_decl(
            "Pair",
            None,
            &[],
            vec![
                field_member(Modifiers::NONE, Some(int_type()), "a", None),
                constructor(vec![param("a")], vec![expr(assign(field(name("this"), "a"), name("a")))]),
                getter("first", name("a")),
            ],
        ))],
    );
    let v = run(
        &mut interp,
        vec![
            class_stmt(class_decl(
                "Pair",
                None,
                &[],
                vec![
                    field_member(Modifiers::NONE, Some(int_type()), "a", None),
                    field_member(Modifiers::NONE, Some(int_type()), "b", None),
                    constructor(
                        vec![param("a"), param("b")],
                        vec![
                            expr(assign(field(name("this"), "a"), name("a"))),
                            expr(assign(field(name("this"), "b"), name("b"))),
                        ],
                    ),
                    getter("sum", add(name("a"), name("b"))),
                ],
            )),
            expr(method(new_object("Pair", vec![int(2), int(5)]), "sum", vec![])),
        ],
    );
    assert!(v.same(&Value::int(7)));
    assert!(interp
        .eval(&program(vec![expr(new_object("Pair", vec![int(1)]))]))
        .is_err());
    assert!(interp
        .eval(&program(vec![expr(method(new_object("Pair", vec![int(1), int(2)]), "first", vec![]))]))
        .is_err());
}
