use beanscript::ast::build::*;
use beanscript::ast::{AssignOp, Modifiers, ReturnType, Statement};
use beanscript::{
    CallbackEmitter, ClassBuilder, ClassDef, ClassDescriptor, ClassEmitter, ClassRef, FaultKind,
    Interpreter, Primitive, SecurityGuard, UtilError, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

#[ctor::ctor]
fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .try_init();
}

fn run(interp: &mut Interpreter, body: Vec<Statement>) -> Value {
    interp.eval(&program(body)).unwrap()
}

fn int_of(value: &Value) -> i64 {
    value.as_primitive().and_then(Primitive::as_i64).unwrap()
}

fn counter_class() -> ClassBuilder {
    ClassBuilder::class("demo.Counter")
        .field("count", "int", Modifiers::PUBLIC)
        .constructor(&["int"], |_interp, this, args| {
            this.set_field("count", args[0].clone());
            Ok(())
        })
        .method("bump", &[], |interp, this, _args| {
            let Some(obj) = this.as_object() else {
                return Err(interp.core().throw("java.lang.NullPointerException", "bump"));
            };
            let next = obj
                .field("count")
                .and_then(|v| v.as_primitive())
                .and_then(Primitive::as_i64)
                .unwrap_or(0)
                + 1;
            let next = Value::int(next as i32);
            obj.set_field("count", next.clone());
            Ok(next)
        })
        .static_method("check", &["int"], |interp, _this, args| {
            match args[0].as_primitive().and_then(Primitive::as_i64) {
                Some(n) if n >= 0 => Ok(Value::boolean(true)),
                _ => Err(interp
                    .core()
                    .throw("java.lang.IllegalArgumentException", "negative")),
            }
        })
}

#[test]
fn native_classes_are_constructed_and_called_from_scripts() {
    let mut interp = Interpreter::new();
    interp.register_class(counter_class());
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("c"), new_object("demo.Counter", vec![int(5)]))),
            expr(method(name("c"), "bump", vec![])),
            expr(method(name("c"), "bump", vec![])),
            expr(field(name("c"), "count")),
        ],
    );
    assert_eq!(int_of(&v), 7);
    let c = interp.get("c").unwrap().unwrap();
    assert_eq!(c.as_object().unwrap().class().name, "demo.Counter");
}

#[test]
fn native_exceptions_surface_as_target_faults() {
    let mut interp = Interpreter::new();
    interp.register_class(counter_class());
    let err = interp
        .eval(&program(vec![expr(call("demo.Counter.check", vec![int(-1)]))]))
        .unwrap_err();
    match err.kind() {
        FaultKind::Target(thrown) => {
            assert!(thrown.native);
            assert_eq!(thrown.class_name(), "java.lang.IllegalArgumentException");
        }
        other => panic!("expected a target fault, got {other:?}"),
    }
    assert!(err.render().contains("native code"));

    let v = run(
        &mut interp,
        vec![
            expr(assign(name("caught"), string(""))),
            try_catch(
                vec![expr(call("demo.Counter.check", vec![int(-2)]))],
                vec![catch(
                    &["RuntimeException"],
                    "e",
                    vec![expr(assign(name("caught"), method(name("e"), "getMessage", vec![])))],
                )],
                None,
            ),
            expr(name("caught")),
        ],
    );
    assert_eq!(v.as_object().and_then(|o| o.string_value()).as_deref(), Some("negative"));
}

#[test]
fn lambdas_satisfy_native_functional_parameters() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("list"), new_object("ArrayList", vec![]))),
            expr(method(name("list"), "add", vec![int(1)])),
            expr(method(name("list"), "add", vec![int(2)])),
            expr(method(name("list"), "add", vec![int(3)])),
            expr(assign(name("sum"), int(0))),
            expr(method(
                name("list"),
                "forEach",
                vec![lambda(&["x"], assign_op(AssignOp::AddAssign, name("sum"), name("x")))],
            )),
            expr(name("sum")),
        ],
    );
    assert_eq!(int_of(&v), 6);
}

#[test]
fn host_values_flow_into_script_methods() {
    let mut interp = Interpreter::new();
    interp.register_class(counter_class());
    interp
        .eval(&program(vec![method_stmt(method_decl(
            "bumpTwice",
            Modifiers::NONE,
            ReturnType::Loose,
            vec![param("c")],
            Some(vec![
                expr(method(name("c"), "bump", vec![])),
                ret(Some(method(name("c"), "bump", vec![]))),
            ]),
        ))]))
        .unwrap();
    let counter = run(&mut interp, vec![expr(new_object("demo.Counter", vec![int(40)]))]);
    let v = interp.invoke_method("bumpTwice", vec![counter]).unwrap();
    assert_eq!(int_of(&v), 42);
    assert!(interp.invoke_method("missing", vec![]).is_err());
}

struct Recording {
    emitted: Rc<RefCell<Vec<String>>>,
}

impl ClassEmitter for Recording {
    fn emit(&self, descriptor: &ClassDescriptor) -> Result<ClassRef, UtilError> {
        self.emitted.borrow_mut().push(format!(
            "{}:{}",
            descriptor.name,
            descriptor.methods.len()
        ));
        CallbackEmitter.emit(descriptor)
    }
}

#[test]
fn custom_emitters_see_every_generated_class() {
    let mut interp = Interpreter::new();
    let emitted = Rc::new(RefCell::new(Vec::new()));
    interp.set_emitter(Recording {
        emitted: emitted.clone(),
    });
    let v = run(
        &mut interp,
        vec![
            class_stmt(class_decl(
                "Greeter",
                None,
                &[],
                vec![method_member(method_decl(
                    "greet",
                    Modifiers::NONE,
                    ReturnType::Loose,
                    vec![param("who")],
                    Some(vec![ret(Some(add(string("hello "), name("who"))))]),
                ))],
            )),
            expr(method(new_object("Greeter", vec![]), "greet", vec![string("ada")])),
        ],
    );
    assert_eq!(v.as_object().and_then(|o| o.string_value()).as_deref(), Some("hello ada"));
    assert_eq!(*emitted.borrow(), vec!["Greeter:1".to_string()]);
}

struct DenyConstruct(&'static str);

impl SecurityGuard for DenyConstruct {
    fn can_construct(&self, class: &ClassDef, _args: &[Value]) -> bool {
        class.name != self.0
    }
}

#[test]
fn guards_veto_construction() {
    let mut interp = Interpreter::new();
    interp.register_class(counter_class());
    interp.add_guard(DenyConstruct("demo.Counter"));
    let err = interp
        .eval(&program(vec![expr(new_object("demo.Counter", vec![int(1)]))]))
        .unwrap_err();
    assert!(err.is_security());
    let v = run(&mut interp, vec![expr(new_object("ArrayList", vec![]))]);
    assert!(v.as_object().is_some());
}

#[test]
fn maps_can_hold_themselves_as_keys() {
    let mut interp = Interpreter::new();
    let v = run(
        &mut interp,
        vec![
            expr(assign(name("m"), new_object("HashMap", vec![]))),
            expr(method(name("m"), "put", vec![string("a"), int(1)])),
            expr(assign(index(name("m"), name("m")), int(2))),
            expr(method(name("m"), "put", vec![name("m"), int(3)])),
            expr(method(name("m"), "get", vec![name("m")])),
        ],
    );
    assert_eq!(int_of(&v), 3);
    let v = run(&mut interp, vec![expr(method(name("m"), "size", vec![]))]);
    assert_eq!(int_of(&v), 2);
    let v = run(&mut interp, vec![expr(method(name("m"), "containsKey", vec![name("m")]))]);
    assert!(v.same(&Value::boolean(true)));
    let v = run(&mut interp, vec![expr(method(name("m"), "remove", vec![name("m")]))]);
    assert_eq!(int_of(&v), 3);
    let v = run(&mut interp, vec![expr(index(name("m"), string("a")))]);
    assert_eq!(int_of(&v), 1);
}
