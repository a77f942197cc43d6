use crate::ast::*;
use crate::config::Config;
use crate::types::{Primitive, PrimitiveType, Type, Value, primitive_ops};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::{OnceCell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

mod types;
pub use types::*;

mod helpers;
pub(crate) use helpers::*;
mod error;
pub use error::*;
mod callstack;
pub use callstack::*;
mod object;
pub use object::*;
mod class;
pub use class::*;
mod registry;
pub use registry::*;
mod namespace;
pub use namespace::*;
mod security;
pub use security::*;
mod monitor;
use monitor::Monitors;
mod emit;
pub use emit::*;
mod lhs;
pub(crate) use lhs::*;
mod name;
pub(crate) use name::*;
mod reflect;
pub(crate) use reflect::*;
mod methods;
pub(crate) use methods::enclosing_instance;
mod eval;
mod exec;
mod arrays;
mod iteration;
pub(crate) use iteration::ValueIter;
mod classgen;
mod builtins;
pub use builtins::CoreClasses;

pub struct Interpreter {
    global: NsRef,
    registry: RegistryRef,
    core: Rc<CoreClasses>,
    config: Config,
    interrupted: Arc<AtomicBool>,
    guards: Guards,
    emitter: Rc<dyn ClassEmitter>,
    monitors: Monitors,
    /// String literals share one object per distinct text.
    interned: FxHashMap<String, ObjectRef>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `obj` answers `toString()` from script code rather than natively.
fn scripted_to_string(obj: &ObjectRef) -> bool {
    match &*obj.data() {
        ObjectData::This(ns) | ObjectData::Proxy(ns) => {
            !ns.borrow().local_methods("toString").is_empty()
        }
        _ => {
            let mut current = Some(obj.class().clone());
            while let Some(class) = current {
                if class.is_generated() && class.declares_method("toString") {
                    return true;
                }
                current = class.superclass.clone();
            }
            false
        }
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let registry: RegistryRef = Rc::new(RefCell::new(ClassRegistry::new()));
        let core = builtins::install(&registry);
        let global = Namespace::new("global", ScopeKind::Global, None, core.clone());
        for package in &config.default_imports {
            Namespace::import_package(&global, package);
        }
        debug!(
            "interpreter ready: {} classes, strict={}",
            registry.borrow().len(),
            config.strict_java
        );
        Interpreter {
            global,
            registry,
            core,
            config,
            interrupted: Arc::new(AtomicBool::new(false)),
            guards: Guards::default(),
            emitter: Rc::new(CallbackEmitter),
            monitors: Monitors::default(),
            interned: FxHashMap::default(),
        }
    }

    /// Runs a program in the global scope. The value is that of an explicit top-level
    /// `return`, or else of the last statement.
    pub fn eval(&mut self, program: &Program) -> Result<Value, EvalError> {
        let mut cs = CallStack::with_file(self.global.clone(), program.file.clone());
        match self.exec_statements(&program.body, &mut cs)? {
            Completion::Normal(v) | Completion::Return(v) => Ok(v),
            Completion::Break(_) | Completion::Continue(_) => Ok(Value::Void),
        }
    }

    pub fn eval_expression(&mut self, expr: &Expression) -> Result<Value, EvalError> {
        let mut cs = CallStack::new(self.global.clone());
        self.eval_expr(expr, &mut cs)
    }

    /// Binds a loosely typed global variable.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), EvalError> {
        let cs = CallStack::new(self.global.clone());
        Namespace::set_local_variable(&self.global, name, value.into(), false).at(&cs)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Option<Value>, EvalError> {
        let cs = CallStack::new(self.global.clone());
        self.global.borrow().get_value(name, false).at(&cs)
    }

    /// Calls a global script method (or a statically imported one).
    pub fn invoke_method(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let mut cs = CallStack::new(self.global.clone());
        self.invoke_unqualified(name, args, &mut cs)
    }

    pub fn register_class(&mut self, builder: ClassBuilder) -> ClassRef {
        let class = builder.build();
        debug!("register class {}", class.name);
        self.registry.borrow_mut().register(class)
    }

    pub fn add_guard(&mut self, guard: impl SecurityGuard + 'static) {
        self.guards.add(Rc::new(guard));
    }

    /// Replaces the backend that turns script class bodies into classes.
    pub fn set_emitter(&mut self, emitter: impl ClassEmitter + 'static) {
        self.emitter = Rc::new(emitter);
    }

    /// Flag another thread may raise to stop running loops.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn clear_interrupt(&self) {
        self.interrupted.store(false, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Forgets generated classes and idle monitors. Generated classes keep their static
    /// scopes alive until this runs.
    pub fn teardown(&mut self) {
        debug!("teardown");
        self.registry.borrow_mut().clear_generated();
        self.monitors.prune();
        self.interned.clear();
    }

    pub fn global_namespace(&self) -> NsRef {
        self.global.clone()
    }

    pub fn core(&self) -> Rc<CoreClasses> {
        self.core.clone()
    }

    pub fn registry(&self) -> RegistryRef {
        self.registry.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn intern(&mut self, text: &str) -> Value {
        if let Some(existing) = self.interned.get(text) {
            return Value::Object(existing.clone());
        }
        let value = self.core.string(text);
        if let Value::Object(obj) = &value {
            self.interned.insert(text.to_string(), obj.clone());
        }
        value
    }

    /// String form of a value, dispatching to a script-defined `toString()` when present.
    pub(crate) fn stringify_value(&mut self, value: &Value) -> UtilResult<String> {
        let Value::Object(obj) = value else {
            return Ok(value_to_string(value));
        };
        if !scripted_to_string(obj) {
            return Ok(value_to_string(value));
        }
        let mut cs = CallStack::new(self.global.clone());
        let text = self.invoke_on_value(value, "toString", Vec::new(), &mut cs)?;
        Ok(value_to_string(&text))
    }

    /// Calls `method` on a functional value from native code: lambdas, scripted objects
    /// and host objects alike.
    pub(crate) fn call_functional(&mut self, f: &Value, method: &str, args: Vec<Value>) -> UtilResult<Value> {
        let mut cs = CallStack::new(self.global.clone());
        Ok(self.invoke_on_value(f, method, args, &mut cs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;

    #[test]
    fn host_bindings_round_trip_through_globals() {
        let mut interp = Interpreter::new();
        interp.set("n", 41).unwrap();
        let v = interp
            .eval(&program(vec![expr(assign_op(AssignOp::AddAssign, name("n"), int(1)))]))
            .unwrap();
        assert!(v.same(&Value::int(42)));
        assert!(interp.get("n").unwrap().unwrap().same(&Value::int(42)));
        assert!(interp.get("missing").unwrap().is_none());
    }

    #[test]
    fn string_literals_are_interned() {
        let mut interp = Interpreter::new();
        let a = interp.intern("same");
        let b = interp.intern("same");
        let (Value::Object(a), Value::Object(b)) = (a, b) else {
            panic!("strings are objects");
        };
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn global_methods_can_be_invoked_from_the_host() {
        let mut interp = Interpreter::new();
        interp
            .eval(&program(vec![function(
                "twice",
                &["x"],
                vec![ret(Some(binary(BinaryOp::Mul, name("x"), int(2))))],
            )]))
            .unwrap();
        let v = interp.invoke_method("twice", vec![Value::int(21)]).unwrap();
        assert!(v.same(&Value::int(42)));
    }

    #[test]
    fn scripted_to_string_is_used_for_concatenation() {
        let mut interp = Interpreter::new();
        let v = interp
            .eval(&program(vec![
                function(
                    "make",
                    &[],
                    vec![
                        function("toString", &[], vec![ret(Some(string("made")))]),
                        ret(Some(name("this"))),
                    ],
                ),
                expr(add(string("it was "), call("make", vec![]))),
            ]))
            .unwrap();
        assert_eq!(value_to_string(&v), "it was made");
    }

    #[test]
    fn interrupt_handle_is_shared() {
        let interp = Interpreter::new();
        let handle = interp.interrupt_handle();
        handle.store(true, Ordering::SeqCst);
        assert!(interp.is_interrupted());
        interp.clear_interrupt();
        assert!(!handle.load(Ordering::SeqCst));
    }

    #[test]
    fn teardown_forgets_generated_classes() {
        let mut interp = Interpreter::new();
        interp
            .eval(&program(vec![class_stmt(class_decl("Temp", None, &[], vec![]))]))
            .unwrap();
        assert!(interp.registry().borrow().generated("Temp").is_some());
        interp.teardown();
        assert!(interp.registry().borrow().get("Temp").is_none());
    }
}
