use super::*;
use log::{debug, trace};
use std::sync::atomic::AtomicUsize;

/// Suffix source for anonymous class names, shared by every interpreter in the process.
static ANONYMOUS_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A class declaration with its names and supertypes already resolved.
struct ClassShape {
    name: String,
    kind: ClassKind,
    modifiers: Modifiers,
    superclass: Option<ClassRef>,
    interfaces: Vec<ClassRef>,
    body: Rc<ClassBody>,
    anonymous: bool,
}

fn class_body(class: &ClassDef) -> Option<Rc<ClassBody>> {
    class.generated.as_ref().map(|info| info.body.borrow().clone())
}

fn is_static_field(decl: &VariableDeclaration, interface: bool) -> bool {
    interface || decl.modifiers.is_static()
}

impl Interpreter {
    /// Evaluates a class or interface declaration and declares it in the current scope.
    pub(crate) fn define_class(&mut self, decl: &Rc<ClassDecl>, cs: &mut CallStack) -> EvalResult<ClassRef> {
        let top = cs.top();
        let enclosing = top.borrow().enclosing_class().map(|c| c.name.clone());
        self.define_class_in(decl, enclosing, cs)
    }

    fn define_class_in(
        &mut self,
        decl: &Rc<ClassDecl>,
        enclosing: Option<String>,
        cs: &mut CallStack,
    ) -> EvalResult<ClassRef> {
        let package = cs.top().borrow().package();
        let name = match (enclosing, package) {
            (Some(outer), _) => format!("{outer}${}", decl.name),
            (None, Some(package)) => format!("{package}.{}", decl.name),
            (None, None) => decl.name.clone(),
        };
        let ns = cs.top();
        let superclass = match &decl.extends {
            Some(node) => {
                let class = self.resolve_class_node(node, &ns, cs)?;
                if class.is_interface() {
                    return Err(EvalError::eval(
                        format!("Class {name} cannot extend interface {}", class.name),
                        cs,
                    ));
                }
                self.guards.extend(&class).at(cs)?;
                Some(class)
            }
            None if decl.kind == ClassKind::Class => Some(self.core.object.clone()),
            None => None,
        };
        let mut interfaces = Vec::with_capacity(decl.implements.len());
        for node in &decl.implements {
            let iface = self.resolve_class_node(node, &ns, cs)?;
            if !iface.is_interface() {
                return Err(EvalError::eval(
                    format!("{} is not an interface", iface.name),
                    cs,
                ));
            }
            self.guards.implement(&iface).at(cs)?;
            interfaces.push(iface);
        }
        debug!("define class {name}");
        self.generate_class(
            ClassShape {
                name,
                kind: decl.kind,
                modifiers: decl.modifiers,
                superclass,
                interfaces,
                body: decl.body.clone(),
                anonymous: false,
            },
            cs,
        )
    }

    fn resolve_class_node(&self, node: &TypeNode, ns: &NsRef, cs: &CallStack) -> EvalResult<ClassRef> {
        match self.resolve_type(node, ns).at(cs)? {
            Type::Class(class) => Ok(class),
            other => Err(EvalError::eval(format!("Not a class type: {other}"), cs)),
        }
    }

    fn generate_class(&mut self, shape: ClassShape, cs: &mut CallStack) -> EvalResult<ClassRef> {
        if !self.registry.borrow_mut().start_defining(&shape.name) {
            return Err(EvalError::eval(
                format!("Recursive class definition: {}", shape.name),
                cs,
            ));
        }
        let name = shape.name.clone();
        let enclosing = cs.top();
        let simple = name.rsplit(['.', '$']).next().unwrap_or(&name).to_string();
        let static_ns = Namespace::child(&enclosing, &simple, ScopeKind::Class);
        let previous = cs.swap(static_ns.clone());
        let result = self.build_class(shape, &static_ns, &enclosing, cs);
        cs.swap(previous);
        self.registry.borrow_mut().end_defining(&name);
        result
    }

    fn param_desc(&self, param: &Param, ns: &NsRef) -> TypeDesc {
        let desc = match &param.ty {
            Some(node) => self.type_desc(node, ns),
            None => TypeDesc::object(),
        };
        match param.varargs {
            true => TypeDesc::Array(Box::new(desc)),
            false => desc,
        }
    }

    fn method_descriptor(&self, name: &str, decl: &Rc<MethodDecl>, body: Option<Rc<ScriptMethod>>, ns: &NsRef) -> MethodDescriptor {
        MethodDescriptor {
            name: name.to_string(),
            modifiers: decl.modifiers,
            returns: match &decl.return_type {
                ReturnType::Typed(node) => Some(self.type_desc(node, ns)),
                ReturnType::Loose | ReturnType::Void => None,
            },
            params: decl.params.iter().map(|p| self.param_desc(p, ns)).collect(),
            varargs: decl.params.last().is_some_and(|p| p.varargs),
            body,
        }
    }

    /// Runs with `static_ns` swapped onto the stack.
    fn build_class(
        &mut self,
        shape: ClassShape,
        static_ns: &NsRef,
        enclosing: &NsRef,
        cs: &mut CallStack,
    ) -> EvalResult<ClassRef> {
        let interface = shape.kind == ClassKind::Interface;
        for member in &shape.body.members {
            if let Member::Class(inner) = member {
                self.define_class_in(inner, Some(shape.name.clone()), cs)?;
            }
        }

        // member types stay descriptors; they may name classes still being defined
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut constructors = Vec::new();
        for member in &shape.body.members {
            match member {
                Member::Field(decl) => {
                    let modifiers = match interface {
                        true => decl
                            .modifiers
                            .with(Modifiers::PUBLIC.with(Modifiers::STATIC).with(Modifiers::FINAL)),
                        false => decl.modifiers,
                    };
                    for d in &decl.declarators {
                        let ty = match &decl.ty {
                            Some(node) => self.type_desc(&node.clone().with_dimensions(d.dims), static_ns),
                            None => TypeDesc::object(),
                        };
                        fields.push(FieldDescriptor {
                            name: d.name.clone(),
                            ty,
                            modifiers,
                        });
                    }
                }
                Member::Method(decl) => {
                    let method = ScriptMethod::new(&decl.name, decl.clone(), static_ns);
                    Namespace::set_method(static_ns, method.clone());
                    let body = decl.body.as_ref().map(|_| method);
                    let mut descriptor = self.method_descriptor(&decl.name, decl, body, static_ns);
                    if decl.body.is_none() {
                        descriptor.modifiers = descriptor.modifiers.with(Modifiers::ABSTRACT);
                    }
                    if interface {
                        descriptor.modifiers = descriptor.modifiers.with(Modifiers::PUBLIC);
                    }
                    methods.push(descriptor);
                }
                Member::Constructor(decl) => {
                    if interface {
                        return Err(EvalError::eval(
                            format!("Interface {} cannot declare a constructor", shape.name),
                            cs,
                        ));
                    }
                    let simple = shape.name.rsplit(['.', '$']).next().unwrap_or(&shape.name);
                    let method = ScriptMethod::new(simple, decl.clone(), static_ns);
                    constructors.push(self.method_descriptor(simple, decl, Some(method), static_ns));
                }
                Member::Initializer { .. } | Member::Class(_) => {}
            }
        }

        if self.registry.borrow().generated(&shape.name).is_some() {
            debug!("redefining generated class {}", shape.name);
        }
        // a redefinition replaces the registered class; existing instances keep the old one
        let descriptor = ClassDescriptor {
            name: shape.name.clone(),
            kind: shape.kind,
            modifiers: shape.modifiers,
            superclass: shape.superclass,
            interfaces: shape.interfaces,
            fields,
            methods,
            constructors,
            anonymous: shape.anonymous,
            static_ns: static_ns.clone(),
            body: shape.body.clone(),
        };
        let class = self.emitter.emit(&descriptor).at(cs)?;
        let class = self.registry.borrow_mut().register(class);
        static_ns.borrow_mut().class = Some(class.clone());
        if !shape.anonymous {
            Namespace::declare_class(enclosing, class.simple_name(), class.clone());
        }
        self.run_initializers(&shape.body, true, interface, cs)?;
        Ok(class)
    }

    /// Field initializers and initializer blocks of one kind, in source order, declared
    /// into the scope on top of the stack.
    fn run_initializers(&mut self, body: &ClassBody, statics: bool, interface: bool, cs: &mut CallStack) -> EvalResult<()> {
        for member in &body.members {
            match member {
                Member::Field(decl) if is_static_field(decl, interface) == statics => {
                    if interface {
                        let constant = VariableDeclaration {
                            modifiers: decl.modifiers.with(Modifiers::STATIC).with(Modifiers::FINAL),
                            ..decl.clone()
                        };
                        self.exec_variable(&constant, cs)?;
                    } else {
                        self.exec_variable(decl, cs)?;
                    }
                }
                Member::Initializer { is_static, block } if *is_static == statics => {
                    self.exec_block(block, cs)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Allocates an instance of a generated class: one instance scope per generated class
    /// in the hierarchy, then the constructor chain.
    pub(crate) fn construct_generated(&mut self, class: &ClassRef, args: Vec<Value>, cs: &mut CallStack) -> EvalResult<Value> {
        let obj = ObjectRef::new(class.clone(), ObjectData::for_storage(class.storage));
        self.init_native_fields(&obj);
        let mut chain = Vec::new();
        let mut current = Some(class.clone());
        while let Some(c) = current {
            current = c.superclass.clone();
            if c.is_generated() {
                chain.push(c);
            }
        }
        for c in chain.iter().rev() {
            let (Some(static_ns), Some(body)) = (c.static_namespace(), class_body(c)) else {
                return Err(EvalError::eval(
                    format!("Class {} is no longer defined", c.name),
                    cs,
                ));
            };
            let ns = Namespace::child(&static_ns, c.simple_name(), ScopeKind::Instance);
            {
                let mut n = ns.borrow_mut();
                n.class = Some(c.clone());
                n.instance = Some(obj.downgrade());
            }
            for member in &body.members {
                let Member::Field(decl) = member else { continue };
                if is_static_field(decl, c.is_interface()) {
                    continue;
                }
                let base = match &decl.ty {
                    Some(node) => Some(self.resolve_type(node, &static_ns).at(cs)?),
                    None => None,
                };
                for d in &decl.declarators {
                    let ty = base.clone().map(|t| t.with_dimensions(d.dims));
                    Namespace::set_typed_variable(&ns, &d.name, ty, None, decl.modifiers).at(cs)?;
                }
            }
            obj.add_callback(c.clone(), ns);
        }
        trace!("constructing {}", class.name);
        self.run_constructor(class, &obj, args, cs)?;
        Ok(Value::Object(obj))
    }

    fn run_constructor(&mut self, class: &ClassRef, obj: &ObjectRef, args: Vec<Value>, cs: &mut CallStack) -> EvalResult<()> {
        let Some(instance_ns) = obj.callback_for(class) else {
            return Err(EvalError::eval(
                format!("No instance scope for {}", class.name),
                cs,
            ));
        };
        let constructors: Vec<Rc<ScriptMethod>> = class
            .constructors
            .iter()
            .filter_map(|c| match &c.body {
                ConstructorBody::Script(sm) => Some(sm.clone()),
                ConstructorBody::Native(_) => None,
            })
            .collect();
        if constructors.is_empty() {
            // anonymous classes hand their arguments to the superclass
            if !args.is_empty() && !class.is_anonymous() {
                return Err(UtilError::NoSuchMember(format!(
                    "Constructor {}({}) not found",
                    class.name,
                    arg_types_string(&args)
                )))
                .at(cs);
            }
            self.init_super(class, obj, args, cs)?;
            return self.init_instance(class, &instance_ns, cs);
        }
        let candidates = constructors
            .iter()
            .map(|c| self.script_candidate(c))
            .collect::<UtilResult<Vec<_>>>()
            .at(cs)?;
        let Some(index) = select_overload(&class.name, &candidates, &args, &self.core).at(cs)? else {
            return Err(UtilError::NoSuchMember(format!(
                "Constructor {}({}) not found",
                class.name,
                arg_types_string(&args)
            )))
            .at(cs);
        };
        let args = convert_arguments(&candidates[index], args, &self.core).at(cs)?;
        let constructor = &constructors[index];
        self.check_depth(&constructor.name, cs)?;
        let ns = Namespace::child(&instance_ns, &constructor.name, ScopeKind::Method);
        self.bind_params(constructor, &ns, args, cs)?;
        cs.push(ns);
        cs.set_span(&constructor.decl.span);
        let result = self.run_constructor_body(class, obj, &instance_ns, constructor, cs);
        cs.pop();
        result
    }

    fn run_constructor_body(
        &mut self,
        class: &ClassRef,
        obj: &ObjectRef,
        instance_ns: &NsRef,
        constructor: &ScriptMethod,
        cs: &mut CallStack,
    ) -> EvalResult<()> {
        let Some(body) = &constructor.decl.body else {
            return Err(EvalError::eval(
                format!("Constructor of {} has no body", class.name),
                cs,
            ));
        };
        let explicit = match body.body.first().map(|s| &s.kind) {
            Some(StatementKind::Expression(e)) => e.constructor_call(),
            _ => None,
        };
        let rest = match explicit {
            Some(("this", args)) => {
                let args = self.eval_args(args, cs)?;
                self.run_constructor(class, obj, args, cs)?;
                &body.body[1..]
            }
            Some((_, args)) => {
                let args = self.eval_args(args, cs)?;
                self.init_super(class, obj, args, cs)?;
                self.init_instance(class, instance_ns, cs)?;
                &body.body[1..]
            }
            None => {
                self.init_super(class, obj, Vec::new(), cs)?;
                self.init_instance(class, instance_ns, cs)?;
                &body.body[..]
            }
        };
        let completion = self
            .exec_statements(rest, cs)
            .map_err(|e| e.prepend(&format!("Constructor of {}: ", class.name)))?;
        match completion {
            Completion::Return(value) if !value.is_void() => Err(EvalError::eval(
                format!("Cannot return value from constructor of {}", class.name),
                cs,
            )),
            _ => Ok(()),
        }
    }

    fn init_super(&mut self, class: &ClassRef, obj: &ObjectRef, args: Vec<Value>, cs: &mut CallStack) -> EvalResult<()> {
        let Some(superclass) = class.superclass.clone() else {
            return Ok(());
        };
        if superclass.is_generated() {
            self.run_constructor(&superclass, obj, args, cs)
        } else {
            self.run_native_constructor(&superclass, obj, args, cs)
        }
    }

    fn init_instance(&mut self, class: &ClassRef, instance_ns: &NsRef, cs: &mut CallStack) -> EvalResult<()> {
        let Some(body) = class_body(class) else {
            return Ok(());
        };
        let previous = cs.swap(instance_ns.clone());
        let result = self.run_initializers(&body, false, class.is_interface(), cs);
        cs.swap(previous);
        result
    }

    fn anonymous_name(&self, cs: &CallStack) -> String {
        let n = ANONYMOUS_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        let top = cs.top();
        let outer = top.borrow().enclosing_class().map(|c| c.name.clone());
        let outer = outer.unwrap_or_else(|| Namespace::non_block(&top).borrow().name().to_string());
        format!("{outer}${n}")
    }

    /// `new Base(args) { body }` for a class `Base`.
    pub(crate) fn anonymous_subclass(
        &mut self,
        class: &ClassRef,
        body: &Rc<ClassBody>,
        args: Vec<Value>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        self.guards.extend(class).at(cs)?;
        if body.members.iter().any(|m| matches!(m, Member::Constructor(_))) {
            return Err(EvalError::eval(
                format!("Anonymous subclass of {} cannot declare a constructor", class.name),
                cs,
            ));
        }
        let name = self.anonymous_name(cs);
        debug!("anonymous subclass {name} of {}", class.name);
        let generated = self.generate_class(
            ClassShape {
                name,
                kind: ClassKind::Class,
                modifiers: Modifiers::NONE,
                superclass: Some(class.clone()),
                interfaces: Vec::new(),
                body: body.clone(),
                anonymous: true,
            },
            cs,
        )?;
        self.construct(&generated, args, cs)
    }

    /// `new Iface() { body }`: the body runs in a throwaway scope that then backs a proxy.
    pub(crate) fn anonymous_interface(&mut self, iface: &ClassRef, body: &Rc<ClassBody>, cs: &mut CallStack) -> EvalResult<Value> {
        self.guards.implement(iface).at(cs)?;
        let name = self.anonymous_name(cs);
        debug!("anonymous implementation {name} of {}", iface.name);
        let ns = Namespace::child(&cs.top(), &name, ScopeKind::Anonymous);
        Namespace::import_static(&ns, StaticImport::Class(iface.clone()));
        let previous = cs.swap(ns.clone());
        let result = self.eval_anonymous_body(iface, body, &ns, cs);
        cs.swap(previous);
        result?;
        let obj = ObjectRef::new(iface.clone(), ObjectData::Proxy(ns.clone()));
        ns.borrow_mut().instance = Some(obj.downgrade());
        Ok(Value::Object(obj))
    }

    fn eval_anonymous_body(&mut self, iface: &ClassRef, body: &ClassBody, ns: &NsRef, cs: &mut CallStack) -> EvalResult<()> {
        for member in &body.members {
            match member {
                Member::Field(decl) => self.exec_variable(decl, cs)?,
                Member::Method(decl) => {
                    Namespace::set_method(ns, ScriptMethod::new(&decl.name, decl.clone(), ns));
                }
                Member::Initializer { block, .. } => {
                    self.exec_block(block, cs)?;
                }
                Member::Class(inner) => {
                    self.define_class(inner, cs)?;
                }
                Member::Constructor(_) => {
                    return Err(EvalError::eval(
                        format!("Anonymous implementation of {} cannot declare a constructor", iface.name),
                        cs,
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;

    fn run(interp: &mut Interpreter, body: Vec<Statement>) -> Result<Value, EvalError> {
        interp.eval(&program(body))
    }

    fn point_class() -> Statement {
        class_stmt(class_decl(
            "Point",
            None,
            &[],
            vec![
                field_member(Modifiers::NONE, Some(int_type()), "x", None),
                field_member(Modifiers::NONE, Some(int_type()), "y", Some(int(7))),
                field_member(Modifiers::STATIC, Some(int_type()), "count", Some(int(0))),
                constructor(
                    vec![param("x")],
                    vec![
                        expr(assign(field(name("this"), "x"), name("x"))),
                        expr(post_inc(name("count"))),
                    ],
                ),
                constructor(vec![], vec![expr(call("this", vec![int(1)]))]),
                method_member(method_decl(
                    "sum",
                    Modifiers::PUBLIC,
                    ReturnType::Typed(int_type()),
                    vec![],
                    Some(vec![ret(Some(add(name("x"), name("y"))))]),
                )),
            ],
        ))
    }

    #[test]
    fn fields_constructors_and_methods() {
        let mut interp = Interpreter::new();
        let v = run(
            &mut interp,
            vec![
                point_class(),
                var(named("Point"), "p", Some(new_object("Point", vec![int(3)]))),
                expr(method(name("p"), "sum", vec![])),
            ],
        )
        .unwrap();
        assert!(v.same(&Value::int(10)));
    }

    #[test]
    fn this_delegation_and_static_state() {
        let mut interp = Interpreter::new();
        let v = run(
            &mut interp,
            vec![
                point_class(),
                expr(new_object("Point", vec![])),
                var(named("Point"), "q", Some(new_object("Point", vec![]))),
                expr(add(field(name("q"), "x"), field(name("Point"), "count"))),
            ],
        )
        .unwrap();
        assert!(v.same(&Value::int(3)));
    }

    #[test]
    fn subclasses_chain_constructors_and_override() {
        let mut interp = Interpreter::new();
        let base = class_decl(
            "Base",
            None,
            &[],
            vec![
                field_member(Modifiers::NONE, None, "log", Some(string(""))),
                constructor(
                    vec![param("tag")],
                    vec![expr(assign_op(AssignOp::AddAssign, name("log"), name("tag")))],
                ),
                method_member(method_decl(
                    "name",
                    Modifiers::NONE,
                    ReturnType::Loose,
                    vec![],
                    Some(vec![ret(Some(string("base")))]),
                )),
                method_member(method_decl(
                    "describe",
                    Modifiers::NONE,
                    ReturnType::Loose,
                    vec![],
                    Some(vec![ret(Some(add(name("log"), call("name", vec![]))))]),
                )),
            ],
        );
        let derived = class_decl(
            "Derived",
            Some("Base"),
            &[],
            vec![
                constructor(vec![], vec![expr(call("super", vec![string("d:")]))]),
                method_member(method_decl(
                    "name",
                    Modifiers::NONE,
                    ReturnType::Loose,
                    vec![],
                    Some(vec![ret(Some(add(string("derived/"), call("super.name", vec![]))))]),
                )),
            ],
        );
        let v = run(
            &mut interp,
            vec![
                class_stmt(base),
                class_stmt(derived),
                expr(method(new_object("Derived", vec![]), "describe", vec![])),
            ],
        )
        .unwrap();
        assert_eq!(value_to_string(&v), "d:derived/base");
    }

    #[test]
    fn nested_classes_are_qualified_by_their_outer_class() {
        let mut interp = Interpreter::new();
        let inner = class_decl("Inner", None, &[], vec![]);
        let outer = class_decl("Outer", None, &[], vec![Member::Class(inner)]);
        run(&mut interp, vec![class_stmt(outer)]).unwrap();
        assert!(interp.registry().borrow().get("Outer$Inner").is_some());
    }

    #[test]
    fn anonymous_subclasses_get_distinct_names() {
        let mut interp = Interpreter::new();
        run(
            &mut interp,
            vec![
                class_stmt(class_decl("Shape", None, &[], vec![])),
                var(named("Shape"), "a", Some(new_anonymous("Shape", vec![], vec![]))),
                var(named("Shape"), "b", Some(new_anonymous("Shape", vec![], vec![]))),
            ],
        )
        .unwrap();
        let names: Vec<String> = ["a", "b"]
            .iter()
            .map(|n| match interp.get(n).unwrap() {
                Some(Value::Object(o)) => o.class().name.clone(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_ne!(names[0], names[1]);
        assert!(names.iter().all(|n| n.starts_with("global$")));
    }

    #[test]
    fn anonymous_interface_bodies_see_constants_and_locals() {
        let mut interp = Interpreter::new();
        let iface = interface_decl(
            "Greeter",
            &[],
            vec![
                field_member(Modifiers::NONE, Some(named("String")), "PREFIX", Some(string("hi "))),
                method_member(method_decl(
                    "greet",
                    Modifiers::NONE,
                    ReturnType::Typed(named("String")),
                    vec![param("who")],
                    None,
                )),
            ],
        );
        let v = run(
            &mut interp,
            vec![
                class_stmt(iface),
                var_with(Modifiers::NONE, None, "suffix", Some(string("!"))),
                var(
                    named("Greeter"),
                    "g",
                    Some(new_anonymous(
                        "Greeter",
                        vec![],
                        vec![method_member(method_decl(
                            "greet",
                            Modifiers::PUBLIC,
                            ReturnType::Loose,
                            vec![param("who")],
                            Some(vec![ret(Some(add(add(name("PREFIX"), name("who")), name("suffix"))))]),
                        ))],
                    )),
                ),
                expr(method(name("g"), "greet", vec![string("bob")])),
            ],
        )
        .unwrap();
        assert_eq!(value_to_string(&v), "hi bob!");
    }

    #[test]
    fn abstract_classes_and_interfaces_cannot_be_instantiated() {
        let mut interp = Interpreter::new();
        let err = run(
            &mut interp,
            vec![
                class_stmt(interface_decl("Marker", &[], vec![])),
                expr(new_object("Marker", vec![])),
            ],
        )
        .unwrap_err();
        assert!(err.message().contains("Cannot instantiate abstract class or interface"));
    }

    #[test]
    fn extending_an_interface_is_rejected() {
        let mut interp = Interpreter::new();
        let err = run(
            &mut interp,
            vec![
                class_stmt(interface_decl("Marker", &[], vec![])),
                class_stmt(class_decl("Impl", Some("Marker"), &[], vec![])),
            ],
        )
        .unwrap_err();
        assert!(err.message().contains("cannot extend interface"));
    }

    #[test]
    fn constructors_reject_returned_values() {
        let mut interp = Interpreter::new();
        let decl = class_decl("Bad", None, &[], vec![constructor(vec![], vec![ret(Some(int(1)))])]);
        let err = run(&mut interp, vec![class_stmt(decl), expr(new_object("Bad", vec![]))]).unwrap_err();
        assert!(err.message().contains("Cannot return value from constructor"));
    }
}
