use super::*;
use log::trace;

impl Interpreter {
    /// `name(args)` with no target: scope methods, then the enclosing class, then static
    /// imports, walking outward.
    pub(crate) fn invoke_unqualified(
        &mut self,
        name: &str,
        args: Vec<Value>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        let mut current = Some(cs.top());
        while let Some(ns) = current {
            let (kind, class, object, methods, imports, parent) = {
                let n = ns.borrow();
                (
                    n.kind(),
                    n.class.clone(),
                    n.object(),
                    n.local_methods(name),
                    n.static_imports().to_vec(),
                    n.parent(),
                )
            };
            if let Some(class) = &class {
                if ClassDef::has_method(class, name) {
                    match (kind, object) {
                        (ScopeKind::Instance, Some(obj)) => {
                            return self.invoke_object_method(&obj, name, args, cs);
                        }
                        _ => return self.invoke_static_method(class, name, args, cs),
                    }
                }
            } else if !methods.is_empty() {
                let candidates = methods
                    .iter()
                    .map(|m| self.script_candidate(m))
                    .collect::<UtilResult<Vec<_>>>()
                    .at(cs)?;
                let chosen = select_overload(name, &candidates, &args, &self.core).at(cs)?;
                if let Some(index) = chosen {
                    let method = methods[index].clone();
                    let args = convert_arguments(&candidates[index], args, &self.core).at(cs)?;
                    let parent = method.declaring().unwrap_or_else(|| ns.clone());
                    return self.invoke_script_method(&method, args, parent, cs);
                }
            }
            for import in imports.iter().rev() {
                let class = match import {
                    StaticImport::Class(c) => c,
                    StaticImport::Member(c, member) if member == name => c,
                    StaticImport::Member(..) => continue,
                };
                if ClassDef::has_method(class, name) {
                    return self.invoke_static_method(class, name, args, cs);
                }
            }
            current = parent;
        }
        Err(UtilError::NoSuchMember(format!(
            "Command not found: {name}({})",
            arg_types_string(&args)
        )))
        .at(cs)
    }

    /// `target.name(args)` for any runtime value.
    pub(crate) fn invoke_on_value(
        &mut self,
        target: &Value,
        name: &str,
        args: Vec<Value>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        let obj = match target {
            Value::Object(o) => o.clone(),
            Value::Primitive(p) => {
                let boxed = self.core.boxed(*p);
                let Value::Object(o) = boxed else {
                    return Err(EvalError::eval("Boxing produced no object", cs));
                };
                return self.invoke_object_method(&o, name, args, cs);
            }
            Value::Null => {
                return Err(self.core.throw(
                    "java.lang.NullPointerException",
                    &format!("Attempt to invoke method {name} on null value"),
                ))
                .at(cs);
            }
            Value::Void => {
                return Err(EvalError::eval(
                    format!("Attempt to resolve method: {name}() on undefined variable or class name"),
                    cs,
                ));
            }
        };
        let scope = match &*obj.data() {
            ObjectData::This(ns) | ObjectData::Proxy(ns) => Some(ns.clone()),
            _ => None,
        };
        if let Some(scope) = scope {
            return self.invoke_scope_method(&obj, &scope, name, args, cs);
        }
        let lambda = match &*obj.data() {
            ObjectData::Lambda(f) => Some(f.clone()),
            _ => None,
        };
        match lambda {
            Some(f) if !self.core.object.declares_method(name) => {
                self.guards.invoke(target, name, &args).at(cs)?;
                self.invoke_lambda(&f, args, cs)
            }
            _ => self.invoke_object_method(&obj, name, args, cs),
        }
    }

    /// Methods of a scripted object are the loose methods of its scope chain.
    fn invoke_scope_method(
        &mut self,
        obj: &ObjectRef,
        scope: &NsRef,
        name: &str,
        args: Vec<Value>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        self.guards
            .invoke(&Value::Object(obj.clone()), name, &args)
            .at(cs)?;
        let mut current = Some(scope.clone());
        while let Some(ns) = current {
            let (methods, parent) = {
                let n = ns.borrow();
                (n.local_methods(name), n.parent())
            };
            if !methods.is_empty() {
                let candidates = methods
                    .iter()
                    .map(|m| self.script_candidate(m))
                    .collect::<UtilResult<Vec<_>>>()
                    .at(cs)?;
                if let Some(index) = select_overload(name, &candidates, &args, &self.core).at(cs)? {
                    let method = methods[index].clone();
                    let args = convert_arguments(&candidates[index], args, &self.core).at(cs)?;
                    let parent = method.declaring().unwrap_or(ns);
                    return self.invoke_script_method(&method, args, parent, cs);
                }
            }
            current = parent;
        }
        self.invoke_object_method(obj, name, args, cs)
    }

    pub(crate) fn invoke_object_method(
        &mut self,
        obj: &ObjectRef,
        name: &str,
        args: Vec<Value>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        let target = Value::Object(obj.clone());
        self.guards.invoke(&target, name, &args).at(cs)?;
        let class = obj.class().clone();
        trace!("invoke {}.{name}", class.name);
        let methods = collect_methods(&class, name, &self.core.object);
        match self.choose_method(methods, name, &args).at(cs)? {
            Some((owner, method, candidate)) => {
                let this = (!method.is_static()).then_some(target);
                self.invoke_method_def(&owner, &method, &candidate, this, args, cs)
            }
            None => Err(UtilError::NoSuchMember(format!(
                "Method {name}({}) not found in class'{}'",
                arg_types_string(&args),
                class.name
            )))
            .at(cs),
        }
    }

    pub(crate) fn invoke_static_method(
        &mut self,
        class: &ClassRef,
        name: &str,
        args: Vec<Value>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        self.guards.invoke_static(class, name, &args).at(cs)?;
        trace!("invoke static {}.{name}", class.name);
        let methods = collect_methods(class, name, &self.core.object);
        match self.choose_method(methods, name, &args).at(cs)? {
            Some((owner, method, candidate)) if method.is_static() => {
                self.invoke_method_def(&owner, &method, &candidate, None, args, cs)
            }
            Some(_) => Err(EvalError::eval(
                format!(
                    "Cannot reach instance method: {name}({}) from static context: {}",
                    arg_types_string(&args),
                    class.name
                ),
                cs,
            )),
            None => Err(UtilError::NoSuchMember(format!(
                "Static method {name}({}) not found in class'{}'",
                arg_types_string(&args),
                class.name
            )))
            .at(cs),
        }
    }

    /// `super.name(args)`: the superclass implementation for class instances, the enclosing
    /// scope's method for loose scripts.
    pub(crate) fn invoke_super(&mut self, name: &str, args: Vec<Value>, cs: &mut CallStack) -> EvalResult<Value> {
        let Some((class, obj)) = enclosing_instance(&cs.top()) else {
            let target = Namespace::get_super(&cs.top());
            return self.invoke_on_value(&target, name, args, cs);
        };
        let Some(superclass) = class.superclass.clone() else {
            return Err(EvalError::eval(format!("{} has no superclass", class.name), cs));
        };
        self.guards.invoke_super(&superclass, name, &args).at(cs)?;
        let methods = collect_methods(&superclass, name, &self.core.object);
        match self.choose_method(methods, name, &args).at(cs)? {
            Some((owner, method, candidate)) => {
                let this = (!method.is_static()).then(|| Value::Object(obj));
                self.invoke_method_def(&owner, &method, &candidate, this, args, cs)
            }
            None => Err(UtilError::NoSuchMember(format!(
                "Method {name}({}) not found in superclass {}",
                arg_types_string(&args),
                superclass.name
            )))
            .at(cs),
        }
    }

    fn invoke_method_def(
        &mut self,
        owner: &ClassRef,
        method: &Rc<MethodDef>,
        candidate: &Candidate,
        this: Option<Value>,
        args: Vec<Value>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        let args = convert_arguments(candidate, args, &self.core).at(cs)?;
        match &method.body {
            MethodBody::Native(f) => {
                let f = f.clone();
                let this = this.unwrap_or(Value::Null);
                f(self, &this, &args).at(cs)
            }
            MethodBody::Abstract => Err(EvalError::eval(
                format!("Cannot invoke abstract method {}.{}", owner.name, method.name),
                cs,
            )),
            MethodBody::Script(sm) => {
                // a redefinition of the class replaces bodies in its static scope
                let static_ns = owner.static_namespace();
                let current = static_ns
                    .as_ref()
                    .and_then(|ns| {
                        ns.borrow()
                            .local_methods(&sm.name)
                            .into_iter()
                            .find(|m| m.same_signature(sm))
                    })
                    .unwrap_or_else(|| sm.clone());
                let parent = match &this {
                    Some(Value::Object(obj)) => obj.callback_for(owner),
                    _ => static_ns,
                };
                let Some(parent) = parent else {
                    return Err(EvalError::eval(
                        format!("No scope for method {} of {}", method.name, owner.name),
                        cs,
                    ));
                };
                self.invoke_script_method(&current, args, parent, cs)
            }
        }
    }

    pub(crate) fn check_depth(&self, name: &str, cs: &CallStack) -> EvalResult<()> {
        if cs.depth() >= self.config.max_call_depth {
            return Err(EvalError::eval(
                format!("Maximum call depth exceeded in method: {name}"),
                cs,
            ));
        }
        Ok(())
    }

    /// Declares the parameters of `method` in `ns`.
    pub(crate) fn bind_params(
        &mut self,
        method: &ScriptMethod,
        ns: &NsRef,
        args: Vec<Value>,
        cs: &CallStack,
    ) -> EvalResult<()> {
        if args.len() != method.arity() {
            return Err(EvalError::eval(
                format!(
                    "Wrong number of arguments for method: {}, expected {} but got {}",
                    method.name,
                    method.arity(),
                    args.len()
                ),
                cs,
            ));
        }
        let types = self.script_param_types(method).at(cs)?;
        for ((param, ty), value) in method.decl.params.iter().zip(types).zip(args) {
            Namespace::set_typed_variable(ns, &param.name, ty, Some(value), param.modifiers)
                .map_err(|e| e.prefixed(&format!("Argument {}: ", param.name)))
                .at(cs)?;
        }
        Ok(())
    }

    /// Runs a script method body in a fresh method scope under `parent`.
    pub(crate) fn invoke_script_method(
        &mut self,
        method: &Rc<ScriptMethod>,
        args: Vec<Value>,
        parent: NsRef,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        self.check_depth(&method.name, cs)?;
        let Some(body) = &method.decl.body else {
            return Err(EvalError::eval(
                format!("Cannot invoke abstract method: {}", method.name),
                cs,
            ));
        };
        trace!("call {}", method.name);
        let ns = Namespace::child(&parent, &method.name, ScopeKind::Method);
        self.bind_params(method, &ns, args, cs)?;

        let monitor = match method.decl.modifiers.is_synchronized() {
            true => match Namespace::get_this(&ns) {
                Value::Object(o) => Some((o.id(), self.monitors.monitor(o.id()))),
                _ => None,
            },
            false => None,
        };
        let guard = monitor.as_ref().map(|(_, m)| m.lock());

        cs.push(ns.clone());
        cs.set_span(&method.decl.span);
        let result = self.exec_statements(&body.body, cs);
        cs.pop();
        drop(guard);
        if let Some((id, m)) = monitor {
            self.monitors.release(id, m);
        }
        let completion = result.map_err(|e| e.prepend(&format!("Method {}: ", method.name)))?;

        let (value, returned) = match completion {
            Completion::Return(v) => (v, true),
            Completion::Normal(v) => (v, false),
            Completion::Break(_) | Completion::Continue(_) => (Value::Void, false),
        };
        match &method.decl.return_type {
            ReturnType::Loose => Ok(value),
            ReturnType::Void => {
                if returned && !value.is_void() {
                    return Err(EvalError::eval(
                        format!("Cannot return value from void method: {}", method.name),
                        cs,
                    ));
                }
                Ok(Value::Void)
            }
            ReturnType::Typed(node) => {
                if !returned || value.is_void() {
                    return Err(EvalError::eval(
                        format!("Method {} must return a value", method.name),
                        cs,
                    ));
                }
                let ty = self.resolve_type(node, &parent).at(cs)?;
                coerce(value, &ty, Conversion::Assignment, &self.core)
                    .map_err(|e| e.prefixed(&format!("Return value of {}: ", method.name)))
                    .at(cs)
            }
        }
    }

    pub(crate) fn invoke_lambda(&mut self, f: &LambdaFn, args: Vec<Value>, cs: &mut CallStack) -> EvalResult<Value> {
        self.check_depth("lambda", cs)?;
        let params = &f.expr.params;
        if params.len() != args.len() {
            return Err(EvalError::eval(
                format!("Lambda expects {} arguments but got {}", params.len(), args.len()),
                cs,
            ));
        }
        let ns = Namespace::child(&f.scope, "lambda", ScopeKind::Lambda);
        for (param, value) in params.iter().zip(args) {
            let ty = match &param.ty {
                Some(node) => Some(self.resolve_type(node, &f.scope).at(cs)?),
                None => None,
            };
            Namespace::set_typed_variable(&ns, &param.name, ty, Some(value), param.modifiers).at(cs)?;
        }
        cs.push(ns);
        let result = match &f.expr.body {
            LambdaBody::Expression(e) => self.eval_expr(e, cs),
            LambdaBody::Block(block) => self.exec_statements(&block.body, cs).map(|c| match c {
                Completion::Return(v) => v,
                _ => Value::Void,
            }),
        };
        cs.pop();
        result
    }

    /// `new Class(args)`.
    pub(crate) fn construct(&mut self, class: &ClassRef, args: Vec<Value>, cs: &mut CallStack) -> EvalResult<Value> {
        self.guards.construct(class, &args).at(cs)?;
        if class.is_abstract() {
            return Err(EvalError::eval(
                format!("Cannot instantiate abstract class or interface: {}", class.name),
                cs,
            ));
        }
        if class.is_generated() {
            return self.construct_generated(class, args, cs);
        }
        let obj = ObjectRef::new(class.clone(), ObjectData::for_storage(class.storage));
        self.init_native_fields(&obj);
        self.run_native_constructor(class, &obj, args, cs)?;
        Ok(Value::Object(obj))
    }

    /// Instance fields of native classes start at their type's default.
    pub(crate) fn init_native_fields(&self, obj: &ObjectRef) {
        let mut current = Some(obj.class().clone());
        while let Some(class) = current {
            if !class.is_generated() {
                for field in class.fields.iter().filter(|f| !f.modifiers.is_static()) {
                    let value = field
                        .resolved_type(&self.core)
                        .map(default_value)
                        .unwrap_or(Value::Null);
                    obj.set_field(&field.name, value);
                }
            }
            current = class.superclass.clone();
        }
    }

    pub(crate) fn run_native_constructor(
        &mut self,
        class: &ClassRef,
        obj: &ObjectRef,
        args: Vec<Value>,
        cs: &mut CallStack,
    ) -> EvalResult<()> {
        if class.constructors.is_empty() && args.is_empty() {
            return Ok(());
        }
        let candidates = class
            .constructors
            .iter()
            .map(|c| c.params.types(&self.core).map(|t| Candidate::typed(t, c.varargs)))
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
        match &class.constructors[index].body {
            ConstructorBody::Native(init) => {
                let init = init.clone();
                init(self, obj, &args).at(cs)
            }
            ConstructorBody::Script(_) => Err(EvalError::eval(
                format!("Scripted constructor on native class {}", class.name),
                cs,
            )),
        }
    }
}

/// The generated class and object whose instance scope encloses `ns`.
pub(crate) fn enclosing_instance(ns: &NsRef) -> Option<(ClassRef, ObjectRef)> {
    let mut current = Some(ns.clone());
    while let Some(scope) = current {
        let s = scope.borrow();
        if s.kind() == ScopeKind::Instance {
            if let (Some(class), Some(obj)) = (&s.class, s.object()) {
                return Some((class.clone(), obj));
            }
        }
        current = s.parent();
    }
    None
}
