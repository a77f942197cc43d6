use super::*;
use log::{debug, trace};

/// What a loop does after one pass of its body.
enum Step {
    Next,
    Exit,
    Propagate(Completion),
}

fn loop_step(completion: Completion, label: Option<&str>) -> Step {
    match completion {
        Completion::Normal(_) | Completion::Continue(None) => Step::Next,
        Completion::Continue(Some(l)) if Some(l.as_str()) == label => Step::Next,
        Completion::Break(None) => Step::Exit,
        Completion::Break(Some(l)) if Some(l.as_str()) == label => Step::Exit,
        other => Step::Propagate(other),
    }
}

/// Case labels compare numerically against primitive and boxed discriminants, by content
/// for strings and by identity otherwise.
fn switch_matches(discriminant: &Value, label: &Value) -> bool {
    match (unbox(discriminant), unbox(label)) {
        (Some(a), Some(b)) => matches!(
            primitive_ops::binary(BinaryOp::Eq, a, b),
            Ok(Primitive::Boolean(true))
        ),
        _ => match (discriminant, label) {
            (Value::Object(a), Value::Object(b)) if a.is_string() && b.is_string() => {
                value_equals(discriminant, label)
            }
            _ => discriminant.same(label),
        },
    }
}

impl Interpreter {
    /// Runs a statement list in the current scope. Method declarations are installed before
    /// anything runs so that calls may precede them.
    pub(crate) fn exec_statements(&mut self, stmts: &[Statement], cs: &mut CallStack) -> EvalResult<Completion> {
        let scope = Namespace::non_block(&cs.top());
        for stmt in stmts {
            if let StatementKind::MethodDeclaration(decl) = &stmt.kind {
                Namespace::set_method(&scope, ScriptMethod::new(&decl.name, decl.clone(), &scope));
            }
        }
        let mut last = Value::Void;
        for stmt in stmts {
            match self.exec_statement(stmt, cs)? {
                Completion::Normal(value) => last = value,
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(last))
    }

    pub(crate) fn exec_statement(&mut self, stmt: &Statement, cs: &mut CallStack) -> EvalResult<Completion> {
        cs.set_span(&stmt.span);
        let normal = |value: Value| -> EvalResult<Completion> { Ok(Completion::Normal(value)) };
        match &stmt.kind {
            StatementKind::Empty | StatementKind::MethodDeclaration(_) => normal(Value::Void),
            StatementKind::Expression(e) => {
                let value = self.eval_expr(e, cs)?;
                normal(value)
            }
            StatementKind::Block(block) => self.exec_block(block, cs),
            StatementKind::Variable(decl) => {
                self.exec_variable(decl, cs)?;
                normal(Value::Void)
            }
            StatementKind::If(test, then, otherwise) => {
                let test = self.eval_expr(test, cs)?;
                if condition_value(&test).at(cs)? {
                    self.exec_statement(then, cs)
                } else if let Some(otherwise) = otherwise {
                    self.exec_statement(otherwise, cs)
                } else {
                    normal(Value::Void)
                }
            }
            StatementKind::While(test, body) => self.exec_while(test, body, None, cs),
            StatementKind::DoWhile(body, test) => self.exec_do_while(body, test, None, cs),
            StatementKind::For(f) => self.exec_for(f, None, cs),
            StatementKind::ForEach(f) => self.exec_for_each(f, None, cs),
            StatementKind::Labeled(label, body) => self.exec_labeled(label, body, cs),
            StatementKind::Switch(s) => self.exec_switch(s, cs),
            StatementKind::Return(value) => {
                let value = match value {
                    Some(e) => self.eval_expr(e, cs)?,
                    None => Value::Void,
                };
                Ok(Completion::Return(value))
            }
            StatementKind::Break(label) => Ok(Completion::Break(label.clone())),
            StatementKind::Continue(label) => Ok(Completion::Continue(label.clone())),
            StatementKind::Throw(e) => self.exec_throw(e, cs),
            StatementKind::Try(t) => self.exec_try(t, cs),
            StatementKind::Synchronized(lock, block) => self.exec_synchronized(lock, block, cs),
            StatementKind::ClassDeclaration(decl) => {
                self.define_class(decl, cs)?;
                normal(Value::Void)
            }
            StatementKind::Import(import) => {
                self.exec_import(import, cs)?;
                normal(Value::Void)
            }
            StatementKind::Package(name) => {
                debug!("package {name}");
                self.registry.borrow_mut().add_package(name);
                Namespace::set_package(&cs.top(), name);
                normal(Value::Void)
            }
        }
    }

    /// Runs `block` in a fresh block scope swapped onto the current frame.
    pub(crate) fn exec_block(&mut self, block: &Block, cs: &mut CallStack) -> EvalResult<Completion> {
        let ns = Namespace::child(&cs.top(), "block", ScopeKind::Block);
        let previous = cs.swap(ns);
        let result = self.exec_statements(&block.body, cs);
        cs.swap(previous);
        result
    }

    /// Declares every declarator of `decl` in the current scope.
    pub(crate) fn exec_variable(&mut self, decl: &VariableDeclaration, cs: &mut CallStack) -> EvalResult<()> {
        let ns = cs.top();
        let base = match &decl.ty {
            Some(node) => Some(self.resolve_type(node, &ns).at(cs)?),
            None => None,
        };
        for d in &decl.declarators {
            let ty = base.clone().map(|t| t.with_dimensions(d.dims));
            let value = match &d.init {
                Some(Expression::ArrayInit(init)) => Some(self.eval_initializer(init, ty.as_ref(), cs)?),
                Some(init) => {
                    let value = self.eval_expr(init, cs)?;
                    if value.is_void() {
                        return Err(EvalError::eval(
                            format!("Void initializer for variable: {}", d.name),
                            cs,
                        ));
                    }
                    Some(value)
                }
                None => None,
            };
            trace!("declare {}", d.name);
            Namespace::set_typed_variable(&ns, &d.name, ty, value, decl.modifiers)
                .map_err(|e| e.prefixed("Typed variable declaration: "))
                .at(cs)?;
        }
        Ok(())
    }

    fn exec_while(&mut self, test: &Expression, body: &Statement, label: Option<&str>, cs: &mut CallStack) -> EvalResult<Completion> {
        loop {
            let value = self.eval_expr(test, cs)?;
            if !condition_value(&value).at(cs)? {
                break;
            }
            match loop_step(self.exec_statement(body, cs)?, label) {
                Step::Propagate(c) => return Ok(c),
                Step::Exit => break,
                Step::Next => {}
            }
            if self.is_interrupted() {
                debug!("loop interrupted");
                break;
            }
        }
        Ok(Completion::Normal(Value::Void))
    }

    fn exec_do_while(&mut self, body: &Statement, test: &Expression, label: Option<&str>, cs: &mut CallStack) -> EvalResult<Completion> {
        loop {
            match loop_step(self.exec_statement(body, cs)?, label) {
                Step::Propagate(c) => return Ok(c),
                Step::Exit => break,
                Step::Next => {}
            }
            if self.is_interrupted() {
                debug!("loop interrupted");
                break;
            }
            let value = self.eval_expr(test, cs)?;
            if !condition_value(&value).at(cs)? {
                break;
            }
        }
        Ok(Completion::Normal(Value::Void))
    }

    fn exec_for(&mut self, f: &ForStatement, label: Option<&str>, cs: &mut CallStack) -> EvalResult<Completion> {
        let ns = Namespace::child(&cs.top(), "for", ScopeKind::Block);
        let previous = cs.swap(ns);
        let result = self.run_for(f, label, cs);
        cs.swap(previous);
        result
    }

    fn run_for(&mut self, f: &ForStatement, label: Option<&str>, cs: &mut CallStack) -> EvalResult<Completion> {
        match &f.init {
            Some(ForInit::Variable(decl)) => self.exec_variable(decl, cs)?,
            Some(ForInit::Expressions(exprs)) => {
                for e in exprs {
                    self.eval_expr(e, cs)?;
                }
            }
            None => {}
        }
        loop {
            if let Some(test) = &f.test {
                let value = self.eval_expr(test, cs)?;
                if !condition_value(&value).at(cs)? {
                    break;
                }
            }
            match loop_step(self.exec_statement(&f.body, cs)?, label) {
                Step::Propagate(c) => return Ok(c),
                Step::Exit => break,
                Step::Next => {}
            }
            if self.is_interrupted() {
                debug!("loop interrupted");
                break;
            }
            for update in &f.update {
                self.eval_expr(update, cs)?;
            }
        }
        Ok(Completion::Normal(Value::Void))
    }

    fn exec_for_each(&mut self, f: &ForEachStatement, label: Option<&str>, cs: &mut CallStack) -> EvalResult<Completion> {
        let iterable = self.eval_expr(&f.iterable, cs)?;
        let iter = self.value_iter(&iterable, cs)?;
        let ty = match &f.ty {
            Some(node) => Some(self.resolve_type(node, &cs.top()).at(cs)?),
            None => None,
        };
        let ns = Namespace::child(&cs.top(), "for-each", ScopeKind::Block);
        let previous = cs.swap(ns.clone());
        let result = self.run_for_each(f, iter, ty, &ns, label, cs);
        cs.swap(previous);
        result
    }

    fn run_for_each(
        &mut self,
        f: &ForEachStatement,
        mut iter: ValueIter,
        ty: Option<Type>,
        ns: &NsRef,
        label: Option<&str>,
        cs: &mut CallStack,
    ) -> EvalResult<Completion> {
        while let Some(item) = self.iter_next(&mut iter, cs)? {
            Namespace::set_typed_variable(ns, &f.name, ty.clone(), Some(item), f.modifiers)
                .map_err(|e| e.prefixed("for-each variable: "))
                .at(cs)?;
            match loop_step(self.exec_statement(&f.body, cs)?, label) {
                Step::Propagate(c) => return Ok(c),
                Step::Exit => break,
                Step::Next => {}
            }
            if self.is_interrupted() {
                debug!("loop interrupted");
                break;
            }
        }
        Ok(Completion::Normal(Value::Void))
    }

    fn exec_labeled(&mut self, label: &str, body: &Statement, cs: &mut CallStack) -> EvalResult<Completion> {
        cs.set_span(&body.span);
        let completion = match &body.kind {
            StatementKind::While(test, inner) => self.exec_while(test, inner, Some(label), cs)?,
            StatementKind::DoWhile(inner, test) => self.exec_do_while(inner, test, Some(label), cs)?,
            StatementKind::For(f) => self.exec_for(f, Some(label), cs)?,
            StatementKind::ForEach(f) => self.exec_for_each(f, Some(label), cs)?,
            _ => self.exec_statement(body, cs)?,
        };
        match completion {
            Completion::Break(Some(l)) if l == label => Ok(Completion::Normal(Value::Void)),
            other => Ok(other),
        }
    }

    fn exec_switch(&mut self, s: &SwitchStatement, cs: &mut CallStack) -> EvalResult<Completion> {
        let discriminant = self.eval_expr(&s.discriminant, cs)?;
        if discriminant.is_void() {
            return Err(EvalError::eval("Switch on undefined value", cs));
        }
        let ns = Namespace::child(&cs.top(), "switch", ScopeKind::Block);
        let previous = cs.swap(ns);
        let result = self.run_switch(s, &discriminant, cs);
        cs.swap(previous);
        result
    }

    fn run_switch(&mut self, s: &SwitchStatement, discriminant: &Value, cs: &mut CallStack) -> EvalResult<Completion> {
        let mut matched = false;
        for case in &s.cases {
            if !matched {
                matched = match &case.test {
                    None => true,
                    Some(test) => {
                        let label = self.eval_expr(test, cs)?;
                        switch_matches(discriminant, &label)
                    }
                };
            }
            if !matched {
                continue;
            }
            match self.exec_statements(&case.body, cs)? {
                Completion::Break(None) => return Ok(Completion::Normal(Value::Void)),
                Completion::Normal(_) => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(Value::Void))
    }

    fn exec_throw(&mut self, e: &Expression, cs: &mut CallStack) -> EvalResult<Completion> {
        let value = self.eval_expr(e, cs)?;
        let obj = match &value {
            Value::Object(o) => o.clone(),
            Value::Null => {
                return Err(self
                    .core
                    .throw("java.lang.NullPointerException", "Cannot throw null"))
                .at(cs);
            }
            _ => {
                return Err(EvalError::eval(
                    format!("Expression in 'throw' must be a Throwable, found: {}", type_name(&value)),
                    cs,
                ));
            }
        };
        // a rethrow keeps the origin recorded by the first throw
        let native = match &mut *obj.data_mut() {
            ObjectData::Throwable(t) => *t.native_origin.get_or_insert(false),
            _ => {
                return Err(EvalError::eval(
                    format!("Expression in 'throw' must be a Throwable, found: {}", obj.class().name),
                    cs,
                ));
            }
        };
        Err(UtilError::Target(Thrown {
            exception: value,
            native,
        }))
        .at(cs)
    }

    fn exec_try(&mut self, t: &TryStatement, cs: &mut CallStack) -> EvalResult<Completion> {
        let result = match self.exec_block(&t.block, cs) {
            Err(err) if err.is_target() => self.exec_catch(t, err, cs),
            other => other,
        };
        if let Some(finalizer) = &t.finalizer {
            let completion = self.exec_block(finalizer, cs)?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
        }
        result
    }

    fn exec_catch(&mut self, t: &TryStatement, err: EvalError, cs: &mut CallStack) -> EvalResult<Completion> {
        let Some(thrown) = err.thrown().cloned() else {
            return Err(err);
        };
        let scope = cs.top();
        for handler in &t.handlers {
            let mut declared = None;
            let mut matched = handler.types.is_empty();
            for node in &handler.types {
                let ty = self.resolve_type(node, &scope).at(cs)?;
                if is_assignable(&thrown.exception, &ty, false, &self.core) {
                    matched = true;
                    declared = Some(ty);
                    break;
                }
            }
            if !matched {
                continue;
            }
            trace!("caught {}", thrown.class_name());
            // multi-catch parameters stay loosely typed
            let ty = declared.filter(|_| handler.types.len() == 1);
            let ns = Namespace::child(&scope, "catch", ScopeKind::Block);
            Namespace::set_typed_variable(&ns, &handler.name, ty, Some(thrown.exception.clone()), Modifiers::NONE)
                .at(cs)?;
            let previous = cs.swap(ns);
            let result = self.exec_statements(&handler.body.body, cs);
            cs.swap(previous);
            return result;
        }
        Err(err)
    }

    fn exec_synchronized(&mut self, lock: &Expression, block: &Block, cs: &mut CallStack) -> EvalResult<Completion> {
        let value = self.eval_expr(lock, cs)?;
        let obj = match &value {
            Value::Object(o) => o.clone(),
            Value::Null | Value::Void => {
                return Err(self
                    .core
                    .throw("java.lang.NullPointerException", "Null lock in synchronized block"))
                .at(cs);
            }
            Value::Primitive(p) => {
                return Err(EvalError::eval(
                    format!("Cannot synchronize on primitive {}", p.ty()),
                    cs,
                ));
            }
        };
        let monitor = self.monitors.monitor(obj.id());
        let guard = monitor.lock();
        let result = self.exec_block(block, cs);
        drop(guard);
        self.monitors.release(obj.id(), monitor);
        result
    }

    fn exec_import(&mut self, import: &ImportDeclaration, cs: &mut CallStack) -> EvalResult<()> {
        let ns = cs.top();
        let not_found = |name: &str| UtilError::eval(format!("Class not found: {name}"));
        if import.is_static {
            let (class_name, member) = match import.wildcard {
                true => (import.name.as_str(), None),
                false => match import.name.rsplit_once('.') {
                    Some((class, member)) => (class, Some(member)),
                    None => return Err(not_found(&import.name)).at(cs),
                },
            };
            let class = self
                .resolve_class(class_name, &ns)
                .ok_or_else(|| not_found(class_name))
                .at(cs)?;
            let import = match member {
                Some(member) => StaticImport::Member(class, member.to_string()),
                None => StaticImport::Class(class),
            };
            Namespace::import_static(&ns, import);
            return Ok(());
        }
        if import.wildcard {
            Namespace::import_package(&ns, &import.name);
            return Ok(());
        }
        let class = self
            .resolve_class(&import.name, &ns)
            .ok_or_else(|| not_found(&import.name))
            .at(cs)?;
        let simple = import.name.rsplit('.').next().unwrap_or(&import.name);
        Namespace::import_class(&ns, simple, &class.name);
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

    fn int_of(interp: &Interpreter, name: &str) -> i64 {
        let value = interp.get(name).unwrap().unwrap();
        unbox(&value).and_then(Primitive::as_i64).unwrap()
    }

    #[test]
    fn while_body_declarations_are_fresh_each_pass() {
        let mut interp = Interpreter::new();
        run(
            &mut interp,
            vec![
                expr(assign(name("i"), int(0))),
                expr(assign(name("seen"), int(0))),
                while_loop(
                    lt(name("i"), int(3)),
                    block(vec![
                        var(int_type(), "local", None),
                        expr(assign_op(AssignOp::AddAssign, name("local"), int(1))),
                        expr(assign_op(AssignOp::AddAssign, name("seen"), name("local"))),
                        expr(post_inc(name("i"))),
                    ]),
                ),
            ],
        )
        .unwrap();
        assert_eq!(int_of(&interp, "seen"), 3);
        assert_eq!(int_of(&interp, "i"), 3);
        assert!(interp.get("local").unwrap().is_none());
    }

    #[test]
    fn labeled_break_and_continue() {
        let mut interp = Interpreter::new();
        let inner = for_loop(
            Some(ForInit::Variable(declaration(Modifiers::NONE, Some(int_type()), "j", Some(int(0))))),
            Some(lt(name("j"), int(3))),
            vec![post_inc(name("j"))],
            block(vec![
                if_else(eq(name("j"), int(1)), cont(Some("outer")), None),
                if_else(eq(name("i"), int(2)), brk(Some("outer")), None),
                expr(post_inc(name("count"))),
            ]),
        );
        run(
            &mut interp,
            vec![
                expr(assign(name("count"), int(0))),
                labeled(
                    "outer",
                    for_loop(
                        Some(ForInit::Variable(declaration(Modifiers::NONE, Some(int_type()), "i", Some(int(0))))),
                        Some(lt(name("i"), int(5))),
                        vec![post_inc(name("i"))],
                        inner,
                    ),
                ),
            ],
        )
        .unwrap();
        // j == 0 counts for i in 0 and 1, then i == 2 leaves both loops
        assert_eq!(int_of(&interp, "count"), 2);
    }

    #[test]
    fn switch_falls_through_until_break() {
        let mut interp = Interpreter::new();
        run(
            &mut interp,
            vec![
                expr(assign(name("log"), string(""))),
                switch(
                    method(int(2), "intValue", vec![]),
                    vec![
                        case(Some(int(1)), vec![expr(assign_op(AssignOp::AddAssign, name("log"), string("a")))]),
                        case(Some(int(2)), vec![expr(assign_op(AssignOp::AddAssign, name("log"), string("b")))]),
                        case(None, vec![expr(assign_op(AssignOp::AddAssign, name("log"), string("c"))), brk(None)]),
                        case(Some(int(3)), vec![expr(assign_op(AssignOp::AddAssign, name("log"), string("d")))]),
                    ],
                ),
            ],
        )
        .unwrap();
        let log = interp.get("log").unwrap().unwrap();
        assert_eq!(value_to_string(&log), "bc");
    }

    #[test]
    fn boxed_discriminants_match_by_value() {
        let mut interp = Interpreter::new();
        let boxed = interp.core().boxed(Primitive::Int(7));
        interp.set("n", boxed).unwrap();
        let v = run(
            &mut interp,
            vec![
                switch(
                    name("n"),
                    vec![case(Some(int(7)), vec![expr(assign(name("hit"), boolean(true)))])],
                ),
                expr(name("hit")),
            ],
        )
        .unwrap();
        assert!(v.same(&Value::boolean(true)));
    }

    #[test]
    fn finally_overrides_and_catch_binds() {
        let mut interp = Interpreter::new();
        interp.set("cleaned", false).unwrap();
        let body = vec![try_catch(
            vec![throw(new_object("IllegalStateException", vec![string("boom")]))],
            vec![catch(&["RuntimeException"], "e", vec![ret(Some(method(name("e"), "getMessage", vec![])))])],
            Some(vec![expr(assign(name("cleaned"), boolean(true)))]),
        )];
        let decl = method_decl("f", Modifiers::NONE, ReturnType::Loose, Vec::new(), Some(body));
        let v = run(&mut interp, vec![method_stmt(decl), expr(call("f", vec![]))]).unwrap();
        assert_eq!(value_to_string(&v), "boom");
        let cleaned = interp.get("cleaned").unwrap().unwrap();
        assert!(cleaned.same(&Value::boolean(true)));

        let overriding = vec![try_catch(vec![ret(Some(int(1)))], Vec::new(), Some(vec![ret(Some(int(2)))]))];
        let decl = method_decl("g", Modifiers::NONE, ReturnType::Loose, Vec::new(), Some(overriding));
        let v = run(&mut interp, vec![method_stmt(decl), expr(call("g", vec![]))]).unwrap();
        assert!(v.same(&Value::int(2)));
    }

    #[test]
    fn evaluation_faults_are_not_catchable() {
        let mut interp = Interpreter::new();
        let result = run(
            &mut interp,
            vec![try_catch(
                vec![expr(call("noSuchCommand", vec![]))],
                vec![catch(&[], "e", vec![])],
                None,
            )],
        );
        assert!(result.unwrap_err().message().starts_with("Command not found"));
    }

    #[test]
    fn rethrow_keeps_script_origin() {
        let mut interp = Interpreter::new();
        let err = run(
            &mut interp,
            vec![try_catch(
                vec![throw(new_object("Exception", vec![string("x")]))],
                vec![catch(&["Exception"], "e", vec![throw(name("e"))])],
                None,
            )],
        )
        .unwrap_err();
        assert!(!err.thrown().unwrap().native);
        assert_eq!(err.thrown().unwrap().class_name(), "java.lang.Exception");
    }

    #[test]
    fn interrupted_loops_stop_after_the_current_pass() {
        let mut interp = Interpreter::new();
        interp.interrupt();
        let v = run(
            &mut interp,
            vec![
                expr(assign(name("n"), int(0))),
                while_loop(boolean(true), block(vec![expr(post_inc(name("n")))])),
            ],
        )
        .unwrap();
        assert!(v.is_void());
        assert_eq!(int_of(&interp, "n"), 1);
    }

    #[test]
    fn static_imports_expose_members() {
        let mut interp = Interpreter::new();
        let v = run(
            &mut interp,
            vec![
                import("java.lang.Math", true, true),
                expr(call("max", vec![int(3), int(9)])),
            ],
        )
        .unwrap();
        assert!(v.same(&Value::int(9)));
    }
}
