use super::*;
use log::trace;
use primitive_ops::OpError;

fn is_string(value: &Value) -> bool {
    matches!(value, Value::Object(o) if o.is_string())
}

/// `==` as scripts see it: numeric comparison when either side is primitive, identity
/// otherwise.
fn identity_equals(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Primitive(_), _) | (_, Value::Primitive(_)) => match (unbox(l), unbox(r)) {
            (Some(a), Some(b)) => matches!(
                primitive_ops::binary(BinaryOp::Eq, a, b),
                Ok(Primitive::Boolean(true))
            ),
            _ => false,
        },
        _ => l.same(r),
    }
}

impl Interpreter {
    pub(crate) fn eval_expr(&mut self, expr: &Expression, cs: &mut CallStack) -> EvalResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(self.eval_literal(lit)),
            Expression::Name(_)
            | Expression::Field { .. }
            | Expression::Index { .. }
            | Expression::MethodCall { .. }
            | Expression::Property { .. } => match self.eval_target(expr, cs)? {
                Target::Value(v) => Ok(v),
                Target::Class(class) => Ok(self.core.class_object(Type::Class(class))),
                Target::ShortCircuit => Ok(Value::Null),
            },
            Expression::Slice { target, from, to, step } => {
                self.eval_slice(target, from.as_deref(), to.as_deref(), step.as_deref(), cs)
            }
            Expression::Call { name, args } => self.eval_call(name, args, cs),
            Expression::Unary(op, operand) => self.eval_unary(*op, operand, cs),
            Expression::Update { op, prefix, target } => self.eval_update(*op, *prefix, target, cs),
            Expression::Binary(op, l, r) => self.eval_binary(*op, l, r, cs),
            Expression::InstanceOf(e, ty) => self.eval_instance_of(e, ty, cs),
            Expression::Assign(op, target, value) => self.eval_assign(*op, target, value, cs),
            Expression::Conditional(test, then, otherwise) => {
                let test = self.eval_expr(test, cs)?;
                if condition_value(&test).at(cs)? {
                    self.eval_expr(then, cs)
                } else {
                    self.eval_expr(otherwise, cs)
                }
            }
            Expression::Cast(node, e) => {
                let value = self.eval_expr(e, cs)?;
                let ty = self.resolve_type(node, &cs.top()).at(cs)?;
                coerce(value, &ty, Conversion::Cast, &self.core).at(cs)
            }
            Expression::New { class, args, body } => self.eval_new(class, args, body.as_ref(), cs),
            Expression::NewArray {
                element,
                dims,
                extra_dims,
                init,
            } => self.eval_new_array(element, dims, *extra_dims, init.as_ref(), cs),
            Expression::ArrayInit(init) => self.eval_initializer(init, None, cs),
            Expression::MapEntry(key, value) => {
                let key = self.eval_expr(key, cs)?;
                let value = self.eval_expr(value, cs)?;
                Ok(self.core.new_entry(key, value))
            }
            Expression::ClassLiteral(node) => {
                let ty = self.resolve_type(node, &cs.top()).at(cs)?;
                Ok(self.core.class_object(ty))
            }
            Expression::Lambda(expr) => {
                let f = LambdaFn {
                    expr: expr.clone(),
                    scope: cs.top(),
                };
                Ok(Value::Object(ObjectRef::new(
                    self.core.lambda_class.clone(),
                    ObjectData::Lambda(Rc::new(f)),
                )))
            }
        }
    }

    fn eval_literal(&mut self, lit: &Literal) -> Value {
        match lit {
            Literal::Null => Value::Null,
            Literal::Void => Value::Void,
            Literal::Boolean(b) => Value::boolean(*b),
            Literal::Char(c) => Value::Primitive(Primitive::Char(*c)),
            Literal::Int(i) => Value::int(*i),
            Literal::Long(l) => Value::long(*l),
            Literal::Float(f) => Value::Primitive(Primitive::Float(*f)),
            Literal::Double(d) => Value::double(*d),
            Literal::String(s) => self.intern(s),
        }
    }

    /// Evaluates an access chain, keeping class names and null-safe short circuits distinct
    /// from ordinary values.
    fn eval_target(&mut self, expr: &Expression, cs: &mut CallStack) -> EvalResult<Target> {
        match expr {
            Expression::Name(name) => self.eval_name(name, cs),
            Expression::Field {
                target,
                name,
                null_safe,
            } => match self.eval_target(target, cs)? {
                Target::Value(Value::Null) if *null_safe => Ok(Target::ShortCircuit),
                target => self.member_of(target, name, cs),
            },
            Expression::Index {
                target,
                index,
                null_safe,
            } => {
                let container = match self.eval_target(target, cs)? {
                    Target::ShortCircuit => return Ok(Target::ShortCircuit),
                    Target::Value(Value::Null) if *null_safe => return Ok(Target::ShortCircuit),
                    Target::Value(v) => v,
                    Target::Class(class) => {
                        return Err(EvalError::eval(format!("Can't index class {}", class.name), cs));
                    }
                };
                let lhs = self.index_lhs(&container, index, cs)?;
                self.lhs_get(&lhs, cs).map(Target::Value)
            }
            Expression::MethodCall {
                target,
                name,
                args,
                null_safe,
            } => {
                let target = match self.eval_target(target, cs)? {
                    Target::ShortCircuit => return Ok(Target::ShortCircuit),
                    Target::Value(Value::Null) if *null_safe => return Ok(Target::ShortCircuit),
                    target => target,
                };
                let args = self.eval_args(args, cs)?;
                self.invoke_target(target, name, args, cs).map(Target::Value)
            }
            Expression::Property { target, key } => {
                let target = self.eval_expr(target, cs)?;
                let key = self.eval_expr(key, cs)?;
                self.lhs_get(&Lhs::Property { target, key }, cs).map(Target::Value)
            }
            other => self.eval_expr(other, cs).map(Target::Value),
        }
    }

    fn invoke_target(&mut self, target: Target, name: &str, args: Vec<Value>, cs: &mut CallStack) -> EvalResult<Value> {
        match target {
            Target::Value(value) => self.invoke_on_value(&value, name, args, cs),
            Target::Class(class) => self.invoke_static_method(&class, name, args, cs),
            Target::ShortCircuit => Ok(Value::Null),
        }
    }

    fn index_lhs(&mut self, container: &Value, index: &Expression, cs: &mut CallStack) -> EvalResult<Lhs> {
        let obj = match container {
            Value::Object(o) => o.clone(),
            Value::Null | Value::Void => {
                return Err(self.core.throw(
                    "java.lang.NullPointerException",
                    "Attempt to index a null value",
                ))
                .at(cs);
            }
            Value::Primitive(p) => {
                return Err(EvalError::eval(format!("Not an array or list: {}", p.ty()), cs));
            }
        };
        let key = self.eval_expr(index, cs)?;
        if matches!(&*obj.data(), ObjectData::Map(_)) {
            if self.config.strict_java {
                return Err(EvalError::eval("Map index access is not permitted in strict mode", cs));
            }
            return Ok(Lhs::MapEntry { map: obj, key });
        }
        let index = integral_value(&key, "Array index").at(cs)?;
        Ok(Lhs::Index { container: obj, index })
    }

    /// Reference for the target of an assignment or update.
    fn eval_lhs(&mut self, expr: &Expression, cs: &mut CallStack) -> EvalResult<Lhs> {
        match expr {
            Expression::Name(name) => match name.rsplit_once('.') {
                None => Ok(Lhs::Variable {
                    scope: cs.top(),
                    name: name.clone(),
                    local_only: false,
                }),
                Some((prefix, last)) => {
                    let target = self.eval_name(prefix, cs)?;
                    self.member_lhs(target, last, cs)
                }
            },
            Expression::Field { target, name, .. } => {
                let target = self.eval_target(target, cs)?;
                self.member_lhs(target, name, cs)
            }
            Expression::Index { target, index, .. } => {
                let container = self.eval_expr(target, cs)?;
                self.index_lhs(&container, index, cs)
            }
            Expression::Property { target, key } => {
                let target = self.eval_expr(target, cs)?;
                let key = self.eval_expr(key, cs)?;
                Ok(Lhs::Property { target, key })
            }
            Expression::Slice { .. } => Ok(Lhs::Slice),
            other => self.eval_expr(other, cs).map(Lhs::Value),
        }
    }

    fn member_lhs(&mut self, target: Target, name: &str, cs: &mut CallStack) -> EvalResult<Lhs> {
        match target {
            Target::Value(value) => self.field_lhs(&value, name, cs),
            Target::Class(class) => self.static_field_lhs(&class, name, cs),
            Target::ShortCircuit => Ok(Lhs::Value(Value::Null)),
        }
    }

    fn eval_assign(&mut self, op: AssignOp, target: &Expression, value: &Expression, cs: &mut CallStack) -> EvalResult<Value> {
        let lhs = self.eval_lhs(target, cs)?;
        let Some(binary) = op.binary_op() else {
            let value = self.eval_expr(value, cs)?;
            return self.lhs_assign(&lhs, value, cs);
        };
        let current = self.lhs_get(&lhs, cs)?;
        if binary == BinaryOp::NullCoalesce {
            if !current.is_null() && !current.is_void() {
                return Ok(current);
            }
            let value = self.eval_expr(value, cs)?;
            return self.lhs_assign(&lhs, value, cs);
        }
        if current.is_void() {
            return Err(EvalError::eval(
                format!("Illegal use of undefined variable in '{}' assignment", binary.symbol()),
                cs,
            ));
        }
        let rhs = self.eval_expr(value, cs)?;
        let combined = self.apply_binary(binary, current.clone(), rhs, cs)?;
        // only declared primitive targets narrow; loose ones take the result's type
        let combined = match (self.lhs_declared_type(&lhs), &combined) {
            (Some(Type::Primitive(ty)), Value::Primitive(p)) => {
                Value::Primitive(p.cast(ty).unwrap_or(*p))
            }
            _ => combined,
        };
        self.lhs_assign(&lhs, combined, cs)
    }

    fn lhs_declared_type(&self, lhs: &Lhs) -> Option<Type> {
        match lhs {
            Lhs::Variable { scope, name, .. } => scope.borrow().declared_type(name),
            Lhs::Field { field, .. } => field.declared_type(&self.core),
            Lhs::Index { container, .. } => match &*container.data() {
                ObjectData::Array(a) => Some(a.element.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    fn eval_update(&mut self, op: UpdateOp, prefix: bool, target: &Expression, cs: &mut CallStack) -> EvalResult<Value> {
        let lhs = self.eval_lhs(target, cs)?;
        let current = self.lhs_get(&lhs, cs)?;
        let symbol = match op {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        };
        let Some(before) = unbox(&current) else {
            return Err(EvalError::eval(
                format!("Operator: '{symbol}' inappropriate for type {}", type_name(&current)),
                cs,
            ));
        };
        let binary = match op {
            UpdateOp::Increment => BinaryOp::Add,
            UpdateOp::Decrement => BinaryOp::Sub,
        };
        let after = primitive_ops::binary(binary, before, Primitive::Int(1))
            .map_err(|e| self.op_error(e, cs))?;
        let after = after.cast(before.ty()).unwrap_or(after);
        self.lhs_assign(&lhs, Value::Primitive(after), cs)?;
        Ok(Value::Primitive(if prefix { after } else { before }))
    }

    fn op_error(&self, e: OpError, cs: &CallStack) -> EvalError {
        match e {
            OpError::DivideByZero => self
                .core
                .throw("java.lang.ArithmeticException", "/ by zero")
                .into_eval(cs),
            OpError::Operand(message) => EvalError::eval(message, cs),
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expression, cs: &mut CallStack) -> EvalResult<Value> {
        let value = self.eval_expr(operand, cs)?;
        let Some(p) = unbox(&value) else {
            return Err(EvalError::eval(
                format!("Operator: '{}' inappropriate for {}", op.symbol(), type_name(&value)),
                cs,
            ));
        };
        primitive_ops::unary(op, p)
            .map(Value::Primitive)
            .map_err(|e| self.op_error(e, cs))
    }

    fn boolean_operand(&self, value: &Value, op: BinaryOp, cs: &CallStack) -> EvalResult<bool> {
        unbox(value).and_then(Primitive::as_bool).ok_or_else(|| {
            EvalError::eval(
                format!("Operator: '{}' inappropriate for {}", op.symbol(), type_name(value)),
                cs,
            )
        })
    }

    fn eval_binary(&mut self, op: BinaryOp, l: &Expression, r: &Expression, cs: &mut CallStack) -> EvalResult<Value> {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let left = self.eval_expr(l, cs)?;
                let left = self.boolean_operand(&left, op, cs)?;
                if left == (op == BinaryOp::Or) {
                    return Ok(Value::boolean(left));
                }
                let right = self.eval_expr(r, cs)?;
                self.boolean_operand(&right, op, cs).map(Value::boolean)
            }
            BinaryOp::NullCoalesce => {
                let left = self.eval_expr(l, cs)?;
                if !left.is_null() && !left.is_void() {
                    return Ok(left);
                }
                self.eval_expr(r, cs)
            }
            _ => {
                let left = self.eval_expr(l, cs)?;
                let right = self.eval_expr(r, cs)?;
                self.apply_binary(op, left, right, cs)
            }
        }
    }

    pub(crate) fn apply_binary(&mut self, op: BinaryOp, l: Value, r: Value, cs: &mut CallStack) -> EvalResult<Value> {
        if l.is_void() || r.is_void() {
            return Err(EvalError::eval(
                format!("Illegal use of undefined variable, class, or 'void' literal with '{}'", op.symbol()),
                cs,
            ));
        }
        match op {
            BinaryOp::Eq => Ok(Value::boolean(identity_equals(&l, &r))),
            BinaryOp::NotEq => Ok(Value::boolean(!identity_equals(&l, &r))),
            BinaryOp::Add if is_string(&l) || is_string(&r) => {
                let mut text = self.stringify_value(&l).at(cs)?;
                text.push_str(&self.stringify_value(&r).at(cs)?);
                Ok(self.core.string(text))
            }
            _ => {
                let (Some(a), Some(b)) = (unbox(&l), unbox(&r)) else {
                    return Err(EvalError::eval(
                        format!(
                            "Operator: '{}' inappropriate for objects: {} and {}",
                            op.symbol(),
                            type_name(&l),
                            type_name(&r)
                        ),
                        cs,
                    ));
                };
                primitive_ops::binary(op, a, b)
                    .map(Value::Primitive)
                    .map_err(|e| self.op_error(e, cs))
            }
        }
    }

    fn eval_instance_of(&mut self, e: &Expression, node: &TypeNode, cs: &mut CallStack) -> EvalResult<Value> {
        let value = self.eval_expr(e, cs)?;
        if value.is_null() || value.is_void() {
            return Ok(Value::boolean(false));
        }
        let ty = self.resolve_type(node, &cs.top()).at(cs)?;
        let matched = match &value {
            Value::Primitive(_) => ty
                .as_class()
                .is_some_and(|c| c.same_class(&self.core.primitive_marker)),
            _ => value_type(&value).is_some_and(|t| is_type_assignable(&t, &ty, false, &self.core)),
        };
        Ok(Value::boolean(matched))
    }

    fn eval_new(
        &mut self,
        node: &TypeNode,
        args: &[Expression],
        body: Option<&Rc<ClassBody>>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        let ty = self.resolve_type(node, &cs.top()).at(cs)?;
        let Type::Class(class) = ty else {
            return Err(EvalError::eval(
                format!("Can't construct {ty} with new; use array syntax"),
                cs,
            ));
        };
        let args = self.eval_args(args, cs)?;
        trace!("new {}", class.name);
        match body {
            Some(body) if class.is_interface() => {
                if !args.is_empty() {
                    return Err(EvalError::eval(
                        format!("Anonymous implementation of {} takes no arguments", class.name),
                        cs,
                    ));
                }
                self.anonymous_interface(&class, body, cs)
            }
            Some(body) => self.anonymous_subclass(&class, body, args, cs),
            None => self.construct(&class, args, cs),
        }
    }

    pub(crate) fn eval_args(&mut self, args: &[Expression], cs: &mut CallStack) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let value = self.eval_expr(arg, cs)?;
            if value.is_void() {
                return Err(EvalError::eval(format!("Undefined argument: {i}"), cs));
            }
            values.push(value);
        }
        Ok(values)
    }

    fn eval_call(&mut self, name: &str, args: &[Expression], cs: &mut CallStack) -> EvalResult<Value> {
        if name == "this" || name == "super" {
            return Err(EvalError::eval(
                format!("{name}() may only be called as the first statement of a constructor"),
                cs,
            ));
        }
        if let Some(method) = name.strip_prefix("super.").filter(|m| !m.contains('.')) {
            let args = self.eval_args(args, cs)?;
            return self.invoke_super(method, args, cs);
        }
        match name.rsplit_once('.') {
            None => {
                let args = self.eval_args(args, cs)?;
                self.invoke_unqualified(name, args, cs)
            }
            Some((prefix, method)) => {
                let target = self.eval_name(prefix, cs)?;
                let args = self.eval_args(args, cs)?;
                self.invoke_target(target, method, args, cs)
            }
        }
    }
}
