use super::*;
use log::trace;

/// An evaluated initializer before its array type is known.
enum InitNode {
    Leaf(Value),
    Nested(Vec<InitNode>),
}

fn nesting_depth(nodes: &[InitNode]) -> usize {
    1 + nodes
        .iter()
        .map(|n| match n {
            InitNode::Nested(children) => nesting_depth(children),
            InitNode::Leaf(_) => 0,
        })
        .max()
        .unwrap_or(0)
}

fn collect_leaves<'a>(nodes: &'a [InitNode], out: &mut Vec<&'a Value>) {
    for node in nodes {
        match node {
            InitNode::Leaf(v) => out.push(v),
            InitNode::Nested(children) => collect_leaves(children, out),
        }
    }
}

fn common_primitive(a: PrimitiveType, b: PrimitiveType) -> Option<PrimitiveType> {
    if a.widens_to(b) {
        Some(b)
    } else if b.widens_to(a) {
        Some(a)
    } else {
        PrimitiveType::binary_promotion(a, b)
    }
}

/// Most specific type every leaf converts to; `Object` when nothing narrower fits.
fn common_type(leaves: &[&Value], core: &CoreClasses) -> Type {
    let object = Type::Class(core.object.clone());
    let mut common: Option<Type> = None;
    let mut saw_null = false;
    for leaf in leaves {
        let Some(ty) = value_type(leaf) else {
            saw_null = true;
            continue;
        };
        common = Some(match common {
            None => ty,
            Some(Type::Primitive(a)) => match ty {
                Type::Primitive(b) => match common_primitive(a, b) {
                    Some(p) => Type::Primitive(p),
                    None => return object,
                },
                _ => return object,
            },
            Some(current) => {
                if is_type_assignable(&ty, &current, false, core) {
                    current
                } else if is_type_assignable(&current, &ty, false, core) {
                    ty
                } else {
                    return object;
                }
            }
        });
    }
    match common {
        Some(Type::Primitive(p)) if saw_null => Type::Class(core.wrapper(p).clone()),
        Some(ty) => ty,
        None => object,
    }
}

/// Indices picked by `[from:to:step]` over a sequence of `len` items.
fn slice_indices(len: usize, from: Option<i64>, to: Option<i64>, step: usize) -> Vec<usize> {
    let clamp = |i: i64| {
        let i = if i < 0 { i + len as i64 } else { i };
        i.clamp(0, len as i64) as usize
    };
    let start = from.map_or(0, clamp);
    let end = to.map_or(len, clamp);
    (start..end.max(start)).step_by(step).collect()
}

impl Interpreter {
    pub(crate) fn eval_new_array(
        &mut self,
        element: &TypeNode,
        dims: &[Expression],
        extra_dims: usize,
        init: Option<&ArrayInitializer>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        let base = self.resolve_type(element, &cs.top()).at(cs)?;
        let ty = base.with_dimensions(dims.len() + extra_dims);
        if let Some(init) = init {
            return self.eval_initializer(init, Some(&ty), cs);
        }
        let mut sizes = Vec::with_capacity(dims.len());
        for dim in dims {
            let value = self.eval_expr(dim, cs)?;
            let size = integral_value(&value, "Array dimension").at(cs)?;
            if size < 0 {
                return Err(self
                    .core
                    .throw("java.lang.NegativeArraySizeException", &size.to_string()))
                .at(cs);
            }
            sizes.push(size as usize);
        }
        trace!("allocate {ty} {sizes:?}");
        Ok(self.allocate_array(&ty, &sizes))
    }

    /// Trailing dimensions without a size stay null, typed by the remaining dimensions.
    fn allocate_array(&self, ty: &Type, sizes: &[usize]) -> Value {
        let (Some(element), Some((len, rest))) = (ty.element(), sizes.split_first()) else {
            return default_value(ty);
        };
        let items = (0..*len)
            .map(|_| match rest.is_empty() {
                true => default_value(element),
                false => self.allocate_array(element, rest),
            })
            .collect();
        self.core.new_array(element.clone(), items)
    }

    /// `{...}` initializers. Declared map and collection types build those instead of an
    /// array; without a declared type the array type is inferred.
    pub(crate) fn eval_initializer(
        &mut self,
        init: &ArrayInitializer,
        declared: Option<&Type>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        match declared {
            None => self.eval_loose_initializer(init, cs),
            Some(Type::Array(element)) => self.eval_typed_initializer(init, element, cs),
            Some(Type::Class(class)) => {
                let is_kind = |name: &str| {
                    self.core
                        .class(name)
                        .is_some_and(|kind| class.is_subclass_of(&kind))
                };
                if is_kind("java.util.Map") {
                    self.eval_map_initializer(init, cs)
                } else if is_kind("java.util.Collection") {
                    let mut items = Vec::with_capacity(init.elements.len());
                    for e in &init.elements {
                        items.push(self.eval_element(e, None, cs)?);
                    }
                    Ok(self.core.new_list(items))
                } else if class.same_class(&self.core.object) {
                    self.eval_loose_initializer(init, cs)
                } else {
                    Err(EvalError::eval(
                        format!("Can't initialize {} with an array initializer", class.name),
                        cs,
                    ))
                }
            }
            Some(ty) => Err(EvalError::eval(
                format!("Can't initialize {ty} with an array initializer"),
                cs,
            )),
        }
    }

    fn eval_element(&mut self, e: &Expression, element: Option<&Type>, cs: &mut CallStack) -> EvalResult<Value> {
        let value = match e {
            Expression::ArrayInit(inner) => self.eval_initializer(inner, element, cs)?,
            other => self.eval_expr(other, cs)?,
        };
        if value.is_void() {
            return Err(EvalError::eval("Void in array initializer", cs));
        }
        Ok(value)
    }

    fn eval_typed_initializer(&mut self, init: &ArrayInitializer, element: &Type, cs: &mut CallStack) -> EvalResult<Value> {
        let mut items = Vec::with_capacity(init.elements.len());
        for e in &init.elements {
            let value = self.eval_element(e, Some(element), cs)?;
            let value = coerce(value, element, Conversion::Assignment, &self.core)
                .map_err(|e| e.prefixed("Array element: "))
                .at(cs)?;
            items.push(value);
        }
        Ok(self.core.new_array(element.clone(), items))
    }

    fn eval_map_initializer(&mut self, init: &ArrayInitializer, cs: &mut CallStack) -> EvalResult<Value> {
        let mut entries = Vec::with_capacity(init.elements.len());
        for e in &init.elements {
            let value = self.eval_element(e, None, cs)?;
            let pair = match &value {
                Value::Object(o) => match &*o.data() {
                    ObjectData::Entry(k, v) => Some((k.clone(), v.clone())),
                    _ => None,
                },
                _ => None,
            };
            let Some((key, value)) = pair else {
                return Err(EvalError::eval(
                    format!("Map initializer element is not a key=value entry: {}", type_name(&value)),
                    cs,
                ));
            };
            builtins::put_entry(&mut entries, key, value);
        }
        Ok(self.core.new_map(entries))
    }

    fn collect_init(&mut self, init: &ArrayInitializer, cs: &mut CallStack) -> EvalResult<Vec<InitNode>> {
        let mut nodes = Vec::with_capacity(init.elements.len());
        for e in &init.elements {
            nodes.push(match e {
                Expression::ArrayInit(inner) => InitNode::Nested(self.collect_init(inner, cs)?),
                other => InitNode::Leaf(self.eval_element(other, None, cs)?),
            });
        }
        Ok(nodes)
    }

    fn eval_loose_initializer(&mut self, init: &ArrayInitializer, cs: &mut CallStack) -> EvalResult<Value> {
        let nodes = self.collect_init(init, cs)?;
        let mut leaves = Vec::new();
        collect_leaves(&nodes, &mut leaves);
        let base = common_type(&leaves, &self.core);
        let ty = base.with_dimensions(nesting_depth(&nodes));
        trace!("inferred initializer type {ty}");
        self.build_array(nodes, &ty).at(cs)
    }

    fn build_array(&self, nodes: Vec<InitNode>, ty: &Type) -> UtilResult<Value> {
        let Some(element) = ty.element() else {
            return Err(UtilError::eval(format!("Initializer nests deeper than {ty}")));
        };
        let mut items = Vec::with_capacity(nodes.len());
        for node in nodes {
            items.push(match node {
                InitNode::Leaf(value) => coerce(value, element, Conversion::Assignment, &self.core)
                    .map_err(|e| e.prefixed("Array element: "))?,
                InitNode::Nested(children) => self.build_array(children, element)?,
            });
        }
        Ok(self.core.new_array(element.clone(), items))
    }

    /// `target[from:to:step]`: a copy of the selected elements.
    pub(crate) fn eval_slice(
        &mut self,
        target: &Expression,
        from: Option<&Expression>,
        to: Option<&Expression>,
        step: Option<&Expression>,
        cs: &mut CallStack,
    ) -> EvalResult<Value> {
        let container = self.eval_expr(target, cs)?;
        let mut bound = |e: Option<&Expression>, what: &str, cs: &mut CallStack| -> EvalResult<Option<i64>> {
            match e {
                Some(e) => {
                    let value = self.eval_expr(e, cs)?;
                    integral_value(&value, what).at(cs).map(Some)
                }
                None => Ok(None),
            }
        };
        let from = bound(from, "Slice start", cs)?;
        let to = bound(to, "Slice end", cs)?;
        let step = bound(step, "Slice step", cs)?.unwrap_or(1);
        if step <= 0 {
            return Err(EvalError::eval(format!("Slice step must be positive: {step}"), cs));
        }
        let Value::Object(obj) = &container else {
            return Err(self
                .core
                .throw("java.lang.NullPointerException", "Attempt to slice a null value"))
            .at(cs);
        };
        let step = step as usize;
        let core = self.core();
        match &*obj.data() {
            ObjectData::Array(a) => {
                let items = slice_indices(a.items.len(), from, to, step)
                    .into_iter()
                    .map(|i| a.items[i].clone())
                    .collect();
                Ok(core.new_array(a.element.clone(), items))
            }
            ObjectData::List(list) => {
                let items = slice_indices(list.len(), from, to, step)
                    .into_iter()
                    .map(|i| list[i].clone())
                    .collect();
                Ok(core.new_list(items))
            }
            ObjectData::String(s) => {
                let units = utf16_units(s);
                let picked: Vec<u16> = slice_indices(units.len(), from, to, step)
                    .into_iter()
                    .map(|i| units[i])
                    .collect();
                Ok(core.string(from_utf16_units(&picked)))
            }
            _ => Err(EvalError::eval(
                format!("Can't slice {}", obj.class().name),
                cs,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;

    fn eval(interp: &mut Interpreter, e: Expression) -> Result<Value, EvalError> {
        interp.eval(&program(vec![expr(e)]))
    }

    fn runtime_type(value: &Value) -> String {
        value.as_object().unwrap().runtime_type().name()
    }

    #[test]
    fn loose_initializers_infer_dimensions_and_element_type() {
        let mut interp = Interpreter::new();
        let flat = eval(&mut interp, array(vec![int(1), int(2), int(3)])).unwrap();
        assert_eq!(runtime_type(&flat), "int[]");
        let ragged = eval(
            &mut interp,
            array(vec![array(vec![int(1), int(2)]), array(vec![int(3)])]),
        )
        .unwrap();
        assert_eq!(runtime_type(&ragged), "int[][]");
        let empty = eval(&mut interp, array(vec![array(vec![])])).unwrap();
        assert_eq!(runtime_type(&empty), "java.lang.Object[][]");
        let mixed = eval(&mut interp, array(vec![int(1), double(2.5)])).unwrap();
        assert_eq!(runtime_type(&mixed), "double[]");
        let with_null = eval(&mut interp, array(vec![int(1), null()])).unwrap();
        assert_eq!(runtime_type(&with_null), "java.lang.Integer[]");
    }

    #[test]
    fn negative_sizes_throw() {
        let mut interp = Interpreter::new();
        let err = eval(&mut interp, new_array(int_type(), vec![int(-1)], 0)).unwrap_err();
        assert_eq!(
            err.thrown().unwrap().class_name(),
            "java.lang.NegativeArraySizeException"
        );
    }

    #[test]
    fn trailing_dimensions_stay_null() {
        let mut interp = Interpreter::new();
        let v = eval(&mut interp, new_array(int_type(), vec![int(2)], 1)).unwrap();
        assert_eq!(runtime_type(&v), "int[][]");
        let items = v.as_object().unwrap().elements().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(Value::is_null));
    }

    #[test]
    fn declared_map_types_take_entries() {
        let mut interp = Interpreter::new();
        let v = interp
            .eval(&program(vec![
                var(
                    named("Map"),
                    "m",
                    Some(array(vec![entry(string("a"), int(1)), entry(string("b"), int(2))])),
                ),
                expr(method(name("m"), "get", vec![string("b")])),
            ]))
            .unwrap();
        assert!(v.same(&Value::int(2)));
    }

    #[test]
    fn typed_initializers_coerce_elements() {
        let mut interp = Interpreter::new();
        let v = interp
            .eval(&program(vec![
                var(prim(PrimitiveType::Double).array(), "d", Some(array(vec![int(1), int(2)]))),
                expr(index(name("d"), int(-1))),
            ]))
            .unwrap();
        assert!(v.same(&Value::double(2.0)));
        let err = interp
            .eval(&program(vec![var(int_type().array(), "bad", Some(array(vec![string("x")])))]))
            .unwrap_err();
        assert!(err.message().contains("Array element"));
    }

    #[test]
    fn slices_copy_with_clamped_bounds() {
        assert_eq!(slice_indices(5, Some(1), Some(-1), 1), vec![1, 2, 3]);
        assert_eq!(slice_indices(5, None, Some(99), 2), vec![0, 2, 4]);
        assert!(slice_indices(5, Some(4), Some(2), 1).is_empty());
        let mut interp = Interpreter::new();
        let v = eval(&mut interp, slice(string("abcdef"), Some(int(1)), Some(int(4)))).unwrap();
        assert_eq!(value_to_string(&v), "bcd");
    }
}
