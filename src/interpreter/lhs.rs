use super::*;
use log::warn;

/// A field of a registered class, read and written through whichever storage backs it:
/// the static or instance scope of a generated class, or the native field tables.
#[derive(Clone)]
pub(crate) struct FieldRef {
    pub(crate) class: ClassRef,
    pub(crate) field: Rc<FieldDef>,
}

impl FieldRef {
    pub(crate) fn find(class: &ClassRef, name: &str) -> Option<FieldRef> {
        ClassDef::find_field(class, name).map(|(class, field)| FieldRef { class, field })
    }

    pub(crate) fn is_static(&self) -> bool {
        self.field.modifiers.is_static()
    }

    fn name(&self) -> &str {
        &self.field.name
    }

    pub(crate) fn declared_type(&self, core: &CoreClasses) -> Option<Type> {
        self.field.resolved_type(core).ok().cloned()
    }

    pub(crate) fn get(&self) -> UtilResult<Value> {
        if let Some(ns) = self.class.static_namespace() {
            let ns = ns.borrow();
            return match ns.local_variable(self.name()) {
                Some(var) => var.value(),
                None => Ok(Value::Null),
            };
        }
        Ok(self
            .class
            .statics
            .borrow()
            .get(self.name())
            .cloned()
            .unwrap_or(Value::Null))
    }

    pub(crate) fn set(&self, value: Value, core: &CoreClasses) -> UtilResult<Value> {
        if let Some(ns) = self.class.static_namespace() {
            return Namespace::set_local_variable(&ns, self.name(), value, false);
        }
        let assigned = self.class.statics.borrow().contains_key(self.name());
        if self.field.modifiers.is_final() && assigned {
            return Err(UtilError::FinalVariable(self.field.name.clone()));
        }
        let value = self.converted(value, core)?;
        self.class
            .statics
            .borrow_mut()
            .insert(self.field.name.clone(), value.clone());
        Ok(value)
    }

    pub(crate) fn get_on(&self, obj: &ObjectRef) -> UtilResult<Value> {
        if self.class.is_generated() {
            let ns = self.instance_scope(obj)?;
            let ns = ns.borrow();
            return match ns.local_variable(self.name()) {
                Some(var) => var.value(),
                None => Ok(Value::Null),
            };
        }
        Ok(obj.field(self.name()).unwrap_or(Value::Null))
    }

    pub(crate) fn set_on(&self, obj: &ObjectRef, value: Value, core: &CoreClasses) -> UtilResult<Value> {
        if self.class.is_generated() {
            let ns = self.instance_scope(obj)?;
            return Namespace::set_local_variable(&ns, self.name(), value, false);
        }
        // native fields without a backing scope are never treated as final
        let value = self.converted(value, core)?;
        obj.set_field(self.name(), value.clone());
        Ok(value)
    }

    fn instance_scope(&self, obj: &ObjectRef) -> UtilResult<NsRef> {
        obj.callback_for(&self.class).ok_or_else(|| {
            UtilError::eval(format!(
                "No instance scope for {} on {}",
                self.class.name,
                obj.class().name
            ))
        })
    }

    fn converted(&self, value: Value, core: &CoreClasses) -> UtilResult<Value> {
        let ty = self.field.resolved_type(core)?;
        coerce(value, ty, Conversion::Assignment, core)
            .map_err(|e| e.prefixed(&format!("Field assignment: {}: ", self.field.name)))
    }
}

/// Where an assignment lands.
pub(crate) enum Lhs {
    Variable {
        scope: NsRef,
        name: String,
        /// Assign in `scope` itself instead of the nearest existing binding.
        local_only: bool,
    },
    Field {
        field: FieldRef,
        target: Option<ObjectRef>,
    },
    Property {
        target: Value,
        key: Value,
    },
    Index {
        container: ObjectRef,
        index: i64,
    },
    MapEntry {
        map: ObjectRef,
        key: Value,
    },
    Slice,
    /// The result of a computation, readable but never assignable.
    Value(Value),
}

/// Resolves a possibly negative index against `len`.
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

fn capitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Interpreter {
    pub(crate) fn lhs_get(&mut self, lhs: &Lhs, cs: &mut CallStack) -> EvalResult<Value> {
        match lhs {
            Lhs::Variable { scope, name, .. } => {
                let value = scope.borrow().get_value(name, true).at(cs)?;
                match value {
                    Some(v) => Ok(v),
                    None if self.config.strict_java => {
                        Err(EvalError::eval(format!("Undefined variable: {name}"), cs))
                    }
                    None => Ok(Value::Void),
                }
            }
            Lhs::Field { field, target } => {
                self.check_field_access(field, target.as_ref(), cs)?;
                match target {
                    Some(obj) => field.get_on(obj).at(cs),
                    None => field.get().at(cs),
                }
            }
            Lhs::Property { target, key } => self.property_get(target, key, cs),
            Lhs::Index { container, index } => self.index_get(container, *index, cs),
            Lhs::MapEntry { map, key } => match &*map.data() {
                ObjectData::Map(entries) => Ok(builtins::map_get(entries, key).unwrap_or(Value::Null)),
                _ => Ok(Value::Null),
            },
            Lhs::Slice => Err(EvalError::eval("Slice is not an assignable reference", cs)),
            Lhs::Value(v) => Ok(v.clone()),
        }
    }

    pub(crate) fn lhs_assign(&mut self, lhs: &Lhs, value: Value, cs: &mut CallStack) -> EvalResult<Value> {
        if value.is_void() {
            return Err(EvalError::eval("Can't assign void value", cs));
        }
        let core = self.core();
        match lhs {
            Lhs::Variable {
                scope,
                name,
                local_only,
            } => {
                let strict = self.config.strict_java;
                if *local_only {
                    Namespace::set_local_variable(scope, name, value, strict).at(cs)
                } else {
                    Namespace::set_variable(scope, name, value, strict, true).at(cs)
                }
            }
            Lhs::Field { field, target } => {
                self.check_field_access(field, target.as_ref(), cs)?;
                match target {
                    Some(obj) => field.set_on(obj, value, &core).at(cs),
                    None => field.set(value, &core).at(cs),
                }
            }
            Lhs::Property { target, key } => self.property_set(target, key, value, cs),
            Lhs::Index { container, index } => self.index_set(container, *index, value, cs),
            Lhs::MapEntry { map, key } => {
                builtins::map_put(map, key.clone(), value.clone()).at(cs)?;
                Ok(value)
            }
            Lhs::Slice => Err(EvalError::eval("Can't assign to a slice", cs)),
            Lhs::Value(_) => Err(EvalError::eval("Can't assign to a computed value", cs)),
        }
    }

    fn check_field_access(&self, field: &FieldRef, target: Option<&ObjectRef>, cs: &CallStack) -> EvalResult<()> {
        let target = target.map(|o| Value::Object(o.clone()));
        self.guards
            .access_field(&field.class, target.as_ref(), &field.field.name)
            .at(cs)
    }

    fn out_of_bounds(&self, container: &ObjectRef, index: i64, len: usize) -> UtilError {
        let class = match &*container.data() {
            ObjectData::Array(_) => "java.lang.ArrayIndexOutOfBoundsException",
            ObjectData::String(_) => "java.lang.StringIndexOutOfBoundsException",
            _ => "java.lang.IndexOutOfBoundsException",
        };
        self.core.throw(
            class,
            &format!("Index {index} out of bounds for length {len}"),
        )
    }

    pub(crate) fn index_get(&mut self, container: &ObjectRef, index: i64, cs: &CallStack) -> EvalResult<Value> {
        let found = match &*container.data() {
            ObjectData::Array(a) => Ok(normalize_index(index, a.items.len()).map(|i| a.items[i].clone())),
            ObjectData::List(items) => Ok(normalize_index(index, items.len()).map(|i| items[i].clone())),
            ObjectData::String(s) => {
                let units = utf16_units(s);
                Ok(normalize_index(index, units.len()).map(|i| Value::char_unit(units[i])))
            }
            _ => Err(UtilError::type_error(format!(
                "Not an array or list: {}",
                container.class().name
            ))),
        };
        match found.at(cs)? {
            Some(v) => Ok(v),
            None => {
                let len = self.container_len(container);
                Err(self.out_of_bounds(container, index, len)).at(cs)
            }
        }
    }

    fn container_len(&self, container: &ObjectRef) -> usize {
        match &*container.data() {
            ObjectData::Array(a) => a.items.len(),
            ObjectData::List(items) => items.len(),
            ObjectData::String(s) => utf16_len(s),
            _ => 0,
        }
    }

    fn index_set(&mut self, container: &ObjectRef, index: i64, value: Value, cs: &CallStack) -> EvalResult<Value> {
        let core = self.core();
        let len = self.container_len(container);
        let Some(at) = normalize_index(index, len) else {
            return Err(self.out_of_bounds(container, index, len)).at(cs);
        };
        let element = match &*container.data() {
            ObjectData::Array(a) => Some(a.element.clone()),
            ObjectData::List(_) => None,
            _ => {
                return Err(EvalError::eval(
                    format!("Can't assign into an element of {}", container.class().name),
                    cs,
                ));
            }
        };
        let value = match element {
            Some(ty) => coerce(value, &ty, Conversion::Assignment, &core)
                .map_err(|e| e.prefixed("Array element: "))
                .at(cs)?,
            None => value,
        };
        match &mut *container.data_mut() {
            ObjectData::Array(a) => a.items[at] = value.clone(),
            ObjectData::List(items) => items[at] = value.clone(),
            _ => {}
        }
        Ok(value)
    }

    fn property_get(&mut self, target: &Value, key: &Value, cs: &mut CallStack) -> EvalResult<Value> {
        let Value::Object(obj) = target else {
            return Err(EvalError::eval("Attempt to access property on null value", cs));
        };
        if let ObjectData::Map(entries) = &*obj.data() {
            if self.config.strict_java {
                return Err(EvalError::eval("Map property access is not permitted in strict mode", cs));
            }
            return Ok(builtins::map_get(entries, key).unwrap_or(Value::Null));
        }
        let name = value_to_string(key);
        if let ObjectData::This(ns) | ObjectData::Proxy(ns) = &*obj.data() {
            let found = ns.borrow().get_value(&name, true).at(cs)?;
            return Ok(found.unwrap_or(Value::Void));
        }
        let getter = format!("get{}", capitalized(&name));
        let class = obj.class().clone();
        if ClassDef::has_method(&class, &getter) {
            return self.invoke_on_value(target, &getter, Vec::new(), cs);
        }
        let flag = format!("is{}", capitalized(&name));
        if ClassDef::has_method(&class, &flag) {
            return self.invoke_on_value(target, &flag, Vec::new(), cs);
        }
        Err(EvalError::eval(
            format!("Property: {name} not found in class {}", class.name),
            cs,
        ))
    }

    fn property_set(&mut self, target: &Value, key: &Value, value: Value, cs: &mut CallStack) -> EvalResult<Value> {
        let Value::Object(obj) = target else {
            return Err(EvalError::eval("Attempt to set property on null value", cs));
        };
        if matches!(&*obj.data(), ObjectData::Map(_)) {
            if self.config.strict_java {
                return Err(EvalError::eval("Map property access is not permitted in strict mode", cs));
            }
            builtins::map_put(obj, key.clone(), value.clone()).at(cs)?;
            return Ok(value);
        }
        let name = value_to_string(key);
        let scope = match &*obj.data() {
            ObjectData::This(ns) | ObjectData::Proxy(ns) => Some(ns.clone()),
            _ => None,
        };
        if let Some(ns) = scope {
            return Namespace::set_local_variable(&ns, &name, value, self.config.strict_java).at(cs);
        }
        let setter = format!("set{}", capitalized(&name));
        if !ClassDef::has_method(obj.class(), &setter) {
            return Err(EvalError::eval(
                format!("Property: {name} not found in class {}", obj.class().name),
                cs,
            ));
        }
        self.invoke_on_value(target, &setter, vec![value.clone()], cs)?;
        Ok(value)
    }

    /// Field read used by `a.b` chains: fields first, then bean getters.
    pub(crate) fn field_value(&mut self, target: &Value, name: &str, cs: &mut CallStack) -> EvalResult<Value> {
        let lhs = self.field_lhs(target, name, cs)?;
        match lhs {
            Lhs::Property { target, key } => {
                warn!("no field {name}; falling back to bean property");
                self.property_get(&target, &key, cs)
            }
            other => self.lhs_get(&other, cs),
        }
    }

    /// Builds the reference for `target.name` without reading it.
    pub(crate) fn field_lhs(&mut self, target: &Value, name: &str, cs: &mut CallStack) -> EvalResult<Lhs> {
        let obj = match target {
            Value::Object(o) => o.clone(),
            Value::Null | Value::Void => {
                return Err(self.core.throw(
                    "java.lang.NullPointerException",
                    &format!("Attempt to access field '{name}' on null value"),
                ))
                .at(cs);
            }
            Value::Primitive(p) => {
                return Err(EvalError::eval(
                    format!("Attempt to access field '{name}' on primitive {}", p.ty()),
                    cs,
                ));
            }
        };
        if name == "length" {
            if let Some(len) = obj.array_len() {
                return Ok(Lhs::Value(Value::int(len as i32)));
            }
        }
        let scope = match &*obj.data() {
            ObjectData::This(ns) | ObjectData::Proxy(ns) => Some(ns.clone()),
            _ => None,
        };
        if let Some(scope) = scope {
            return Ok(Lhs::Variable {
                scope,
                name: name.to_string(),
                local_only: true,
            });
        }
        if let Some(field) = FieldRef::find(obj.class(), name) {
            let target = (!field.is_static()).then_some(obj);
            return Ok(Lhs::Field { field, target });
        }
        let core = self.core();
        Ok(Lhs::Property {
            target: target.clone(),
            key: core.string(name),
        })
    }

    /// Static field reference on a class.
    pub(crate) fn static_field_lhs(&self, class: &ClassRef, name: &str, cs: &CallStack) -> EvalResult<Lhs> {
        match FieldRef::find(class, name) {
            Some(field) if field.is_static() => Ok(Lhs::Field { field, target: None }),
            Some(_) => Err(EvalError::eval(
                format!("Can't reach instance field: {name} from static context: {}", class.name),
                cs,
            )),
            None => Err(UtilError::NoSuchMember(format!(
                "No static field or inner class: {name} of {}",
                class.name
            )))
            .at(cs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_count_from_the_end() {
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(-3, 3), Some(0));
        assert_eq!(normalize_index(-4, 3), None);
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(0, 0), None);
    }

    #[test]
    fn native_static_fields_honour_final() {
        let interp = Interpreter::new();
        let core = interp.core();
        let max = FieldRef::find(core.wrapper(PrimitiveType::Int), "MAX_VALUE").unwrap();
        assert!(max.is_static());
        assert!(max.get().unwrap().same(&Value::int(i32::MAX)));
        let err = max.set(Value::int(0), &core).unwrap_err();
        assert!(matches!(err, UtilError::FinalVariable(_)));
    }

    #[test]
    fn slices_and_results_reject_assignment() {
        let mut interp = Interpreter::new();
        let mut cs = CallStack::new(interp.global_namespace());
        assert!(interp.lhs_assign(&Lhs::Slice, Value::int(1), &mut cs).is_err());
        let err = interp
            .lhs_assign(&Lhs::Value(Value::int(1)), Value::int(2), &mut cs)
            .unwrap_err();
        assert_eq!(err.message(), "Can't assign to a computed value");
    }

    #[test]
    fn capitalization_for_bean_accessors() {
        assert_eq!(capitalized("name"), "Name");
        assert_eq!(capitalized(""), "");
    }
}
