use super::*;

/// Source of for-each items: a snapshot of a built-in container, or a live
/// `hasNext()`/`next()` iterator driven through method calls.
pub(crate) enum ValueIter {
    Items(std::vec::IntoIter<Value>),
    Host(Value),
}

/// Whether a method `name` is reachable on `obj` by ordinary invocation.
fn responds_to(obj: &ObjectRef, name: &str) -> bool {
    match &*obj.data() {
        ObjectData::This(ns) | ObjectData::Proxy(ns) => {
            let mut scope = Some(ns.clone());
            while let Some(current) = scope {
                if !current.borrow().local_methods(name).is_empty() {
                    return true;
                }
                scope = current.borrow().parent();
            }
            false
        }
        _ => ClassDef::has_method(obj.class(), name),
    }
}

impl Interpreter {
    pub(crate) fn value_iter(&mut self, value: &Value, cs: &mut CallStack) -> EvalResult<ValueIter> {
        let obj = match value {
            Value::Object(o) => o.clone(),
            Value::Null => {
                return Err(self
                    .core
                    .throw("java.lang.NullPointerException", "Attempt to iterate over null"))
                .at(cs);
            }
            other => {
                return Err(EvalError::eval(
                    format!("Can't iterate over type: {}", type_name(other)),
                    cs,
                ));
            }
        };
        let snapshot = match &*obj.data() {
            ObjectData::Array(a) => Some(a.items.clone()),
            ObjectData::List(items) => Some(items.clone()),
            ObjectData::String(s) => Some(s.encode_utf16().map(Value::char_unit).collect()),
            ObjectData::Map(entries) => Some(
                entries
                    .iter()
                    .map(|(k, v)| self.core.new_entry(k.clone(), v.clone()))
                    .collect(),
            ),
            ObjectData::Iterator { items, position } => Some(items[*position..].to_vec()),
            _ => None,
        };
        if let Some(items) = snapshot {
            return Ok(ValueIter::Items(items.into_iter()));
        }
        if responds_to(&obj, "iterator") {
            let iterator = self.invoke_on_value(value, "iterator", Vec::new(), cs)?;
            return match &iterator {
                Value::Object(_) => self.value_iter(&iterator, cs),
                _ => Err(EvalError::eval("iterator() returned no iterator", cs)),
            };
        }
        if responds_to(&obj, "hasNext") && responds_to(&obj, "next") {
            return Ok(ValueIter::Host(value.clone()));
        }
        Err(EvalError::eval(
            format!("Can't iterate over type: {}", obj.class().name),
            cs,
        ))
    }

    pub(crate) fn iter_next(&mut self, iter: &mut ValueIter, cs: &mut CallStack) -> EvalResult<Option<Value>> {
        match iter {
            ValueIter::Items(items) => Ok(items.next()),
            ValueIter::Host(target) => {
                let more = self.invoke_on_value(target, "hasNext", Vec::new(), cs)?;
                if !condition_value(&more).at(cs)? {
                    return Ok(None);
                }
                self.invoke_on_value(target, "next", Vec::new(), cs).map(Some)
            }
        }
    }
}
