use super::*;

/// The conversion context a value is being converted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Conversion {
    /// Variable and field stores; permits narrowing of int-sized constants.
    Assignment,
    /// Argument passing.
    Invocation,
    /// Explicit casts; failures raise `ClassCastException`.
    Cast,
}

pub(crate) fn unbox(value: &Value) -> Option<Primitive> {
    match value {
        Value::Primitive(p) => Some(*p),
        Value::Object(o) => match &*o.data() {
            ObjectData::Boxed(p) => Some(*p),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn value_type(value: &Value) -> Option<Type> {
    match value {
        Value::Primitive(p) => Some(Type::Primitive(p.ty())),
        Value::Object(o) => Some(o.runtime_type()),
        Value::Void | Value::Null => None,
    }
}

pub(crate) fn type_name(value: &Value) -> String {
    match value {
        Value::Void => "void".to_string(),
        Value::Null => "null".to_string(),
        Value::Primitive(p) => p.ty().name().to_string(),
        Value::Object(o) => o.runtime_type().name(),
    }
}

pub(crate) fn is_type_assignable(from: &Type, to: &Type, boxing: bool, core: &CoreClasses) -> bool {
    match (from, to) {
        (Type::Primitive(a), Type::Primitive(b)) => a.widens_to(*b),
        (Type::Class(a), Type::Class(b)) => a.is_subclass_of(b),
        (Type::Array(a), Type::Array(b)) => match (a.as_ref(), b.as_ref()) {
            (Type::Primitive(x), Type::Primitive(y)) => x == y,
            (x, y) if x.is_primitive() || y.is_primitive() => false,
            (x, y) => is_type_assignable(x, y, false, core),
        },
        (Type::Array(_), Type::Class(b)) => b.name == "java.lang.Object",
        (Type::Primitive(p), Type::Class(c)) => boxing && core.wrapper(*p).is_subclass_of(c),
        (Type::Class(c), Type::Primitive(p)) => {
            boxing && PrimitiveType::from_wrapper_name(&c.name).is_some_and(|q| q.widens_to(*p))
        }
        _ => false,
    }
}

fn is_functional(o: &ObjectRef) -> bool {
    matches!(&*o.data(), ObjectData::This(_) | ObjectData::Lambda(_))
}

/// Whether `value` could be passed where `to` is expected.
pub(crate) fn is_assignable(value: &Value, to: &Type, boxing: bool, core: &CoreClasses) -> bool {
    match value {
        Value::Void => false,
        Value::Null => !to.is_primitive(),
        Value::Object(o) if is_functional(o) && to.as_class().is_some_and(|c| c.is_interface()) => {
            true
        }
        _ => value_type(value).is_some_and(|t| is_type_assignable(&t, to, boxing, core)),
    }
}

fn conversion_failure(value: &Value, to: &Type, conversion: Conversion, core: &CoreClasses) -> UtilError {
    match conversion {
        Conversion::Cast => core.throw(
            "java.lang.ClassCastException",
            &format!("Cannot cast {} to {}", type_name(value), to),
        ),
        _ => UtilError::type_error(format!(
            "Incompatible types: {} cannot be converted to {}",
            type_name(value),
            to
        )),
    }
}

fn narrowing_allowed(p: Primitive, to: PrimitiveType, conversion: Conversion, direct: bool) -> bool {
    p.ty().widens_to(to)
        || conversion == Conversion::Cast
        || (conversion == Conversion::Assignment && direct && p.fits_narrowing(to))
}

fn box_primitive(
    p: Primitive,
    class: &ClassRef,
    conversion: Conversion,
    core: &CoreClasses,
) -> UtilResult<Value> {
    if core.wrapper(p.ty()).is_subclass_of(class) {
        return Ok(core.boxed(p));
    }
    if let Some(target) = PrimitiveType::from_wrapper_name(&class.name) {
        if narrowing_allowed(p, target, conversion, true) {
            if let Some(converted) = p.cast(target) {
                return Ok(core.boxed(converted));
            }
        }
    }
    let value = Value::Primitive(p);
    Err(conversion_failure(&value, &Type::Class(class.clone()), conversion, core))
}

/// Converts `value` to `to` following the promotion lattice, boxing rules and host
/// assignability. Scripted objects and lambdas adapt to interface types.
pub(crate) fn coerce(
    value: Value,
    to: &Type,
    conversion: Conversion,
    core: &CoreClasses,
) -> UtilResult<Value> {
    if value.is_void() {
        return Err(UtilError::eval(format!(
            "Undefined value cannot be converted to {to}"
        )));
    }
    match to {
        Type::Primitive(target) => {
            if value.is_null() {
                return Err(UtilError::type_error(format!(
                    "Can't assign null to primitive type {target}"
                )));
            }
            let Some(p) = unbox(&value) else {
                return Err(conversion_failure(&value, to, conversion, core));
            };
            if p.ty() == *target {
                return Ok(Value::Primitive(p));
            }
            let direct = matches!(value, Value::Primitive(_));
            if narrowing_allowed(p, *target, conversion, direct) {
                if let Some(converted) = p.cast(*target) {
                    return Ok(Value::Primitive(converted));
                }
            }
            Err(conversion_failure(&value, to, conversion, core))
        }
        Type::Class(class) => {
            let obj = match &value {
                Value::Null => return Ok(Value::Null),
                Value::Primitive(p) => return box_primitive(*p, class, conversion, core),
                Value::Object(o) => o.clone(),
                Value::Void => return Err(conversion_failure(&value, to, conversion, core)),
            };
            if obj.class().is_subclass_of(class) && !matches!(&*obj.data(), ObjectData::Array(_)) {
                return Ok(value);
            }
            if class.name == "java.lang.Object" {
                return Ok(value);
            }
            if class.is_interface() {
                match &*obj.data() {
                    ObjectData::This(ns) => {
                        let proxy = ObjectRef::new(class.clone(), ObjectData::Proxy(ns.clone()));
                        return Ok(Value::Object(proxy));
                    }
                    ObjectData::Lambda(_) => return Ok(value.clone()),
                    _ => {}
                }
            }
            Err(conversion_failure(&value, to, conversion, core))
        }
        Type::Array(_) => {
            if value.is_null() {
                return Ok(Value::Null);
            }
            if value_type(&value).is_some_and(|t| is_type_assignable(&t, to, false, core)) {
                Ok(value)
            } else {
                Err(conversion_failure(&value, to, conversion, core))
            }
        }
    }
}

pub(crate) fn default_value(ty: &Type) -> Value {
    match ty {
        Type::Primitive(p) => Value::Primitive(Primitive::default_for(*p)),
        _ => Value::Null,
    }
}

/// Boolean test for `if`, loops and the ternary operator.
pub(crate) fn condition_value(value: &Value) -> UtilResult<bool> {
    if value.is_void() {
        return Err(UtilError::eval("Condition evaluates to void type"));
    }
    match unbox(value).and_then(Primitive::as_bool) {
        Some(b) => Ok(b),
        None => Err(UtilError::eval(format!(
            "Condition must evaluate to a boolean, found: {}",
            type_name(value)
        ))),
    }
}

/// Integral value of an index or dimension expression.
pub(crate) fn integral_value(value: &Value, what: &str) -> UtilResult<i64> {
    match unbox(value) {
        Some(p) if p.ty().promoted() == PrimitiveType::Int || p.ty() == PrimitiveType::Long => {
            p.as_i64().ok_or_else(|| UtilError::eval(format!("{what} must be an integer")))
        }
        _ => Err(UtilError::eval(format!(
            "{what} must be an integer, found: {}",
            type_name(value)
        ))),
    }
}

/// `Object.toString()` rendering that never calls back into script.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::Void => "void".to_string(),
        Value::Null => "null".to_string(),
        Value::Primitive(p) => p.to_string(),
        Value::Object(o) => object_to_string(o),
    }
}

fn join_values<'a>(items: impl Iterator<Item = &'a Value>, owner: &ObjectRef) -> String {
    items
        .map(|v| match v {
            Value::Object(o) if o.ptr_eq(owner) => "(this Collection)".to_string(),
            other => value_to_string(other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn object_to_string(o: &ObjectRef) -> String {
    match &*o.data() {
        ObjectData::String(s) => s.clone(),
        ObjectData::Boxed(p) => p.to_string(),
        ObjectData::Array(a) => format!("{}[]@{:x}", a.element, o.id()),
        ObjectData::List(items) => format!("[{}]", join_values(items.iter(), o)),
        ObjectData::Map(entries) => {
            let body = entries
                .iter()
                .map(|(k, v)| format!("{}={}", value_to_string(k), value_to_string(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{body}}}")
        }
        ObjectData::Entry(k, v) => format!("{}={}", value_to_string(k), value_to_string(v)),
        ObjectData::Class(ty) => match ty.as_class() {
            Some(c) if c.is_interface() => format!("interface {}", c.name),
            Some(c) => format!("class {}", c.name),
            None => ty.name(),
        },
        ObjectData::This(ns) => format!("'this' reference to scope: {}", ns.borrow().name()),
        ObjectData::Throwable(t) => match &t.message {
            Some(msg) => format!("{}: {}", o.class().name, msg),
            None => o.class().name.clone(),
        },
        ObjectData::Lambda(_) => format!("lambda@{:x}", o.id()),
        ObjectData::Plain | ObjectData::Proxy(_) | ObjectData::Iterator { .. } => {
            format!("{}@{:x}", o.class().name, o.id())
        }
    }
}

/// `equals` semantics of the built-in value classes; identity for everything else.
pub(crate) fn value_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) | (Value::Void, Value::Void) => return true,
        (Value::Object(x), Value::Object(y)) if x.ptr_eq(y) => return true,
        _ => {}
    }
    if let (Some(x), Some(y)) = (unbox(a), unbox(b)) {
        let both_boxed = matches!((a, b), (Value::Object(_), Value::Object(_)));
        if both_boxed && x.ty() != y.ty() {
            return false;
        }
        return matches!(
            primitive_ops::binary(BinaryOp::Eq, x, y),
            Ok(Primitive::Boolean(true))
        );
    }
    let (Value::Object(x), Value::Object(y)) = (a, b) else {
        return false;
    };
    match (&*x.data(), &*y.data()) {
        (ObjectData::String(s), ObjectData::String(t)) => s == t,
        (ObjectData::Entry(k1, v1), ObjectData::Entry(k2, v2)) => {
            value_equals(k1, k2) && value_equals(v1, v2)
        }
        (ObjectData::List(l1), ObjectData::List(l2)) => {
            l1.len() == l2.len() && l1.iter().zip(l2).all(|(p, q)| value_equals(p, q))
        }
        _ => false,
    }
}

pub(crate) fn hash_code(value: &Value) -> i32 {
    match unbox(value) {
        Some(Primitive::Boolean(b)) => return if b { 1231 } else { 1237 },
        Some(Primitive::Long(l)) => return (l ^ (l >> 32)) as i32,
        Some(Primitive::Double(d)) => {
            let bits = d.to_bits() as i64;
            return (bits ^ (bits >> 32)) as i32;
        }
        Some(Primitive::Float(f)) => return f.to_bits() as i32,
        Some(p) => return p.as_i64().unwrap_or_default() as i32,
        None => {}
    }
    match value {
        Value::Object(o) => match &*o.data() {
            ObjectData::String(s) => s
                .encode_utf16()
                .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32)),
            _ => o.id() as i32,
        },
        _ => 0,
    }
}

/// Strings index, measure and slice by UTF-16 code unit.
pub(crate) fn utf16_units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

pub(crate) fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Rebuilds text from code units; a surrogate left unpaired by the cut becomes U+FFFD.
pub(crate) fn from_utf16_units(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_type() -> Type {
        Type::Primitive(PrimitiveType::Int)
    }

    #[test]
    fn assignment_narrows_only_fitting_constants() {
        let interp = Interpreter::new();
        let core = interp.core();
        let byte = Type::Primitive(PrimitiveType::Byte);
        let ok = coerce(Value::int(100), &byte, Conversion::Assignment, &core).unwrap();
        assert!(ok.same(&Value::Primitive(Primitive::Byte(100))));
        assert!(coerce(Value::int(300), &byte, Conversion::Assignment, &core).is_err());
        assert!(coerce(Value::int(300), &byte, Conversion::Invocation, &core).is_err());
        let cast = coerce(Value::int(300), &byte, Conversion::Cast, &core).unwrap();
        assert!(cast.same(&Value::Primitive(Primitive::Byte(44))));
    }

    #[test]
    fn widening_and_boolean_isolation() {
        let interp = Interpreter::new();
        let core = interp.core();
        let double = Type::Primitive(PrimitiveType::Double);
        let v = coerce(Value::int(2), &double, Conversion::Assignment, &core).unwrap();
        assert!(v.same(&Value::double(2.0)));
        assert!(coerce(Value::boolean(true), &int_type(), Conversion::Cast, &core).is_err());
        assert!(coerce(Value::Null, &int_type(), Conversion::Assignment, &core).is_err());
        assert!(coerce(Value::Void, &int_type(), Conversion::Assignment, &core).is_err());
    }

    #[test]
    fn boxing_through_supertypes() {
        let interp = Interpreter::new();
        let core = interp.core();
        let number = Type::Class(core.class("java.lang.Number").unwrap());
        let boxed = coerce(Value::int(7), &number, Conversion::Assignment, &core).unwrap();
        let obj = boxed.as_object().unwrap();
        assert_eq!(obj.class().name, "java.lang.Integer");
        assert_eq!(unbox(&boxed), Some(Primitive::Int(7)));
        let back = coerce(boxed.clone(), &int_type(), Conversion::Assignment, &core).unwrap();
        assert!(back.same(&Value::int(7)));
        let string = Type::Class(core.string_class.clone());
        assert!(coerce(boxed, &string, Conversion::Assignment, &core).is_err());
    }

    #[test]
    fn failed_cast_raises_class_cast_exception() {
        let interp = Interpreter::new();
        let core = interp.core();
        let string = Type::Class(core.string_class.clone());
        let err = coerce(Value::int(1), &string, Conversion::Cast, &core).unwrap_err();
        match err {
            UtilError::Target(t) => {
                assert_eq!(t.class_name(), "java.lang.ClassCastException");
                assert!(t.native);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn equality_and_hashing_follow_value_classes() {
        let interp = Interpreter::new();
        let core = interp.core();
        let a = core.string("abc");
        let b = core.string("abc");
        assert!(!a.same(&b));
        assert!(value_equals(&a, &b));
        assert_eq!(hash_code(&a), 96354);
        assert!(value_equals(&core.boxed(Primitive::Int(3)), &Value::long(3)));
        assert!(!value_equals(&core.boxed(Primitive::Int(3)), &core.boxed(Primitive::Long(3))));
        assert_eq!(value_to_string(&Value::double(1.0)), "1.0");
    }

    #[test]
    fn conditions_require_booleans() {
        assert!(condition_value(&Value::boolean(true)).unwrap());
        assert!(condition_value(&Value::int(1)).is_err());
        let err = condition_value(&Value::Void).unwrap_err();
        assert_eq!(err.to_string(), "Condition evaluates to void type");
    }
}
