mod lang;
mod util;

use super::*;
pub(crate) use util::{map_get, map_put, put_entry};

/// Handles on the classes the evaluator itself creates values of.
pub struct CoreClasses {
    pub object: ClassRef,
    pub string_class: ClassRef,
    /// Marker type answered by unboxed primitives in `instanceof`.
    pub primitive_marker: ClassRef,
    pub this_class: ClassRef,
    pub lambda_class: ClassRef,
    pub class_class: ClassRef,
    pub throwable: ClassRef,
    pub array_list: ClassRef,
    pub hash_map: ClassRef,
    pub entry: ClassRef,
    pub iterator: ClassRef,
    wrappers: FxHashMap<PrimitiveType, ClassRef>,
    registry: Weak<RefCell<ClassRegistry>>,
}

/// Registers the built-in classes and returns handles on the core ones.
pub(crate) fn install(registry: &RegistryRef) -> Rc<CoreClasses> {
    let mut reg = registry.borrow_mut();
    let lang = lang::install(&mut reg);
    let util = util::install(&mut reg, &lang);
    Rc::new(CoreClasses {
        object: lang.object,
        string_class: lang.string,
        primitive_marker: lang.primitive_marker,
        this_class: lang.this_class,
        lambda_class: lang.lambda_class,
        class_class: lang.class_class,
        throwable: lang.throwable,
        array_list: util.array_list,
        hash_map: util.hash_map,
        entry: util.entry,
        iterator: util.iterator,
        wrappers: lang.wrappers,
        registry: Rc::downgrade(registry),
    })
}

impl CoreClasses {
    pub fn class(&self, name: &str) -> Option<ClassRef> {
        self.registry.upgrade()?.borrow().get(name)
    }

    pub fn wrapper(&self, ty: PrimitiveType) -> &ClassRef {
        self.wrappers.get(&ty).unwrap_or(&self.object)
    }

    pub fn boxed(&self, p: Primitive) -> Value {
        Value::Object(ObjectRef::new(self.wrapper(p.ty()).clone(), ObjectData::Boxed(p)))
    }

    pub fn string(&self, s: impl Into<String>) -> Value {
        Value::Object(ObjectRef::new(
            self.string_class.clone(),
            ObjectData::String(s.into()),
        ))
    }

    pub fn class_object(&self, ty: Type) -> Value {
        Value::Object(ObjectRef::new(self.class_class.clone(), ObjectData::Class(ty)))
    }

    pub fn new_array(&self, element: Type, items: Vec<Value>) -> Value {
        Value::Object(ObjectRef::new(
            self.object.clone(),
            ObjectData::Array(ArrayData { element, items }),
        ))
    }

    pub fn new_list(&self, items: Vec<Value>) -> Value {
        Value::Object(ObjectRef::new(self.array_list.clone(), ObjectData::List(items)))
    }

    pub fn new_map(&self, entries: Vec<(Value, Value)>) -> Value {
        Value::Object(ObjectRef::new(self.hash_map.clone(), ObjectData::Map(entries)))
    }

    pub fn new_entry(&self, key: Value, value: Value) -> Value {
        Value::Object(ObjectRef::new(self.entry.clone(), ObjectData::Entry(key, value)))
    }

    pub fn new_iterator(&self, items: Vec<Value>) -> Value {
        Value::Object(ObjectRef::new(
            self.iterator.clone(),
            ObjectData::Iterator { items, position: 0 },
        ))
    }

    pub fn exception(&self, class: &str, message: Option<&str>) -> Value {
        let class = self.class(class).unwrap_or_else(|| self.throwable.clone());
        let data = ThrowableData {
            message: message.map(str::to_string),
            native_origin: None,
        };
        Value::Object(ObjectRef::new(class, ObjectData::Throwable(data)))
    }

    /// A target fault carrying a freshly raised native exception.
    pub fn throw(&self, class: &str, message: &str) -> UtilError {
        let exception = self.exception(class, Some(message));
        if let Value::Object(o) = &exception {
            if let ObjectData::Throwable(t) = &mut *o.data_mut() {
                t.native_origin = Some(true);
            }
        }
        UtilError::Target(Thrown {
            exception,
            native: true,
        })
    }

    pub fn resolve_desc(&self, desc: &TypeDesc) -> UtilResult<Type> {
        match desc {
            TypeDesc::Primitive(p) => Ok(Type::Primitive(*p)),
            TypeDesc::Class(name) => self
                .class(name)
                .map(Type::Class)
                .ok_or_else(|| UtilError::eval(format!("Class not found: {name}"))),
            TypeDesc::Array(element) => Ok(Type::array_of(self.resolve_desc(element)?)),
        }
    }
}

pub(crate) fn arg(args: &[Value], index: usize) -> UtilResult<&Value> {
    args.get(index)
        .ok_or_else(|| UtilError::eval(format!("Missing argument {index}")))
}

pub(crate) fn string_arg(core: &CoreClasses, args: &[Value], index: usize) -> UtilResult<String> {
    match arg(args, index)? {
        Value::Object(o) => o
            .string_value()
            .ok_or_else(|| UtilError::type_error(format!("Argument {index} is not a String"))),
        _ => Err(core.throw("java.lang.NullPointerException", "String argument is null")),
    }
}

pub(crate) fn int_arg(args: &[Value], index: usize) -> UtilResult<i64> {
    integral_value(arg(args, index)?, "Argument")
}

pub(crate) fn double_arg(args: &[Value], index: usize) -> UtilResult<f64> {
    unbox(arg(args, index)?)
        .and_then(Primitive::as_f64)
        .ok_or_else(|| UtilError::type_error(format!("Argument {index} is not numeric")))
}

pub(crate) fn this_object(this: &Value) -> UtilResult<&ObjectRef> {
    this.as_object()
        .ok_or_else(|| UtilError::eval("Instance method invoked without a target"))
}

pub(crate) fn this_string(this: &Value) -> UtilResult<String> {
    this_object(this)?
        .string_value()
        .ok_or_else(|| UtilError::type_error("Target is not a String"))
}

/// Normalizes a collection index, raising `IndexOutOfBoundsException` when out of range.
pub(crate) fn checked_index(core: &CoreClasses, index: i64, len: usize, inclusive: bool) -> UtilResult<usize> {
    let limit = if inclusive { len + 1 } else { len };
    if index < 0 || index as usize >= limit {
        return Err(core.throw(
            "java.lang.IndexOutOfBoundsException",
            &format!("Index {index} out of bounds for length {len}"),
        ));
    }
    Ok(index as usize)
}
