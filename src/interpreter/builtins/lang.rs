use super::super::*;
use super::{arg, double_arg, int_arg, string_arg, this_object, this_string};

pub(super) struct LangClasses {
    pub(super) object: ClassRef,
    pub(super) string: ClassRef,
    pub(super) primitive_marker: ClassRef,
    pub(super) this_class: ClassRef,
    pub(super) lambda_class: ClassRef,
    pub(super) class_class: ClassRef,
    pub(super) throwable: ClassRef,
    pub(super) wrappers: FxHashMap<PrimitiveType, ClassRef>,
}

const EXCEPTIONS: &[(&str, &str)] = &[
    ("java.lang.Exception", "java.lang.Throwable"),
    ("java.lang.Error", "java.lang.Throwable"),
    ("java.lang.RuntimeException", "java.lang.Exception"),
    ("java.lang.InterruptedException", "java.lang.Exception"),
    ("java.lang.ArithmeticException", "java.lang.RuntimeException"),
    ("java.lang.ClassCastException", "java.lang.RuntimeException"),
    ("java.lang.NullPointerException", "java.lang.RuntimeException"),
    ("java.lang.IllegalArgumentException", "java.lang.RuntimeException"),
    ("java.lang.NumberFormatException", "java.lang.IllegalArgumentException"),
    ("java.lang.IllegalStateException", "java.lang.RuntimeException"),
    ("java.lang.UnsupportedOperationException", "java.lang.RuntimeException"),
    ("java.lang.NegativeArraySizeException", "java.lang.RuntimeException"),
    ("java.lang.IndexOutOfBoundsException", "java.lang.RuntimeException"),
    (
        "java.lang.ArrayIndexOutOfBoundsException",
        "java.lang.IndexOutOfBoundsException",
    ),
    (
        "java.lang.StringIndexOutOfBoundsException",
        "java.lang.IndexOutOfBoundsException",
    ),
    ("java.util.NoSuchElementException", "java.lang.RuntimeException"),
];

pub(super) fn install(reg: &mut ClassRegistry) -> LangClasses {
    let object = reg.register(object_class());
    let comparable = reg.register(
        ClassBuilder::interface("java.lang.Comparable")
            .abstract_method("compareTo", &["java.lang.Object"])
            .build(),
    );
    reg.register(
        ClassBuilder::interface("java.lang.Runnable")
            .abstract_method("run", &[])
            .build(),
    );
    reg.register(
        ClassBuilder::interface("java.lang.Iterable")
            .abstract_method("iterator", &[])
            .build(),
    );
    let string = reg.register(string_class(&object, &comparable));
    let number = reg.register(number_class(&object));

    let mut wrappers = FxHashMap::default();
    for ty in PrimitiveType::ALL {
        let class = match ty {
            PrimitiveType::Boolean => boolean_class(&object, &comparable),
            PrimitiveType::Char => character_class(&object, &comparable),
            _ => numeric_wrapper(ty, &number, &comparable),
        };
        wrappers.insert(ty, reg.register(class));
    }

    reg.register(math_class(&object));
    let class_class = reg.register(class_class(&object));

    let throwable = reg.register(throwable_class("java.lang.Throwable", &object));
    for (name, parent) in EXCEPTIONS {
        if let Some(parent) = reg.get(parent) {
            reg.register(throwable_class(name, &parent));
        }
    }

    let marker = |name: &str| ClassBuilder::class(name).extends(&object).build();
    let primitive_marker = reg.register(marker("beanscript.Primitive"));
    let this_class = reg.register(marker("beanscript.This"));
    let lambda_class = reg.register(marker("beanscript.Lambda"));

    LangClasses {
        object,
        string,
        primitive_marker,
        this_class,
        lambda_class,
        class_class,
        throwable,
        wrappers,
    }
}

fn object_class() -> ClassRef {
    ClassBuilder::class("java.lang.Object")
        .constructor(&[], |_interp, _this, _args| Ok(()))
        .method("toString", &[], |interp, this, _args| {
            Ok(interp.core().string(value_to_string(this)))
        })
        .method("equals", &["java.lang.Object"], |_interp, this, args| {
            Ok(Value::boolean(value_equals(this, arg(args, 0)?)))
        })
        .method("hashCode", &[], |_interp, this, _args| {
            Ok(Value::int(hash_code(this)))
        })
        .method("getClass", &[], |interp, this, _args| {
            let ty = this_object(this)?.runtime_type();
            Ok(interp.core().class_object(ty))
        })
        .build()
}

fn char_index(s: &str, byte_index: Option<usize>) -> Value {
    match byte_index {
        Some(b) => Value::int(utf16_len(&s[..b]) as i32),
        None => Value::int(-1),
    }
}

fn compare_strings(a: &str, b: &str) -> i32 {
    for (x, y) in a.encode_utf16().zip(b.encode_utf16()) {
        if x != y {
            return x as i32 - y as i32;
        }
    }
    utf16_len(a) as i32 - utf16_len(b) as i32
}

fn substring(core: &CoreClasses, s: &str, from: i64, to: Option<i64>) -> UtilResult<Value> {
    let units = utf16_units(s);
    let to = to.unwrap_or(units.len() as i64);
    if from < 0 || to > units.len() as i64 || from > to {
        return Err(core.throw(
            "java.lang.StringIndexOutOfBoundsException",
            &format!("begin {from}, end {to}, length {}", units.len()),
        ));
    }
    Ok(core.string(from_utf16_units(&units[from as usize..to as usize])))
}

fn string_class(object: &ClassRef, comparable: &ClassRef) -> ClassRef {
    ClassBuilder::class("java.lang.String")
        .extends(object)
        .implements(comparable)
        .modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
        .constructor(&[], |_interp, this, _args| {
            *this.data_mut() = ObjectData::String(String::new());
            Ok(())
        })
        .constructor(&["java.lang.String"], |interp, this, args| {
            let s = string_arg(&interp.core(), args, 0)?;
            *this.data_mut() = ObjectData::String(s);
            Ok(())
        })
        .method("length", &[], |_interp, this, _args| {
            Ok(Value::int(utf16_len(&this_string(this)?) as i32))
        })
        .method("isEmpty", &[], |_interp, this, _args| {
            Ok(Value::boolean(this_string(this)?.is_empty()))
        })
        .method("charAt", &["int"], |interp, this, args| {
            let s = this_string(this)?;
            let index = int_arg(args, 0)?;
            match usize::try_from(index).ok().and_then(|i| s.encode_utf16().nth(i)) {
                Some(unit) => Ok(Value::char_unit(unit)),
                None => Err(interp.core().throw(
                    "java.lang.StringIndexOutOfBoundsException",
                    &format!("index {index}, length {}", utf16_len(&s)),
                )),
            }
        })
        .method("substring", &["int"], |interp, this, args| {
            substring(&interp.core(), &this_string(this)?, int_arg(args, 0)?, None)
        })
        .method("substring", &["int", "int"], |interp, this, args| {
            let to = int_arg(args, 1)?;
            substring(&interp.core(), &this_string(this)?, int_arg(args, 0)?, Some(to))
        })
        .method("indexOf", &["java.lang.String"], |interp, this, args| {
            let s = this_string(this)?;
            let needle = string_arg(&interp.core(), args, 0)?;
            Ok(char_index(&s, s.find(&needle)))
        })
        .method("indexOf", &["char"], |_interp, this, args| {
            let s = this_string(this)?;
            let c = value_to_string(arg(args, 0)?);
            Ok(char_index(&s, s.find(&c)))
        })
        .method("lastIndexOf", &["java.lang.String"], |interp, this, args| {
            let s = this_string(this)?;
            let needle = string_arg(&interp.core(), args, 0)?;
            Ok(char_index(&s, s.rfind(&needle)))
        })
        .method("contains", &["java.lang.String"], |interp, this, args| {
            let needle = string_arg(&interp.core(), args, 0)?;
            Ok(Value::boolean(this_string(this)?.contains(&needle)))
        })
        .method("startsWith", &["java.lang.String"], |interp, this, args| {
            let prefix = string_arg(&interp.core(), args, 0)?;
            Ok(Value::boolean(this_string(this)?.starts_with(&prefix)))
        })
        .method("endsWith", &["java.lang.String"], |interp, this, args| {
            let suffix = string_arg(&interp.core(), args, 0)?;
            Ok(Value::boolean(this_string(this)?.ends_with(&suffix)))
        })
        .method("toUpperCase", &[], |interp, this, _args| {
            Ok(interp.core().string(this_string(this)?.to_uppercase()))
        })
        .method("toLowerCase", &[], |interp, this, _args| {
            Ok(interp.core().string(this_string(this)?.to_lowercase()))
        })
        .method("trim", &[], |interp, this, _args| {
            Ok(interp.core().string(this_string(this)?.trim()))
        })
        .method("concat", &["java.lang.String"], |interp, this, args| {
            let core = interp.core();
            let tail = string_arg(&core, args, 0)?;
            Ok(core.string(this_string(this)? + &tail))
        })
        .method(
            "replace",
            &["java.lang.String", "java.lang.String"],
            |interp, this, args| {
                let core = interp.core();
                let from = string_arg(&core, args, 0)?;
                let to = string_arg(&core, args, 1)?;
                Ok(core.string(this_string(this)?.replace(&from, &to)))
            },
        )
        .method("split", &["java.lang.String"], |interp, this, args| {
            let core = interp.core();
            let s = this_string(this)?;
            let separator = string_arg(&core, args, 0)?;
            let mut parts: Vec<String> = if separator.is_empty() {
                s.chars().map(String::from).collect()
            } else {
                s.split(separator.as_str()).map(str::to_string).collect()
            };
            while parts.last().is_some_and(|p| p.is_empty()) {
                parts.pop();
            }
            let items = parts.into_iter().map(|p| core.string(p)).collect();
            Ok(core.new_array(Type::Class(core.string_class.clone()), items))
        })
        .method("toCharArray", &[], |interp, this, _args| {
            let items = this_string(this)?.encode_utf16().map(Value::char_unit).collect();
            Ok(interp
                .core()
                .new_array(Type::Primitive(PrimitiveType::Char), items))
        })
        .method("equals", &["java.lang.Object"], |_interp, this, args| {
            Ok(Value::boolean(value_equals(this, arg(args, 0)?)))
        })
        .method("equalsIgnoreCase", &["java.lang.String"], |_interp, this, args| {
            let other = match arg(args, 0)? {
                Value::Object(o) => o.string_value(),
                _ => None,
            };
            let s = this_string(this)?;
            Ok(Value::boolean(
                other.is_some_and(|o| o.to_lowercase() == s.to_lowercase()),
            ))
        })
        .method("compareTo", &["java.lang.Object"], |interp, this, args| {
            let other = string_arg(&interp.core(), args, 0)?;
            Ok(Value::int(compare_strings(&this_string(this)?, &other)))
        })
        .method("toString", &[], |_interp, this, _args| Ok(this.clone()))
        .static_method("valueOf", &["java.lang.Object"], |interp, _this, args| {
            let s = interp.stringify_value(arg(args, 0)?)?;
            Ok(interp.core().string(s))
        })
        .build()
}

fn number_class(object: &ClassRef) -> ClassRef {
    let mut builder = ClassBuilder::class("java.lang.Number")
        .extends(object)
        .modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT);
    for (name, ty) in [
        ("byteValue", PrimitiveType::Byte),
        ("shortValue", PrimitiveType::Short),
        ("intValue", PrimitiveType::Int),
        ("longValue", PrimitiveType::Long),
        ("floatValue", PrimitiveType::Float),
        ("doubleValue", PrimitiveType::Double),
    ] {
        builder = builder.method(name, &[], move |_interp, this, _args| {
            unbox(this)
                .and_then(|p| p.cast(ty))
                .map(Value::Primitive)
                .ok_or_else(|| UtilError::type_error("Not a number"))
        });
    }
    builder.build()
}

fn wrapper_common(builder: ClassBuilder, ty: PrimitiveType) -> ClassBuilder {
    builder
        .constructor(&[ty.name()], move |_interp, this, args| {
            let p = unbox(arg(args, 0)?).and_then(|p| p.cast(ty));
            let p = p.ok_or_else(|| UtilError::type_error("Bad wrapper value"))?;
            *this.data_mut() = ObjectData::Boxed(p);
            Ok(())
        })
        .static_method("valueOf", &[ty.name()], move |interp, _this, args| {
            let p = unbox(arg(args, 0)?).and_then(|p| p.cast(ty));
            p.map(|p| interp.core().boxed(p))
                .ok_or_else(|| UtilError::type_error("Bad wrapper value"))
        })
        .method("equals", &["java.lang.Object"], |_interp, this, args| {
            Ok(Value::boolean(value_equals(this, arg(args, 0)?)))
        })
        .method("hashCode", &[], |_interp, this, _args| Ok(Value::int(hash_code(this))))
        .method("toString", &[], |interp, this, _args| {
            Ok(interp.core().string(value_to_string(this)))
        })
        .method("compareTo", &["java.lang.Object"], |_interp, this, args| {
            let (Some(a), Some(b)) = (unbox(this), unbox(arg(args, 0)?)) else {
                return Err(UtilError::type_error("compareTo: incomparable values"));
            };
            let ordering = match (a.as_bool(), b.as_bool()) {
                (Some(x), Some(y)) => x.cmp(&y) as i32,
                _ => {
                    let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
                    x.partial_cmp(&y).map_or(0, |o| o as i32)
                }
            };
            Ok(Value::int(ordering))
        })
}

fn parse_primitive(core: &CoreClasses, ty: PrimitiveType, text: &str) -> UtilResult<Primitive> {
    let parsed = match ty {
        PrimitiveType::Byte => text.parse().ok().map(Primitive::Byte),
        PrimitiveType::Short => text.parse().ok().map(Primitive::Short),
        PrimitiveType::Int => text.parse().ok().map(Primitive::Int),
        PrimitiveType::Long => text.parse().ok().map(Primitive::Long),
        PrimitiveType::Float => text.trim().parse().ok().map(Primitive::Float),
        PrimitiveType::Double => text.trim().parse().ok().map(Primitive::Double),
        PrimitiveType::Boolean => Some(Primitive::Boolean(text.eq_ignore_ascii_case("true"))),
        PrimitiveType::Char => None,
    };
    parsed.ok_or_else(|| {
        core.throw(
            "java.lang.NumberFormatException",
            &format!("For input string: \"{text}\""),
        )
    })
}

fn numeric_wrapper(ty: PrimitiveType, number: &ClassRef, comparable: &ClassRef) -> ClassRef {
    let simple = ty.wrapper_name().rsplit('.').next().unwrap_or_default();
    let parse_name = match ty {
        PrimitiveType::Int => "parseInt".to_string(),
        _ => format!("parse{simple}"),
    };
    let builder = ClassBuilder::class(ty.wrapper_name())
        .extends(number)
        .implements(comparable)
        .modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
        .constructor(&["java.lang.String"], move |interp, this, args| {
            let core = interp.core();
            let p = parse_primitive(&core, ty, &string_arg(&core, args, 0)?)?;
            *this.data_mut() = ObjectData::Boxed(p);
            Ok(())
        })
        .static_method(&parse_name, &["java.lang.String"], move |interp, _this, args| {
            let core = interp.core();
            let p = parse_primitive(&core, ty, &string_arg(&core, args, 0)?)?;
            Ok(Value::Primitive(p))
        });
    let builder = match ty {
        PrimitiveType::Byte => builder
            .constant("MIN_VALUE", "byte", Value::Primitive(Primitive::Byte(i8::MIN)))
            .constant("MAX_VALUE", "byte", Value::Primitive(Primitive::Byte(i8::MAX))),
        PrimitiveType::Short => builder
            .constant("MIN_VALUE", "short", Value::Primitive(Primitive::Short(i16::MIN)))
            .constant("MAX_VALUE", "short", Value::Primitive(Primitive::Short(i16::MAX))),
        PrimitiveType::Int => builder
            .constant("MIN_VALUE", "int", Value::int(i32::MIN))
            .constant("MAX_VALUE", "int", Value::int(i32::MAX)),
        PrimitiveType::Long => builder
            .constant("MIN_VALUE", "long", Value::long(i64::MIN))
            .constant("MAX_VALUE", "long", Value::long(i64::MAX)),
        PrimitiveType::Float => builder
            .constant("MIN_VALUE", "float", Value::Primitive(Primitive::Float(f32::from_bits(1))))
            .constant("MAX_VALUE", "float", Value::Primitive(Primitive::Float(f32::MAX))),
        _ => builder
            .constant("MIN_VALUE", "double", Value::double(f64::from_bits(1)))
            .constant("MAX_VALUE", "double", Value::double(f64::MAX))
            .static_method("isNaN", &["double"], |_interp, _this, args| {
                Ok(Value::boolean(double_arg(args, 0)?.is_nan()))
            }),
    };
    wrapper_common(builder, ty).build()
}

fn boolean_class(object: &ClassRef, comparable: &ClassRef) -> ClassRef {
    let builder = ClassBuilder::class("java.lang.Boolean")
        .extends(object)
        .implements(comparable)
        .modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
        .method("booleanValue", &[], |_interp, this, _args| {
            unbox(this)
                .map(Value::Primitive)
                .ok_or_else(|| UtilError::type_error("Not a boolean"))
        })
        .static_method("parseBoolean", &["java.lang.String"], |_interp, _this, args| {
            let text = match arg(args, 0)? {
                Value::Object(o) => o.string_value().unwrap_or_default(),
                _ => String::new(),
            };
            Ok(Value::boolean(text.eq_ignore_ascii_case("true")))
        });
    wrapper_common(builder, PrimitiveType::Boolean).build()
}

fn char_arg(args: &[Value]) -> UtilResult<char> {
    match unbox(arg(args, 0)?) {
        Some(Primitive::Char(unit)) => Ok(char::from_u32(unit as u32).unwrap_or('\u{fffd}')),
        _ => Err(UtilError::type_error("Expected a char")),
    }
}

fn character_class(object: &ClassRef, comparable: &ClassRef) -> ClassRef {
    let mut builder = ClassBuilder::class("java.lang.Character")
        .extends(object)
        .implements(comparable)
        .modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
        .method("charValue", &[], |_interp, this, _args| {
            unbox(this)
                .map(Value::Primitive)
                .ok_or_else(|| UtilError::type_error("Not a char"))
        })
        .static_method("toUpperCase", &["char"], |_interp, _this, args| {
            let c = char_arg(args)?;
            Ok(Value::char(c.to_uppercase().next().unwrap_or(c)))
        })
        .static_method("toLowerCase", &["char"], |_interp, _this, args| {
            let c = char_arg(args)?;
            Ok(Value::char(c.to_lowercase().next().unwrap_or(c)))
        });
    let predicates: [(&str, fn(char) -> bool); 6] = [
        ("isDigit", |c| c.is_ascii_digit()),
        ("isLetter", char::is_alphabetic),
        ("isLetterOrDigit", char::is_alphanumeric),
        ("isWhitespace", char::is_whitespace),
        ("isUpperCase", char::is_uppercase),
        ("isLowerCase", char::is_lowercase),
    ];
    for (name, test) in predicates {
        builder = builder.static_method(name, &["char"], move |_interp, _this, args| {
            Ok(Value::boolean(test(char_arg(args)?)))
        });
    }
    wrapper_common(builder, PrimitiveType::Char).build()
}

fn math_class(object: &ClassRef) -> ClassRef {
    let unary: [(&str, fn(f64) -> f64); 7] = [
        ("sqrt", f64::sqrt),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("exp", f64::exp),
        ("log", f64::ln),
        ("sin", f64::sin),
        ("cos", f64::cos),
    ];
    let mut builder = ClassBuilder::class("java.lang.Math")
        .extends(object)
        .modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
        .constant("PI", "double", Value::double(std::f64::consts::PI))
        .constant("E", "double", Value::double(std::f64::consts::E))
        .static_method("abs", &["int"], |_interp, _this, args| {
            Ok(Value::int((int_arg(args, 0)? as i32).wrapping_abs()))
        })
        .static_method("abs", &["long"], |_interp, _this, args| {
            Ok(Value::long(int_arg(args, 0)?.wrapping_abs()))
        })
        .static_method("abs", &["double"], |_interp, _this, args| {
            Ok(Value::double(double_arg(args, 0)?.abs()))
        })
        .static_method("max", &["int", "int"], |_interp, _this, args| {
            Ok(Value::int(int_arg(args, 0)?.max(int_arg(args, 1)?) as i32))
        })
        .static_method("max", &["long", "long"], |_interp, _this, args| {
            Ok(Value::long(int_arg(args, 0)?.max(int_arg(args, 1)?)))
        })
        .static_method("max", &["double", "double"], |_interp, _this, args| {
            Ok(Value::double(double_arg(args, 0)?.max(double_arg(args, 1)?)))
        })
        .static_method("min", &["int", "int"], |_interp, _this, args| {
            Ok(Value::int(int_arg(args, 0)?.min(int_arg(args, 1)?) as i32))
        })
        .static_method("min", &["long", "long"], |_interp, _this, args| {
            Ok(Value::long(int_arg(args, 0)?.min(int_arg(args, 1)?)))
        })
        .static_method("min", &["double", "double"], |_interp, _this, args| {
            Ok(Value::double(double_arg(args, 0)?.min(double_arg(args, 1)?)))
        })
        .static_method("pow", &["double", "double"], |_interp, _this, args| {
            Ok(Value::double(double_arg(args, 0)?.powf(double_arg(args, 1)?)))
        })
        .static_method("round", &["double"], |_interp, _this, args| {
            Ok(Value::long((double_arg(args, 0)? + 0.5).floor() as i64))
        })
        .static_method("floorMod", &["int", "int"], |interp, _this, args| {
            let (a, b) = (int_arg(args, 0)?, int_arg(args, 1)?);
            if b == 0 {
                return Err(interp.core().throw("java.lang.ArithmeticException", "/ by zero"));
            }
            let r = a % b;
            let r = if r != 0 && (r < 0) != (b < 0) { r + b } else { r };
            Ok(Value::int(r as i32))
        });
    for (name, f) in unary {
        builder = builder.static_method(name, &["double"], move |_interp, _this, args| {
            Ok(Value::double(f(double_arg(args, 0)?)))
        });
    }
    builder.build()
}

fn class_of(this: &Value) -> UtilResult<Type> {
    match &*this_object(this)?.data() {
        ObjectData::Class(ty) => Ok(ty.clone()),
        _ => Err(UtilError::type_error("Not a Class object")),
    }
}

fn class_class(object: &ClassRef) -> ClassRef {
    ClassBuilder::class("java.lang.Class")
        .extends(object)
        .modifiers(Modifiers::PUBLIC | Modifiers::FINAL)
        .method("getName", &[], |interp, this, _args| {
            Ok(interp.core().string(class_of(this)?.name()))
        })
        .method("getSimpleName", &[], |interp, this, _args| {
            let name = match class_of(this)? {
                Type::Class(c) => c.simple_name().to_string(),
                other => other.name(),
            };
            Ok(interp.core().string(name))
        })
        .method("isInterface", &[], |_interp, this, _args| {
            let ty = class_of(this)?;
            Ok(Value::boolean(ty.as_class().is_some_and(|c| c.is_interface())))
        })
        .method("isArray", &[], |_interp, this, _args| {
            Ok(Value::boolean(matches!(class_of(this)?, Type::Array(_))))
        })
        .method("isInstance", &["java.lang.Object"], |interp, this, args| {
            let ty = class_of(this)?;
            let value = arg(args, 0)?;
            let core = interp.core();
            Ok(Value::boolean(
                !value.is_null() && is_assignable(value, &ty, false, &core),
            ))
        })
        .build()
}

fn throwable_class(name: &str, parent: &ClassRef) -> ClassRef {
    ClassBuilder::class(name)
        .extends(parent)
        .storage(Storage::Throwable)
        .constructor(&[], |_interp, _this, _args| Ok(()))
        .constructor(&["java.lang.String"], |_interp, this, args| {
            let message = match arg(args, 0)? {
                Value::Object(o) => o.string_value(),
                _ => None,
            };
            if let ObjectData::Throwable(t) = &mut *this.data_mut() {
                t.message = message;
            }
            Ok(())
        })
        .method("getMessage", &[], |interp, this, _args| {
            let message = match &*this_object(this)?.data() {
                ObjectData::Throwable(t) => t.message.clone(),
                _ => None,
            };
            Ok(message.map_or(Value::Null, |m| interp.core().string(m)))
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_helpers_count_characters() {
        assert_eq!(compare_strings("apple", "banana"), -1);
        assert_eq!(compare_strings("abc", "ab"), 1);
        assert!(char_index("héllo", "héllo".find('l')).same(&Value::int(2)));
        assert!(char_index("abc", None).same(&Value::int(-1)));
        assert!(char_index("😀x", "😀x".find('x')).same(&Value::int(2)));
        assert_eq!(compare_strings("\u{FF61}", "😀"), 0xFF61 - 0xD83D);
    }

    #[test]
    fn exception_hierarchy_is_registered() {
        let interp = Interpreter::new();
        let core = interp.core();
        let aioobe = core.class("java.lang.ArrayIndexOutOfBoundsException").unwrap();
        let runtime = core.class("java.lang.RuntimeException").unwrap();
        assert!(aioobe.is_subclass_of(&runtime));
        assert!(aioobe.is_subclass_of(&core.throwable));
        assert_eq!(aioobe.storage, Storage::Throwable);
    }

    #[test]
    fn parse_failures_raise_number_format_exception() {
        let interp = Interpreter::new();
        let core = interp.core();
        assert_eq!(
            parse_primitive(&core, PrimitiveType::Int, "42").unwrap(),
            Primitive::Int(42)
        );
        match parse_primitive(&core, PrimitiveType::Int, "4x2") {
            Err(UtilError::Target(t)) => {
                assert_eq!(t.class_name(), "java.lang.NumberFormatException");
                assert_eq!(t.message().as_deref(), Some("For input string: \"4x2\""));
            }
            _ => panic!("expected NumberFormatException"),
        }
    }
}
