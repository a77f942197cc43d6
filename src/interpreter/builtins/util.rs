use super::super::*;
use super::lang::LangClasses;
use super::{arg, checked_index, int_arg, this_object};

pub(super) struct UtilClasses {
    pub(super) array_list: ClassRef,
    pub(super) hash_map: ClassRef,
    pub(super) entry: ClassRef,
    pub(super) iterator: ClassRef,
}

pub(super) fn install(reg: &mut ClassRegistry, lang: &LangClasses) -> UtilClasses {
    let object = &lang.object;
    let iterator_iface = reg.register(
        ClassBuilder::interface("java.util.Iterator")
            .abstract_method("hasNext", &[])
            .abstract_method("next", &[])
            .build(),
    );
    let iterable = reg.get("java.lang.Iterable");
    let mut collection = ClassBuilder::interface("java.util.Collection")
        .abstract_method("size", &[])
        .abstract_method("isEmpty", &[])
        .abstract_method("contains", &["java.lang.Object"])
        .abstract_method("add", &["java.lang.Object"]);
    if let Some(iterable) = &iterable {
        collection = collection.implements(iterable);
    }
    let collection = reg.register(collection.build());
    let list = reg.register(
        ClassBuilder::interface("java.util.List")
            .implements(&collection)
            .abstract_method("get", &["int"])
            .abstract_method("set", &["int", "java.lang.Object"])
            .build(),
    );
    let map = reg.register(
        ClassBuilder::interface("java.util.Map")
            .abstract_method("get", &["java.lang.Object"])
            .abstract_method("put", &["java.lang.Object", "java.lang.Object"])
            .abstract_method("size", &[])
            .build(),
    );
    reg.register(
        ClassBuilder::interface("java.util.function.Consumer")
            .abstract_method("accept", &["java.lang.Object"])
            .build(),
    );
    reg.register(
        ClassBuilder::interface("java.util.function.Function")
            .abstract_method("apply", &["java.lang.Object"])
            .build(),
    );
    reg.register(
        ClassBuilder::interface("java.util.function.Supplier")
            .abstract_method("get", &[])
            .build(),
    );
    reg.register(
        ClassBuilder::interface("java.util.function.Predicate")
            .abstract_method("test", &["java.lang.Object"])
            .build(),
    );

    let iterator = reg.register(iterator_class(object, &iterator_iface));
    let array_list = reg.register(array_list_class(object, &list));
    let entry = reg.register(entry_class(object));
    let hash_map = reg.register(hash_map_class(object, &map));
    UtilClasses {
        array_list,
        hash_map,
        entry,
        iterator,
    }
}

fn iterator_class(object: &ClassRef, iface: &ClassRef) -> ClassRef {
    ClassBuilder::class("java.util.ArrayList$Itr")
        .extends(object)
        .implements(iface)
        .method("hasNext", &[], |_interp, this, _args| {
            match &*this_object(this)?.data() {
                ObjectData::Iterator { items, position } => {
                    Ok(Value::boolean(*position < items.len()))
                }
                _ => Err(UtilError::type_error("Not an iterator")),
            }
        })
        .method("next", &[], |interp, this, _args| {
            let next = match &mut *this_object(this)?.data_mut() {
                ObjectData::Iterator { items, position } => {
                    let item = items.get(*position).cloned();
                    if item.is_some() {
                        *position += 1;
                    }
                    item
                }
                _ => return Err(UtilError::type_error("Not an iterator")),
            };
            next.ok_or_else(|| {
                interp
                    .core()
                    .throw("java.util.NoSuchElementException", "No more elements")
            })
        })
        .build()
}

fn with_list<R>(this: &Value, f: impl FnOnce(&mut Vec<Value>) -> R) -> UtilResult<R> {
    match &mut *this_object(this)?.data_mut() {
        ObjectData::List(items) => Ok(f(items)),
        _ => Err(UtilError::type_error("Target is not a list")),
    }
}

fn list_items(this: &Value) -> UtilResult<Vec<Value>> {
    with_list(this, |items| items.clone())
}

fn array_list_class(object: &ClassRef, list: &ClassRef) -> ClassRef {
    ClassBuilder::class("java.util.ArrayList")
        .extends(object)
        .implements(list)
        .storage(Storage::List)
        .constructor(&[], |_interp, _this, _args| Ok(()))
        .constructor(&["int"], |_interp, _this, _args| Ok(()))
        .method("size", &[], |_interp, this, _args| {
            Ok(Value::int(with_list(this, |items| items.len())? as i32))
        })
        .method("isEmpty", &[], |_interp, this, _args| {
            Ok(Value::boolean(with_list(this, |items| items.is_empty())?))
        })
        .method("add", &["java.lang.Object"], |_interp, this, args| {
            let value = arg(args, 0)?.clone();
            with_list(this, |items| items.push(value))?;
            Ok(Value::boolean(true))
        })
        .method("add", &["int", "java.lang.Object"], |interp, this, args| {
            let core = interp.core();
            let value = arg(args, 1)?.clone();
            let index = int_arg(args, 0)?;
            with_list(this, |items| {
                let at = checked_index(&core, index, items.len(), true)?;
                items.insert(at, value);
                Ok(Value::Void)
            })?
        })
        .method("get", &["int"], |interp, this, args| {
            let core = interp.core();
            let index = int_arg(args, 0)?;
            with_list(this, |items| {
                let at = checked_index(&core, index, items.len(), false)?;
                Ok(items[at].clone())
            })?
        })
        .method("set", &["int", "java.lang.Object"], |interp, this, args| {
            let core = interp.core();
            let index = int_arg(args, 0)?;
            let value = arg(args, 1)?.clone();
            with_list(this, |items| {
                let at = checked_index(&core, index, items.len(), false)?;
                Ok(std::mem::replace(&mut items[at], value))
            })?
        })
        .method("remove", &["int"], |interp, this, args| {
            let core = interp.core();
            let index = int_arg(args, 0)?;
            with_list(this, |items| {
                let at = checked_index(&core, index, items.len(), false)?;
                Ok(items.remove(at))
            })?
        })
        .method("remove", &["java.lang.Object"], |_interp, this, args| {
            let target = arg(args, 0)?;
            let removed = with_list(this, |items| {
                match items.iter().position(|v| value_equals(v, target)) {
                    Some(at) => {
                        items.remove(at);
                        true
                    }
                    None => false,
                }
            })?;
            Ok(Value::boolean(removed))
        })
        .method("contains", &["java.lang.Object"], |_interp, this, args| {
            let target = arg(args, 0)?;
            let found = with_list(this, |items| items.iter().any(|v| value_equals(v, target)))?;
            Ok(Value::boolean(found))
        })
        .method("indexOf", &["java.lang.Object"], |_interp, this, args| {
            let target = arg(args, 0)?;
            let at = with_list(this, |items| items.iter().position(|v| value_equals(v, target)))?;
            Ok(Value::int(at.map_or(-1, |i| i as i32)))
        })
        .method("clear", &[], |_interp, this, _args| {
            with_list(this, Vec::clear)?;
            Ok(Value::Void)
        })
        .method("addAll", &["java.util.Collection"], |_interp, this, args| {
            let extra = match arg(args, 0)? {
                Value::Object(o) => o.elements().unwrap_or_default(),
                _ => Vec::new(),
            };
            let changed = !extra.is_empty();
            with_list(this, |items| items.extend(extra))?;
            Ok(Value::boolean(changed))
        })
        .method("iterator", &[], |interp, this, _args| {
            Ok(interp.core().new_iterator(list_items(this)?))
        })
        .method("forEach", &["java.util.function.Consumer"], |interp, this, args| {
            let action = arg(args, 0)?.clone();
            for item in list_items(this)? {
                interp.call_functional(&action, "accept", vec![item])?;
            }
            Ok(Value::Void)
        })
        .method("toString", &[], |interp, this, _args| {
            let mut parts = Vec::new();
            for item in list_items(this)? {
                parts.push(interp.stringify_value(&item)?);
            }
            Ok(interp.core().string(format!("[{}]", parts.join(", "))))
        })
        .build()
}

fn entry_class(object: &ClassRef) -> ClassRef {
    fn part(this: &Value, key: bool) -> UtilResult<Value> {
        match &*this_object(this)?.data() {
            ObjectData::Entry(k, v) => Ok(if key { k.clone() } else { v.clone() }),
            _ => Err(UtilError::type_error("Not a map entry")),
        }
    }
    ClassBuilder::class("java.util.Map$Entry")
        .extends(object)
        .method("getKey", &[], |_interp, this, _args| part(this, true))
        .method("getValue", &[], |_interp, this, _args| part(this, false))
        .method("setValue", &["java.lang.Object"], |_interp, this, args| {
            let value = arg(args, 0)?.clone();
            match &mut *this_object(this)?.data_mut() {
                ObjectData::Entry(_, v) => Ok(std::mem::replace(v, value)),
                _ => Err(UtilError::type_error("Not a map entry")),
            }
        })
        .build()
}

fn with_map<R>(this: &Value, f: impl FnOnce(&[(Value, Value)]) -> R) -> UtilResult<R> {
    match &*this_object(this)?.data() {
        ObjectData::Map(entries) => Ok(f(entries)),
        _ => Err(UtilError::type_error("Target is not a map")),
    }
}

/// Mutations that never compare keys, so holding the mutable borrow is safe.
fn with_map_mut<R>(this: &Value, f: impl FnOnce(&mut Vec<(Value, Value)>) -> R) -> UtilResult<R> {
    match &mut *this_object(this)?.data_mut() {
        ObjectData::Map(entries) => Ok(f(entries)),
        _ => Err(UtilError::type_error("Target is not a map")),
    }
}

fn lookup(entries: &[(Value, Value)], key: &Value) -> Option<usize> {
    entries.iter().position(|(k, _)| value_equals(k, key))
}

/// Inserts into entries that are not yet reachable from any map object.
pub(crate) fn put_entry(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) -> Value {
    match lookup(entries, &key) {
        Some(at) => std::mem::replace(&mut entries[at].1, value),
        None => {
            entries.push((key, value));
            Value::Null
        }
    }
}

/// Inserts or replaces in a live map, returning the previous value or null. Keys are
/// compared under a shared borrow since a key may be the map itself.
pub(crate) fn map_put(map: &ObjectRef, key: Value, value: Value) -> UtilResult<Value> {
    let at = match &*map.data() {
        ObjectData::Map(entries) => lookup(entries, &key),
        _ => return Err(UtilError::type_error("Target is not a map")),
    };
    match &mut *map.data_mut() {
        ObjectData::Map(entries) => Ok(match at {
            Some(at) => std::mem::replace(&mut entries[at].1, value),
            None => {
                entries.push((key, value));
                Value::Null
            }
        }),
        _ => Err(UtilError::type_error("Target is not a map")),
    }
}

pub(crate) fn map_get(entries: &[(Value, Value)], key: &Value) -> Option<Value> {
    lookup(entries, key).map(|at| entries[at].1.clone())
}

fn hash_map_class(object: &ClassRef, map: &ClassRef) -> ClassRef {
    ClassBuilder::class("java.util.HashMap")
        .extends(object)
        .implements(map)
        .storage(Storage::Map)
        .constructor(&[], |_interp, _this, _args| Ok(()))
        .method("put", &["java.lang.Object", "java.lang.Object"], |_interp, this, args| {
            let (key, value) = (arg(args, 0)?.clone(), arg(args, 1)?.clone());
            map_put(this_object(this)?, key, value)
        })
        .method("get", &["java.lang.Object"], |_interp, this, args| {
            let key = arg(args, 0)?;
            Ok(with_map(this, |entries| map_get(entries, key))?.unwrap_or(Value::Null))
        })
        .method(
            "getOrDefault",
            &["java.lang.Object", "java.lang.Object"],
            |_interp, this, args| {
                let key = arg(args, 0)?;
                let fallback = arg(args, 1)?.clone();
                Ok(with_map(this, |entries| map_get(entries, key))?.unwrap_or(fallback))
            },
        )
        .method("containsKey", &["java.lang.Object"], |_interp, this, args| {
            let key = arg(args, 0)?;
            Ok(Value::boolean(with_map(this, |entries| lookup(entries, key).is_some())?))
        })
        .method("containsValue", &["java.lang.Object"], |_interp, this, args| {
            let target = arg(args, 0)?;
            let found = with_map(this, |entries| entries.iter().any(|(_, v)| value_equals(v, target)))?;
            Ok(Value::boolean(found))
        })
        .method("remove", &["java.lang.Object"], |_interp, this, args| {
            let key = arg(args, 0)?;
            match with_map(this, |entries| lookup(entries, key))? {
                Some(at) => with_map_mut(this, |entries| entries.remove(at).1),
                None => Ok(Value::Null),
            }
        })
        .method("size", &[], |_interp, this, _args| {
            Ok(Value::int(with_map(this, |entries| entries.len())? as i32))
        })
        .method("isEmpty", &[], |_interp, this, _args| {
            Ok(Value::boolean(with_map(this, |entries| entries.is_empty())?))
        })
        .method("clear", &[], |_interp, this, _args| {
            with_map_mut(this, Vec::clear)?;
            Ok(Value::Void)
        })
        .method("keySet", &[], |interp, this, _args| {
            let keys = with_map(this, |entries| entries.iter().map(|(k, _)| k.clone()).collect())?;
            Ok(interp.core().new_list(keys))
        })
        .method("values", &[], |interp, this, _args| {
            let values = with_map(this, |entries| entries.iter().map(|(_, v)| v.clone()).collect())?;
            Ok(interp.core().new_list(values))
        })
        .method("entrySet", &[], |interp, this, _args| {
            let core = interp.core();
            let pairs = with_map(this, |entries| entries.to_vec())?;
            let entries = pairs
                .into_iter()
                .map(|(k, v)| core.new_entry(k, v))
                .collect();
            Ok(core.new_list(entries))
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_put_replaces_by_equality() {
        let interp = Interpreter::new();
        let core = interp.core();
        let mut entries = Vec::new();
        assert!(put_entry(&mut entries, core.string("a"), Value::int(1)).is_null());
        let previous = put_entry(&mut entries, core.string("a"), Value::int(2));
        assert!(previous.same(&Value::int(1)));
        assert_eq!(entries.len(), 1);
        assert!(map_get(&entries, &core.string("a")).unwrap().same(&Value::int(2)));
        assert!(map_get(&entries, &core.string("b")).is_none());
    }

    #[test]
    fn collection_hierarchy() {
        let interp = Interpreter::new();
        let core = interp.core();
        let collection = core.class("java.util.Collection").unwrap();
        let iterable = core.class("java.lang.Iterable").unwrap();
        assert!(core.array_list.is_subclass_of(&collection));
        assert!(core.array_list.is_subclass_of(&iterable));
        assert_eq!(core.hash_map.storage, Storage::Map);
        assert!(core.class("java.util.function.Consumer").unwrap().is_interface());
    }
}
