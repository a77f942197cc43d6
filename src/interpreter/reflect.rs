use super::*;
use log::trace;

/// One overload as the resolver sees it. `None` parameters are loosely typed.
pub(crate) struct Candidate {
    pub(crate) params: Vec<Option<Type>>,
    pub(crate) varargs: bool,
}

impl Candidate {
    pub(crate) fn typed(types: &[Type], varargs: bool) -> Self {
        Candidate {
            params: types.iter().cloned().map(Some).collect(),
            varargs,
        }
    }

    fn vararg_element(&self) -> Option<Type> {
        match self.params.last() {
            Some(Some(Type::Array(element))) => Some((**element).clone()),
            _ => None,
        }
    }
}

/// Applicability phases, tried in order: exact subtyping and widening, then boxing, then
/// variable arity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Strict,
    Boxing,
    Varargs,
}

fn accepts(param: &Option<Type>, arg: &Value, boxing: bool, core: &CoreClasses) -> bool {
    match param {
        None => !arg.is_void(),
        Some(ty) => is_assignable(arg, ty, boxing, core),
    }
}

fn applicable(c: &Candidate, args: &[Value], phase: Phase, core: &CoreClasses) -> bool {
    match phase {
        Phase::Strict | Phase::Boxing => {
            let boxing = phase == Phase::Boxing;
            c.params.len() == args.len()
                && c.params.iter().zip(args).all(|(p, a)| accepts(p, a, boxing, core))
        }
        Phase::Varargs => {
            if !c.varargs || args.len() + 1 < c.params.len() {
                return false;
            }
            let fixed = c.params.len() - 1;
            let element = c.vararg_element();
            c.params[..fixed]
                .iter()
                .zip(args)
                .all(|(p, a)| accepts(p, a, true, core))
                && args[fixed..].iter().all(|a| accepts(&element, a, true, core))
        }
    }
}

// loose parameters are the least specific of all
fn param_more_specific(a: &Option<Type>, b: &Option<Type>, core: &CoreClasses) -> bool {
    match (a, b) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(x), Some(y)) => is_type_assignable(x, y, false, core),
    }
}

fn more_specific(a: &Candidate, b: &Candidate, core: &CoreClasses) -> bool {
    a.params.len() == b.params.len()
        && a
            .params
            .iter()
            .zip(&b.params)
            .all(|(x, y)| param_more_specific(x, y, core))
}

pub(crate) fn arg_types_string(args: &[Value]) -> String {
    args.iter().map(type_name).collect::<Vec<_>>().join(", ")
}

/// Picks the most specific applicable overload for the runtime argument values.
pub(crate) fn select_overload(
    name: &str,
    candidates: &[Candidate],
    args: &[Value],
    core: &CoreClasses,
) -> UtilResult<Option<usize>> {
    for phase in [Phase::Strict, Phase::Boxing, Phase::Varargs] {
        let usable: Vec<usize> = (0..candidates.len())
            .filter(|&i| applicable(&candidates[i], args, phase, core))
            .collect();
        if usable.is_empty() {
            continue;
        }
        let best: Vec<usize> = usable
            .iter()
            .copied()
            .filter(|&i| {
                usable
                    .iter()
                    .all(|&j| i == j || more_specific(&candidates[i], &candidates[j], core))
            })
            .collect();
        trace!("{name}: {} applicable in {phase:?} phase", usable.len());
        return match best.as_slice() {
            [only] => Ok(Some(*only)),
            _ => Err(UtilError::Ambiguous(format!(
                "Ambiguous method: {name}({})",
                arg_types_string(args)
            ))),
        };
    }
    Ok(None)
}

/// Applies invocation conversion and packs trailing arguments of a variable arity call.
pub(crate) fn convert_arguments(
    c: &Candidate,
    mut args: Vec<Value>,
    core: &CoreClasses,
) -> UtilResult<Vec<Value>> {
    if c.varargs {
        let fixed = c.params.len().saturating_sub(1);
        let passes_array = args.len() == c.params.len()
            && args
                .last()
                .zip(c.params.last())
                .is_some_and(|(a, p)| a.is_null() || accepts(p, a, false, core));
        if !passes_array {
            let element = c.vararg_element().unwrap_or_else(|| Type::Class(core.object.clone()));
            let items = args
                .split_off(fixed.min(args.len()))
                .into_iter()
                .map(|v| coerce(v, &element, Conversion::Invocation, core))
                .collect::<UtilResult<Vec<_>>>()?;
            args.push(core.new_array(element, items));
        }
    }
    args.into_iter()
        .zip(&c.params)
        .map(|(value, param)| match param {
            Some(ty) => coerce(value, ty, Conversion::Invocation, core),
            None => Ok(value),
        })
        .collect()
}

/// Methods named `name` visible on `class`, most derived first. Overridden signatures are
/// dropped; interfaces fall back to `Object`'s methods.
pub(crate) fn collect_methods(
    class: &ClassRef,
    name: &str,
    object: &ClassRef,
) -> Vec<(ClassRef, Rc<MethodDef>)> {
    let mut found: Vec<(ClassRef, Rc<MethodDef>)> = Vec::new();
    let mut visited: FxHashSet<String> = FxHashSet::default();
    let mut queue = std::collections::VecDeque::from([class.clone()]);
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.name.clone()) {
            continue;
        }
        for method in current.methods.iter().filter(|m| m.name == name) {
            let overridden = found
                .iter()
                .any(|(_, m)| m.params.descs() == method.params.descs());
            if !overridden {
                found.push((current.clone(), method.clone()));
            }
        }
        if let Some(sup) = &current.superclass {
            queue.push_back(sup.clone());
        }
        queue.extend(current.interfaces.iter().cloned());
    }
    if !visited.contains(&object.name) {
        for method in object.methods.iter().filter(|m| m.name == name) {
            if !found.iter().any(|(_, m)| m.params.descs() == method.params.descs()) {
                found.push((object.clone(), method.clone()));
            }
        }
    }
    found
}

impl Interpreter {
    /// Parameter types of a script method, resolved in its declaring scope on first use.
    pub(crate) fn script_param_types(&self, sm: &ScriptMethod) -> UtilResult<Vec<Option<Type>>> {
        if let Some(types) = sm.cached_param_types() {
            return Ok(types.clone());
        }
        let ns = sm.declaring().unwrap_or_else(|| self.global.clone());
        let mut types = Vec::with_capacity(sm.arity());
        for param in &sm.decl.params {
            let ty = match &param.ty {
                Some(node) => Some(self.resolve_type(node, &ns)?),
                None => None,
            };
            types.push(match (ty, param.varargs) {
                (Some(ty), true) => Some(Type::array_of(ty)),
                (None, true) => Some(Type::array_of(Type::Class(self.core.object.clone()))),
                (ty, false) => ty,
            });
        }
        Ok(sm.cache_param_types(types).clone())
    }

    pub(crate) fn script_candidate(&self, sm: &ScriptMethod) -> UtilResult<Candidate> {
        Ok(Candidate {
            params: self.script_param_types(sm)?,
            varargs: sm.is_varargs(),
        })
    }

    pub(crate) fn method_candidate(&self, method: &MethodDef) -> UtilResult<Candidate> {
        match &method.body {
            MethodBody::Script(sm) => self.script_candidate(sm),
            _ => Ok(Candidate::typed(method.params.types(&self.core)?, method.varargs)),
        }
    }

    /// Overload selection over host methods; `None` when nothing applies.
    pub(crate) fn choose_method(
        &self,
        methods: Vec<(ClassRef, Rc<MethodDef>)>,
        name: &str,
        args: &[Value],
    ) -> UtilResult<Option<(ClassRef, Rc<MethodDef>, Candidate)>> {
        let mut candidates = methods
            .iter()
            .map(|(_, m)| self.method_candidate(m))
            .collect::<UtilResult<Vec<_>>>()?;
        let Some(index) = select_overload(name, &candidates, args, &self.core)? else {
            return Ok(None);
        };
        let candidate = candidates.swap_remove(index);
        let (owner, method) = methods[index].clone();
        Ok(Some((owner, method, candidate)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> Option<Type> {
        Some(Type::Primitive(PrimitiveType::Int))
    }

    fn long() -> Option<Type> {
        Some(Type::Primitive(PrimitiveType::Long))
    }

    fn candidate(params: Vec<Option<Type>>) -> Candidate {
        Candidate {
            params,
            varargs: false,
        }
    }

    #[test]
    fn most_specific_overload_wins() {
        let interp = Interpreter::new();
        let core = interp.core();
        let object = Some(Type::Class(core.object.clone()));
        let overloads = [candidate(vec![long()]), candidate(vec![int()]), candidate(vec![object])];
        let picked = select_overload("f", &overloads, &[Value::int(1)], &core).unwrap();
        assert_eq!(picked, Some(1));
        // boxing only once nothing applies without it
        let picked = select_overload("f", &overloads[..1], &[core.boxed(Primitive::Int(1))], &core);
        assert_eq!(picked.unwrap(), Some(0));
        let picked = select_overload("f", &overloads, &[core.string("s")], &core).unwrap();
        assert_eq!(picked, Some(2));
    }

    #[test]
    fn loose_parameters_lose_to_typed_ones() {
        let interp = Interpreter::new();
        let core = interp.core();
        let overloads = [candidate(vec![None]), candidate(vec![int()])];
        let picked = select_overload("f", &overloads, &[Value::int(1)], &core).unwrap();
        assert_eq!(picked, Some(1));
        let picked = select_overload("f", &overloads, &[Value::boolean(true)], &core).unwrap();
        assert_eq!(picked, Some(0));
    }

    #[test]
    fn incomparable_overloads_are_ambiguous() {
        let interp = Interpreter::new();
        let core = interp.core();
        let overloads = [candidate(vec![int(), long()]), candidate(vec![long(), int()])];
        let err = select_overload("g", &overloads, &[Value::int(1), Value::int(2)], &core)
            .unwrap_err();
        assert!(matches!(err, UtilError::Ambiguous(_)));
        assert_eq!(err.to_string(), "Ambiguous method: g(int, int)");
    }

    #[test]
    fn varargs_pack_trailing_arguments() {
        let interp = Interpreter::new();
        let core = interp.core();
        let string = Type::Class(core.string_class.clone());
        let c = Candidate {
            params: vec![Some(string.clone()), Some(Type::array_of(Type::Primitive(PrimitiveType::Int)))],
            varargs: true,
        };
        let args = vec![core.string("fmt"), Value::int(1), Value::int(2)];
        assert_eq!(select_overload("h", std::slice::from_ref(&c), &args, &core).unwrap(), Some(0));
        let converted = convert_arguments(&c, args, &core).unwrap();
        assert_eq!(converted.len(), 2);
        let packed = converted[1].as_object().unwrap().elements().unwrap();
        assert_eq!(packed.len(), 2);
        let converted = convert_arguments(&c, vec![core.string("fmt")], &core).unwrap();
        assert_eq!(converted[1].as_object().unwrap().array_len(), Some(0));
    }

    #[test]
    fn overridden_methods_are_collected_once() {
        let interp = Interpreter::new();
        let core = interp.core();
        let list = core.array_list.clone();
        let methods = collect_methods(&list, "toString", &core.object);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].0.name, "java.util.ArrayList");
        let removes = collect_methods(&list, "remove", &core.object);
        assert_eq!(removes.len(), 2);
    }
}
