use super::*;
use log::trace;

/// What an ambiguous name or access chain evaluated to.
pub(crate) enum Target {
    Value(Value),
    Class(ClassRef),
    /// A null-safe access met null; the rest of the chain is skipped.
    ShortCircuit,
}

impl Interpreter {
    /// Resolves a simple, qualified or nested (`Outer.Inner`) class name as seen from `ns`.
    pub(crate) fn resolve_class(&self, name: &str, ns: &NsRef) -> Option<ClassRef> {
        if !name.contains('.') {
            return self.resolve_simple_class(name, ns);
        }
        let registry = self.registry.borrow();
        if let Some(class) = registry.get(name) {
            return Some(class);
        }
        let segments: Vec<&str> = name.split('.').collect();
        for split in (1..segments.len()).rev() {
            let head = segments[..split].join(".");
            let outer = if split == 1 {
                self.resolve_simple_class(&head, ns)
            } else {
                registry.get(&head)
            };
            if let Some(outer) = outer {
                let nested = format!("{}${}", outer.name, segments[split..].join("$"));
                return registry.get(&nested);
            }
        }
        None
    }

    fn resolve_simple_class(&self, name: &str, ns: &NsRef) -> Option<ClassRef> {
        let registry = self.registry.borrow();
        let mut current = Some(ns.clone());
        while let Some(scope) = current {
            let s = scope.borrow();
            if let Some(class) = s.declared_class(name) {
                return Some(class);
            }
            if let Some(class) = s.imported_class(name).and_then(|q| registry.get(q)) {
                return Some(class);
            }
            if let Some(class) = &s.class {
                if let Some(nested) = registry.get(&format!("{}${name}", class.name)) {
                    return Some(nested);
                }
            }
            for package in s.imported_packages().iter().rev() {
                if let Some(class) = registry.get(&format!("{package}.{name}")) {
                    return Some(class);
                }
            }
            current = s.parent();
        }
        if let Some(package) = ns.borrow().package() {
            if let Some(class) = registry.get(&format!("{package}.{name}")) {
                return Some(class);
            }
        }
        registry.get(name)
    }

    pub(crate) fn resolve_type(&self, node: &TypeNode, ns: &NsRef) -> UtilResult<Type> {
        match node {
            TypeNode::Primitive(p) => Ok(Type::Primitive(*p)),
            TypeNode::Named(name) => self
                .resolve_class(name, ns)
                .map(Type::Class)
                .ok_or_else(|| UtilError::eval(format!("Class: {name} not found in namespace"))),
            TypeNode::Array(element) => Ok(Type::array_of(self.resolve_type(element, ns)?)),
        }
    }

    /// Descriptor for a member type of a class being defined. Names of classes still under
    /// definition resolve to their qualified names; unknown names are kept verbatim.
    pub(crate) fn type_desc(&self, node: &TypeNode, ns: &NsRef) -> TypeDesc {
        match node {
            TypeNode::Primitive(p) => TypeDesc::Primitive(*p),
            TypeNode::Array(element) => TypeDesc::Array(Box::new(self.type_desc(element, ns))),
            TypeNode::Named(name) => {
                if let Some(class) = self.resolve_class(name, ns) {
                    return TypeDesc::Class(class.name.clone());
                }
                let registry = self.registry.borrow();
                let defining = registry.defining_names().find(|q| {
                    *q == name || q.rsplit(['.', '$']).next() == Some(name.as_str())
                });
                TypeDesc::Class(defining.unwrap_or(name).to_string())
            }
        }
    }

    /// Resolves an ambiguous dotted name: variable first, then the longest class prefix,
    /// with any remaining segments read as fields or nested classes.
    pub(crate) fn eval_name(&mut self, name: &str, cs: &mut CallStack) -> EvalResult<Target> {
        let ns = cs.top();
        let segments: Vec<&str> = name.split('.').collect();
        let first = segments[0];
        let start = match first {
            "this" => Some(Namespace::get_this(&ns)),
            "super" => Some(Namespace::get_super(&ns)),
            "global" => Some(Namespace::get_global(&ns)),
            _ => ns.borrow().get_value(first, true).at(cs)?,
        };
        if let Some(value) = start {
            trace!("name {first} resolved to a variable");
            return self.walk_fields(Target::Value(value), &segments[1..], cs);
        }
        for split in (1..=segments.len()).rev() {
            let head = segments[..split].join(".");
            if let Some(class) = self.resolve_class(&head, &ns) {
                trace!("name {head} resolved to class {}", class.name);
                return self.walk_fields(Target::Class(class), &segments[split..], cs);
            }
        }
        if self.config.strict_java || (segments.len() > 1 && !self.is_package(name)) {
            let what = if segments.len() > 1 { "Class or variable" } else { "Variable" };
            return Err(EvalError::eval(format!("{what} not found: {name}"), cs));
        }
        Ok(Target::Value(Value::Void))
    }

    fn is_package(&self, name: &str) -> bool {
        self.registry.borrow().is_package(name)
    }

    fn walk_fields(&mut self, mut target: Target, rest: &[&str], cs: &mut CallStack) -> EvalResult<Target> {
        for segment in rest {
            target = self.member_of(target, segment, cs)?;
        }
        Ok(target)
    }

    /// `target.name` where the target may be a class (static field or nested class).
    pub(crate) fn member_of(&mut self, target: Target, name: &str, cs: &mut CallStack) -> EvalResult<Target> {
        match target {
            Target::ShortCircuit => Ok(Target::ShortCircuit),
            Target::Value(value) => self.field_value(&value, name, cs).map(Target::Value),
            Target::Class(class) => {
                let nested = self.registry.borrow().get(&format!("{}${name}", class.name));
                if let Some(nested) = nested {
                    return Ok(Target::Class(nested));
                }
                let lhs = self.static_field_lhs(&class, name, cs)?;
                self.lhs_get(&lhs, cs).map(Target::Value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_imports_resolve_simple_names() {
        let interp = Interpreter::new();
        let global = interp.global_namespace();
        let list = interp.resolve_class("ArrayList", &global).unwrap();
        assert_eq!(list.name, "java.util.ArrayList");
        assert!(interp.resolve_class("Primitive", &global).is_some());
        assert!(interp.resolve_class("NoSuchThing", &global).is_none());
    }

    #[test]
    fn dotted_names_reach_nested_classes() {
        let interp = Interpreter::new();
        let global = interp.global_namespace();
        let entry = interp.resolve_class("Map.Entry", &global).unwrap();
        assert_eq!(entry.name, "java.util.Map$Entry");
        let entry = interp.resolve_class("java.util.Map.Entry", &global).unwrap();
        assert_eq!(entry.name, "java.util.Map$Entry");
    }

    #[test]
    fn explicit_imports_shadow_packages() {
        let mut interp = Interpreter::new();
        interp.register_class(ClassBuilder::class("org.demo.List"));
        let global = interp.global_namespace();
        Namespace::import_class(&global, "List", "org.demo.List");
        let list = interp.resolve_class("List", &global).unwrap();
        assert_eq!(list.name, "org.demo.List");
    }

    #[test]
    fn array_type_nodes_resolve() {
        let interp = Interpreter::new();
        let global = interp.global_namespace();
        let node = TypeNode::named("String").array().array();
        let ty = interp.resolve_type(&node, &global).unwrap();
        assert_eq!(ty.name(), "java.lang.String[][]");
        assert!(interp.resolve_type(&TypeNode::named("Nope"), &global).is_err());
    }
}
