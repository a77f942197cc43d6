use super::*;

/// Result of executing a statement. Abrupt kinds propagate outward until a construct with a
/// matching label (or none) consumes them.
#[derive(Debug)]
pub enum Completion {
    Normal(Value),
    Return(Value),
    Break(Option<String>),
    Continue(Option<String>),
}

impl Completion {
    pub(crate) fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Method,
    Block,
    Lambda,
    /// Static scope of a generated class.
    Class,
    /// Per-instance scope of a generated class.
    Instance,
    /// Throwaway scope backing an anonymous interface implementation.
    Anonymous,
}

#[derive(Clone)]
pub(crate) struct Variable {
    pub(crate) name: String,
    pub(crate) ty: Option<Type>,
    pub(crate) value: Value,
    /// View onto external storage, e.g. a statically imported field.
    pub(crate) binding: Option<FieldRef>,
    pub(crate) modifiers: Modifiers,
}

impl Variable {
    pub(crate) fn new(name: &str, ty: Option<Type>, value: Value, modifiers: Modifiers) -> Self {
        Variable {
            name: name.to_string(),
            ty,
            value,
            binding: None,
            modifiers,
        }
    }

    pub(crate) fn bound(name: &str, field: FieldRef) -> Self {
        let modifiers = field.field.modifiers;
        Variable {
            name: name.to_string(),
            ty: None,
            value: Value::Null,
            binding: Some(field),
            modifiers,
        }
    }

    /// Declared type, looking through bindings; `None` for loose variables.
    pub(crate) fn declared_type(&self, core: &CoreClasses) -> Option<Type> {
        match &self.binding {
            Some(field) => field.declared_type(core),
            None => self.ty.clone(),
        }
    }

    pub(crate) fn value(&self) -> UtilResult<Value> {
        match &self.binding {
            Some(field) => field.get(),
            None => Ok(self.value.clone()),
        }
    }

    pub(crate) fn assign(&mut self, value: Value, core: &CoreClasses) -> UtilResult<Value> {
        if value.is_void() {
            return Err(UtilError::eval(format!(
                "Can't assign void to variable: {}",
                self.name
            )));
        }
        if let Some(field) = &self.binding {
            return field.set(value, core);
        }
        if self.modifiers.is_final() && !self.value.is_null() {
            return Err(UtilError::FinalVariable(self.name.clone()));
        }
        let value = match &self.ty {
            Some(ty) => coerce(value, ty, Conversion::Assignment, core)
                .map_err(|e| e.prefixed(&format!("Variable assignment: {}: ", self.name)))?,
            None => value,
        };
        self.value = value.clone();
        Ok(value)
    }
}

/// A method declared in script code, loose or inside a class body.
pub struct ScriptMethod {
    pub(crate) name: String,
    pub(crate) decl: Rc<MethodDecl>,
    declaring: Weak<RefCell<Namespace>>,
    param_types: OnceCell<Vec<Option<Type>>>,
}

impl ScriptMethod {
    pub(crate) fn new(name: &str, decl: Rc<MethodDecl>, declaring: &NsRef) -> Rc<Self> {
        Rc::new(ScriptMethod {
            name: name.to_string(),
            decl,
            declaring: Rc::downgrade(declaring),
            param_types: OnceCell::new(),
        })
    }

    pub(crate) fn declaring(&self) -> Option<NsRef> {
        self.declaring.upgrade()
    }

    pub(crate) fn arity(&self) -> usize {
        self.decl.params.len()
    }

    pub(crate) fn is_varargs(&self) -> bool {
        self.decl.params.last().is_some_and(|p| p.varargs)
    }

    pub(crate) fn is_static(&self) -> bool {
        self.decl.modifiers.is_static()
    }

    pub(crate) fn same_signature(&self, other: &ScriptMethod) -> bool {
        self.arity() == other.arity()
            && self
                .decl
                .params
                .iter()
                .zip(&other.decl.params)
                .all(|(a, b)| a.ty == b.ty && a.varargs == b.varargs)
    }

    pub(crate) fn cached_param_types(&self) -> Option<&Vec<Option<Type>>> {
        self.param_types.get()
    }

    pub(crate) fn cache_param_types(&self, types: Vec<Option<Type>>) -> &Vec<Option<Type>> {
        self.param_types.get_or_init(|| types)
    }
}

/// A lambda value closed over its defining scope.
pub struct LambdaFn {
    pub(crate) expr: Rc<LambdaExpr>,
    pub(crate) scope: NsRef,
}
