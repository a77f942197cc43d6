use super::*;
use log::{debug, trace};

pub type NsRef = Rc<RefCell<Namespace>>;

#[derive(Clone)]
pub(crate) enum StaticImport {
    /// `import static a.B.*`
    Class(ClassRef),
    /// `import static a.B.member`
    Member(ClassRef, String),
}

/// Where an inherited name actually lives.
enum Slot {
    Scope(NsRef),
    Static(FieldRef),
    Object(FieldRef, ObjectRef),
}

/// A lexical scope: variables, loose methods, imports and the `this` identity.
pub struct Namespace {
    name: String,
    kind: ScopeKind,
    parent: Option<NsRef>,
    variables: FxHashMap<String, Variable>,
    methods: FxHashMap<String, Vec<Rc<ScriptMethod>>>,
    imported_classes: FxHashMap<String, String>,
    imported_packages: Vec<String>,
    imported_statics: Vec<StaticImport>,
    classes: FxHashMap<String, ClassRef>,
    package: Option<String>,
    /// Generated class owning a class or instance scope.
    pub(crate) class: Option<ClassRef>,
    pub(crate) instance: Option<Weak<HostObject>>,
    this_cache: Weak<HostObject>,
    core: Rc<CoreClasses>,
}

impl Namespace {
    pub fn new(name: &str, kind: ScopeKind, parent: Option<NsRef>, core: Rc<CoreClasses>) -> NsRef {
        Rc::new(RefCell::new(Namespace {
            name: name.to_string(),
            kind,
            parent,
            variables: FxHashMap::default(),
            methods: FxHashMap::default(),
            imported_classes: FxHashMap::default(),
            imported_packages: Vec::new(),
            imported_statics: Vec::new(),
            classes: FxHashMap::default(),
            package: None,
            class: None,
            instance: None,
            this_cache: Weak::new(),
            core,
        }))
    }

    pub fn child(parent: &NsRef, name: &str, kind: ScopeKind) -> NsRef {
        trace!("new {kind:?} scope {name}");
        let core = parent.borrow().core.clone();
        Self::new(name, kind, Some(parent.clone()), core)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NsRef> {
        self.parent.clone()
    }

    pub(crate) fn core(&self) -> &Rc<CoreClasses> {
        &self.core
    }

    pub(crate) fn object(&self) -> Option<ObjectRef> {
        self.instance
            .as_ref()
            .and_then(Weak::upgrade)
            .map(ObjectRef::from_rc)
    }

    /// Nearest enclosing scope that is not a plain block.
    pub fn non_block(ns: &NsRef) -> NsRef {
        let mut current = ns.clone();
        loop {
            let parent = {
                let n = current.borrow();
                match n.kind {
                    ScopeKind::Block => n.parent.clone(),
                    _ => None,
                }
            };
            match parent {
                Some(p) => current = p,
                None => return current,
            }
        }
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub(crate) fn local_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Lookup order: local, statically imported, inherited, then the parent chain.
    pub fn get_value(&self, name: &str, recurse: bool) -> UtilResult<Option<Value>> {
        if let Some(var) = self.variables.get(name) {
            return var.value().map(Some);
        }
        if let Some(field) = self.static_import_field(name) {
            return field.get().map(Some);
        }
        if let Some(slot) = self.inherited_slot(name) {
            return match slot {
                Slot::Scope(ns) => {
                    let ns = ns.borrow();
                    match ns.variables.get(name) {
                        Some(var) => var.value().map(Some),
                        None => Ok(None),
                    }
                }
                Slot::Static(field) => field.get().map(Some),
                Slot::Object(field, obj) => field.get_on(&obj).map(Some),
            };
        }
        match (&self.parent, recurse) {
            (Some(parent), true) => parent.borrow().get_value(name, true),
            _ => Ok(None),
        }
    }

    /// Declared type of the binding `get_value` would read; `None` when it is loose or unbound.
    pub(crate) fn declared_type(&self, name: &str) -> Option<Type> {
        if let Some(var) = self.variables.get(name) {
            return var.declared_type(&self.core);
        }
        if let Some(field) = self.static_import_field(name) {
            return field.declared_type(&self.core);
        }
        if let Some(slot) = self.inherited_slot(name) {
            return match slot {
                Slot::Scope(ns) => ns
                    .borrow()
                    .variables
                    .get(name)
                    .and_then(|var| var.declared_type(&self.core)),
                Slot::Static(field) | Slot::Object(field, _) => field.declared_type(&self.core),
            };
        }
        self.parent
            .as_ref()
            .and_then(|parent| parent.borrow().declared_type(name))
    }

    fn static_import_field(&self, name: &str) -> Option<FieldRef> {
        self.imported_statics.iter().rev().find_map(|import| {
            let (class, member) = match import {
                StaticImport::Class(c) => (c, name),
                StaticImport::Member(c, m) if m == name => (c, m.as_str()),
                StaticImport::Member(..) => return None,
            };
            ClassDef::find_field(class, member)
                .filter(|(_, f)| f.modifiers.is_static())
                .map(|(class, field)| FieldRef { class, field })
        })
    }

    fn inherited_slot(&self, name: &str) -> Option<Slot> {
        let class = self.class.as_ref()?;
        match self.kind {
            ScopeKind::Instance => {
                let obj = self.object()?;
                let mut current = class.superclass.clone();
                while let Some(sup) = current {
                    if sup.is_generated() {
                        if let Some(ns) = obj.callback_for(&sup) {
                            if ns.borrow().variables.contains_key(name) {
                                return Some(Slot::Scope(ns));
                            }
                        }
                    } else if let Some((owner, field)) = ClassDef::find_field(&sup, name) {
                        if !field.modifiers.is_static() {
                            return Some(Slot::Object(FieldRef { class: owner, field }, obj));
                        }
                    }
                    current = sup.superclass.clone();
                }
                None
            }
            ScopeKind::Class => class
                .superclass
                .iter()
                .chain(class.interfaces.iter())
                .find_map(|sup| ClassDef::find_field(sup, name))
                .filter(|(_, f)| f.modifiers.is_static())
                .map(|(class, field)| Slot::Static(FieldRef { class, field })),
            _ => None,
        }
    }

    fn owns(&self, name: &str) -> bool {
        self.variables.contains_key(name)
            || self.static_import_field(name).is_some()
            || self.inherited_slot(name).is_some()
    }

    fn find_owner(ns: &NsRef, name: &str) -> Option<NsRef> {
        let mut current = ns.clone();
        loop {
            let parent = {
                let n = current.borrow();
                if n.owns(name) {
                    return Some(current.clone());
                }
                n.parent.clone()
            };
            current = parent?;
        }
    }

    /// Untyped assignment. Blocks never create bindings; they hand the assignment to
    /// their parent. Elsewhere an existing binding up the chain wins over a new local.
    pub fn set_variable(
        ns: &NsRef,
        name: &str,
        value: Value,
        strict: bool,
        recurse: bool,
    ) -> UtilResult<Value> {
        let core = ns.borrow().core.clone();
        {
            let mut this = ns.borrow_mut();
            if let Some(var) = this.variables.get_mut(name) {
                return var.assign(value, &core);
            }
        }
        let (import, inherited, kind, parent) = {
            let this = ns.borrow();
            (
                this.static_import_field(name),
                this.inherited_slot(name),
                this.kind,
                this.parent.clone(),
            )
        };
        if let Some(field) = import {
            return field.set(value, &core);
        }
        match inherited {
            Some(Slot::Scope(owner)) => return Self::set_variable(&owner, name, value, strict, false),
            Some(Slot::Static(field)) => return field.set(value, &core),
            Some(Slot::Object(field, obj)) => return field.set_on(&obj, value, &core),
            None => {}
        }
        if let Some(parent) = &parent {
            if kind == ScopeKind::Block {
                return Self::set_variable(parent, name, value, strict, recurse);
            }
            if recurse {
                if let Some(owner) = Self::find_owner(parent, name) {
                    return Self::set_variable(&owner, name, value, strict, false);
                }
            }
        }
        Self::create_local(ns, name, value, strict)
    }

    /// Assigns in this scope only, creating the binding if needed.
    pub fn set_local_variable(ns: &NsRef, name: &str, value: Value, strict: bool) -> UtilResult<Value> {
        let core = ns.borrow().core.clone();
        {
            let mut this = ns.borrow_mut();
            if let Some(var) = this.variables.get_mut(name) {
                return var.assign(value, &core);
            }
        }
        Self::create_local(ns, name, value, strict)
    }

    fn create_local(ns: &NsRef, name: &str, value: Value, strict: bool) -> UtilResult<Value> {
        if strict {
            return Err(UtilError::eval(format!(
                "(Strict Java mode) Assignment to undeclared variable: {name}"
            )));
        }
        if value.is_void() {
            return Err(UtilError::eval(format!(
                "Can't assign void to variable: {name}"
            )));
        }
        ns.borrow_mut().variables.insert(
            name.to_string(),
            Variable::new(name, None, value.clone(), Modifiers::NONE),
        );
        Ok(value)
    }

    /// Declares a binding in exactly this scope, replacing any previous one.
    pub fn set_typed_variable(
        ns: &NsRef,
        name: &str,
        ty: Option<Type>,
        value: Option<Value>,
        modifiers: Modifiers,
    ) -> UtilResult<()> {
        let core = ns.borrow().core.clone();
        let mut var = Variable::new(name, ty.clone(), Value::Null, modifiers);
        match (value, &ty) {
            (Some(value), _) => {
                var.assign(value, &core)?;
            }
            // final primitives stay unset until their first assignment
            (None, Some(ty)) if !modifiers.is_final() => var.value = default_value(ty),
            (None, _) => {}
        }
        ns.borrow_mut().variables.insert(name.to_string(), var);
        Ok(())
    }

    pub(crate) fn bind_static_field(ns: &NsRef, name: &str, field: FieldRef) {
        ns.borrow_mut()
            .variables
            .insert(name.to_string(), Variable::bound(name, field));
    }

    pub(crate) fn set_method(ns: &NsRef, method: Rc<ScriptMethod>) {
        let target = Self::non_block(ns);
        let mut target = target.borrow_mut();
        trace!("declare method {} in {}", method.name, target.name);
        let overloads = target.methods.entry(method.name.clone()).or_default();
        match overloads.iter_mut().find(|m| m.same_signature(&method)) {
            Some(existing) => *existing = method,
            None => overloads.push(method),
        }
    }

    pub(crate) fn local_methods(&self, name: &str) -> Vec<Rc<ScriptMethod>> {
        self.methods.get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn import_class(ns: &NsRef, simple: &str, qualified: &str) {
        debug!("import class {qualified}");
        Self::non_block(ns)
            .borrow_mut()
            .imported_classes
            .insert(simple.to_string(), qualified.to_string());
    }

    pub(crate) fn import_package(ns: &NsRef, package: &str) {
        debug!("import package {package}");
        let target = Self::non_block(ns);
        let mut target = target.borrow_mut();
        if !target.imported_packages.iter().any(|p| p == package) {
            target.imported_packages.push(package.to_string());
        }
    }

    pub(crate) fn import_static(ns: &NsRef, import: StaticImport) {
        match &import {
            StaticImport::Class(c) => debug!("import static {}.*", c.name),
            StaticImport::Member(c, m) => debug!("import static {}.{m}", c.name),
        }
        Self::non_block(ns).borrow_mut().imported_statics.push(import);
    }

    pub(crate) fn static_imports(&self) -> &[StaticImport] {
        &self.imported_statics
    }

    pub(crate) fn declare_class(ns: &NsRef, simple: &str, class: ClassRef) {
        Self::non_block(ns)
            .borrow_mut()
            .classes
            .insert(simple.to_string(), class);
    }

    pub(crate) fn declared_class(&self, simple: &str) -> Option<ClassRef> {
        self.classes.get(simple).cloned()
    }

    pub(crate) fn imported_class(&self, simple: &str) -> Option<&str> {
        self.imported_classes.get(simple).map(String::as_str)
    }

    pub(crate) fn imported_packages(&self) -> &[String] {
        &self.imported_packages
    }

    pub(crate) fn set_package(ns: &NsRef, package: &str) {
        Self::non_block(ns).borrow_mut().package = Some(package.to_string());
    }

    /// The package in effect here, inherited from enclosing scopes.
    pub fn package(&self) -> Option<String> {
        match (&self.package, &self.parent) {
            (Some(p), _) => Some(p.clone()),
            (None, Some(parent)) => parent.borrow().package(),
            (None, None) => None,
        }
    }

    /// Innermost enclosing generated class, if any.
    pub(crate) fn enclosing_class(&self) -> Option<ClassRef> {
        match (&self.class, &self.parent) {
            (Some(c), _) => Some(c.clone()),
            (None, Some(parent)) => parent.borrow().enclosing_class(),
            (None, None) => None,
        }
    }

    /// Skips blocks and lambda bodies, which share the identity of their enclosing scope.
    pub fn this_scope(ns: &NsRef) -> NsRef {
        let mut current = ns.clone();
        loop {
            let parent = {
                let n = current.borrow();
                match n.kind {
                    ScopeKind::Block | ScopeKind::Lambda => n.parent.clone(),
                    _ => None,
                }
            };
            match parent {
                Some(p) => current = p,
                None => return current,
            }
        }
    }

    pub fn get_this(ns: &NsRef) -> Value {
        let scope = Self::this_scope(ns);
        let owner = {
            let s = scope.borrow();
            match (&s.kind, &s.parent) {
                (ScopeKind::Method, Some(p))
                    if matches!(p.borrow().kind, ScopeKind::Instance | ScopeKind::Anonymous) =>
                {
                    Some(p.clone())
                }
                _ => None,
            }
        };
        let scope = owner.unwrap_or(scope);
        if let Some(obj) = scope.borrow().object() {
            return Value::Object(obj);
        }
        Value::Object(Self::this_object(&scope))
    }

    pub fn get_super(ns: &NsRef) -> Value {
        let scope = Self::this_scope(ns);
        let parent = scope.borrow().parent.clone();
        match parent {
            Some(p) => Self::get_this(&p),
            None => Value::Object(Self::this_object(&scope)),
        }
    }

    pub fn get_global(ns: &NsRef) -> Value {
        let mut current = ns.clone();
        loop {
            let parent = current.borrow().parent.clone();
            match parent {
                Some(p) => current = p,
                None => return Value::Object(Self::this_object(&current)),
            }
        }
    }

    /// The scripted object wrapping this scope, shared while anything holds it.
    fn this_object(ns: &NsRef) -> ObjectRef {
        if let Some(existing) = ns.borrow().this_cache.upgrade() {
            return ObjectRef::from_rc(existing);
        }
        let class = ns.borrow().core.this_class.clone();
        let obj = ObjectRef::new(class, ObjectData::This(ns.clone()));
        ns.borrow_mut().this_cache = obj.downgrade();
        obj
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("variables", &self.variable_names())
            .finish_non_exhaustive()
    }
}
