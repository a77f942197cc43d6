use super::*;

pub type ClassRef = Rc<ClassDef>;
pub type NativeMethod = Rc<dyn Fn(&mut Interpreter, &Value, &[Value]) -> UtilResult<Value>>;
pub type NativeInit = Rc<dyn Fn(&mut Interpreter, &ObjectRef, &[Value]) -> UtilResult<()>>;

/// Unresolved type reference, resolved against the registry on first use.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Primitive(PrimitiveType),
    Class(String),
    Array(Box<TypeDesc>),
}

impl TypeDesc {
    /// Parses `int`, `java.lang.String`, `int[][]`.
    pub fn parse(text: &str) -> TypeDesc {
        if let Some(inner) = text.strip_suffix("[]") {
            return TypeDesc::Array(Box::new(TypeDesc::parse(inner)));
        }
        match PrimitiveType::from_name(text) {
            Some(p) => TypeDesc::Primitive(p),
            None => TypeDesc::Class(text.to_string()),
        }
    }

    pub fn of(ty: &Type) -> TypeDesc {
        match ty {
            Type::Primitive(p) => TypeDesc::Primitive(*p),
            Type::Class(c) => TypeDesc::Class(c.name.clone()),
            Type::Array(e) => TypeDesc::Array(Box::new(TypeDesc::of(e))),
        }
    }

    pub fn object() -> TypeDesc {
        TypeDesc::Class("java.lang.Object".to_string())
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Primitive(p) => f.write_str(p.name()),
            TypeDesc::Class(name) => f.write_str(name),
            TypeDesc::Array(e) => write!(f, "{e}[]"),
        }
    }
}

/// Parameter list with lazily resolved types.
pub struct Signature {
    descs: Vec<TypeDesc>,
    resolved: OnceCell<Vec<Type>>,
}

impl Signature {
    pub fn new(descs: Vec<TypeDesc>) -> Self {
        Signature {
            descs,
            resolved: OnceCell::new(),
        }
    }

    /// `"java.lang.Object..."` marks a trailing varargs parameter.
    pub(crate) fn parse(params: &[&str]) -> (Self, bool) {
        let mut varargs = false;
        let descs = params
            .iter()
            .map(|p| match p.strip_suffix("...") {
                Some(element) => {
                    varargs = true;
                    TypeDesc::Array(Box::new(TypeDesc::parse(element)))
                }
                None => TypeDesc::parse(p),
            })
            .collect();
        (Signature::new(descs), varargs)
    }

    pub fn descs(&self) -> &[TypeDesc] {
        &self.descs
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    pub(crate) fn types(&self, core: &CoreClasses) -> UtilResult<&[Type]> {
        if let Some(types) = self.resolved.get() {
            return Ok(types);
        }
        let types = self
            .descs
            .iter()
            .map(|d| core.resolve_desc(d))
            .collect::<UtilResult<Vec<_>>>()?;
        Ok(self.resolved.get_or_init(|| types))
    }
}

pub enum MethodBody {
    Native(NativeMethod),
    /// Scripted body, re-resolved through the class's static scope at call time.
    Script(Rc<ScriptMethod>),
    Abstract,
}

pub struct MethodDef {
    pub name: String,
    pub modifiers: Modifiers,
    pub params: Signature,
    pub returns: Option<TypeDesc>,
    pub varargs: bool,
    pub body: MethodBody,
}

impl MethodDef {
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }
}

pub enum ConstructorBody {
    Native(NativeInit),
    Script(Rc<ScriptMethod>),
}

pub struct ConstructorDef {
    pub modifiers: Modifiers,
    pub params: Signature,
    pub varargs: bool,
    pub body: ConstructorBody,
}

pub struct FieldDef {
    pub name: String,
    pub ty: TypeDesc,
    pub modifiers: Modifiers,
    resolved: OnceCell<Type>,
}

impl FieldDef {
    pub fn new(name: &str, ty: TypeDesc, modifiers: Modifiers) -> Self {
        FieldDef {
            name: name.to_string(),
            ty,
            modifiers,
            resolved: OnceCell::new(),
        }
    }

    pub(crate) fn resolved_type(&self, core: &CoreClasses) -> UtilResult<&Type> {
        if let Some(ty) = self.resolved.get() {
            return Ok(ty);
        }
        let ty = core.resolve_desc(&self.ty)?;
        Ok(self.resolved.get_or_init(|| ty))
    }
}

/// Native payload kind allocated for instances, inherited by subclasses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Storage {
    Plain,
    List,
    Map,
    Throwable,
}

pub(crate) struct GeneratedInfo {
    pub(crate) static_ns: RefCell<Option<NsRef>>,
    pub(crate) body: RefCell<Rc<ClassBody>>,
    pub(crate) anonymous: bool,
}

pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub superclass: Option<ClassRef>,
    pub interfaces: Vec<ClassRef>,
    pub fields: Vec<Rc<FieldDef>>,
    pub methods: Vec<Rc<MethodDef>>,
    pub constructors: Vec<Rc<ConstructorDef>>,
    pub storage: Storage,
    pub(crate) statics: RefCell<FxHashMap<String, Value>>,
    pub(crate) generated: Option<GeneratedInfo>,
}

impl ClassDef {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit(['.', '$']).next().unwrap_or(&self.name)
    }

    pub fn package(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(pkg, _)| pkg)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.modifiers.is_abstract()
    }

    pub fn is_generated(&self) -> bool {
        self.generated.is_some()
    }

    pub fn same_class(&self, other: &ClassDef) -> bool {
        std::ptr::eq(self, other) || self.name == other.name
    }

    /// Reflexive subtype test over superclasses and interfaces.
    pub fn is_subclass_of(&self, other: &ClassDef) -> bool {
        if self.same_class(other) {
            return true;
        }
        if self.interfaces.iter().any(|i| i.is_subclass_of(other)) {
            return true;
        }
        match &self.superclass {
            Some(s) => s.is_subclass_of(other),
            // interfaces are still objects
            None => self.is_interface() && other.name == "java.lang.Object",
        }
    }

    pub(crate) fn static_namespace(&self) -> Option<NsRef> {
        self.generated.as_ref()?.static_ns.borrow().clone()
    }

    pub(crate) fn is_anonymous(&self) -> bool {
        self.generated.as_ref().is_some_and(|g| g.anonymous)
    }

    /// Field lookup through the class, its interfaces and its superclasses.
    pub fn find_field(class: &ClassRef, name: &str) -> Option<(ClassRef, Rc<FieldDef>)> {
        if let Some(field) = class.fields.iter().find(|f| f.name == name) {
            return Some((class.clone(), field.clone()));
        }
        for iface in &class.interfaces {
            if let Some(found) = Self::find_field(iface, name) {
                return Some(found);
            }
        }
        class
            .superclass
            .as_ref()
            .and_then(|s| Self::find_field(s, name))
    }

    pub fn declares_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }

    pub fn has_method(class: &ClassRef, name: &str) -> bool {
        class.declares_method(name)
            || class.interfaces.iter().any(|i| Self::has_method(i, name))
            || class
                .superclass
                .as_ref()
                .is_some_and(|s| Self::has_method(s, name))
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Builds the registration entry of a native class.
pub struct ClassBuilder {
    def: ClassDef,
}

impl ClassBuilder {
    fn with_kind(name: &str, kind: ClassKind) -> Self {
        ClassBuilder {
            def: ClassDef {
                name: name.to_string(),
                kind,
                modifiers: Modifiers::PUBLIC,
                superclass: None,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                storage: Storage::Plain,
                statics: RefCell::new(FxHashMap::default()),
                generated: None,
            },
        }
    }

    pub fn class(name: &str) -> Self {
        Self::with_kind(name, ClassKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        Self::with_kind(name, ClassKind::Interface)
    }

    pub fn extends(mut self, superclass: &ClassRef) -> Self {
        self.def.storage = superclass.storage;
        self.def.superclass = Some(superclass.clone());
        self
    }

    pub fn implements(mut self, iface: &ClassRef) -> Self {
        self.def.interfaces.push(iface.clone());
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.def.modifiers = modifiers;
        self
    }

    pub fn storage(mut self, storage: Storage) -> Self {
        self.def.storage = storage;
        self
    }

    pub fn field(mut self, name: &str, ty: &str, modifiers: Modifiers) -> Self {
        self.def
            .fields
            .push(Rc::new(FieldDef::new(name, TypeDesc::parse(ty), modifiers)));
        self
    }

    pub fn constant(mut self, name: &str, ty: &str, value: Value) -> Self {
        let modifiers = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
        self.def
            .fields
            .push(Rc::new(FieldDef::new(name, TypeDesc::parse(ty), modifiers)));
        self.def.statics.borrow_mut().insert(name.to_string(), value);
        self
    }

    fn push_method(&mut self, name: &str, params: &[&str], modifiers: Modifiers, body: MethodBody) {
        let (params, varargs) = Signature::parse(params);
        self.def.methods.push(Rc::new(MethodDef {
            name: name.to_string(),
            modifiers,
            params,
            returns: None,
            varargs,
            body,
        }));
    }

    pub fn method(
        mut self,
        name: &str,
        params: &[&str],
        f: impl Fn(&mut Interpreter, &Value, &[Value]) -> UtilResult<Value> + 'static,
    ) -> Self {
        self.push_method(name, params, Modifiers::PUBLIC, MethodBody::Native(Rc::new(f)));
        self
    }

    pub fn static_method(
        mut self,
        name: &str,
        params: &[&str],
        f: impl Fn(&mut Interpreter, &Value, &[Value]) -> UtilResult<Value> + 'static,
    ) -> Self {
        let modifiers = Modifiers::PUBLIC | Modifiers::STATIC;
        self.push_method(name, params, modifiers, MethodBody::Native(Rc::new(f)));
        self
    }

    pub fn abstract_method(mut self, name: &str, params: &[&str]) -> Self {
        let modifiers = Modifiers::PUBLIC | Modifiers::ABSTRACT;
        self.push_method(name, params, modifiers, MethodBody::Abstract);
        self
    }

    pub fn constructor(
        mut self,
        params: &[&str],
        f: impl Fn(&mut Interpreter, &ObjectRef, &[Value]) -> UtilResult<()> + 'static,
    ) -> Self {
        let (params, varargs) = Signature::parse(params);
        self.def.constructors.push(Rc::new(ConstructorDef {
            modifiers: Modifiers::PUBLIC,
            params,
            varargs,
            body: ConstructorBody::Native(Rc::new(f)),
        }));
        self
    }

    pub fn build(self) -> ClassRef {
        Rc::new(self.def)
    }

    pub(crate) fn into_def(self) -> ClassDef {
        self.def
    }
}
