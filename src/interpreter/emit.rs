use super::*;

/// Structural description of a script class handed to the emission backend.
pub struct ClassDescriptor {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub superclass: Option<ClassRef>,
    pub interfaces: Vec<ClassRef>,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub constructors: Vec<MethodDescriptor>,
    pub anonymous: bool,
    pub(crate) static_ns: NsRef,
    pub(crate) body: Rc<ClassBody>,
}

pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeDesc,
    pub modifiers: Modifiers,
}

pub struct MethodDescriptor {
    pub name: String,
    pub modifiers: Modifiers,
    /// `None` for loosely typed and void methods.
    pub returns: Option<TypeDesc>,
    pub params: Vec<TypeDesc>,
    pub varargs: bool,
    /// Scripted body; `None` for abstract methods.
    pub body: Option<Rc<ScriptMethod>>,
}

/// Produces a loadable class from a descriptor.
pub trait ClassEmitter {
    fn emit(&self, descriptor: &ClassDescriptor) -> UtilResult<ClassRef>;
}

/// Builds classes whose scripted members dispatch back into the interpreter through the
/// class's static scope and each instance's callback scopes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallbackEmitter;

impl ClassEmitter for CallbackEmitter {
    fn emit(&self, d: &ClassDescriptor) -> UtilResult<ClassRef> {
        let methods = d
            .methods
            .iter()
            .map(|m| {
                Rc::new(MethodDef {
                    name: m.name.clone(),
                    modifiers: m.modifiers,
                    params: Signature::new(m.params.clone()),
                    returns: m.returns.clone(),
                    varargs: m.varargs,
                    body: match &m.body {
                        Some(body) => MethodBody::Script(body.clone()),
                        None => MethodBody::Abstract,
                    },
                })
            })
            .collect();
        let constructors = d
            .constructors
            .iter()
            .map(|c| {
                let body = c.body.clone().ok_or_else(|| {
                    UtilError::eval(format!("Constructor of {} has no body", d.name))
                })?;
                Ok(Rc::new(ConstructorDef {
                    modifiers: c.modifiers,
                    params: Signature::new(c.params.clone()),
                    varargs: c.varargs,
                    body: ConstructorBody::Script(body),
                }))
            })
            .collect::<UtilResult<Vec<_>>>()?;
        let fields = d
            .fields
            .iter()
            .map(|f| Rc::new(FieldDef::new(&f.name, f.ty.clone(), f.modifiers)))
            .collect();
        Ok(Rc::new(ClassDef {
            name: d.name.clone(),
            kind: d.kind,
            modifiers: d.modifiers,
            superclass: d.superclass.clone(),
            interfaces: d.interfaces.clone(),
            fields,
            methods,
            constructors,
            storage: d.superclass.as_ref().map_or(Storage::Plain, |s| s.storage),
            statics: RefCell::new(FxHashMap::default()),
            generated: Some(GeneratedInfo {
                static_ns: RefCell::new(Some(d.static_ns.clone())),
                body: RefCell::new(d.body.clone()),
                anonymous: d.anonymous,
            }),
        }))
    }
}
