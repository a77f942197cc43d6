use super::*;

/// Heap object: an instance of a registered class plus its native payload.
pub struct HostObject {
    class: ClassRef,
    data: RefCell<ObjectData>,
    fields: RefCell<FxHashMap<String, Value>>,
    /// Instance scopes of the generated classes in this object's hierarchy.
    callbacks: RefCell<Vec<(ClassRef, NsRef)>>,
}

pub enum ObjectData {
    Plain,
    String(String),
    Boxed(Primitive),
    Array(ArrayData),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Entry(Value, Value),
    Iterator { items: Vec<Value>, position: usize },
    Class(Type),
    This(NsRef),
    Proxy(NsRef),
    Lambda(Rc<LambdaFn>),
    Throwable(ThrowableData),
}

pub struct ArrayData {
    pub element: Type,
    pub items: Vec<Value>,
}

#[derive(Clone, Debug, Default)]
pub struct ThrowableData {
    pub message: Option<String>,
    /// `Some(true)` once raised by native code, `Some(false)` once thrown by script.
    pub native_origin: Option<bool>,
}

impl ObjectData {
    pub(crate) fn for_storage(storage: Storage) -> Self {
        match storage {
            Storage::Plain => ObjectData::Plain,
            Storage::List => ObjectData::List(Vec::new()),
            Storage::Map => ObjectData::Map(Vec::new()),
            Storage::Throwable => ObjectData::Throwable(ThrowableData::default()),
        }
    }
}

#[derive(Clone)]
pub struct ObjectRef(Rc<HostObject>);

impl ObjectRef {
    pub fn new(class: ClassRef, data: ObjectData) -> Self {
        ObjectRef(Rc::new(HostObject {
            class,
            data: RefCell::new(data),
            fields: RefCell::new(FxHashMap::default()),
            callbacks: RefCell::new(Vec::new()),
        }))
    }

    pub(crate) fn from_rc(rc: Rc<HostObject>) -> Self {
        ObjectRef(rc)
    }

    pub(crate) fn downgrade(&self) -> Weak<HostObject> {
        Rc::downgrade(&self.0)
    }

    pub fn class(&self) -> &ClassRef {
        &self.0.class
    }

    pub fn data(&self) -> Ref<'_, ObjectData> {
        self.0.data.borrow()
    }

    pub fn data_mut(&self) -> RefMut<'_, ObjectData> {
        self.0.data.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity used for monitors and default hash codes.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn runtime_type(&self) -> Type {
        match &*self.data() {
            ObjectData::Array(a) => Type::array_of(a.element.clone()),
            _ => Type::Class(self.0.class.clone()),
        }
    }

    pub fn string_value(&self) -> Option<String> {
        match &*self.data() {
            ObjectData::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(&*self.data(), ObjectData::String(_))
    }

    pub fn array_len(&self) -> Option<usize> {
        match &*self.data() {
            ObjectData::Array(a) => Some(a.items.len()),
            _ => None,
        }
    }

    /// Elements of an array or list.
    pub fn elements(&self) -> Option<Vec<Value>> {
        match &*self.data() {
            ObjectData::Array(a) => Some(a.items.clone()),
            ObjectData::List(items) => Some(items.clone()),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.0.fields.borrow_mut().insert(name.to_string(), value);
    }

    pub(crate) fn callback_for(&self, class: &ClassDef) -> Option<NsRef> {
        self.0
            .callbacks
            .borrow()
            .iter()
            .find(|(c, _)| c.same_class(class))
            .map(|(_, ns)| ns.clone())
    }

    pub(crate) fn add_callback(&self, class: ClassRef, ns: NsRef) {
        self.0.callbacks.borrow_mut().push((class, ns));
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.data() {
            ObjectData::String(s) => write!(f, "{s:?}"),
            ObjectData::Boxed(p) => write!(f, "{}({p})", self.0.class.name),
            _ => write!(f, "{}@{:x}", self.0.class.name, self.id()),
        }
    }
}
