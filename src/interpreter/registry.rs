use super::*;

pub type RegistryRef = Rc<RefCell<ClassRegistry>>;

/// Every class known to an interpreter, keyed by qualified name.
#[derive(Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, ClassRef>,
    packages: FxHashSet<String>,
    /// Qualified names whose body is currently being evaluated.
    defining: FxHashSet<String>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassRef) -> ClassRef {
        let mut prefix = class.name.as_str();
        while let Some((package, _)) = prefix.rsplit_once('.') {
            self.packages.insert(package.to_string());
            prefix = package;
        }
        self.classes.insert(class.name.clone(), class.clone());
        class
    }

    pub fn get(&self, name: &str) -> Option<ClassRef> {
        self.classes.get(name).cloned()
    }

    pub fn is_package(&self, name: &str) -> bool {
        self.packages.contains(name)
    }

    pub fn add_package(&mut self, name: &str) {
        self.packages.insert(name.to_string());
    }

    /// Returns false when the name is already being defined.
    pub(crate) fn start_defining(&mut self, name: &str) -> bool {
        self.defining.insert(name.to_string())
    }

    pub(crate) fn end_defining(&mut self, name: &str) {
        self.defining.remove(name);
    }

    pub fn is_defining(&self, name: &str) -> bool {
        self.defining.contains(name)
    }

    pub(crate) fn defining_names(&self) -> impl Iterator<Item = &str> {
        self.defining.iter().map(String::as_str)
    }

    pub fn generated(&self, name: &str) -> Option<ClassRef> {
        self.classes.get(name).filter(|c| c.is_generated()).cloned()
    }

    /// Drops generated classes and unlinks their static scopes.
    pub(crate) fn clear_generated(&mut self) {
        self.classes.retain(|_, class| match &class.generated {
            Some(info) => {
                info.static_ns.borrow_mut().take();
                false
            }
            None => true,
        });
        self.defining.clear();
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_records_packages() {
        let mut registry = ClassRegistry::new();
        registry.register(ClassBuilder::class("org.demo.util.Thing").build());
        assert!(registry.is_package("org"));
        assert!(registry.is_package("org.demo.util"));
        assert!(!registry.is_package("org.demo.util.Thing"));
        assert!(registry.get("org.demo.util.Thing").is_some());
        assert!(registry.generated("org.demo.util.Thing").is_none());
    }

    #[test]
    fn defining_marker_rejects_reentry() {
        let mut registry = ClassRegistry::new();
        assert!(registry.start_defining("Foo"));
        assert!(!registry.start_defining("Foo"));
        assert!(registry.is_defining("Foo"));
        registry.end_defining("Foo");
        assert!(!registry.is_defining("Foo"));
    }
}
