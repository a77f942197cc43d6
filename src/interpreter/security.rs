use super::*;
use log::debug;

/// Authorization policy consulted before reflective operations. Every predicate defaults
/// to allowing the operation.
pub trait SecurityGuard {
    fn can_construct(&self, _class: &ClassDef, _args: &[Value]) -> bool {
        true
    }

    fn can_invoke_static(&self, _class: &ClassDef, _method: &str, _args: &[Value]) -> bool {
        true
    }

    fn can_invoke(&self, _target: &Value, _method: &str, _args: &[Value]) -> bool {
        true
    }

    fn can_invoke_super(&self, _class: &ClassDef, _method: &str, _args: &[Value]) -> bool {
        true
    }

    /// `target` is `None` for static fields.
    fn can_access_field(&self, _class: &ClassDef, _target: Option<&Value>, _field: &str) -> bool {
        true
    }

    fn can_extend(&self, _superclass: &ClassDef) -> bool {
        true
    }

    fn can_implement(&self, _interface: &ClassDef) -> bool {
        true
    }
}

/// Registered guards; one denial is final.
#[derive(Clone, Default)]
pub(crate) struct Guards {
    guards: Vec<Rc<dyn SecurityGuard>>,
}

impl Guards {
    pub(crate) fn add(&mut self, guard: Rc<dyn SecurityGuard>) {
        self.guards.push(guard);
    }

    fn check(&self, allowed: impl Fn(&dyn SecurityGuard) -> bool, what: impl FnOnce() -> String) -> UtilResult<()> {
        if self.guards.iter().all(|g| allowed(g.as_ref())) {
            return Ok(());
        }
        let message = format!("Security: {}", what());
        debug!("{message}");
        Err(UtilError::Security(message))
    }

    pub(crate) fn construct(&self, class: &ClassDef, args: &[Value]) -> UtilResult<()> {
        self.check(
            |g| g.can_construct(class, args),
            || format!("cannot construct {}", class.name),
        )
    }

    pub(crate) fn invoke_static(&self, class: &ClassDef, method: &str, args: &[Value]) -> UtilResult<()> {
        self.check(
            |g| g.can_invoke_static(class, method, args),
            || format!("cannot invoke static method {}.{method}", class.name),
        )
    }

    pub(crate) fn invoke(&self, target: &Value, method: &str, args: &[Value]) -> UtilResult<()> {
        self.check(
            |g| g.can_invoke(target, method, args),
            || format!("cannot invoke method {method} on {}", type_name(target)),
        )
    }

    pub(crate) fn invoke_super(&self, class: &ClassDef, method: &str, args: &[Value]) -> UtilResult<()> {
        self.check(
            |g| g.can_invoke_super(class, method, args),
            || format!("cannot invoke super method {}.{method}", class.name),
        )
    }

    pub(crate) fn access_field(&self, class: &ClassDef, target: Option<&Value>, field: &str) -> UtilResult<()> {
        self.check(
            |g| g.can_access_field(class, target, field),
            || format!("cannot access field {}.{field}", class.name),
        )
    }

    pub(crate) fn extend(&self, superclass: &ClassDef) -> UtilResult<()> {
        self.check(
            |g| g.can_extend(superclass),
            || format!("cannot extend {}", superclass.name),
        )
    }

    pub(crate) fn implement(&self, interface: &ClassDef) -> UtilResult<()> {
        self.check(
            |g| g.can_implement(interface),
            || format!("cannot implement {}", interface.name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoThreads;

    impl SecurityGuard for NoThreads {
        fn can_construct(&self, class: &ClassDef, _args: &[Value]) -> bool {
            class.name != "java.lang.Thread"
        }
    }

    struct AllowAll;
    impl SecurityGuard for AllowAll {}

    #[test]
    fn any_denial_wins() {
        let thread = ClassBuilder::class("java.lang.Thread").build();
        let mut guards = Guards::default();
        guards.add(Rc::new(AllowAll));
        assert!(guards.construct(&thread, &[]).is_ok());
        guards.add(Rc::new(NoThreads));
        let err = guards.construct(&thread, &[]).unwrap_err();
        assert!(matches!(err, UtilError::Security(_)));
        assert_eq!(err.to_string(), "Security: cannot construct java.lang.Thread");
        assert!(guards.extend(&thread).is_ok());
    }
}
