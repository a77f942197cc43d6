use super::*;

/// One line of a script-level stack trace.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceFrame {
    pub scope: String,
    pub line: u32,
    pub file: Option<Rc<str>>,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "  at {} (line {}, {})", self.scope, self.line, file),
            None => write!(f, "  at {} (line {})", self.scope, self.line),
        }
    }
}

struct Frame {
    ns: NsRef,
    line: u32,
    file: Option<Rc<str>>,
}

impl Frame {
    fn new(ns: NsRef, file: Option<Rc<str>>) -> Self {
        Frame { ns, line: 0, file }
    }
}

/// The dynamic chain of active scopes. Each host entry point builds its own stack.
pub struct CallStack {
    current: Frame,
    below: Vec<Frame>,
}

impl CallStack {
    pub fn new(ns: NsRef) -> Self {
        CallStack {
            current: Frame::new(ns, None),
            below: Vec::new(),
        }
    }

    pub fn with_file(ns: NsRef, file: Option<Rc<str>>) -> Self {
        CallStack {
            current: Frame::new(ns, file),
            below: Vec::new(),
        }
    }

    pub fn top(&self) -> NsRef {
        self.current.ns.clone()
    }

    pub fn depth(&self) -> usize {
        self.below.len() + 1
    }

    /// Enters a method scope.
    pub fn push(&mut self, ns: NsRef) {
        let file = self.current.file.clone();
        let previous = std::mem::replace(&mut self.current, Frame::new(ns, file));
        self.below.push(previous);
    }

    /// Leaves a method scope. The root frame is never popped.
    pub fn pop(&mut self) -> Option<NsRef> {
        let previous = self.below.pop()?;
        Some(std::mem::replace(&mut self.current, previous).ns)
    }

    /// Replaces the scope of the top frame, keeping its location.
    pub fn swap(&mut self, ns: NsRef) -> NsRef {
        std::mem::replace(&mut self.current.ns, ns)
    }

    pub fn set_span(&mut self, span: &Span) {
        self.current.line = span.line;
        if span.file.is_some() {
            self.current.file = span.file.clone();
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.current.line, self.current.file.clone())
    }

    /// Frozen copy of the frames, innermost first.
    pub fn snapshot(&self) -> Vec<TraceFrame> {
        std::iter::once(&self.current)
            .chain(self.below.iter().rev())
            .map(|frame| {
                let scope = Namespace::non_block(&frame.ns);
                let scope = scope.borrow().name().to_string();
                TraceFrame {
                    scope,
                    line: frame.line,
                    file: frame.file.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_keeps_frame_location() {
        let interp = Interpreter::new();
        let global = interp.global_namespace();
        let mut cs = CallStack::new(global.clone());
        cs.set_span(&Span::new(3, None));
        let block = Namespace::child(&global, "block", ScopeKind::Block);
        let saved = cs.swap(block.clone());
        assert!(Rc::ptr_eq(&saved, &global));
        assert!(Rc::ptr_eq(&cs.top(), &block));
        assert_eq!(cs.span().line, 3);
        assert_eq!(cs.depth(), 1);
        // block frames report their enclosing method scope
        assert_eq!(cs.snapshot()[0].scope, "global");
    }

    #[test]
    fn push_pop_tracks_method_frames() {
        let interp = Interpreter::new();
        let global = interp.global_namespace();
        let mut cs = CallStack::new(global.clone());
        cs.set_span(&Span::new(10, Some(Rc::from("main.bsh"))));
        let method = Namespace::child(&global, "foo", ScopeKind::Method);
        cs.push(method);
        cs.set_span(&Span::new(2, None));
        let trace = cs.snapshot();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].scope, "foo");
        assert_eq!(trace[0].line, 2);
        assert_eq!(trace[0].file.as_deref(), Some("main.bsh"));
        assert_eq!(trace[1].line, 10);
        assert!(cs.pop().is_some());
        assert!(cs.pop().is_none());
        assert_eq!(cs.depth(), 1);
    }
}
