use super::*;
use thiserror::Error;

/// A host-level throwable escaping invoked code.
#[derive(Clone, Debug)]
pub struct Thrown {
    pub exception: Value,
    /// Raised by native code rather than by a script `throw`.
    pub native: bool,
}

impl Thrown {
    pub fn class_name(&self) -> String {
        match &self.exception {
            Value::Object(o) => o.class().name.clone(),
            _ => "null".to_string(),
        }
    }

    pub fn message(&self) -> Option<String> {
        let Value::Object(o) = &self.exception else {
            return None;
        };
        match &*o.data() {
            ObjectData::Throwable(t) => t.message.clone(),
            _ => None,
        }
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "{}: {}", self.class_name(), msg),
            None => f.write_str(&self.class_name()),
        }
    }
}

/// Faults raised below the AST layer. They carry no location; the nearest node boundary
/// converts them into an [`EvalError`].
#[derive(Debug, Error)]
pub enum UtilError {
    #[error("{0}")]
    Eval(String),
    #[error("{0}")]
    Type(String),
    #[error("Cannot re-assign final variable {0}.")]
    FinalVariable(String),
    #[error("{0}")]
    NoSuchMember(String),
    #[error("{0}")]
    Ambiguous(String),
    #[error("{0}")]
    Security(String),
    #[error("{0}")]
    Target(Thrown),
    #[error(transparent)]
    Nested(Box<EvalError>),
}

pub type UtilResult<T> = Result<T, UtilError>;
pub type EvalResult<T> = Result<T, EvalError>;

impl UtilError {
    pub fn eval(message: impl Into<String>) -> Self {
        UtilError::Eval(message.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        UtilError::Type(message.into())
    }

    pub(crate) fn prefixed(self, prefix: &str) -> Self {
        match self {
            UtilError::Eval(m) => UtilError::Eval(format!("{prefix}{m}")),
            UtilError::Type(m) => UtilError::Type(format!("{prefix}{m}")),
            UtilError::FinalVariable(name) => {
                UtilError::Eval(format!("{prefix}Cannot re-assign final variable {name}."))
            }
            other => other,
        }
    }

    pub(crate) fn into_eval(self, cs: &CallStack) -> EvalError {
        match self {
            UtilError::Nested(e) => *e,
            UtilError::Target(thrown) => {
                let message = thrown.to_string();
                EvalError::new(FaultKind::Target(thrown), message, cs)
            }
            UtilError::Security(m) => EvalError::new(FaultKind::Security, m, cs),
            other => EvalError::new(FaultKind::Eval, other.to_string(), cs),
        }
    }
}

impl From<EvalError> for UtilError {
    fn from(e: EvalError) -> Self {
        UtilError::Nested(Box::new(e))
    }
}

pub(crate) trait UtilResultExt<T> {
    /// Attach the current location and a frozen trace.
    fn at(self, cs: &CallStack) -> Result<T, EvalError>;
}

impl<T> UtilResultExt<T> for UtilResult<T> {
    fn at(self, cs: &CallStack) -> Result<T, EvalError> {
        self.map_err(|e| e.into_eval(cs))
    }
}

#[derive(Clone, Debug)]
pub enum FaultKind {
    Eval,
    Target(Thrown),
    Security,
}

fn location_suffix(location: &Option<Span>) -> String {
    match location {
        Some(span) if span.line > 0 => match &span.file {
            Some(file) => format!(" : at line {} in file {}", span.line, file),
            None => format!(" : at line {}", span.line),
        },
        _ => String::new(),
    }
}

/// A located evaluation failure as seen by script users.
#[derive(Clone, Debug, Error)]
#[error("{message}{}", location_suffix(.location))]
pub struct EvalError {
    kind: FaultKind,
    message: String,
    location: Option<Span>,
    trace: Vec<TraceFrame>,
}

impl EvalError {
    pub(crate) fn new(kind: FaultKind, message: impl Into<String>, cs: &CallStack) -> Self {
        EvalError {
            kind,
            message: message.into(),
            location: Some(cs.span()),
            trace: cs.snapshot(),
        }
    }

    pub(crate) fn eval(message: impl Into<String>, cs: &CallStack) -> Self {
        Self::new(FaultKind::Eval, message, cs)
    }

    pub fn kind(&self) -> &FaultKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&Span> {
        self.location.as_ref()
    }

    pub fn trace(&self) -> &[TraceFrame] {
        &self.trace
    }

    pub fn thrown(&self) -> Option<&Thrown> {
        match &self.kind {
            FaultKind::Target(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_target(&self) -> bool {
        matches!(self.kind, FaultKind::Target(_))
    }

    pub fn is_security(&self) -> bool {
        matches!(self.kind, FaultKind::Security)
    }

    /// Adds context in front of the message; the innermost text stays at the end.
    pub fn prepend(mut self, prefix: &str) -> Self {
        self.message = format!("{prefix}{}", self.message);
        self
    }

    /// Message, location and the script call stack, one line per method frame.
    pub fn render(&self) -> String {
        let mut out = self.to_string();
        if let FaultKind::Target(t) = &self.kind {
            if t.native {
                out.push_str("\nTarget exception raised by native code");
            }
        }
        for frame in &self.trace {
            out.push('\n');
            out.push_str(&frame.to_string());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> CallStack {
        let interp = Interpreter::new();
        let mut cs = CallStack::new(interp.global_namespace());
        cs.set_span(&Span::new(7, Some(Rc::from("demo.bsh"))));
        cs
    }

    #[test]
    fn prepend_keeps_innermost_message_last() {
        let cs = stack();
        let err = EvalError::eval("Undefined argument: x", &cs)
            .prepend("Method foo: ")
            .prepend("Error in: ");
        assert_eq!(err.message(), "Error in: Method foo: Undefined argument: x");
        assert_eq!(
            err.to_string(),
            "Error in: Method foo: Undefined argument: x : at line 7 in file demo.bsh"
        );
    }

    #[test]
    fn utility_faults_pick_up_location() {
        let cs = stack();
        let err: Result<(), EvalError> =
            Err(UtilError::FinalVariable("x".to_string())).at(&cs);
        let err = err.unwrap_err();
        assert_eq!(err.location().map(|s| s.line), Some(7));
        assert_eq!(err.message(), "Cannot re-assign final variable x.");
        assert!(!err.is_target());
        assert_eq!(err.trace().len(), 1);
    }

    #[test]
    fn nested_faults_pass_through_unchanged() {
        let cs = stack();
        let inner = EvalError::eval("inner", &cs).prepend("ctx: ");
        let outer = UtilError::from(inner).into_eval(&cs);
        assert_eq!(outer.message(), "ctx: inner");
    }
}
