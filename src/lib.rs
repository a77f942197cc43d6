//! A tree-walking interpreter for a loosely typed superset of Java.
//!
//! Scripts arrive as [`ast::Program`]s; [`Interpreter`] evaluates them against a registry of
//! host classes and can generate new classes from script class bodies.

pub mod ast;
pub mod config;
pub mod interpreter;
pub mod types;

pub use config::Config;
pub use interpreter::{
    CallStack, CallbackEmitter, ClassBuilder, ClassDef, ClassDescriptor, ClassEmitter, ClassRef,
    ClassRegistry, CoreClasses, EvalError, FaultKind, FieldDescriptor, Interpreter,
    MethodDescriptor, Namespace, NsRef, ObjectData, ObjectRef, ScopeKind, SecurityGuard, Storage,
    Thrown, TraceFrame, TypeDesc, UtilError,
};
pub use types::{Primitive, PrimitiveType, Type, Value};
