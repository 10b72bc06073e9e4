//! Host collaborator traits
//!
//! The interpreter orchestrates register state and control flow only.
//! Everything else comes from the host through two traits:
//!
//! - [`Resolver`]: maps indices in the instruction stream (types, methods,
//!   strings, fields) to live entities of the loaded program
//! - [`HostObjects`]: the object system (identity, classes, arrays, locks,
//!   exceptions, native calls)
//!
//! Operations that can raise a Java exception return `Err(ObjRef)` carrying
//! the throwable; the interpreter records it as the pending exception.

use std::sync::Arc;

use crate::bytecode::{CodeItem, Opcode};
use crate::vm::options::InterpreterOptions;
use crate::vm::value::{ClassRef, MethodRef, ObjRef, RegValue, Shorty, Value};
use crate::vm::VmError;

/// Result of a host operation that may throw
pub type HostResult<T> = Result<T, ObjRef>;

/// Failure of a host method call
///
/// A call may re-enter the interpreter, so besides a thrown exception it
/// can end in an internal fault that must not reach the caller's catch
/// clauses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The callee raised a Java exception
    #[error("Exception thrown: {0}")]
    Thrown(ObjRef),

    /// The callee hit an internal fault
    #[error(transparent)]
    Fatal(#[from] VmError),
}

/// Result of [`HostObjects::call_method`]
pub type CallResult = Result<Value, HostError>;

/// The five invoke kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    /// `invoke-virtual`
    Virtual,
    /// `invoke-super`
    Super,
    /// `invoke-direct`
    Direct,
    /// `invoke-static`
    Static,
    /// `invoke-interface`
    Interface,
}

impl InvokeKind {
    /// Kind and range flag of an invoke opcode
    pub fn from_opcode(op: Opcode) -> Option<(InvokeKind, bool)> {
        Some(match op {
            Opcode::InvokeVirtual => (InvokeKind::Virtual, false),
            Opcode::InvokeSuper => (InvokeKind::Super, false),
            Opcode::InvokeDirect => (InvokeKind::Direct, false),
            Opcode::InvokeStatic => (InvokeKind::Static, false),
            Opcode::InvokeInterface => (InvokeKind::Interface, false),
            Opcode::InvokeVirtualRange => (InvokeKind::Virtual, true),
            Opcode::InvokeSuperRange => (InvokeKind::Super, true),
            Opcode::InvokeDirectRange => (InvokeKind::Direct, true),
            Opcode::InvokeStaticRange => (InvokeKind::Static, true),
            Opcode::InvokeInterfaceRange => (InvokeKind::Interface, true),
            _ => return None,
        })
    }

    /// Static invokes carry no receiver
    #[inline]
    pub fn is_static(self) -> bool {
        self == InvokeKind::Static
    }

    /// Virtual, super and interface invokes select an override at run time
    #[inline]
    pub fn is_dispatched(self) -> bool {
        matches!(
            self,
            InvokeKind::Virtual | InvokeKind::Super | InvokeKind::Interface
        )
    }
}

/// A call handed to the host's native calling convention
#[derive(Debug, Clone, Copy)]
pub struct HostCall<'a> {
    /// Invoke kind (selects virtual/super/interface dispatch)
    pub kind: InvokeKind,
    /// Resolved method
    pub method: MethodRef,
    /// Return and parameter types
    pub shorty: &'a Shorty,
    /// Receiver for non-static kinds (never null)
    pub receiver: Option<ObjRef>,
    /// Arguments, typed by the shorty
    pub args: &'a [Value],
    /// Options of the calling interpreter, for hosts that re-enter it
    pub options: &'a InterpreterOptions,
    /// Live activations of the calling interpreter
    pub depth: usize,
}

/// Index resolution bound to a loaded program image
///
/// `referrer` is the method whose instruction stream holds the index.
pub trait Resolver {
    /// Resolve a type index to a class
    fn resolve_class(&mut self, referrer: MethodRef, type_idx: u32) -> HostResult<ClassRef>;

    /// Resolve a method index
    fn resolve_method(
        &mut self,
        referrer: MethodRef,
        method_idx: u32,
        is_static: bool,
    ) -> HostResult<MethodRef>;

    /// Resolve a string index to an interned string object
    fn resolve_string(&mut self, referrer: MethodRef, string_idx: u32) -> HostResult<ObjRef>;

    /// Read a field (`instance` is `None` for static fields)
    fn resolve_field(
        &mut self,
        referrer: MethodRef,
        field_idx: u32,
        instance: Option<ObjRef>,
    ) -> HostResult<Value>;

    /// Write a field; the host types `value` by the field's declared type
    fn resolve_set_field(
        &mut self,
        referrer: MethodRef,
        field_idx: u32,
        instance: Option<ObjRef>,
        value: RegValue,
    ) -> HostResult<()>;

    /// Allocate an array of the array type `type_idx` (e.g. `[I`)
    fn alloc_array(&mut self, referrer: MethodRef, length: i32, type_idx: u32)
        -> HostResult<ObjRef>;

    /// Shorty descriptor of a resolved method
    fn shorty(&self, method: MethodRef) -> Option<Shorty>;

    /// Descriptor of a type index (e.g. `[Ljava/lang/String;`)
    fn type_descriptor(&self, referrer: MethodRef, type_idx: u32) -> Option<String>;

    /// Select the implementation of `method` for `receiver`
    fn resolve_virtual(
        &mut self,
        method: MethodRef,
        _kind: InvokeKind,
        _receiver: ObjRef,
    ) -> HostResult<MethodRef> {
        Ok(method)
    }

    /// Interpretable body of `method`, if it has one
    fn method_body(&self, method: MethodRef) -> Option<Arc<CodeItem>>;
}

/// The host object system
pub trait HostObjects {
    /// Class of a non-null object
    fn class_of(&self, obj: ObjRef) -> ClassRef;

    /// Human-readable class name (`java.lang.String`)
    fn class_name(&self, class: ClassRef) -> String;

    /// Check `obj instanceof class` (`obj` is non-null)
    fn is_instance_of(&self, obj: ObjRef, class: ClassRef) -> bool;

    /// Length of a non-null array
    fn array_length(&self, array: ObjRef) -> i32;

    /// Element `index` of an array; the index is already bounds-checked
    fn array_get(&mut self, array: ObjRef, index: i32) -> Value;

    /// Store into element `index`; the host types `value` by element type
    fn array_put(&mut self, array: ObjRef, index: i32, value: RegValue) -> HostResult<()>;

    /// Allocate a zeroed instance
    fn new_object(&mut self, class: ClassRef) -> HostResult<ObjRef>;

    /// Acquire the monitor of a non-null object
    fn monitor_enter(&mut self, obj: ObjRef) -> HostResult<()>;

    /// Release the monitor of a non-null object
    fn monitor_exit(&mut self, obj: ObjRef) -> HostResult<()>;

    /// Create a throwable of class `class_name` with an optional message
    fn throw_new(&mut self, class_name: &str, message: Option<&str>) -> ObjRef;

    /// Call a method through the host's native calling convention
    ///
    /// Hosts that run bytecode bodies here should do so through
    /// [`Interpreter::for_host_call`](crate::vm::Interpreter::for_host_call)
    /// and report its faults as [`HostError::Fatal`].
    fn call_method(&mut self, call: &HostCall<'_>) -> CallResult;
}

/// Everything the interpreter needs from its host
pub trait Runtime: Resolver + HostObjects {}

impl<T: Resolver + HostObjects + ?Sized> Runtime for T {}
