//! In-memory reference runtime
//!
//! [`SandboxRuntime`] implements [`Resolver`] and [`HostObjects`] over a
//! small object model: single-inheritance classes, instances with named
//! fields, typed arrays, interned strings and re-entrant monitors.
//! Methods are either interpretable bodies or Rust closures.
//!
//! Index tables (types, strings, fields, methods) are global to the
//! sandbox; the `referrer` passed by the interpreter is ignored.
//!
//! ```ignore
//! let mut rt = SandboxRuntime::new();
//! let main = rt.add_method("Main", "run", "I", true, code)?;
//! let outcome = Interpreter::new().call(&mut rt, main, None, &[])?;
//! ```

mod heap;

pub use heap::{Heap, HeapObject};

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::bytecode::CodeItem;
use crate::vm::interpreter::{Interpreter, Outcome};
use crate::vm::runtime::{
    CallResult, HostCall, HostError, HostObjects, HostResult, InvokeKind, Resolver,
};
use crate::vm::value::{ClassRef, MethodRef, ObjRef, RegValue, Shorty, TypeCode, Value};
use crate::vm::{VmError, VmResult};

/// Native method implementation
pub type NativeMethod =
    Arc<dyn Fn(&mut SandboxRuntime, &HostCall<'_>) -> HostResult<Value> + Send + Sync>;

/// Well-known class names, registered by [`SandboxRuntime::new`]
pub mod classes {
    /// Root class
    pub const OBJECT: &str = "java/lang/Object";
    /// Class mirrors
    pub const CLASS: &str = "java/lang/Class";
    /// Strings
    pub const STRING: &str = "java/lang/String";
    /// Root throwable
    pub const THROWABLE: &str = "java/lang/Throwable";
    /// Checked exceptions
    pub const EXCEPTION: &str = "java/lang/Exception";
    /// Unchecked exceptions
    pub const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";
    /// Errors
    pub const ERROR: &str = "java/lang/Error";
    /// Unknown type index
    pub const NO_CLASS_DEF: &str = "java/lang/NoClassDefFoundError";
    /// Unknown method index
    pub const NO_SUCH_METHOD: &str = "java/lang/NoSuchMethodError";
    /// Unknown field index
    pub const NO_SUCH_FIELD: &str = "java/lang/NoSuchFieldError";
    /// Static/instance mismatch
    pub const INCOMPATIBLE_CLASS_CHANGE: &str = "java/lang/IncompatibleClassChangeError";
    /// Unlock of a monitor not held
    pub const ILLEGAL_MONITOR_STATE: &str = "java/lang/IllegalMonitorStateException";
    /// Reference stored into an array of an unrelated element class
    pub const ARRAY_STORE: &str = "java/lang/ArrayStoreException";
    /// Negative array length
    pub const NEGATIVE_ARRAY_SIZE: &str = "java/lang/NegativeArraySizeException";
    /// Interpreter fault surfaced to bytecode
    pub const INTERNAL_ERROR: &str = "java/lang/InternalError";
}

/// Superclass of each predefined class, root first
const BOOT_CLASSES: &[(&str, Option<&str>)] = &[
    (classes::OBJECT, None),
    (classes::CLASS, Some(classes::OBJECT)),
    (classes::STRING, Some(classes::OBJECT)),
    (classes::THROWABLE, Some(classes::OBJECT)),
    (classes::EXCEPTION, Some(classes::THROWABLE)),
    (classes::ERROR, Some(classes::THROWABLE)),
    (classes::RUNTIME_EXCEPTION, Some(classes::EXCEPTION)),
    ("java/lang/NullPointerException", Some(classes::RUNTIME_EXCEPTION)),
    ("java/lang/IndexOutOfBoundsException", Some(classes::RUNTIME_EXCEPTION)),
    (
        "java/lang/ArrayIndexOutOfBoundsException",
        Some("java/lang/IndexOutOfBoundsException"),
    ),
    (classes::NEGATIVE_ARRAY_SIZE, Some(classes::RUNTIME_EXCEPTION)),
    ("java/lang/ClassCastException", Some(classes::RUNTIME_EXCEPTION)),
    ("java/lang/ArithmeticException", Some(classes::RUNTIME_EXCEPTION)),
    (classes::ARRAY_STORE, Some(classes::RUNTIME_EXCEPTION)),
    (classes::ILLEGAL_MONITOR_STATE, Some(classes::RUNTIME_EXCEPTION)),
    ("java/lang/LinkageError", Some(classes::ERROR)),
    (classes::NO_CLASS_DEF, Some("java/lang/LinkageError")),
    (classes::INCOMPATIBLE_CLASS_CHANGE, Some("java/lang/LinkageError")),
    (classes::NO_SUCH_METHOD, Some(classes::INCOMPATIBLE_CLASS_CHANGE)),
    (classes::NO_SUCH_FIELD, Some(classes::INCOMPATIBLE_CLASS_CHANGE)),
    ("java/lang/VirtualMachineError", Some(classes::ERROR)),
    (classes::INTERNAL_ERROR, Some("java/lang/VirtualMachineError")),
];

/// Field holding a throwable's message string
const MESSAGE_FIELD: &str = "message";

/// A field table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Declaring class
    pub class: ClassRef,
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeCode,
    /// Static field
    pub is_static: bool,
}

/// How a method runs
#[derive(Clone)]
pub enum MethodBody {
    /// Interpretable bytecode
    Code(Arc<CodeItem>),
    /// Rust closure
    Native(NativeMethod),
}

impl std::fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodBody::Code(code) => f
                .debug_struct("Code")
                .field("registers", &code.registers_size)
                .field("insns", &code.insns.len())
                .finish(),
            MethodBody::Native(_) => f.write_str("Native"),
        }
    }
}

/// A method table entry
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Declaring class
    pub class: ClassRef,
    /// Method name
    pub name: String,
    /// Shorty descriptor
    pub shorty: Shorty,
    /// Static method
    pub is_static: bool,
    /// Implementation
    pub body: MethodBody,
}

/// In-memory [`Runtime`](crate::vm::Runtime) for tests and embedders
#[derive(Debug)]
pub struct SandboxRuntime {
    heap: Heap,
    class_names: FxHashMap<String, ClassRef>,
    types: Vec<String>,
    strings: Vec<String>,
    interned: FxHashMap<String, ObjRef>,
    fields: Vec<FieldInfo>,
    statics: FxHashMap<u32, Value>,
    methods: Vec<MethodInfo>,
    monitors: FxHashMap<ObjRef, u32>,
}

impl SandboxRuntime {
    /// Create a runtime with the core `java/lang` classes defined
    pub fn new() -> Self {
        let mut rt = Self {
            heap: Heap::new(),
            class_names: FxHashMap::default(),
            types: Vec::new(),
            strings: Vec::new(),
            interned: FxHashMap::default(),
            fields: Vec::new(),
            statics: FxHashMap::default(),
            methods: Vec::new(),
            monitors: FxHashMap::default(),
        };
        for (name, super_name) in BOOT_CLASSES {
            rt.define_class(name, *super_name);
        }
        rt
    }

    // ===== Registration =====

    /// Define a class, or return the existing one of that name
    ///
    /// An unknown superclass name is defined on the fly under
    /// `java/lang/Object`; `None` makes a root class.
    pub fn define_class(&mut self, name: &str, super_name: Option<&str>) -> ClassRef {
        if let Some(&class) = self.class_names.get(name) {
            return class;
        }
        let super_class = super_name
            .filter(|s| *s != name)
            .map(|s| self.define_class(s, Some(classes::OBJECT)));
        let class = ClassRef::new(self.heap.alloc(HeapObject::Class {
            name: name.to_string(),
            super_class,
        }));
        self.class_names.insert(name.to_string(), class);
        class
    }

    /// Look up a class by internal name
    pub fn class(&self, name: &str) -> Option<ClassRef> {
        self.class_names.get(name).copied()
    }

    /// Internal name of a class (`java/lang/String`)
    pub fn internal_name(&self, class: ClassRef) -> &str {
        match self.heap.get(class.as_object()) {
            Some(HeapObject::Class { name, .. }) => name.as_str(),
            _ => "<invalid class>",
        }
    }

    /// Superclass of `class`
    pub fn super_class(&self, class: ClassRef) -> Option<ClassRef> {
        match self.heap.get(class.as_object()) {
            Some(HeapObject::Class { super_class, .. }) => *super_class,
            _ => None,
        }
    }

    /// Whether `class` is `ancestor` or inherits from it
    pub fn is_subclass_of(&self, class: ClassRef, ancestor: ClassRef) -> bool {
        let mut current = Some(class);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.super_class(c);
        }
        false
    }

    /// Add a type descriptor (`I`, `Lpkg/Name;`, `[I`) and return its index
    pub fn add_type(&mut self, descriptor: &str) -> u32 {
        self.types.push(descriptor.to_string());
        (self.types.len() - 1) as u32
    }

    /// Add a string constant and return its index
    pub fn add_string(&mut self, text: &str) -> u32 {
        self.strings.push(text.to_string());
        (self.strings.len() - 1) as u32
    }

    /// Add a field of `class_name` and return its index
    pub fn add_field(&mut self, class_name: &str, name: &str, ty: TypeCode, is_static: bool) -> u32 {
        let class = self.define_class(class_name, Some(classes::OBJECT));
        self.fields.push(FieldInfo {
            class,
            name: name.to_string(),
            ty,
            is_static,
        });
        (self.fields.len() - 1) as u32
    }

    /// Add an interpretable method; its index equals the returned handle
    pub fn add_method(
        &mut self,
        class_name: &str,
        name: &str,
        shorty: &str,
        is_static: bool,
        code: CodeItem,
    ) -> VmResult<MethodRef> {
        self.push_method(class_name, name, shorty, is_static, MethodBody::Code(Arc::new(code)))
    }

    /// Add a native method implemented by `f`
    pub fn add_native<F>(
        &mut self,
        class_name: &str,
        name: &str,
        shorty: &str,
        is_static: bool,
        f: F,
    ) -> VmResult<MethodRef>
    where
        F: Fn(&mut SandboxRuntime, &HostCall<'_>) -> HostResult<Value> + Send + Sync + 'static,
    {
        self.push_method(class_name, name, shorty, is_static, MethodBody::Native(Arc::new(f)))
    }

    fn push_method(
        &mut self,
        class_name: &str,
        name: &str,
        shorty: &str,
        is_static: bool,
        body: MethodBody,
    ) -> VmResult<MethodRef> {
        let shorty = Shorty::parse(shorty)?;
        if let MethodBody::Code(code) = &body {
            let expected = shorty.arg_slots(is_static);
            if code.ins_size != expected {
                return Err(VmError::MalformedCodeItem(format!(
                    "{}.{}: ins_size {} but shorty {} needs {} slots",
                    class_name, name, code.ins_size, shorty, expected
                )));
            }
        }
        let class = self.define_class(class_name, Some(classes::OBJECT));
        self.methods.push(MethodInfo {
            class,
            name: name.to_string(),
            shorty,
            is_static,
            body,
        });
        Ok(MethodRef((self.methods.len() - 1) as u32))
    }

    /// Method table entry
    pub fn method(&self, method: MethodRef) -> Option<&MethodInfo> {
        self.methods.get(method.0 as usize)
    }

    // ===== Objects =====

    /// Intern a string
    pub fn new_string(&mut self, text: &str) -> ObjRef {
        if let Some(&obj) = self.interned.get(text) {
            return obj;
        }
        let class = self.boot_class(classes::STRING);
        let obj = self.heap.alloc(HeapObject::Str {
            class,
            value: text.to_string(),
        });
        self.interned.insert(text.to_string(), obj);
        obj
    }

    /// Contents of a string object
    pub fn string_value(&self, obj: ObjRef) -> Option<&str> {
        match self.heap.get(obj) {
            Some(HeapObject::Str { value, .. }) => Some(value),
            _ => None,
        }
    }

    /// Allocate an array with the given elements
    ///
    /// `descriptor` is the array type (`[I`); elements are coerced to its
    /// element type.
    pub fn new_array(&mut self, descriptor: &str, elements: &[Value]) -> VmResult<ObjRef> {
        let element = array_element(descriptor)?;
        let class = self.define_class(descriptor, Some(classes::OBJECT));
        Ok(self.heap.alloc(HeapObject::Array {
            class,
            element,
            elements: elements.iter().map(|v| v.coerce(element)).collect(),
        }))
    }

    /// Elements of an array object
    pub fn array_elements(&self, obj: ObjRef) -> Option<&[Value]> {
        match self.heap.get(obj) {
            Some(HeapObject::Array { elements, .. }) => Some(elements),
            _ => None,
        }
    }

    /// Instance field value by name
    pub fn instance_field(&self, obj: ObjRef, name: &str) -> Option<Value> {
        match self.heap.get(obj) {
            Some(HeapObject::Instance { fields, .. }) => fields.get(name).copied(),
            _ => None,
        }
    }

    /// Static field value by index (zero until written)
    pub fn static_field(&self, field_idx: u32) -> Option<Value> {
        let field = self.fields.get(field_idx as usize)?;
        Some(
            self.statics
                .get(&field_idx)
                .copied()
                .unwrap_or_else(|| Value::Void.coerce(field.ty)),
        )
    }

    /// Message of a throwable created by [`HostObjects::throw_new`]
    pub fn exception_message(&self, exception: ObjRef) -> Option<String> {
        let message = self.instance_field(exception, MESSAGE_FIELD)?.as_object();
        self.string_value(message).map(str::to_string)
    }

    /// Internal class name of an object
    pub fn class_name_of(&self, obj: ObjRef) -> String {
        let class = self.class_of(obj);
        self.internal_name(class).to_string()
    }

    /// Current recursion count of an object's monitor
    pub fn monitor_count(&self, obj: ObjRef) -> u32 {
        self.monitors.get(&obj).copied().unwrap_or(0)
    }

    /// Number of heap objects
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    fn boot_class(&mut self, name: &str) -> ClassRef {
        self.define_class(name, Some(classes::OBJECT))
    }

    fn field(&mut self, field_idx: u32) -> HostResult<FieldInfo> {
        match self.fields.get(field_idx as usize) {
            Some(field) => Ok(field.clone()),
            None => {
                let message = format!("field@{}", field_idx);
                Err(self.throw_new(classes::NO_SUCH_FIELD, Some(&message)))
            }
        }
    }

    fn check_static(&mut self, field: &FieldInfo, instance: Option<ObjRef>) -> HostResult<()> {
        if field.is_static == instance.is_none() {
            return Ok(());
        }
        let message = format!("{}.{}", self.internal_name(field.class), field.name);
        Err(self.throw_new(classes::INCOMPATIBLE_CLASS_CHANGE, Some(&message)))
    }
}

impl Default for SandboxRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Element type of an array descriptor
fn array_element(descriptor: &str) -> VmResult<TypeCode> {
    match descriptor.strip_prefix('[') {
        Some(element) if !element.is_empty() => TypeCode::from_descriptor(element),
        _ => Err(VmError::InvalidDescriptor(descriptor.to_string())),
    }
}

/// Class name named by a reference descriptor (`Lpkg/Name;` or `[I`)
fn descriptor_class_name(descriptor: &str) -> Option<&str> {
    if descriptor.starts_with('[') {
        return Some(descriptor);
    }
    descriptor.strip_prefix('L')?.strip_suffix(';')
}

impl Resolver for SandboxRuntime {
    fn resolve_class(&mut self, _referrer: MethodRef, type_idx: u32) -> HostResult<ClassRef> {
        let descriptor = self.types.get(type_idx as usize).cloned();
        let name = descriptor.as_deref().and_then(descriptor_class_name);
        match name {
            Some(name) if name.starts_with('[') => Ok(self.define_class(name, Some(classes::OBJECT))),
            Some(name) => match self.class(name) {
                Some(class) => Ok(class),
                None => Err(self.throw_new(classes::NO_CLASS_DEF, Some(name))),
            },
            None => {
                let message = format!("type@{}", type_idx);
                Err(self.throw_new(classes::NO_CLASS_DEF, Some(&message)))
            }
        }
    }

    fn resolve_method(
        &mut self,
        _referrer: MethodRef,
        method_idx: u32,
        is_static: bool,
    ) -> HostResult<MethodRef> {
        let found = self
            .methods
            .get(method_idx as usize)
            .map(|m| (m.is_static, format!("{}.{}", self.internal_name(m.class), m.name)));
        match found {
            Some((declared_static, _)) if declared_static == is_static => Ok(MethodRef(method_idx)),
            Some((_, name)) => Err(self.throw_new(classes::INCOMPATIBLE_CLASS_CHANGE, Some(&name))),
            None => {
                let message = format!("method@{}", method_idx);
                Err(self.throw_new(classes::NO_SUCH_METHOD, Some(&message)))
            }
        }
    }

    fn resolve_string(&mut self, _referrer: MethodRef, string_idx: u32) -> HostResult<ObjRef> {
        match self.strings.get(string_idx as usize).cloned() {
            Some(text) => Ok(self.new_string(&text)),
            None => {
                let message = format!("string@{}", string_idx);
                Err(self.throw_new(classes::INTERNAL_ERROR, Some(&message)))
            }
        }
    }

    fn resolve_field(
        &mut self,
        _referrer: MethodRef,
        field_idx: u32,
        instance: Option<ObjRef>,
    ) -> HostResult<Value> {
        let field = self.field(field_idx)?;
        self.check_static(&field, instance)?;
        let zero = Value::Void.coerce(field.ty);
        Ok(match instance {
            None => self.statics.get(&field_idx).copied().unwrap_or(zero),
            Some(obj) => self.instance_field(obj, &field.name).unwrap_or(zero),
        })
    }

    fn resolve_set_field(
        &mut self,
        _referrer: MethodRef,
        field_idx: u32,
        instance: Option<ObjRef>,
        value: RegValue,
    ) -> HostResult<()> {
        let field = self.field(field_idx)?;
        self.check_static(&field, instance)?;
        let value = value.to_typed(field.ty);
        match instance {
            None => {
                self.statics.insert(field_idx, value);
            }
            Some(obj) => {
                if let Some(HeapObject::Instance { fields, .. }) = self.heap.get_mut(obj) {
                    fields.insert(field.name, value);
                } else {
                    let message = format!("{} is not an instance", obj);
                    return Err(self.throw_new(classes::INCOMPATIBLE_CLASS_CHANGE, Some(&message)));
                }
            }
        }
        Ok(())
    }

    fn alloc_array(&mut self, _referrer: MethodRef, length: i32, type_idx: u32) -> HostResult<ObjRef> {
        if length < 0 {
            let message = length.to_string();
            return Err(self.throw_new(classes::NEGATIVE_ARRAY_SIZE, Some(&message)));
        }
        let descriptor = self.types.get(type_idx as usize).cloned().unwrap_or_default();
        let element = match array_element(&descriptor) {
            Ok(element) => element,
            Err(_) => {
                let message = format!("type@{} is not an array type", type_idx);
                return Err(self.throw_new(classes::NO_CLASS_DEF, Some(&message)));
            }
        };
        let class = self.define_class(&descriptor, Some(classes::OBJECT));
        Ok(self.heap.alloc(HeapObject::Array {
            class,
            element,
            elements: vec![Value::Void.coerce(element); length as usize],
        }))
    }

    fn shorty(&self, method: MethodRef) -> Option<Shorty> {
        self.method(method).map(|m| m.shorty.clone())
    }

    fn type_descriptor(&self, _referrer: MethodRef, type_idx: u32) -> Option<String> {
        self.types.get(type_idx as usize).cloned()
    }

    /// Walk the receiver's class chain for a method with the same name and
    /// shorty; `invoke-super` keeps the resolved method
    fn resolve_virtual(
        &mut self,
        method: MethodRef,
        kind: InvokeKind,
        receiver: ObjRef,
    ) -> HostResult<MethodRef> {
        let Some(resolved) = self.method(method) else {
            return Ok(method);
        };
        if kind == InvokeKind::Super {
            return Ok(method);
        }
        let mut current = Some(self.class_of(receiver));
        while let Some(class) = current {
            let found = self.methods.iter().position(|m| {
                m.class == class
                    && !m.is_static
                    && m.name == resolved.name
                    && m.shorty == resolved.shorty
            });
            if let Some(index) = found {
                return Ok(MethodRef(index as u32));
            }
            current = self.super_class(class);
        }
        Ok(method)
    }

    fn method_body(&self, method: MethodRef) -> Option<Arc<CodeItem>> {
        match &self.method(method)?.body {
            MethodBody::Code(code) => Some(code.clone()),
            MethodBody::Native(_) => None,
        }
    }
}

impl HostObjects for SandboxRuntime {
    fn class_of(&self, obj: ObjRef) -> ClassRef {
        let name = match self.heap.get(obj) {
            Some(HeapObject::Instance { class, .. })
            | Some(HeapObject::Array { class, .. })
            | Some(HeapObject::Str { class, .. }) => return *class,
            Some(HeapObject::Class { .. }) => classes::CLASS,
            None => classes::OBJECT,
        };
        self.class(name)
            .unwrap_or_else(|| ClassRef::new(ObjRef::NULL))
    }

    fn class_name(&self, class: ClassRef) -> String {
        self.internal_name(class).replace('/', ".")
    }

    fn is_instance_of(&self, obj: ObjRef, class: ClassRef) -> bool {
        self.is_subclass_of(self.class_of(obj), class)
    }

    fn array_length(&self, array: ObjRef) -> i32 {
        self.array_elements(array).map_or(0, |e| e.len() as i32)
    }

    fn array_get(&mut self, array: ObjRef, index: i32) -> Value {
        self.array_elements(array)
            .and_then(|e| e.get(index as usize).copied())
            .unwrap_or_default()
    }

    fn array_put(&mut self, array: ObjRef, index: i32, value: RegValue) -> HostResult<()> {
        let (element, class) = match self.heap.get(array) {
            Some(HeapObject::Array { element, class, .. }) => (*element, *class),
            _ => return Err(self.throw_new(classes::ARRAY_STORE, Some("not an array"))),
        };

        let typed = value.to_typed(element);
        if let Value::Object(obj) = typed {
            let component = self
                .internal_name(class)
                .strip_prefix('[')
                .and_then(descriptor_class_name)
                .and_then(|name| self.class(name));
            if let Some(component) = component {
                if !obj.is_null() && !self.is_instance_of(obj, component) {
                    let message = self.class_name(self.class_of(obj));
                    return Err(self.throw_new(classes::ARRAY_STORE, Some(&message)));
                }
            }
        }

        if let Some(HeapObject::Array { elements, .. }) = self.heap.get_mut(array) {
            if let Some(slot) = elements.get_mut(index as usize) {
                *slot = typed;
            }
        }
        Ok(())
    }

    fn new_object(&mut self, class: ClassRef) -> HostResult<ObjRef> {
        Ok(self.heap.alloc(HeapObject::Instance {
            class,
            fields: FxHashMap::default(),
        }))
    }

    fn monitor_enter(&mut self, obj: ObjRef) -> HostResult<()> {
        *self.monitors.entry(obj).or_insert(0) += 1;
        Ok(())
    }

    fn monitor_exit(&mut self, obj: ObjRef) -> HostResult<()> {
        if let Some(count) = self.monitors.get_mut(&obj).filter(|count| **count > 0) {
            *count -= 1;
            return Ok(());
        }
        Err(self.throw_new(classes::ILLEGAL_MONITOR_STATE, None))
    }

    fn throw_new(&mut self, class_name: &str, message: Option<&str>) -> ObjRef {
        let class = match self.class(class_name) {
            Some(class) => class,
            None => self.define_class(class_name, Some(classes::RUNTIME_EXCEPTION)),
        };
        let mut fields = FxHashMap::default();
        if let Some(message) = message {
            fields.insert(MESSAGE_FIELD.to_string(), Value::Object(self.new_string(message)));
        }
        let exception = self.heap.alloc(HeapObject::Instance { class, fields });
        debug!(class = class_name, detail = ?message, exception = %exception, "sandbox: throw");
        exception
    }

    /// Natives run directly; bytecode bodies re-enter through an
    /// interpreter that inherits the caller's options and depth
    fn call_method(&mut self, call: &HostCall<'_>) -> CallResult {
        let body = match self.method(call.method) {
            Some(info) => info.body.clone(),
            None => {
                let message = format!("method {}", call.method.0);
                return Err(HostError::Thrown(
                    self.throw_new(classes::NO_SUCH_METHOD, Some(&message)),
                ));
            }
        };
        match body {
            MethodBody::Native(f) => f(self, call).map_err(HostError::Thrown),
            MethodBody::Code(_) => {
                let mut interpreter = Interpreter::for_host_call(call);
                match interpreter.call(self, call.method, call.receiver, call.args)? {
                    Outcome::Returned(value) => Ok(value),
                    Outcome::Threw(exception) => Err(HostError::Thrown(exception)),
                }
            }
        }
    }
}
