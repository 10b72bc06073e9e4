//! Object storage for the sandbox runtime
//!
//! Objects live in a growable vector and are never collected. Handle `n`
//! refers to slot `n - 1`, so the zero handle stays free for `null`.

use rustc_hash::FxHashMap;

use crate::vm::value::{ClassRef, ObjRef, TypeCode, Value};

/// A heap object
#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    /// Plain instance with named fields
    Instance {
        /// Runtime class
        class: ClassRef,
        /// Field values by name; absent fields read as zero
        fields: FxHashMap<String, Value>,
    },
    /// Array of primitives or references
    Array {
        /// Array class (`[I`, `[Ljava/lang/String;`, ...)
        class: ClassRef,
        /// Element type
        element: TypeCode,
        /// Elements, typed by `element`
        elements: Vec<Value>,
    },
    /// Interned string
    Str {
        /// `java/lang/String`
        class: ClassRef,
        /// Contents
        value: String,
    },
    /// Class mirror; its own class is `java/lang/Class`
    Class {
        /// Internal name (`java/lang/Object`, `[I`)
        name: String,
        /// Superclass (`None` for the root)
        super_class: Option<ClassRef>,
    },
}

/// Append-only object store
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    /// Create an empty heap
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object` and return its handle
    pub fn alloc(&mut self, object: HeapObject) -> ObjRef {
        self.objects.push(object);
        ObjRef::from_raw(self.objects.len() as u32)
    }

    #[inline]
    fn slot(obj: ObjRef) -> Option<usize> {
        (obj.raw() as usize).checked_sub(1)
    }

    /// Object behind a handle (`None` for null or a dangling handle)
    pub fn get(&self, obj: ObjRef) -> Option<&HeapObject> {
        Self::slot(obj).and_then(|i| self.objects.get(i))
    }

    /// Mutable object behind a handle
    pub fn get_mut(&mut self, obj: ObjRef) -> Option<&mut HeapObject> {
        Self::slot(obj).and_then(move |i| self.objects.get_mut(i))
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing has been allocated
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
